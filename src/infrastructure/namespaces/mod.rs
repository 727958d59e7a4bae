//! Built-in namespace batch handlers

mod copy;

pub use copy::{CopyHandler, COPY_NAMESPACE};
