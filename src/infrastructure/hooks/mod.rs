//! Built-in template hooks

mod include;

pub use include::IncludeHook;
