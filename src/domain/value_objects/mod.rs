//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod content;
mod destination;
mod suffix_chain;

pub use content::Content;
pub use destination::{OutputLayout, RenameRule, DEFAULT_RENAME};
pub use suffix_chain::{is_markup, is_modifier, SuffixChain, MARKUP_LABELS, MODIFIER_TOKENS};
