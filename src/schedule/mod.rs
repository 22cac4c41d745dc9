//! Recurrence rules, calendar stepping, and bounded occurrence enumeration.

pub mod enumerate;
pub mod frequency;
pub mod rule;
pub mod window;

pub use enumerate::{enumerate, Enumeration, MAX_ENUMERATION_STEPS};
pub use frequency::Frequency;
pub use rule::RecurrenceRule;
pub use window::DateWindow;
