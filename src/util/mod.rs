//! Small shared utilities.

pub mod dates;
pub mod debounce;

pub use dates::is_date_in_range;
pub use debounce::Debouncer;
