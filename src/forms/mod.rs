//! Form option lists, default records and composite inputs.

pub mod defaults;
pub mod options;
pub mod phone;

pub use defaults::{new_application, validate_for_submission};
pub use phone::PhoneInput;
