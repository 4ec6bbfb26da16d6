pub mod error;
pub mod sealed;
