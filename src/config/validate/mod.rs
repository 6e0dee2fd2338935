//! Run specification validation
//!
//! Checks ranges and file locations before any training starts.

mod error;
mod validator;


pub use error::ValidationError;
pub use validator::validate_config;
