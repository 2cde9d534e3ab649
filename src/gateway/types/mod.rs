//! Gateway types module
//!
//! ## Submodules
//! - [`response`]: Response envelope and error codes
//! - [`error`]: `ApiError` and handler result helpers
//! - [`extract`]: Validating JSON extractor

pub mod error;
pub mod extract;
pub mod response;

// Re-export commonly used types at module root
pub use error::{ApiError, ApiResult, created, ok};
pub use extract::ValidatedJson;
pub use response::{ApiResponse, error_codes};
