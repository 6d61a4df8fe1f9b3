//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the request handlers: MIME inference
//! and response builders, decoupled from routing and file loading.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{build_404_response, build_405_response, build_file_response};
