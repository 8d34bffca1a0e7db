//! HTTP plumbing shared by Verdict's request validation pipe.
//!
//! A deliberately small request/response model: enough for a handler to
//! decode a submitted form into a data tree and answer with a status,
//! headers and a body.

mod error;
mod form;
mod http;

pub use error::Error;
pub use form::{parse_form, parse_form_map, parse_form_tree};
pub use http::{HttpRequest, HttpResponse};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;
