//! # Server Module
//!
//! Request and response value types the dispatch engine consumes and
//! produces. Socket handling is out of scope: an ingestion layer builds a
//! [`Request`] (from a [`RequestDescriptor`], a raw request string or a file)
//! and the engine hands back an [`HttpResponse`] rendered by the final
//! response event.

mod request;
mod response;

pub use request::{parse_cookies, HttpMethod, Request, RequestDescriptor};
pub use response::HttpResponse;
