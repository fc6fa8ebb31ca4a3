//! Hand-rolled HTTP/1.1 client
//!
//! This module contains the wire-level pieces of the crawler:
//! - Request construction in a fixed dialect
//! - Response framing (Content-Length, gzip bodies)
//! - Marker extraction for cookies, CSRF tokens and pagination
//! - The raw TCP/TLS transport with its retry policy

pub mod markers;
mod request;
mod response;
mod transport;

pub use request::{Method, Request};
pub use response::{decode_body, html_fragment, read_response, RawResponse};
pub use transport::{TcpTransport, Transport, TransportError};
