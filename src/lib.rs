#![warn(clippy::pedantic)]
#![allow(clippy::non_ascii_literal)]

// TODO: Before publishing to crates.io, remove these and fix the warnings they
// suppress.
//#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod chunked_body;
mod error;
mod headers;
mod request;
mod response;
mod server;

pub use crate::chunked_body::{
    ChunkedBody,
    DecodeStatus,
};
pub use crate::error::Error;
pub use crate::headers::Headers;
pub use crate::request::{
    Limits,
    Request,
    RequestLine,
};
pub use crate::response::{
    default_headers,
    StatusCode,
    Writer,
};
pub use crate::server::Server;

// This is the character sequence corresponding to a carriage return (CR)
// followed by a line feed (LF), which officially delimits each
// line of an HTTP message.
const CRLF: &str = "\r\n";

fn find_crlf<T>(message: T) -> Option<usize>
where
    T: AsRef<[u8]>,
{
    message
        .as_ref()
        .windows(CRLF.len())
        .position(|window| window == CRLF.as_bytes())
}

// A line still waiting for its terminator may already hold the carriage
// return, which does not count against the line limit.
fn partial_line_too_long(
    partial_line: &[u8],
    limit: usize,
) -> bool {
    partial_line.strip_suffix(b"\r").unwrap_or(partial_line).len() > limit
}

/// This indicates whether or not a parser has reached the end of the
/// protocol unit it was asked to recognize.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseStatus {
    /// The unit is complete; no more input is needed.
    Complete,

    /// More input is needed before the unit is complete.
    Incomplete,
}
