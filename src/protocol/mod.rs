//! Protocol module - wire format, framing, and message types.
//!
//! This module implements the Debug Adapter Protocol transport:
//! - `Content-Length`-prefixed header encoding/decoding
//! - Message buffer for accumulating partial reads
//! - Serde types for requests, responses and events

mod message_buffer;
mod types;
mod wire_format;

pub use message_buffer::MessageBuffer;
pub use types::{Event, Incoming, Request, Response};
pub use wire_format::{
    encode_message, find_header_end, parse_content_length, CONTENT_LENGTH, CRLF,
    DEFAULT_MAX_CONTENT_LENGTH, TWO_CRLF,
};
