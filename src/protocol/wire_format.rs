//! Wire format encoding and decoding.
//!
//! Each message travels as an ASCII header block followed by a UTF-8 payload:
//!
//! ```text
//! Content-Length: <payload byte length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! Header lines are `Key: value` pairs separated by CRLF; the block ends at
//! the first CRLFCRLF. `Content-Length` is the one mandatory header and
//! counts payload **bytes**, not characters. There is no framing around the
//! header block itself - it is scanned for its terminator.

/// Line separator inside the header block.
pub const CRLF: &[u8] = b"\r\n";

/// Header block terminator (blank line).
pub const TWO_CRLF: &[u8] = b"\r\n\r\n";

/// The mandatory length header.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Default maximum accepted content length (1 GiB).
///
/// A header announcing more than this is treated as a framing error, not an
/// allocation request.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1_073_741_824;

/// Encode a payload into a complete framed message.
///
/// The length header counts the UTF-8 byte length of the payload, which for
/// a Rust `&str` is `payload.len()`.
///
/// # Example
///
/// ```
/// use dapwire::protocol::encode_message;
///
/// let bytes = encode_message("{}");
/// assert_eq!(bytes, b"Content-Length: 2\r\n\r\n{}");
/// ```
pub fn encode_message(payload: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32 + payload.len());
    buf.extend_from_slice(format!("{}: {}", CONTENT_LENGTH, payload.len()).as_bytes());
    buf.extend_from_slice(TWO_CRLF);
    buf.extend_from_slice(payload.as_bytes());
    buf
}

/// Find the end of the header block in `buf`.
///
/// Returns the index of the first byte of the CRLFCRLF terminator, or `None`
/// if the terminator has not arrived yet.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(TWO_CRLF.len())
        .position(|window| window == TWO_CRLF)
}

/// Parse a header block (the bytes before the CRLFCRLF terminator) and
/// extract the `Content-Length` value.
///
/// Lines are split on `:` followed by any run of spaces, matching what
/// adapters emit in practice. Returns `None` when the header is absent or
/// its value does not parse as an integer - both are framing errors the
/// caller reports and survives.
pub fn parse_content_length(header: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(header);
    for line in text.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key == CONTENT_LENGTH {
            return value.trim_start_matches(' ').parse().ok();
        }
    }
    None
}
