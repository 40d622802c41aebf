//! Message buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for incremental buffer management. Chunk
//! boundaries carry no meaning: a message may span many chunks, and one
//! chunk may contain many messages or a fragment of one. The buffer is in
//! one of two states:
//! - no content length known: scanning for the CRLFCRLF header terminator
//! - content length known: waiting for that many payload bytes
//!
//! # Example
//!
//! ```
//! use dapwire::protocol::{encode_message, MessageBuffer};
//!
//! let mut buffer = MessageBuffer::new();
//! let payloads = buffer.push(&encode_message("{\"seq\":1}"));
//! assert_eq!(payloads, vec!["{\"seq\":1}".to_string()]);
//! ```

use bytes::BytesMut;

use super::wire_format::{
    find_header_end, parse_content_length, DEFAULT_MAX_CONTENT_LENGTH, TWO_CRLF,
};

/// Buffer for accumulating incoming bytes and extracting complete payloads.
///
/// All data is stored in a single `BytesMut`; header and payload bytes are
/// consumed with `split_to` as they are recognized. Framing errors (a header
/// block without a parseable `Content-Length`) are non-fatal: the block is
/// discarded with a warning and scanning resumes at the next terminator.
pub struct MessageBuffer {
    /// Accumulated bytes from stream reads.
    buffer: BytesMut,
    /// Payload length parsed from the last header block, if any.
    content_length: Option<usize>,
    /// Maximum accepted content length.
    max_content_length: usize,
}

impl MessageBuffer {
    /// Create a new message buffer with default settings.
    ///
    /// Default capacity: 64KB, max content length: 1 GiB.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            content_length: None,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }

    /// Create a new message buffer with a custom maximum content length.
    pub fn with_max_content_length(max_content_length: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            content_length: None,
            max_content_length,
        }
    }

    /// Push data into the buffer and extract all complete payloads.
    ///
    /// This is the main API for processing incoming stream data. Returns the
    /// complete payloads in arrival order (possibly none). Fragments are
    /// buffered internally for the next push. Zero-length payloads are
    /// consumed but not returned.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(data);

        let mut payloads = Vec::new();
        while let Some(payload) = self.try_extract_one() {
            // An empty message is valid framing but nothing to dispatch.
            if !payload.is_empty() {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Try to extract a single payload from the buffer.
    ///
    /// Returns `None` when more data is needed.
    fn try_extract_one(&mut self) -> Option<String> {
        loop {
            match self.content_length {
                Some(length) => {
                    if self.buffer.len() < length {
                        return None;
                    }
                    let payload = self.buffer.split_to(length);
                    self.content_length = None;
                    return Some(String::from_utf8_lossy(&payload).into_owned());
                }
                None => {
                    let idx = find_header_end(&self.buffer)?;
                    let header = self.buffer.split_to(idx);
                    let _ = self.buffer.split_to(TWO_CRLF.len());

                    match parse_content_length(&header) {
                        Some(length) if length <= self.max_content_length => {
                            self.content_length = Some(length);
                        }
                        Some(length) => {
                            tracing::warn!(
                                length,
                                max = self.max_content_length,
                                "content length exceeds maximum, discarding header"
                            );
                        }
                        None => {
                            tracing::warn!(
                                header = %String::from_utf8_lossy(&header),
                                "header block without a parseable Content-Length, discarding"
                            );
                        }
                    }
                    // Loop: either extract the payload or scan the next block.
                }
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state. Only done on stream close.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.content_length = None;
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}
