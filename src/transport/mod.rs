//! Transport module - stream-pair helpers.
//!
//! The session core is generic over any `AsyncRead`/`AsyncWrite` pair; this
//! module provides the two pairings debug adapters are actually reached by:
//! - a TCP socket (adapter started with `--server=<port>`)
//! - the stdin/stdout of a spawned adapter process

mod stream;

pub use stream::{child_stdio, connect_tcp};
