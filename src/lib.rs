//! # dapwire
//!
//! Client core for the Debug Adapter Protocol transport: drives an external
//! debug-adapter process over a byte stream (pipe or socket) speaking
//! `Content-Length`-framed JSON messages.
//!
//! ## Architecture
//!
//! - **Framing** ([`protocol`]): reassembles complete payloads from
//!   arbitrary stream chunks and frames outgoing ones, bit-exact with the
//!   `Content-Length` + CRLFCRLF wire format.
//! - **Session** ([`session`]): assigns sequence numbers, correlates
//!   responses to pending requests, fans events out to subscribers.
//! - **Client** ([`client`]): the fixed catalog of named operations
//!   (initialize, launch, setBreakpoints, ...) plus `wait_for_event`.
//!
//! ## Example
//!
//! ```ignore
//! use dapwire::{transport, DebugClient, Session};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> dapwire::Result<()> {
//!     let (reader, writer) = transport::connect_tcp("127.0.0.1:4711").await?;
//!
//!     let session = Session::new();
//!     session.connect(reader, writer)?;
//!     let client = DebugClient::new(session);
//!
//!     client.initialize(Some(json!({ "adapterID": "node" }))).await?;
//!     client.wait_for_event("initialized").await?;
//!     client.configuration_done(None).await?;
//!     client.launch(json!({ "program": "app.js" })).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod writer;

pub use client::{DebugClient, DebugClientOptions, DEFAULT_EVENT_TIMEOUT};
pub use error::{DapwireError, Result};
pub use protocol::{Event, Request, Response};
pub use session::{Session, SessionConfig};
