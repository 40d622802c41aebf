//! Protocol session - sequence numbering, correlation and dispatch.
//!
//! A [`Session`] turns the framed payload stream into typed traffic:
//! outgoing requests get a session-unique sequence number and a one-shot
//! continuation in the pending table; incoming payloads are classified and
//! either resolve the matching pending request or fan out to event
//! subscribers.
//!
//! The session manages the runtime plumbing on `connect`:
//! 1. Spawn the writer task on the write half
//! 2. Spawn the read loop on the read half
//! 3. Feed every chunk through the reassembly buffer and dispatch
//!
//! # Example
//!
//! ```ignore
//! use dapwire::Session;
//!
//! let session = Session::new();
//! session.connect(reader, writer)?;
//!
//! let response = session.send("initialize", Some(json!({ "adapterID": "node" }))).await?;
//! let mut stopped = session.subscribe("stopped");
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{mpsc, oneshot};

use crate::error::{DapwireError, Result};
use crate::events::EventRegistry;
use crate::protocol::{
    encode_message, Event, Incoming, MessageBuffer, Request, Response, DEFAULT_MAX_CONTENT_LENGTH,
};
use crate::writer::{spawn_writer_task, OutboundMessage, WriterConfig, WriterHandle};

/// Default read buffer size for the read loop.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a session.
///
/// Threaded in at construction; no ambient process-wide state.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Size of the chunk buffer the read loop reads into.
    pub read_buffer_size: usize,
    /// Maximum accepted `Content-Length` for incoming messages.
    pub max_content_length: usize,
    /// Writer task configuration.
    pub writer: WriterConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            writer: WriterConfig::default(),
        }
    }
}

/// State shared between the session handle and its spawned tasks.
struct Shared {
    /// Next request sequence number. Starts at 1.
    seq: AtomicI64,
    /// Pending requests by sequence number. Each entry is consumed exactly
    /// once: by the matching response, or by `close`.
    pending: Mutex<HashMap<i64, oneshot::Sender<Response>>>,
    /// Event subscribers.
    events: EventRegistry,
    /// Writer handle, present while connected.
    writer: Mutex<Option<WriterHandle>>,
}

impl Shared {
    /// Classify one complete payload and route it.
    fn dispatch(&self, payload: &str) {
        let incoming = match Incoming::parse(payload) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable message");
                return;
            }
        };

        match incoming {
            Incoming::Event(event) => {
                tracing::debug!(event = %event.event, "event received");
                self.events.publish(&event);
            }
            Incoming::Response(response) => {
                let continuation = {
                    let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                    pending.remove(&response.request_seq)
                };
                match continuation {
                    // The receiver may be gone if the caller gave up; that
                    // is their business, not a protocol error.
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => {
                        tracing::debug!(
                            request_seq = response.request_seq,
                            "response without a pending request, dropping"
                        );
                    }
                }
            }
        }
    }

    /// Tear down on stream close: settle every in-flight request.
    ///
    /// Dropping the senders makes each caller's await resolve with
    /// `ConnectionClosed` instead of hanging forever.
    fn close(&self) {
        let drained = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "closing with requests in flight");
        }
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        *writer = None;
    }
}

/// A protocol session over a readable/writable byte-stream pair.
///
/// Created detached; [`connect`](Session::connect) binds it to a stream pair
/// and starts the read loop. Cheap to share behind the typed facade.
pub struct Session {
    shared: Arc<Shared>,
    config: SessionConfig,
}

impl Session {
    /// Create a new, unconnected session with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a new, unconnected session with the given configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                seq: AtomicI64::new(1),
                pending: Mutex::new(HashMap::new()),
                events: EventRegistry::new(),
                writer: Mutex::new(None),
            }),
            config,
        }
    }

    /// Bind the session to a stream pair and start processing.
    ///
    /// All subsequent sends write to `writer`; everything read from `reader`
    /// flows through the reassembly buffer and is dispatched in arrival
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`DapwireError::AlreadyConnected`] if a stream pair is
    /// already bound.
    pub fn connect<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        {
            let mut slot = self.shared.writer.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return Err(DapwireError::AlreadyConnected);
            }
            let (handle, _task) = spawn_writer_task(writer, self.config.writer.clone());
            *slot = Some(handle);
        }

        let shared = self.shared.clone();
        let read_buffer_size = self.config.read_buffer_size;
        let max_content_length = self.config.max_content_length;
        tokio::spawn(async move {
            if let Err(e) =
                Self::read_loop(reader, &shared, read_buffer_size, max_content_length).await
            {
                tracing::error!(error = %e, "read loop error");
            }
            shared.close();
        });

        Ok(())
    }

    /// Main read loop - reads chunks, reassembles and dispatches payloads.
    async fn read_loop<R: AsyncRead + Unpin>(
        mut reader: R,
        shared: &Shared,
        read_buffer_size: usize,
        max_content_length: usize,
    ) -> Result<()> {
        let mut messages = MessageBuffer::with_max_content_length(max_content_length);
        let mut buf = vec![0u8; read_buffer_size];

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => return Ok(()), // stream closed
                Ok(n) => n,
                Err(e) => return Err(DapwireError::Io(e)),
            };

            for payload in messages.push(&buf[..n]) {
                shared.dispatch(&payload);
            }
        }
    }

    /// Send a request and await its response.
    ///
    /// Allocates the next sequence number, registers a one-shot continuation
    /// and writes the framed request. Resolves once the matching response
    /// arrives; requests pipeline freely, and out-of-order responses are
    /// matched by sequence number.
    ///
    /// # Errors
    ///
    /// - [`DapwireError::NotConnected`] when called before `connect`
    /// - [`DapwireError::Peer`] when the adapter reports `success: false`;
    ///   the error displays the adapter's message text
    /// - [`DapwireError::ConnectionClosed`] when the stream closes before
    ///   the response arrives
    pub async fn send(&self, command: &str, arguments: Option<Value>) -> Result<Response> {
        let writer = {
            let slot = self.shared.writer.lock().unwrap_or_else(|e| e.into_inner());
            slot.clone().ok_or(DapwireError::NotConnected)?
        };

        let seq = self.shared.seq.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(seq, command, arguments);
        let payload = request.to_json()?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.insert(seq, tx);
        }

        if let Err(e) = writer.send(OutboundMessage::new(encode_message(&payload))).await {
            // The request never hit the wire; withdraw its pending entry.
            let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&seq);
            return Err(e);
        }

        let response = rx.await.map_err(|_| DapwireError::ConnectionClosed)?;

        if response.success {
            Ok(response)
        } else {
            let message = response
                .message
                .unwrap_or_else(|| format!("request '{}' failed", command));
            Err(DapwireError::Peer {
                command: command.to_string(),
                message,
            })
        }
    }

    /// Subscribe to events of the given name.
    ///
    /// Multiple subscribers per name are allowed; each receives every
    /// matching event published after its subscription, in arrival order.
    pub fn subscribe(&self, event: &str) -> mpsc::UnboundedReceiver<Event> {
        self.shared.events.subscribe(event)
    }

    /// Whether the session currently has a stream pair bound.
    pub fn is_connected(&self) -> bool {
        self.shared
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
