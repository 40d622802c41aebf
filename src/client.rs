//! Typed facade over a protocol session.
//!
//! [`DebugClient`] exposes the fixed catalog of debug-adapter operations as
//! named methods over the generic [`Session::send`], unwrapping the response
//! body on success, plus [`wait_for_event`](DebugClient::wait_for_event)
//! for timeout-bounded waiting on a named event.
//!
//! Command payload shapes are the adapter's business; arguments travel as
//! `serde_json::Value` objects and bodies come back the same way.
//!
//! # Example
//!
//! ```ignore
//! use dapwire::{DebugClient, Session};
//! use serde_json::json;
//!
//! let session = Session::new();
//! session.connect(reader, writer)?;
//! let client = DebugClient::new(session);
//!
//! client.initialize(Some(json!({ "adapterID": "node" }))).await?;
//! client.wait_for_event("initialized").await?;
//! client.configuration_done(None).await?;
//! client.launch(json!({ "program": "app.js" })).await?;
//! ```

use std::time::Duration;

use serde_json::Value;

use crate::error::{DapwireError, Result};
use crate::protocol::Event;
use crate::session::Session;

/// Default timeout for [`DebugClient::wait_for_event`].
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for a [`DebugClient`].
#[derive(Debug, Clone)]
pub struct DebugClientOptions {
    /// Timeout used by `wait_for_event` when none is given explicitly.
    pub default_timeout: Duration,
}

impl Default for DebugClientOptions {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }
}

/// Named debug-adapter operations over a [`Session`].
pub struct DebugClient {
    session: Session,
    options: DebugClientOptions,
}

impl DebugClient {
    /// Create a client over the given session with default options.
    pub fn new(session: Session) -> Self {
        Self::with_options(session, DebugClientOptions::default())
    }

    /// Create a client with explicit options.
    pub fn with_options(session: Session, options: DebugClientOptions) -> Self {
        Self { session, options }
    }

    /// Access the underlying session, e.g. to subscribe to events.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send an arbitrary command and return the response body.
    ///
    /// This is the pass-through every catalog method funnels into; it is
    /// public so adapter-specific commands outside the catalog can use the
    /// same path.
    pub async fn send_custom(&self, command: &str, arguments: Option<Value>) -> Result<Value> {
        let response = self.session.send(command, arguments).await?;
        Ok(response.body.unwrap_or(Value::Null))
    }

    async fn request(&self, command: &str, arguments: Value) -> Result<Value> {
        self.send_custom(command, Some(arguments)).await
    }

    /// Send an `initialize` request.
    pub async fn initialize(&self, arguments: Option<Value>) -> Result<Value> {
        self.send_custom("initialize", arguments).await
    }

    /// Send a `configurationDone` request.
    pub async fn configuration_done(&self, arguments: Option<Value>) -> Result<Value> {
        self.send_custom("configurationDone", arguments).await
    }

    /// Send a `launch` request.
    pub async fn launch(&self, arguments: Value) -> Result<Value> {
        self.request("launch", arguments).await
    }

    /// Send an `attach` request.
    pub async fn attach(&self, arguments: Value) -> Result<Value> {
        self.request("attach", arguments).await
    }

    /// Send a `restart` request.
    pub async fn restart(&self, arguments: Value) -> Result<Value> {
        self.request("restart", arguments).await
    }

    /// Send a `terminate` request.
    pub async fn terminate(&self, arguments: Option<Value>) -> Result<Value> {
        self.send_custom("terminate", arguments).await
    }

    /// Send a `disconnect` request.
    pub async fn disconnect(&self, arguments: Option<Value>) -> Result<Value> {
        self.send_custom("disconnect", arguments).await
    }

    /// Send a `setBreakpoints` request.
    pub async fn set_breakpoints(&self, arguments: Value) -> Result<Value> {
        self.request("setBreakpoints", arguments).await
    }

    /// Send a `setFunctionBreakpoints` request.
    pub async fn set_function_breakpoints(&self, arguments: Value) -> Result<Value> {
        self.request("setFunctionBreakpoints", arguments).await
    }

    /// Send a `setExceptionBreakpoints` request.
    pub async fn set_exception_breakpoints(&self, arguments: Value) -> Result<Value> {
        self.request("setExceptionBreakpoints", arguments).await
    }

    /// Send a `dataBreakpointInfo` request.
    pub async fn data_breakpoint_info(&self, arguments: Value) -> Result<Value> {
        self.request("dataBreakpointInfo", arguments).await
    }

    /// Send a `setDataBreakpoints` request.
    pub async fn set_data_breakpoints(&self, arguments: Value) -> Result<Value> {
        self.request("setDataBreakpoints", arguments).await
    }

    /// Send a `continue` request.
    pub async fn continue_(&self, arguments: Value) -> Result<Value> {
        self.request("continue", arguments).await
    }

    /// Send a `next` request.
    pub async fn next(&self, arguments: Value) -> Result<Value> {
        self.request("next", arguments).await
    }

    /// Send a `stepIn` request.
    pub async fn step_in(&self, arguments: Value) -> Result<Value> {
        self.request("stepIn", arguments).await
    }

    /// Send a `stepOut` request.
    pub async fn step_out(&self, arguments: Value) -> Result<Value> {
        self.request("stepOut", arguments).await
    }

    /// Send a `stepBack` request.
    pub async fn step_back(&self, arguments: Value) -> Result<Value> {
        self.request("stepBack", arguments).await
    }

    /// Send a `reverseContinue` request.
    pub async fn reverse_continue(&self, arguments: Value) -> Result<Value> {
        self.request("reverseContinue", arguments).await
    }

    /// Send a `restartFrame` request.
    pub async fn restart_frame(&self, arguments: Value) -> Result<Value> {
        self.request("restartFrame", arguments).await
    }

    /// Send a `goto` request.
    pub async fn goto(&self, arguments: Value) -> Result<Value> {
        self.request("goto", arguments).await
    }

    /// Send a `pause` request.
    pub async fn pause(&self, arguments: Value) -> Result<Value> {
        self.request("pause", arguments).await
    }

    /// Send a `stackTrace` request.
    pub async fn stack_trace(&self, arguments: Value) -> Result<Value> {
        self.request("stackTrace", arguments).await
    }

    /// Send a `scopes` request.
    pub async fn scopes(&self, arguments: Value) -> Result<Value> {
        self.request("scopes", arguments).await
    }

    /// Send a `variables` request.
    pub async fn variables(&self, arguments: Value) -> Result<Value> {
        self.request("variables", arguments).await
    }

    /// Send a `setVariable` request.
    pub async fn set_variable(&self, arguments: Value) -> Result<Value> {
        self.request("setVariable", arguments).await
    }

    /// Send a `source` request.
    pub async fn source(&self, arguments: Value) -> Result<Value> {
        self.request("source", arguments).await
    }

    /// Send a `threads` request.
    pub async fn threads(&self) -> Result<Value> {
        self.send_custom("threads", None).await
    }

    /// Send a `modules` request.
    pub async fn modules(&self, arguments: Value) -> Result<Value> {
        self.request("modules", arguments).await
    }

    /// Send an `evaluate` request.
    pub async fn evaluate(&self, arguments: Value) -> Result<Value> {
        self.request("evaluate", arguments).await
    }

    /// Send a `stepInTargets` request.
    pub async fn step_in_targets(&self, arguments: Value) -> Result<Value> {
        self.request("stepInTargets", arguments).await
    }

    /// Send a `gotoTargets` request.
    pub async fn goto_targets(&self, arguments: Value) -> Result<Value> {
        self.request("gotoTargets", arguments).await
    }

    /// Send a `completions` request.
    pub async fn completions(&self, arguments: Value) -> Result<Value> {
        self.request("completions", arguments).await
    }

    /// Send an `exceptionInfo` request.
    pub async fn exception_info(&self, arguments: Value) -> Result<Value> {
        self.request("exceptionInfo", arguments).await
    }

    /// Wait for the first event of the given name, with the default timeout.
    ///
    /// See [`wait_for_event_timeout`](DebugClient::wait_for_event_timeout).
    pub async fn wait_for_event(&self, event: &str) -> Result<Event> {
        self.wait_for_event_timeout(event, self.options.default_timeout)
            .await
    }

    /// Wait for the first event of the given name, failing after `timeout`.
    ///
    /// Subscribes once and races the subscription against a timer. Whichever
    /// fires first wins; the subscription is torn down on either outcome, so
    /// an event arriving after the timeout is delivered to a closed channel
    /// and discarded - it neither resolves this call nor errors.
    pub async fn wait_for_event_timeout(&self, event: &str, timeout: Duration) -> Result<Event> {
        let mut rx = self.session.subscribe(event);
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(received)) => Ok(received),
            Ok(None) => Err(DapwireError::ConnectionClosed),
            Err(_) => Err(DapwireError::EventTimeout {
                event: event.to_string(),
                timeout,
            }),
        }
    }
}
