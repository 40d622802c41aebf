//! Adapter driver - end-to-end session example.
//!
//! Spawns a debug adapter, speaks the protocol over its stdio and walks the
//! standard startup sequence:
//! 1. `initialize`
//! 2. wait for the `initialized` event
//! 3. `configurationDone`
//! 4. `launch` the program
//! 5. react to `stopped` events until the session terminates
//!
//! # Usage
//!
//! ```text
//! cargo run --example driver -- <adapter-command> <program> [program-args...]
//! ```

use std::process::Stdio;

use serde_json::json;
use tokio::process::Command;

use dapwire::{transport, DebugClient, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let adapter = args
        .next()
        .ok_or("usage: driver <adapter-command> <program> [program-args...]")?;
    let program = args
        .next()
        .ok_or("usage: driver <adapter-command> <program> [program-args...]")?;
    let program_args: Vec<String> = args.collect();

    tracing::info!(%adapter, %program, "spawning debug adapter");
    let mut child = Command::new(&adapter)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;
    let (reader, writer) = transport::child_stdio(&mut child)?;

    let session = Session::new();
    session.connect(reader, writer)?;

    // React to stop signals out of band, the way a presentation layer would.
    let mut stopped = session.subscribe("stopped");
    tokio::spawn(async move {
        while let Some(event) = stopped.recv().await {
            let reason = event
                .body
                .as_ref()
                .and_then(|b| b.get("reason"))
                .and_then(|r| r.as_str())
                .unwrap_or("unknown");
            tracing::info!(%reason, "debuggee stopped");
        }
    });

    let client = DebugClient::new(session);

    client
        .initialize(Some(json!({
            "adapterID": "dapwire-driver",
            "linesStartAt1": true,
            "columnsStartAt1": true,
            "pathFormat": "path",
        })))
        .await?;
    client.wait_for_event("initialized").await?;
    client.configuration_done(None).await?;

    tracing::info!(%program, "launching");
    client
        .launch(json!({
            "program": program,
            "args": program_args,
        }))
        .await?;

    client.wait_for_event("terminated").await?;
    tracing::info!("session terminated");

    let status = child.wait().await?;
    tracing::info!(code = status.code(), "adapter exited");
    Ok(())
}
