//! Integration tests for dapwire.
//!
//! These tests drive a full session against a scripted in-memory adapter on
//! the far side of a `tokio::io::duplex` pair.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use dapwire::protocol::{encode_message, MessageBuffer};
use dapwire::{DapwireError, DebugClient, Session};

/// Spawn a scripted adapter task on the far side of a connected session.
///
/// For every request the adapter calls `script` with the parsed request and
/// writes back whatever payloads it returns, in order. Events are just
/// payloads the script emits alongside (or instead of) a response.
fn scripted_session<F>(mut script: F) -> Session
where
    F: FnMut(&Value) -> Vec<String> + Send + 'static,
{
    let session = Session::new();
    let (ours, theirs) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(ours);
    session.connect(reader, writer).unwrap();

    let (mut their_reader, mut their_writer) = tokio::io::split(theirs);
    tokio::spawn(async move {
        let mut messages = MessageBuffer::new();
        let mut buf = vec![0u8; 4096];
        loop {
            let n = match their_reader.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            for payload in messages.push(&buf[..n]) {
                let request: Value = serde_json::from_str(&payload).unwrap();
                for outgoing in script(&request) {
                    their_writer
                        .write_all(&encode_message(&outgoing))
                        .await
                        .unwrap();
                }
            }
        }
    });

    session
}

fn ok_response(request: &Value, body: Value) -> String {
    json!({
        "seq": 0,
        "type": "response",
        "request_seq": request["seq"],
        "success": true,
        "command": request["command"],
        "body": body,
    })
    .to_string()
}

fn event(name: &str, body: Value) -> String {
    json!({
        "seq": 0,
        "type": "event",
        "event": name,
        "body": body,
    })
    .to_string()
}

#[tokio::test]
async fn test_startup_sequence() {
    let session = scripted_session(|request| {
        match request["command"].as_str().unwrap() {
            // The adapter announces `initialized` after answering
            // `initialize`, the way real adapters do.
            "initialize" => vec![
                ok_response(request, json!({ "supportsConfigurationDoneRequest": true })),
                event("initialized", Value::Null),
            ],
            _ => vec![ok_response(request, Value::Null)],
        }
    });
    let client = DebugClient::new(session);

    let capabilities = client
        .initialize(Some(json!({ "adapterID": "mock" })))
        .await
        .unwrap();
    assert_eq!(capabilities["supportsConfigurationDoneRequest"], true);

    client.wait_for_event("initialized").await.unwrap();
    client.configuration_done(None).await.unwrap();
    client
        .launch(json!({ "program": "main.js" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_reverse() {
    // Batch up all requests, then answer them newest-first in one write.
    let session = scripted_session({
        let mut batch: Vec<Value> = Vec::new();
        move |request| {
            batch.push(request.clone());
            if batch.len() < 4 {
                return Vec::new();
            }
            batch
                .drain(..)
                .rev()
                .map(|request| {
                    let seq = request["seq"].as_i64().unwrap();
                    ok_response(&request, json!({ "answered": seq }))
                })
                .collect()
        }
    });

    let (a, b, c, d) = tokio::join!(
        session.send("stackTrace", Some(json!({ "threadId": 1 }))),
        session.send("scopes", Some(json!({ "frameId": 1 }))),
        session.send("variables", Some(json!({ "variablesReference": 1 }))),
        session.send("threads", None),
    );

    // Every caller got the response to its own request, never a swap.
    assert_eq!(a.unwrap().body.unwrap()["answered"], 1);
    assert_eq!(b.unwrap().body.unwrap()["answered"], 2);
    assert_eq!(c.unwrap().body.unwrap()["answered"], 3);
    assert_eq!(d.unwrap().body.unwrap()["answered"], 4);
}

#[tokio::test]
async fn test_response_split_across_tiny_chunks() {
    let session = Session::new();
    let (ours, theirs) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(ours);
    session.connect(reader, writer).unwrap();

    let (mut their_reader, mut their_writer) = tokio::io::split(theirs);
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        let _ = their_reader.read(&mut buf).await;

        let response = json!({
            "seq": 1,
            "type": "response",
            "request_seq": 1,
            "success": true,
            "command": "evaluate",
            "body": { "result": "42" },
        })
        .to_string();

        // Dribble the framed response out three bytes at a time.
        for chunk in encode_message(&response).chunks(3) {
            their_writer.write_all(chunk).await.unwrap();
            their_writer.flush().await.unwrap();
        }
    });

    let response = session
        .send("evaluate", Some(json!({ "expression": "6*7" })))
        .await
        .unwrap();
    assert_eq!(response.body.unwrap()["result"], "42");
}

#[tokio::test]
async fn test_event_fan_out_across_layers() {
    let session = scripted_session(|request| {
        vec![
            event("stopped", json!({ "reason": "breakpoint", "threadId": 1 })),
            ok_response(request, Value::Null),
        ]
    });

    let mut first = session.subscribe("stopped");
    let mut second = session.subscribe("stopped");
    let client = DebugClient::new(session);

    let waited = {
        let wait = client.wait_for_event("stopped");
        let send = client.continue_(json!({ "threadId": 1 }));
        let (waited, sent) = tokio::join!(wait, send);
        sent.unwrap();
        waited.unwrap()
    };

    assert_eq!(waited.body.as_ref().unwrap()["reason"], "breakpoint");
    assert_eq!(
        first.recv().await.unwrap().body.unwrap()["reason"],
        "breakpoint"
    );
    assert_eq!(
        second.recv().await.unwrap().body.unwrap()["reason"],
        "breakpoint"
    );
}

#[tokio::test]
async fn test_peer_failure_surfaces_through_facade() {
    let session = scripted_session(|request| {
        vec![json!({
            "seq": 0,
            "type": "response",
            "request_seq": request["seq"],
            "success": false,
            "command": request["command"],
            "message": "bad args",
        })
        .to_string()]
    });
    let client = DebugClient::new(session);

    let err = client
        .evaluate(json!({ "expression": "nonsense((" }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "bad args");
    assert!(matches!(err, DapwireError::Peer { .. }));
}

#[tokio::test]
async fn test_dangling_response_does_not_corrupt_later_traffic() {
    let session = scripted_session(|request| {
        vec![
            // A response to a request this session never issued.
            json!({
                "seq": 0,
                "type": "response",
                "request_seq": 99_999,
                "success": true,
                "command": "ghost",
            })
            .to_string(),
            ok_response(request, json!({ "fine": true })),
        ]
    });

    let response = session.send("threads", None).await.unwrap();
    assert_eq!(response.body.unwrap()["fine"], true);

    // And again: correlation state is intact after the noise.
    let response = session.send("threads", None).await.unwrap();
    assert_eq!(response.body.unwrap()["fine"], true);
}

#[tokio::test]
async fn test_wait_for_event_timeout_then_session_still_usable() {
    let session = scripted_session(|request| vec![ok_response(request, Value::Null)]);
    let client = DebugClient::new(session);

    let err = client
        .wait_for_event_timeout("stopped", Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, DapwireError::EventTimeout { .. }));

    // The timed-out wait tore its subscription down without harming the
    // session: requests still flow.
    client.pause(json!({ "threadId": 1 })).await.unwrap();
}
