//! Stream-pair constructors for reaching a debug adapter.
//!
//! Neither helper owns the adapter's lifecycle; they only hand back the
//! readable/writable pair [`Session::connect`](crate::Session::connect)
//! binds to.
//!
//! # Example
//!
//! ```ignore
//! use dapwire::transport::connect_tcp;
//!
//! let (reader, writer) = connect_tcp("127.0.0.1:4711").await?;
//! session.connect(reader, writer)?;
//! ```

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::process::{Child, ChildStdin, ChildStdout};

use crate::error::{DapwireError, Result};

/// Connect to an adapter listening on a TCP address.
///
/// Typical for adapters launched with a `--server=<port>` flag.
pub async fn connect_tcp<A: ToSocketAddrs>(addr: A) -> Result<(OwnedReadHalf, OwnedWriteHalf)> {
    let stream = TcpStream::connect(addr).await?;
    Ok(stream.into_split())
}

/// Take the stdio pair of a spawned adapter process.
///
/// The child must have been spawned with `Stdio::piped()` for both stdin and
/// stdout; anything else is a caller mistake and fails fast. The child's
/// stderr is untouched - adapters log there.
pub fn child_stdio(child: &mut Child) -> Result<(ChildStdout, ChildStdin)> {
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| DapwireError::Protocol("adapter child has no piped stdin".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| DapwireError::Protocol("adapter child has no piped stdout".to_string()))?;
    Ok((stdout, stdin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_tcp_pairs_with_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&buf).await.unwrap();
        });

        let (mut reader, mut writer) = connect_tcp(addr).await.unwrap();
        writer.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        accept.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_tcp_refused() {
        // Port 1 is essentially never listening.
        let result = connect_tcp("127.0.0.1:1").await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_stdio_roundtrip() {
        use std::process::Stdio;
        use tokio::process::Command;

        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();

        let (mut stdout, mut stdin) = child_stdio(&mut child).unwrap();

        stdin.write_all(b"hello\n").await.unwrap();
        drop(stdin);

        let mut output = String::new();
        stdout.read_to_string(&mut output).await.unwrap();
        assert_eq!(output, "hello\n");

        child.wait().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_stdio_requires_piped_handles() {
        use std::process::Stdio;
        use tokio::process::Command;

        let mut child = Command::new("true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        assert!(child_stdio(&mut child).is_err());
        child.wait().await.unwrap();
    }
}
