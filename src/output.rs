//! Delivery of the readings a sweep returns.

use std::path::PathBuf;

use sensorwatch_types::Reading;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for reportable readings.
#[derive(Debug)]
pub enum Output {
    /// Print one line per reading to stdout.
    ///
    /// With `json` set each line is the serialized reading, otherwise its
    /// `Display` form prefixed by the capture timestamp.
    Stdout { json: bool },

    /// Append newline-delimited JSON to a file.
    File(PathBuf),

    /// Send newline-delimited JSON to a TCP server (best effort).
    Tcp(String),

    /// Send readings through a channel (best effort).
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(tokio::sync::mpsc::Sender<Reading>),
}

impl Output {
    /// Create a stdout output.
    pub fn stdout(json: bool) -> Self {
        Output::Stdout { json }
    }

    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sensorwatch::Output;
    ///
    /// let output = Output::file("alerts.jsonl");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sensorwatch::Output;
    ///
    /// let (output, mut rx) = Output::channel(64);
    ///
    /// // Later, receive readings
    /// // while let Some(reading) = rx.recv().await {
    /// //     println!("{}", reading);
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<Reading>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Emit a batch of readings to this output.
    pub async fn emit(&self, readings: &[Reading]) -> std::io::Result<()> {
        if readings.is_empty() {
            return Ok(());
        }

        match self {
            Output::Stdout { json } => {
                let mut out = String::new();
                for reading in readings {
                    if *json {
                        out.push_str(&serde_json::to_string(reading)?);
                    } else {
                        out.push_str(&format!("{} {}", reading.timestamp_ms, reading));
                    }
                    out.push('\n');
                }
                let mut stdout = tokio::io::stdout();
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
            Output::File(path) => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(json_lines(readings)?.as_bytes()).await?;
                file.flush().await?;
            }
            Output::Tcp(addr) => {
                use tokio::net::TcpStream;

                // Try to connect and send (best effort)
                match TcpStream::connect(addr).await {
                    Ok(mut stream) => {
                        send_best_effort(addr, &mut stream, json_lines(readings)?.as_bytes()).await;
                    }
                    Err(err) => {
                        tracing::warn!(addr = %addr, error = %err, "Dropping readings, TCP output unreachable");
                    }
                }
            }
            Output::Channel(tx) => {
                // Best effort send (don't block if channel is full)
                for reading in readings {
                    if tx.try_send(reading.clone()).is_err() {
                        tracing::warn!("Reading channel full or closed");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Write `payload` to a TCP sink, logging instead of failing. Returns
/// whether the whole payload was written.
async fn send_best_effort<W>(addr: &str, stream: &mut W, payload: &[u8]) -> bool
where
    W: AsyncWrite + Unpin,
{
    match stream.write_all(payload).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(addr = %addr, error = %err, bytes = payload.len(), "Dropping readings, TCP write failed");
            false
        }
    }
}

fn json_lines(readings: &[Reading]) -> serde_json::Result<String> {
    let mut out = String::new();
    for reading in readings {
        out.push_str(&serde_json::to_string(reading)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorwatch_types::ReadingValue;

    fn readings() -> Vec<Reading> {
        vec![
            Reading::new(1_000, "Temperature", ReadingValue::Float(72.5)).with_prefix("Rack1-"),
            Reading::new(1_000, "Door_Switch", ReadingValue::Integer(1)).with_condition("Open"),
        ]
    }

    #[tokio::test]
    async fn test_file_output_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");
        let output = Output::file(&path);

        output.emit(&readings()).await.unwrap();
        output.emit(&readings()[..1]).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: Reading = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.display_name(), "Rack1-Temperature");
        assert_eq!(first.value, ReadingValue::Float(72.5));
    }

    #[tokio::test]
    async fn test_channel_output() {
        let (output, mut rx) = Output::channel(4);
        output.emit(&readings()).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.key, "Temperature");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.condition.as_deref(), Some("Open"));
    }

    #[tokio::test]
    async fn test_channel_output_drops_when_full() {
        let (output, mut rx) = Output::channel(1);
        output.emit(&readings()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().key, "Temperature");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tcp_output_is_best_effort() {
        let output = Output::tcp("127.0.0.1:9");
        assert!(output.emit(&readings()).await.is_ok());
    }

    #[tokio::test]
    async fn test_tcp_write_failure_is_reported_not_raised() {
        let mut broken = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer reset"))
            .build();
        assert!(!send_best_effort("10.0.0.9:5000", &mut broken, b"{}\n").await);

        let mut healthy = tokio_test::io::Builder::new().write(b"{}\n").build();
        assert!(send_best_effort("10.0.0.9:5000", &mut healthy, b"{}\n").await);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");

        Output::file(&path).emit(&[]).await.unwrap();
        assert!(!path.exists());
    }
}
