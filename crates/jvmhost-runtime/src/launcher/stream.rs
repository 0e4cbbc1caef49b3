//! Pipe readers for worker output.
//!
//! Runtimes and native libraries loaded by the worker can emit non-UTF-8
//! bytes. `BufReader::lines()` would end the reader on the first invalid
//! sequence, so lines are read as bytes and decoded lossily.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use super::output::{OutputStream, WorkerOutput};

/// Forward every line of `stream` into `output` until EOF.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    kind: OutputStream,
    output: Arc<WorkerOutput>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf);
                    debug!(pid = %pid, stream = kind.as_str(), "{line}");
                    output.record(kind, &line);
                }
                Err(e) => {
                    debug!(pid = %pid, stream = kind.as_str(), error = %e, "Output reader exiting on read error");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::output::LaunchLog;

    #[tokio::test]
    async fn test_invalid_utf8_does_not_stop_reader() {
        let output = Arc::new(WorkerOutput::new(10, LaunchLog::disabled()));
        let bytes: &[u8] = b"first\r\nbad \xff byte\nlast";

        spawn_stream_reader(bytes, 1, OutputStream::Stderr, output.clone())
            .await
            .unwrap();

        assert_eq!(
            output.tail(),
            vec![
                "[stderr] first",
                "[stderr] bad \u{fffd} byte",
                "[stderr] last"
            ]
        );
    }
}
