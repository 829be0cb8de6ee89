//! Port abstraction for the link writer
//!
//! The writer only ever pushes whole batches of frames, so the port
//! exposes one operation: write a batch and flush it. A stalled port is
//! turned into a `TimedOut` error instead of blocking the writer task.

use async_trait::async_trait;
use std::io;
use std::time::Duration;

/// Batched write access to the actuator board
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write one encoded batch and flush it through to the device
    async fn write_batch(&mut self, frames: &[u8]) -> io::Result<()>;

    /// [`write_batch`](SerialPortIO::write_batch) bounded by `limit`
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::TimedOut` if the batch is not flushed in time,
    /// or the underlying write error.
    async fn write_batch_within(&mut self, frames: &[u8], limit: Duration) -> io::Result<()> {
        match tokio::time::timeout(limit, self.write_batch(frames)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write of {} bytes stalled for {:?}", frames.len(), limit),
            )),
        }
    }
}

/// `tokio_serial::SerialStream` as a [`SerialPortIO`]
pub struct TokioSerialPort {
    stream: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(stream: tokio_serial::SerialStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn write_batch(&mut self, frames: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(frames).await?;
        self.stream.flush().await
    }
}
