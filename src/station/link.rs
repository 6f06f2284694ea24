#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::{LineError, Result};
use crate::store::PortFuture;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

pub const DEFAULT_ROBOT_ADDR: &str = "127.0.0.1:6000";
pub const DEFAULT_STATUS_SETTLE: Duration = Duration::from_millis(100);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const STATUS_REQUEST: &str = "status";
pub const STATUS_BUFFER_LEN: usize = 1024;

/// Persistent text session to one robot controller.
pub trait RobotLink: Send {
    /// Drops any live session and opens a new one.
    fn connect(&mut self) -> PortFuture<'_, ()>;

    fn is_connected(&self) -> bool;

    fn send_command<'a>(&'a mut self, token: &'a str) -> PortFuture<'a, ()>;

    /// Raw status text as read from the controller.
    fn read_status(&mut self) -> PortFuture<'_, String>;

    fn close(&mut self) -> PortFuture<'_, ()>;
}

/// TCP link using the controller's buffer-and-delay protocol.
///
/// Known weakness: replies carry no framing. `read_status` waits a fixed
/// settle delay and performs a single read of at most [`STATUS_BUFFER_LEN`]
/// bytes, so a reply split across segments, or one longer than the buffer,
/// is returned truncated and any remainder is read as the next reply.
pub struct TcpRobotLink {
    addr: String,
    connect_timeout: Duration,
    settle: Duration,
    stream: Option<TcpStream>,
}

impl TcpRobotLink {
    #[must_use]
    pub fn new(addr: impl Into<String>, connect_timeout: Duration, settle: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
            settle,
            stream: None,
        }
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn open(&mut self) -> Result<()> {
        self.stream = None;
        let connect = TcpStream::connect(&self.addr);
        let stream = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                LineError::LinkError(format!(
                    "Timed out connecting to robot at {}",
                    self.addr
                ))
            })?
            .map_err(|e| {
                LineError::LinkError(format!("Failed to connect to robot at {}: {e}", self.addr))
            })?;
        info!("Connected to robot at {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    async fn ensure_connected(&mut self) -> Result<&mut TcpStream> {
        if self.stream.is_none() {
            self.open().await?;
        }
        self.stream
            .as_mut()
            .ok_or_else(|| LineError::LinkError("robot session unavailable".to_string()))
    }

    async fn write_token(&mut self, token: &str) -> Result<()> {
        let stream = self.ensure_connected().await?;
        let frame = format!("{token}\r\n");
        let written = async {
            stream.write_all(frame.as_bytes()).await?;
            stream.flush().await
        }
        .await;
        written.map_err(|e| self.drop_session(&format!("Failed to send {token:?}: {e}")))
    }

    async fn read_reply(&mut self) -> Result<String> {
        tokio::time::sleep(self.settle).await;
        let stream = self.ensure_connected().await?;
        let mut buffer = [0_u8; STATUS_BUFFER_LEN];
        match stream.read(&mut buffer).await {
            Ok(0) => Err(self.drop_session("Robot closed the session")),
            Ok(read) => Ok(String::from_utf8_lossy(&buffer[..read]).into_owned()),
            Err(e) => Err(self.drop_session(&format!("Failed to read status: {e}"))),
        }
    }

    fn drop_session(&mut self, message: &str) -> LineError {
        warn!("Robot at {}: {}", self.addr, message);
        self.stream = None;
        LineError::LinkError(message.to_string())
    }
}

impl RobotLink for TcpRobotLink {
    fn connect(&mut self) -> PortFuture<'_, ()> {
        Box::pin(self.open())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send_command<'a>(&'a mut self, token: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            info!("Sending command: {}", token);
            self.write_token(token).await
        })
    }

    fn read_status(&mut self) -> PortFuture<'_, String> {
        Box::pin(async move {
            self.write_token(STATUS_REQUEST).await?;
            let reply = self.read_reply().await?;
            debug!("Robot status reply: {:?}", reply.trim_end_matches('\0'));
            Ok(reply)
        })
    }

    fn close(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut stream) = self.stream.take() {
                stream.shutdown().await?;
            }
            Ok(())
        })
    }
}
