use crate::error::{LineError, Result};
use crate::store::PortFuture;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_CONVEYOR_COOLDOWN: Duration = Duration::from_millis(5_000);
pub const DEFAULT_CONVEYOR_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Fires one conveyor index and returns the actuator's acknowledgement.
pub trait ConveyorActuator: Send + Sync {
    fn index(&self) -> PortFuture<'_, String>;
}

/// Indexer driven by a single HTTP GET to a motion-controller macro endpoint.
pub struct HttpConveyor {
    http: reqwest::Client,
    url: String,
}

impl HttpConveyor {
    /// # Errors
    /// `LineError::ConfigError` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pickline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LineError::ConfigError(format!("Failed to build conveyor client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConveyorActuator for HttpConveyor {
    fn index(&self) -> PortFuture<'_, String> {
        Box::pin(async move {
            info!("Sending conveyor index request to {}", self.url);
            let response = self
                .http
                .get(&self.url)
                .send()
                .await
                .map_err(|e| LineError::ConveyorError(format!("Request failed: {e}")))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| LineError::ConveyorError(format!("Failed to read reply: {e}")))?;

            if status.is_success() {
                Ok(body)
            } else {
                Err(LineError::ConveyorError(format!(
                    "Conveyor answered {status}: {body}"
                )))
            }
        })
    }
}

/// Stand-in used when no conveyor endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledConveyor;

impl ConveyorActuator for DisabledConveyor {
    fn index(&self) -> PortFuture<'_, String> {
        Box::pin(async {
            warn!("No conveyor configured; skipping index");
            Ok(String::new())
        })
    }
}

/// Cooldown window around an external conveyor index.
pub struct ConveyorGate {
    actuator: Box<dyn ConveyorActuator>,
    cooldown: Duration,
    last_index: Option<Instant>,
}

impl ConveyorGate {
    #[must_use]
    pub fn new(actuator: Box<dyn ConveyorActuator>, cooldown: Duration) -> Self {
        Self {
            actuator,
            cooldown,
            last_index: None,
        }
    }

    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// The cooldown starts when the request is attempted, so a failed
    /// request still holds the gate closed for one run duration.
    ///
    /// # Errors
    /// `LineError::ConveyorError` when the actuator could not be reached.
    pub async fn trigger_index(&mut self) -> Result<String> {
        self.last_index = Some(Instant::now());
        let reply = self.actuator.index().await?;
        info!("Conveyor indexed: {}", reply.trim());
        Ok(reply)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_ready_at(Instant::now())
    }

    #[must_use]
    pub fn is_ready_at(&self, now: Instant) -> bool {
        self.last_index
            .is_none_or(|last| now.saturating_duration_since(last) >= self.cooldown)
    }
}
