//! Waiting for the laser to finish warmup.
//!
//! The waiter polls `SYST:STAT?` and classifies each reply with
//! [`Readiness::classify`]. A warming-up code sleeps and polls again, a fault
//! code ends the wait with [`Error::Fault`], and anything else is success.
//! An unrecognized code ends the wait with [`Error::UnrecognizedStatus`].
//!
//! A timeout or cancellation only takes effect between polls, so a status
//! exchange is never abandoned halfway and the line stays in sync.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use obis_core::error::{Error, Result};

use crate::commands::SessionControlQuery;
use crate::laser::ObisLaser;
use crate::status::{DeviceState, Readiness};

/// Delay between status polls while the laser warms up.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Options for [`ObisLaser::wait_until_ready_with`].
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Abort when this token is cancelled.
    pub cancel: Option<CancellationToken>,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        WaitOptions {
            timeout: None,
            cancel: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

async fn pause(duration: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                _ = tokio::time::sleep(duration) => Ok(()),
            }
        }
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}

impl ObisLaser {
    /// Block until the laser reports a ready state.
    ///
    /// Returns the ready state. Fails with [`Error::Fault`] as soon as a
    /// fault code is seen. There is no timeout; use
    /// [`wait_until_ready_with`](Self::wait_until_ready_with) for one.
    pub async fn wait_until_ready(&mut self) -> Result<DeviceState> {
        self.wait_until_ready_with(WaitOptions::default()).await
    }

    /// [`wait_until_ready`](Self::wait_until_ready) with a deadline,
    /// cancellation and poll interval.
    pub async fn wait_until_ready_with(&mut self, options: WaitOptions) -> Result<DeviceState> {
        let started = Instant::now();
        let deadline = options.timeout.map(|t| started + t);
        let mut polls: u32 = 0;

        loop {
            let raw = self.codec.read(SessionControlQuery::SystemStatus).await?;
            let state = DeviceState::decode(&raw)?;
            polls += 1;

            match Readiness::classify(&raw) {
                Readiness::Ready => {
                    info!(
                        %state,
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "laser ready"
                    );
                    return Ok(state);
                }
                Readiness::Fault => {
                    warn!(%state, code = %raw, "laser reported a fault while waiting");
                    return Err(Error::Fault { code: raw });
                }
                Readiness::WarmingUp => {
                    debug!(%state, polls, "warming up");
                }
            }

            let sleep_for = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::WaitTimeout(options.timeout.unwrap_or_default()));
                    }
                    options.poll_interval.min(deadline - now)
                }
                None => options.poll_interval,
            };
            pause(sleep_for, options.cancel.as_ref()).await?;
        }
    }
}
