//! Retry controller
//!
//! The RetryController is responsible for:
//! - Invoking the Mailer up to `retry_count` times
//! - Stopping at the first successful attempt
//! - Sleeping with linear backoff between failed attempts
//! - Reporting each attempt to the operator and over the event channel
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   send()   ┌─────────────┐
//! │ RetryCtrl    │──────────▶│   Mailer    │  (one attempt per call)
//! └──────────────┘            └─────────────┘
//!        │
//!        ├── EngineEvent ──▶ mpsc channel (monitoring)
//!        └── SendReport  ──▶ caller
//! ```
//!
//! ## Backoff
//!
//! After failed attempt `n` (1-based) the controller waits `n * 2` backoff
//! units before attempt `n + 1`. There is no wait after the last attempt.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::message::Envelope;
use crate::outcome::{DeliveryFailure, FailureKind};
use crate::traits::Mailer;

/// Events emitted by the RetryController
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A delivery attempt is starting
    AttemptStarted {
        attempt: u32,
        max_attempts: u32,
    },

    /// A delivery attempt failed
    AttemptFailed {
        attempt: u32,
        kind: FailureKind,
        message: String,
    },

    /// The controller is about to wait before the next attempt
    RetryScheduled {
        next_attempt: u32,
        delay: Duration,
    },

    /// The message was accepted
    Delivered {
        attempt: u32,
    },

    /// All attempts failed
    GaveUp {
        attempts: u32,
    },
}

/// Retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of delivery attempts
    pub max_attempts: u32,

    /// Backoff unit; the wait after failed attempt `n` is `n * 2` units
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy for the given settings (one second backoff unit)
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.retry_count,
            ..Self::default()
        }
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt.saturating_mul(2)
    }

    /// Upper bound on the events one send emits
    ///
    /// Each attempt emits at most three events (started, failed, retry
    /// scheduled; the last attempt schedules nothing) and the send ends with
    /// exactly one `Delivered` or `GaveUp`.
    pub fn max_events(&self) -> usize {
        (self.max_attempts as usize).saturating_mul(3).max(1)
    }
}

/// Overall result of a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Number of Mailer calls made
    pub attempts: u32,

    /// Failure of the last attempt, `None` when the message was delivered
    pub last_failure: Option<DeliveryFailure>,
}

impl SendReport {
    /// Whether an attempt succeeded
    pub fn is_success(&self) -> bool {
        self.last_failure.is_none() && self.attempts > 0
    }
}

/// Bounded retry loop around a [`Mailer`]
///
/// ## Lifecycle
///
/// 1. Create with [`RetryController::new()`]
/// 2. Call [`RetryController::send()`] once per run
/// 3. Drain the event receiver if needed, then drop both
pub struct RetryController {
    /// Mailer performing single attempts
    mailer: Box<dyn Mailer>,

    /// Attempt budget and backoff
    policy: RetryPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl RetryController {
    /// Create a new controller
    ///
    /// The event channel is sized by [`RetryPolicy::max_events`], so a
    /// receiver drained after `send` returns sees every event.
    ///
    /// # Returns
    ///
    /// A tuple of (controller, event_receiver) where event_receiver yields engine events
    pub fn new(
        mailer: Box<dyn Mailer>,
        policy: RetryPolicy,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(policy.max_events());

        let controller = Self {
            mailer,
            policy,
            event_tx: tx,
        };

        (controller, rx)
    }

    /// Deliver `envelope`, retrying failed attempts
    ///
    /// The failure of the last attempt is returned unchanged in the report.
    pub async fn send(&self, settings: &Settings, envelope: &Envelope) -> SendReport {
        let max_attempts = self.policy.max_attempts;
        if max_attempts == 0 {
            warn!("retry_count is 0, no delivery attempt will be made");
        }

        let mut last_failure = None;
        for attempt in 1..=max_attempts {
            info!("Send attempt {}/{}", attempt, max_attempts);
            self.emit_event(EngineEvent::AttemptStarted {
                attempt,
                max_attempts,
            });

            match self.mailer.send(settings, envelope).await {
                Ok(()) => {
                    info!("Message delivered via {}", self.mailer.mailer_name());
                    self.emit_event(EngineEvent::Delivered { attempt });
                    return SendReport {
                        attempts: attempt,
                        last_failure: None,
                    };
                }
                Err(failure) => {
                    report_failure(&failure);
                    self.emit_event(EngineEvent::AttemptFailed {
                        attempt,
                        kind: failure.kind,
                        message: failure.message.clone(),
                    });
                    last_failure = Some(failure);

                    // Wait before retry (unless this was the last attempt)
                    if attempt < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        info!("Waiting {}s before retrying", delay.as_secs());
                        self.emit_event(EngineEvent::RetryScheduled {
                            next_attempt: attempt + 1,
                            delay,
                        });
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        self.emit_event(EngineEvent::GaveUp {
            attempts: max_attempts,
        });
        SendReport {
            attempts: max_attempts,
            last_failure,
        }
    }

    /// Emit an engine event, dropping it if the receiver is gone
    fn emit_event(&self, event: EngineEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Engine event dropped: {}", e);
        }
    }
}

fn report_failure(failure: &DeliveryFailure) {
    warn!("Attempt failed: {}", failure.kind);
    for hint in failure.kind.hints() {
        info!("Tip: {}", hint);
    }
    warn!("Details: {}", failure.message);
}
