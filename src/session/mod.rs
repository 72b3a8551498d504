//! Order session state machine.
//!
//! [`OrderSession`] owns the UI-facing lifecycle of a single order:
//!
//! ```text
//! Idle ──begin_request──► Requesting ──start──► WaitingForSms ──► SmsReceived
//!  ▲                          │                    │   │
//!  │                          ▼                    │   └──timeout/failure──► Error
//!  └────────reset──────── Error ◄──cancel_failed───┤                          │
//!                                                  └──begin_cancel──► Requesting ──► Cancelled
//! ```
//!
//! It performs no I/O. While in `WaitingForSms` it owns two timers derived
//! from an injected [`Clock`]: a fixed-cadence status-check timer and a
//! countdown deadline. Callers drive it with [`OrderSession::tick`] and feed
//! back the result of each status check.

mod clock;

pub use clock::{Clock, ManualClock, TokioClock};

use crate::types::{Coins, FullNumber, OrderId, OrderStatus, SmsCode};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Message shown when the countdown expires.
pub const TIMEOUT_MESSAGE: &str = "OTP request timed out. Please cancel to try and get a refund.";

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Longest timer a session arms. Longer settings would overflow `Instant`.
const MAX_TIMER: Duration = Duration::from_secs(86400 * 365 * 30);

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    WaitingForSms,
    SmsReceived,
    Error,
    Cancelled,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::WaitingForSms => "waiting_for_sms",
            SessionState::SmsReceived => "sms_received",
            SessionState::Error => "error",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Errors for transitions the current state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("no order is attached to this session")]
    NoOrder,
}

/// The order a session is tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub id: OrderId,
    pub number: FullNumber,
    pub cost: Coins,
}

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Timers are not running.
    Inactive,
    /// Nothing is due for this long.
    Wait(Duration),
    /// Issue one status check now.
    Poll,
    /// The countdown expired; the session moved to `Error`.
    TimedOut,
}

/// Effect of a status check on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Still waiting.
    Pending,
    /// Code received; the session moved to `SmsReceived`.
    Received(SmsCode),
    /// Provider reported a failure status; the session moved to `Error`.
    Failed(OrderStatus),
    /// The session was no longer waiting, so the result was dropped.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Timers {
    next_check: Instant,
    deadline: Instant,
}

/// Explicit state machine for one order's lifecycle.
#[derive(Debug)]
pub struct OrderSession<C: Clock = TokioClock> {
    clock: C,
    poll_interval: Duration,
    timeout: Duration,
    state: SessionState,
    order: Option<OrderDetails>,
    sms_code: Option<SmsCode>,
    error_message: Option<String>,
    timers: Option<Timers>,
    polls: u32,
    consecutive_failures: u32,
}

impl OrderSession<TokioClock> {
    /// Session on the tokio clock.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self::with_clock(TokioClock, poll_interval, timeout)
    }
}

impl<C: Clock> OrderSession<C> {
    /// A zero `poll_interval` is raised to one millisecond. Both durations are
    /// capped at thirty years.
    pub fn with_clock(clock: C, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            clock,
            poll_interval: poll_interval.clamp(MIN_POLL_INTERVAL, MAX_TIMER),
            timeout: timeout.min(MAX_TIMER),
            state: SessionState::Idle,
            order: None,
            sms_code: None,
            error_message: None,
            timers: None,
            polls: 0,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn order(&self) -> Option<&OrderDetails> {
        self.order.as_ref()
    }

    pub fn sms_code(&self) -> Option<&SmsCode> {
        self.sms_code.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Status checks issued since the last `start`.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Failed status checks since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_running(&self) -> bool {
        self.timers.is_some()
    }

    /// Instant the countdown expires. `None` when the timers are not running.
    pub fn deadline(&self) -> Option<Instant> {
        self.timers.map(|t| t.deadline)
    }

    /// Countdown left, rounded up to whole seconds. `None` when the timers are
    /// not running.
    pub fn remaining_secs(&self) -> Option<u64> {
        let timers = self.timers?;
        let left = timers.deadline.saturating_duration_since(self.clock.now());
        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        Some(secs)
    }

    /// Enter `Requesting` for a new acquisition.
    ///
    /// Allowed from `Idle`, `Error` and `Cancelled`; any order left over from
    /// a previous attempt is forgotten.
    pub fn begin_request(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Error | SessionState::Cancelled => {
                self.clear();
                self.state = SessionState::Requesting;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "request a number",
            }),
        }
    }

    /// Acquisition failed before an order existed.
    pub fn request_failed(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.expect(SessionState::Requesting, "fail a request")?;
        self.order = None;
        self.fail(message.into());
        Ok(())
    }

    /// Enter `WaitingForSms` for `order` and arm both timers.
    pub fn start(&mut self, order: OrderDetails) -> Result<(), SessionError> {
        self.expect(SessionState::Requesting, "start waiting")?;
        let now = self.clock.now();
        self.timers = Some(Timers {
            next_check: now + self.poll_interval,
            deadline: now + self.timeout,
        });
        self.polls = 0;
        self.consecutive_failures = 0;
        self.state = SessionState::WaitingForSms;

        #[cfg(feature = "tracing")]
        debug!(
            order_id = %order.id,
            timeout_secs = %self.timeout.as_secs(),
            "Waiting for SMS"
        );

        self.order = Some(order);
        Ok(())
    }

    /// Disarm the timers without changing state.
    pub fn stop(&mut self) {
        self.timers = None;
    }

    /// Advance the timers.
    ///
    /// A check due at the same instant as the deadline is still issued before
    /// the session times out. Missed checks collapse into a single `Poll`.
    pub fn tick(&mut self) -> Tick {
        let Some(timers) = self.timers.as_mut() else {
            return Tick::Inactive;
        };
        let now = self.clock.now();

        if timers.next_check <= now && timers.next_check <= timers.deadline {
            while timers.next_check <= now {
                timers.next_check += self.poll_interval;
            }
            self.polls += 1;
            return Tick::Poll;
        }

        if now >= timers.deadline {
            #[cfg(feature = "tracing")]
            warn!(polls = %self.polls, "Countdown expired without SMS");

            self.fail(TIMEOUT_MESSAGE.to_string());
            return Tick::TimedOut;
        }

        let until = timers.next_check.min(timers.deadline);
        Tick::Wait(until - now)
    }

    /// Feed back a successful status check.
    pub fn apply_check(&mut self, status: &OrderStatus, code: Option<&SmsCode>) -> CheckOutcome {
        if self.state != SessionState::WaitingForSms {
            return CheckOutcome::Ignored;
        }
        self.consecutive_failures = 0;

        match (status, code) {
            (OrderStatus::Received, Some(code)) => {
                self.timers = None;
                self.sms_code = Some(code.clone());
                self.state = SessionState::SmsReceived;
                CheckOutcome::Received(code.clone())
            }
            (status, _) if status.is_failure() => {
                self.fail(format!(
                    "Order failed with status: {status}. Please cancel to try and get a refund."
                ));
                CheckOutcome::Failed(status.clone())
            }
            _ => CheckOutcome::Pending,
        }
    }

    /// A status check failed in transit; treated as still pending.
    pub fn record_poll_failure(&mut self) {
        if self.state == SessionState::WaitingForSms {
            self.consecutive_failures += 1;
        }
    }

    /// Enter `Requesting` to cancel the current order. Stops the timers.
    pub fn begin_cancel(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::WaitingForSms | SessionState::Error => {
                if self.order.is_none() {
                    return Err(SessionError::NoOrder);
                }
                self.timers = None;
                self.state = SessionState::Requesting;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "cancel",
            }),
        }
    }

    pub fn cancel_succeeded(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Requesting, "complete a cancellation")?;
        if self.order.is_none() {
            return Err(SessionError::NoOrder);
        }
        self.error_message = None;
        self.state = SessionState::Cancelled;
        Ok(())
    }

    /// Cancellation failed; the order is kept so it can be retried.
    pub fn cancel_failed(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.expect(SessionState::Requesting, "fail a cancellation")?;
        if self.order.is_none() {
            return Err(SessionError::NoOrder);
        }
        self.fail(message.into());
        Ok(())
    }

    /// Back to `Idle` with everything cleared.
    pub fn reset(&mut self) {
        self.clear();
        self.state = SessionState::Idle;
    }

    fn expect(&self, state: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn fail(&mut self, message: String) {
        self.timers = None;
        self.error_message = Some(message);
        self.state = SessionState::Error;
    }

    fn clear(&mut self) {
        self.timers = None;
        self.order = None;
        self.sms_code = None;
        self.error_message = None;
        self.polls = 0;
        self.consecutive_failures = 0;
    }
}
