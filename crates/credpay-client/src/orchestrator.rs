//! The demo flow as an explicit state machine.
//!
//! ```text
//! idle ──call──▶ calling ──402──▶ blocked ──pay──▶ paying ──▶ success | error
//!                   └──────────────▶ success | error
//! ```
//!
//! A fresh call is only accepted from `idle`, `success` or `error`, and the
//! delegated payer is only reachable from `blocked`.

use std::fmt;

use chrono::{DateTime, Local};

use crate::http_client::PayerMetadata;

/// Name of a state, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Calling,
    Blocked,
    Paying,
    Success,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Calling => "calling",
            Phase::Blocked => "blocked",
            Phase::Paying => "paying",
            Phase::Success => "success",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    Calling,
    /// The resource answered 402; `challenge` is its body verbatim.
    Blocked { challenge: String },
    /// The delegated payer is settling `challenge`.
    Paying { challenge: String },
    Success {
        payload: serde_json::Value,
        /// Present only when the payload was bought by the delegated payer.
        payer: Option<PayerMetadata>,
    },
    /// `status` is None when no HTTP response arrived at all.
    Error { status: Option<u16>, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    CallResource,
    ChallengeReceived(String),
    ResourceServed(serde_json::Value),
    CallFailed { status: Option<u16>, body: String },
    Pay,
    PaymentSucceeded {
        payload: serde_json::Value,
        payer: Option<PayerMetadata>,
    },
    PaymentFailed { status: Option<u16>, body: String },
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::CallResource => "call_resource",
            FlowEvent::ChallengeReceived(_) => "challenge_received",
            FlowEvent::ResourceServed(_) => "resource_served",
            FlowEvent::CallFailed { .. } => "call_failed",
            FlowEvent::Pay => "pay",
            FlowEvent::PaymentSucceeded { .. } => "payment_succeeded",
            FlowEvent::PaymentFailed { .. } => "payment_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("illegal transition: {event} while {from}")]
    Illegal { from: Phase, event: &'static str },
}

impl FlowState {
    pub fn phase(&self) -> Phase {
        match self {
            FlowState::Idle => Phase::Idle,
            FlowState::Calling => Phase::Calling,
            FlowState::Blocked { .. } => Phase::Blocked,
            FlowState::Paying { .. } => Phase::Paying,
            FlowState::Success { .. } => Phase::Success,
            FlowState::Error { .. } => Phase::Error,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, FlowState::Blocked { .. })
    }

    /// The single transition function. `self` is left untouched on error.
    pub fn transition(&self, event: FlowEvent) -> Result<FlowState, TransitionError> {
        use FlowEvent as E;
        use FlowState as S;

        let next = match (self, event) {
            (S::Idle | S::Success { .. } | S::Error { .. }, E::CallResource) => S::Calling,

            (S::Calling, E::ChallengeReceived(challenge)) => S::Blocked { challenge },
            (S::Calling, E::ResourceServed(payload)) => S::Success {
                payload,
                payer: None,
            },
            (S::Calling, E::CallFailed { status, body }) => S::Error { status, body },

            (S::Blocked { challenge }, E::Pay) => S::Paying {
                challenge: challenge.clone(),
            },

            (S::Paying { .. }, E::PaymentSucceeded { payload, payer }) => {
                S::Success { payload, payer }
            }
            (S::Paying { .. }, E::PaymentFailed { status, body }) => S::Error { status, body },

            (from, event) => {
                return Err(TransitionError::Illegal {
                    from: from.phase(),
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

/// Human-readable record of every transition, oldest first.
#[derive(Debug, Clone, Default)]
pub struct FlowLog {
    entries: Vec<(DateTime<Local>, String)>,
}

impl FlowLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push((Local::now(), message.into()));
    }

    /// Log a completed transition with a message describing what happened.
    pub fn record(&mut self, from: Phase, to: &FlowState) {
        let message = match to {
            FlowState::Idle => "Reset.".to_string(),
            FlowState::Calling => "Calling x402 protected API...".to_string(),
            FlowState::Blocked { .. } => "Got 402 Payment Required.".to_string(),
            FlowState::Paying { .. } => {
                "Requesting Credpay credit, paying x402, and retrying...".to_string()
            }
            FlowState::Success { payer: None, .. } => "Got 200 OK.".to_string(),
            FlowState::Success { payer: Some(_), .. } => {
                "Success. Premium response returned.".to_string()
            }
            FlowState::Error {
                status: Some(status),
                ..
            } if from == Phase::Paying => format!("Credpay flow failed: {status}"),
            FlowState::Error {
                status: Some(status),
                ..
            } => format!("Error calling API: {status}"),
            FlowState::Error { status: None, body } => format!("Request failed: {body}"),
        };
        self.push(format!("{from} -> {}: {message}", to.phase()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines formatted as `[HH:MM:SS] message`.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(at, message)| format!("[{}] {message}", at.format("%H:%M:%S")))
            .collect()
    }
}
