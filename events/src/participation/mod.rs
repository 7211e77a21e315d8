//! Event participation workflow.
//!
//! Joining a free event and buying a ticket for a paid one are modelled as
//! a state machine driven by [`ParticipationReducer`]:
//!
//! ```text
//! Free:  NotJoined ─Join─▶ Joining ─────────────────────────────▶ Joined
//! Paid:  NotJoined ─Buy──▶ AwaitingPayment ─▶ Processing ────────▶ Ticketed
//!                   any transitional phase ──────────────────────▶ Failed
//! ```
//!
//! Effects fetch the event, talk to the payment gateway and register the
//! attendee; their outcomes come back as actions. [`ParticipationService`]
//! runs one workflow per request and waits for its terminal action.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use univent_core::UniventError;
use univent_core::environment::Clock;
use univent_core::types::{
    Event, EventAttendee, EventId, EventTicket, PaymentIntent, Session, UserId,
};

use crate::payment_gateway::PaymentGateway;
use crate::repository::{EventRepository, Registered};

pub mod reducer;
pub mod service;

pub use reducer::ParticipationReducer;
pub use service::{ParticipationService, TicketPurchase};

// ============================================================================
// State
// ============================================================================

/// Where a participation workflow currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationPhase {
    /// Nothing in flight
    NotJoined,
    /// Free join in progress
    Joining,
    /// Free join succeeded
    Joined,
    /// Paid event loaded, payment being set up
    AwaitingPayment,
    /// Payment intent created, waiting for capture and registration
    Processing,
    /// Ticket issued
    Ticketed,
    /// The last command failed; see `last_error`
    Failed,
}

impl ParticipationPhase {
    /// Whether a command is in flight
    #[must_use]
    pub const fn is_transitional(self) -> bool {
        matches!(self, Self::Joining | Self::AwaitingPayment | Self::Processing)
    }
}

/// The user taking part, as recorded on the attendee list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    /// User id
    pub user_id: UserId,
    /// Full name shown to the organizer
    pub user_name: String,
}

impl From<&Session> for Participant {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id,
            user_name: session.user.full_name(),
        }
    }
}

/// State of one (event, user) participation workflow
#[derive(Clone, Debug, PartialEq)]
pub struct ParticipationState {
    /// Event being joined
    pub event_id: EventId,
    /// Signed-in user, `None` when anonymous
    pub participant: Option<Participant>,
    /// Current phase
    pub phase: ParticipationPhase,
    /// Payment intent of a paid purchase
    pub payment_intent: Option<PaymentIntent>,
    /// Attendee record once registered
    pub attendee: Option<EventAttendee>,
    /// Ticket once issued
    pub ticket: Option<EventTicket>,
    /// Refund issued after a rejected paid registration
    pub refund_id: Option<String>,
    /// Error of the last rejected or failed command
    pub last_error: Option<UniventError>,
}

impl ParticipationState {
    /// Fresh workflow for `event_id`, acting as the session's user
    #[must_use]
    pub fn new(event_id: EventId, session: Option<&Session>) -> Self {
        Self {
            event_id,
            participant: session.map(Participant::from),
            phase: ParticipationPhase::NotJoined,
            payment_intent: None,
            attendee: None,
            ticket: None,
            refund_id: None,
            last_error: None,
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Actions of the participation workflow
#[derive(Clone, Debug, PartialEq)]
pub enum ParticipationAction {
    // Commands
    /// Join a free event
    JoinFreeEvent,
    /// Buy a ticket for a paid event
    PurchaseTicket,
    /// Return a finished workflow to `NotJoined`
    Reset,

    // Effect outcomes
    /// The event was fetched
    EventLoaded {
        /// Fetched event
        event: Box<Event>,
    },
    /// A payment intent was created
    PaymentIntentCreated {
        /// New intent
        intent: PaymentIntent,
    },
    /// The payment was captured
    PaymentConfirmed {
        /// Captured intent
        intent: PaymentIntent,
    },
    /// Registration of a paid attendee was rejected after capture
    RegistrationRejected {
        /// Rejection reason
        error: UniventError,
    },

    // Terminal outcomes
    /// Free join succeeded
    Joined {
        /// New attendee record
        attendee: EventAttendee,
    },
    /// Ticket purchase succeeded
    Ticketed {
        /// New attendee record
        attendee: EventAttendee,
        /// Issued ticket
        ticket: EventTicket,
    },
    /// The captured payment was returned after a rejected registration
    PaymentRefunded {
        /// Gateway refund id, `None` when the refund itself failed
        refund_id: Option<String>,
        /// Why registration was rejected
        error: UniventError,
    },
    /// The workflow failed
    ParticipationFailed {
        /// Failure reason
        error: UniventError,
    },
    /// A command was rejected before anything started
    CommandRejected {
        /// Rejection reason
        error: UniventError,
    },
}

impl ParticipationAction {
    /// Whether this action ends a command
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Joined { .. }
                | Self::Ticketed { .. }
                | Self::PaymentRefunded { .. }
                | Self::ParticipationFailed { .. }
                | Self::CommandRejected { .. }
        )
    }

    pub(crate) fn from_paid_registration(result: univent_core::Result<Registered>) -> Self {
        match result {
            Ok(Registered {
                attendee,
                ticket: Some(ticket),
            }) => Self::Ticketed { attendee, ticket },
            Ok(Registered { ticket: None, .. }) => Self::ParticipationFailed {
                error: UniventError::Storage("registration stored without a ticket".to_string()),
            },
            Err(error) => Self::RegistrationRejected { error },
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the participation workflow
#[derive(Clone)]
pub struct ParticipationEnvironment {
    /// Clock for join timestamps
    pub clock: Arc<dyn Clock>,
    /// Event storage
    pub repository: Arc<dyn EventRepository>,
    /// Payment processor
    pub payments: Arc<dyn PaymentGateway>,
}

impl ParticipationEnvironment {
    /// Creates a new `ParticipationEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        repository: Arc<dyn EventRepository>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            clock,
            repository,
            payments,
        }
    }
}
