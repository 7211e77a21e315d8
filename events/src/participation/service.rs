//! Request/response entry point for the participation workflow.

use std::time::Duration;

use univent_core::types::{EventAttendee, EventId, EventTicket, Session};
use univent_core::{Result, UniventError};
use univent_runtime::{Store, StoreError};

use super::{ParticipationAction, ParticipationEnvironment, ParticipationReducer, ParticipationState};

/// Records created by a successful ticket purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPurchase {
    /// New attendee record
    pub attendee: EventAttendee,
    /// Issued ticket
    pub ticket: EventTicket,
}

/// Joins free events and sells tickets for paid ones.
///
/// Every call runs its own workflow store, seeded with the caller's session,
/// and waits for the terminal action.
#[derive(Clone)]
pub struct ParticipationService {
    environment: ParticipationEnvironment,
    timeout: Duration,
}

impl ParticipationService {
    /// Creates a service that gives each workflow `timeout` to finish
    #[must_use]
    pub const fn new(environment: ParticipationEnvironment, timeout: Duration) -> Self {
        Self { environment, timeout }
    }

    /// Join a free event.
    ///
    /// # Errors
    ///
    /// - `UniventError::AuthRequired`: no session
    /// - `UniventError::NotFound`, `UniventError::EventNotOpen`: event cannot be joined
    /// - `UniventError::Validation`: the event is paid, or a request is already running
    /// - `UniventError::CapacityExceeded`: no spots left
    /// - `UniventError::Conflict(AlreadyRegistered)`: the user already holds a spot
    /// - `UniventError::Network`: the backend is unreachable or the workflow timed out
    #[tracing::instrument(skip(self, session), fields(event_id = %event_id))]
    pub async fn join_event(
        &self,
        event_id: EventId,
        session: Option<&Session>,
    ) -> Result<EventAttendee> {
        let outcome = self
            .run(event_id, session, ParticipationAction::JoinFreeEvent)
            .await?;

        match outcome {
            ParticipationAction::Joined { attendee } => {
                metrics::counter!("participation.completed", "flow" => "join").increment(1);
                tracing::info!(attendee_id = %attendee.id, "Joined event");
                Ok(attendee)
            },
            other => Err(Self::failure("join", other)),
        }
    }

    /// Buy a ticket for a paid event.
    ///
    /// The card is charged only after the event passed the pre-flight checks.
    /// If registration is rejected after the charge, the payment is refunded
    /// and the rejection is returned.
    ///
    /// # Errors
    ///
    /// - every error of [`join_event`](Self::join_event), with "free" and "paid" swapped
    /// - `UniventError::PaymentSetupFailed`: the payment intent could not be created
    /// - `UniventError::PaymentFailed`: the payment was declined
    /// - `UniventError::Conflict(DuplicatePayment)`: the payment already funded a ticket
    #[tracing::instrument(skip(self, session), fields(event_id = %event_id))]
    pub async fn purchase_ticket(
        &self,
        event_id: EventId,
        session: Option<&Session>,
    ) -> Result<TicketPurchase> {
        let outcome = self
            .run(event_id, session, ParticipationAction::PurchaseTicket)
            .await?;

        match outcome {
            ParticipationAction::Ticketed { attendee, ticket } => {
                metrics::counter!("participation.completed", "flow" => "purchase").increment(1);
                tracing::info!(
                    ticket_id = %ticket.id,
                    intent_id = %ticket.payment_intent_id,
                    amount = ticket.price.cents(),
                    "Ticket purchased"
                );
                Ok(TicketPurchase { attendee, ticket })
            },
            other => Err(Self::failure("purchase", other)),
        }
    }

    async fn run(
        &self,
        event_id: EventId,
        session: Option<&Session>,
        command: ParticipationAction,
    ) -> Result<ParticipationAction> {
        let store = Store::new(
            ParticipationState::new(event_id, session),
            ParticipationReducer::new(),
            self.environment.clone(),
        );

        store
            .send_and_wait_for(command, ParticipationAction::is_terminal, self.timeout)
            .await
            .map_err(|error| match error {
                StoreError::Timeout => {
                    tracing::warn!(timeout = ?self.timeout, "Participation workflow timed out");
                    UniventError::Network("the request timed out".to_string())
                },
                StoreError::ChannelClosed => {
                    UniventError::Network("participation workflow stopped".to_string())
                },
            })
    }

    fn failure(flow: &'static str, outcome: ParticipationAction) -> UniventError {
        let error = match outcome {
            ParticipationAction::ParticipationFailed { error }
            | ParticipationAction::CommandRejected { error } => error,
            ParticipationAction::PaymentRefunded { refund_id, error } => {
                tracing::info!(refund_id = ?refund_id, "Purchase rolled back");
                error
            },
            other => UniventError::Storage(format!("unexpected workflow outcome: {other:?}")),
        };

        metrics::counter!(
            "participation.failed",
            "flow" => flow,
            "kind" => error.kind().as_str()
        )
        .increment(1);
        tracing::warn!(flow, error = %error, "Participation failed");

        error
    }
}
