//! Reducer for the participation workflow.

use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use univent_core::types::{Currency, Event, EventStatus, Money, Pricing};
use univent_core::{ConflictReason, SmallVec, UniventError, effect::Effect, reducer::Reducer, smallvec};

use super::{
    Participant, ParticipationAction, ParticipationEnvironment, ParticipationPhase,
    ParticipationState,
};
use crate::repository::{NewTicket, Registration};

type Effects = SmallVec<[Effect<ParticipationAction>; 4]>;

/// Length of the random part of a check-in code
const CHECK_IN_CODE_LENGTH: usize = 24;

/// Reducer for the participation workflow
///
/// Holds the join and purchase rules; every remote call is an effect whose
/// outcome is fed back as an action.
#[derive(Clone, Debug, Default)]
pub struct ParticipationReducer;

impl ParticipationReducer {
    /// Creates a new `ParticipationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rejects a command without touching the phase
    fn reject(state: &mut ParticipationState, error: UniventError) -> Effects {
        state.last_error = Some(error.clone());
        smallvec![emit(ParticipationAction::CommandRejected { error })]
    }

    /// Moves the workflow to `Failed` and notifies observers
    fn fail(state: &mut ParticipationState, error: UniventError) -> Effects {
        state.phase = ParticipationPhase::Failed;
        state.last_error = Some(error.clone());
        smallvec![emit(ParticipationAction::ParticipationFailed { error })]
    }

    /// Checks that run before a free join is written
    fn validate_join(event: &Event, participant: &Participant) -> Result<(), UniventError> {
        Self::validate_published(event)?;

        if event.pricing.is_paid() {
            return Err(UniventError::validation(
                "pricing",
                "This event requires a ticket; purchase one instead",
            ));
        }

        Self::validate_spot(event, participant)
    }

    /// Checks that run before any money moves; yields the price to charge
    fn validate_purchase(
        event: &Event,
        participant: &Participant,
    ) -> Result<(Money, Currency), UniventError> {
        Self::validate_published(event)?;

        let Pricing::Paid { price, currency } = &event.pricing else {
            return Err(UniventError::validation(
                "pricing",
                "This event is free; join it instead",
            ));
        };

        Self::validate_spot(event, participant)?;
        Ok((*price, currency.clone()))
    }

    fn validate_published(event: &Event) -> Result<(), UniventError> {
        match event.status {
            EventStatus::Published => Ok(()),
            status => Err(UniventError::EventNotOpen { status }),
        }
    }

    /// The user must not hold a spot already and a spot must be free
    ///
    /// A registered user always sees `AlreadyRegistered`, even once the
    /// event has filled up.
    fn validate_spot(event: &Event, participant: &Participant) -> Result<(), UniventError> {
        if event.active_attendee(participant.user_id).is_some() {
            return Err(UniventError::Conflict(ConflictReason::AlreadyRegistered));
        }

        if event.is_full() {
            return Err(UniventError::CapacityExceeded { capacity: event.capacity });
        }

        Ok(())
    }

    /// Whether a failed paid registration leaves captured money behind
    ///
    /// The repository writes nothing when it fails, so every error means the
    /// charge funded no ticket. A duplicate payment already funded one.
    const fn requires_refund(error: &UniventError) -> bool {
        !matches!(error, UniventError::Conflict(ConflictReason::DuplicatePayment))
    }

    fn start(
        state: &mut ParticipationState,
        phase: ParticipationPhase,
        env: &ParticipationEnvironment,
    ) -> Effects {
        if state.phase.is_transitional() {
            return Self::reject(
                state,
                UniventError::validation(
                    "participation",
                    "A request for this event is already in progress",
                ),
            );
        }

        if state.participant.is_none() {
            return Self::reject(state, UniventError::AuthRequired);
        }

        state.phase = phase;
        state.payment_intent = None;
        state.refund_id = None;
        state.last_error = None;

        let repository = Arc::clone(&env.repository);
        let event_id = state.event_id;

        smallvec![Effect::future(async move {
            Some(match repository.find_event(event_id).await {
                Ok(Some(event)) => ParticipationAction::EventLoaded { event: Box::new(event) },
                Ok(None) => ParticipationAction::ParticipationFailed {
                    error: UniventError::not_found("event", event_id),
                },
                Err(error) => ParticipationAction::ParticipationFailed { error },
            })
        })]
    }

    fn on_event_loaded(
        state: &mut ParticipationState,
        event: &Event,
        env: &ParticipationEnvironment,
    ) -> Effects {
        if !matches!(
            state.phase,
            ParticipationPhase::Joining | ParticipationPhase::AwaitingPayment
        ) {
            // Stale outcome of an earlier command
            return SmallVec::new();
        }

        let Some(participant) = state.participant.clone() else {
            return Self::fail(state, UniventError::AuthRequired);
        };

        match state.phase {
            ParticipationPhase::Joining => {
                if let Err(error) = Self::validate_join(event, &participant) {
                    return Self::fail(state, error);
                }

                let registration = Registration {
                    event_id: event.id,
                    user_id: participant.user_id,
                    user_name: participant.user_name,
                    joined_at: env.clock.now(),
                    ticket: None,
                };
                let repository = Arc::clone(&env.repository);

                smallvec![Effect::future(async move {
                    Some(match repository.register_attendee(registration).await {
                        Ok(registered) => ParticipationAction::Joined {
                            attendee: registered.attendee,
                        },
                        Err(error) => ParticipationAction::ParticipationFailed { error },
                    })
                })]
            },

            ParticipationPhase::AwaitingPayment => {
                let (amount, currency) = match Self::validate_purchase(event, &participant) {
                    Ok(price) => price,
                    Err(error) => return Self::fail(state, error),
                };

                let payments = Arc::clone(&env.payments);
                let event_id = event.id;

                smallvec![Effect::future(async move {
                    Some(
                        match payments.create_payment_intent(event_id, amount, currency).await {
                            Ok(intent) => ParticipationAction::PaymentIntentCreated { intent },
                            Err(error) => ParticipationAction::ParticipationFailed {
                                error: UniventError::PaymentSetupFailed(error.to_string()),
                            },
                        },
                    )
                })]
            },

            _ => SmallVec::new(),
        }
    }
}

fn emit(action: ParticipationAction) -> Effect<ParticipationAction> {
    Effect::future(async move { Some(action) })
}

/// Opaque token encoded in the ticket's QR code
fn check_in_code() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CHECK_IN_CODE_LENGTH)
        .map(char::from)
        .collect();
    format!("qr_{token}")
}

impl Reducer for ParticipationReducer {
    type State = ParticipationState;
    type Action = ParticipationAction;
    type Environment = ParticipationEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per workflow step
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            ParticipationAction::JoinFreeEvent => {
                Self::start(state, ParticipationPhase::Joining, env)
            },

            ParticipationAction::PurchaseTicket => {
                Self::start(state, ParticipationPhase::AwaitingPayment, env)
            },

            ParticipationAction::Reset => {
                if state.phase.is_transitional() {
                    return Self::reject(
                        state,
                        UniventError::validation(
                            "participation",
                            "Cannot reset while a request is in progress",
                        ),
                    );
                }

                *state = ParticipationState {
                    participant: state.participant.take(),
                    ..ParticipationState::new(state.event_id, None)
                };
                SmallVec::new()
            },

            // ========== Step 1: Event fetched ==========
            ParticipationAction::EventLoaded { event } => {
                Self::on_event_loaded(state, &event, env)
            },

            // ========== Step 2 (paid): Intent created ==========
            ParticipationAction::PaymentIntentCreated { intent } => {
                if state.phase != ParticipationPhase::AwaitingPayment {
                    return SmallVec::new();
                }

                state.phase = ParticipationPhase::Processing;
                state.payment_intent = Some(intent.clone());

                let payments = Arc::clone(&env.payments);

                smallvec![Effect::future(async move {
                    Some(match payments.confirm_payment(intent).await {
                        Ok(intent) => ParticipationAction::PaymentConfirmed { intent },
                        Err(error) => ParticipationAction::ParticipationFailed {
                            error: UniventError::PaymentFailed(error.to_string()),
                        },
                    })
                })]
            },

            // ========== Step 3 (paid): Funds captured ==========
            ParticipationAction::PaymentConfirmed { intent } => {
                if state.phase != ParticipationPhase::Processing {
                    return SmallVec::new();
                }
                let Some(participant) = state.participant.clone() else {
                    return Self::fail(state, UniventError::AuthRequired);
                };

                state.payment_intent = Some(intent.clone());

                let repository = Arc::clone(&env.repository);
                let event_id = state.event_id;
                let joined_at = env.clock.now();

                smallvec![Effect::future(async move {
                    let registration = Registration {
                        event_id,
                        user_id: participant.user_id,
                        user_name: participant.user_name,
                        joined_at,
                        ticket: Some(NewTicket {
                            payment_intent_id: intent.id,
                            price: intent.amount,
                            currency: intent.currency,
                            qr_code: check_in_code(),
                        }),
                    };

                    let result = repository.register_attendee(registration).await;
                    Some(ParticipationAction::from_paid_registration(result))
                })]
            },

            // ========== Step 4 (paid): Registration rejected after capture ==========
            ParticipationAction::RegistrationRejected { error } => {
                if state.phase != ParticipationPhase::Processing {
                    return SmallVec::new();
                }

                let Some(intent) = state
                    .payment_intent
                    .clone()
                    .filter(|_| Self::requires_refund(&error))
                else {
                    return Self::fail(state, error);
                };

                let payments = Arc::clone(&env.payments);

                smallvec![Effect::future(async move {
                    let refund_id = match payments.refund_payment(&intent.id, intent.amount).await {
                        Ok(refund_id) => {
                            tracing::info!(
                                intent_id = %intent.id,
                                refund_id = %refund_id,
                                reason = %error,
                                "Captured payment refunded"
                            );
                            Some(refund_id)
                        },
                        Err(refund_error) => {
                            tracing::error!(
                                intent_id = %intent.id,
                                amount = intent.amount.cents(),
                                error = %refund_error,
                                "Refund failed; payment needs manual reconciliation"
                            );
                            None
                        },
                    };

                    Some(ParticipationAction::PaymentRefunded { refund_id, error })
                })]
            },

            // ========== Terminal outcomes ==========
            ParticipationAction::Joined { attendee } => {
                if state.phase == ParticipationPhase::Joining {
                    state.phase = ParticipationPhase::Joined;
                    state.attendee = Some(attendee);
                    state.last_error = None;
                }
                SmallVec::new()
            },

            ParticipationAction::Ticketed { attendee, ticket } => {
                if state.phase == ParticipationPhase::Processing {
                    state.phase = ParticipationPhase::Ticketed;
                    state.attendee = Some(attendee);
                    state.ticket = Some(ticket);
                    state.last_error = None;
                }
                SmallVec::new()
            },

            ParticipationAction::PaymentRefunded { refund_id, error } => {
                if state.phase == ParticipationPhase::Processing {
                    state.phase = ParticipationPhase::Failed;
                    state.refund_id = refund_id;
                    state.last_error = Some(error);
                }
                SmallVec::new()
            },

            ParticipationAction::ParticipationFailed { error } => {
                if state.phase.is_transitional() || state.phase == ParticipationPhase::Failed {
                    state.phase = ParticipationPhase::Failed;
                    state.last_error = Some(error);
                }
                SmallVec::new()
            },

            ParticipationAction::CommandRejected { error } => {
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}
