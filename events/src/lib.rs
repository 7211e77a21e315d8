//! # Univent Events
//!
//! Event catalog, payment boundary and participation workflow.
//!
//! ## Components
//!
//! - [`EventRepository`]: the events database boundary, with atomic registration
//! - [`PaymentGateway`]: payment intents, capture and refunds
//! - [`EventService`]: browse, search, create and cancel events
//! - [`ParticipationService`]: join free events and buy tickets for paid ones
//!
//! ## Example
//!
//! ```rust,ignore
//! use univent_events::participation::{ParticipationEnvironment, ParticipationService};
//!
//! let environment = ParticipationEnvironment::new(clock, repository, payments);
//! let participation = ParticipationService::new(environment, Duration::from_secs(30));
//!
//! let purchase = participation.purchase_ticket(event_id, session.as_ref()).await?;
//! println!("Check-in code: {}", purchase.ticket.qr_code);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod participation;
pub mod payment_gateway;
pub mod repository;
pub mod service;

pub use participation::{
    ParticipationAction, ParticipationEnvironment, ParticipationPhase, ParticipationReducer,
    ParticipationService, ParticipationState, TicketPurchase,
};
pub use payment_gateway::{MockPaymentGateway, PaymentGateway, PaymentGatewayError};
pub use repository::{EventRepository, InMemoryEventRepository};
pub use service::{EventQuery, EventService};
