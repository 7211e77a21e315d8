//! Event storage boundary.
//!
//! [`EventRepository`] is everything the app knows about the events
//! database. Writes that touch several records are single operations here,
//! so the storage side can apply them atomically.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use univent_core::environment::{Clock, SystemClock};
use univent_core::types::{
    AttendeeId, AttendeeStatus, Currency, Event, EventAttendee, EventId, EventStatus, EventTicket,
    Money, PaymentIntentId, TicketId, TicketStatus, UserId,
};
use univent_core::{ConflictReason, Result, UniventError};

/// Boxed future returned by repository operations
pub type RepositoryFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// Ticket details attached to a paid registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Captured payment intent; the idempotency key of the purchase
    pub payment_intent_id: PaymentIntentId,
    /// Amount paid
    pub price: Money,
    /// Currency paid in
    pub currency: Currency,
    /// Check-in code printed on the ticket
    pub qr_code: String,
}

/// Request to add a user to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Event to join
    pub event_id: EventId,
    /// Joining user
    pub user_id: UserId,
    /// Name shown on the attendee list
    pub user_name: String,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
    /// Ticket to issue, required for paid events
    pub ticket: Option<NewTicket>,
}

/// Records created by a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    /// New attendee record
    pub attendee: EventAttendee,
    /// Issued ticket, for paid events
    pub ticket: Option<EventTicket>,
}

/// Event repository trait
///
/// Abstraction over the events database.
pub trait EventRepository: Send + Sync {
    /// Published events, newest first
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the database is unreachable
    fn list_published(&self) -> RepositoryFuture<Vec<Event>>;

    /// Event by id, with its attendee list
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the database is unreachable
    fn find_event(&self, event_id: EventId) -> RepositoryFuture<Option<Event>>;

    /// Store a new event
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable or the id is taken
    fn insert_event(&self, event: Event) -> RepositoryFuture<Event>;

    /// Change the lifecycle status of an event
    ///
    /// # Errors
    ///
    /// Returns `UniventError::NotFound` for unknown events
    fn update_status(&self, event_id: EventId, status: EventStatus) -> RepositoryFuture<Event>;

    /// Add an attendee and, for paid events, issue the ticket
    ///
    /// Capacity check, duplicate checks, ticket insert, attendee insert and
    /// counter increment happen as one unit: when any check fails nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// - `UniventError::NotFound`: unknown event
    /// - `UniventError::Conflict(DuplicatePayment)`: payment intent already used
    /// - `UniventError::EventNotOpen`: event is not published
    /// - `UniventError::Validation`: paid event without a ticket
    /// - `UniventError::Conflict(AlreadyRegistered)`: user already has a spot
    /// - `UniventError::CapacityExceeded`: no spots left
    fn register_attendee(&self, registration: Registration) -> RepositoryFuture<Registered>;

    /// Events organized by a user, any status, newest first
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the database is unreachable
    fn events_by_organizer(&self, organizer_id: UserId) -> RepositoryFuture<Vec<Event>>;

    /// Tickets bought by a user, newest purchase first
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the database is unreachable
    fn tickets_for_user(&self, user_id: UserId) -> RepositoryFuture<Vec<EventTicket>>;
}

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    tickets: Vec<EventTicket>,
}

impl Tables {
    fn register(&mut self, registration: Registration, now: DateTime<Utc>) -> Result<Registered> {
        let event = self
            .events
            .get(&registration.event_id)
            .ok_or_else(|| UniventError::not_found("event", registration.event_id))?;

        if let Some(ticket) = &registration.ticket {
            if self
                .tickets
                .iter()
                .any(|t| t.payment_intent_id == ticket.payment_intent_id)
            {
                return Err(UniventError::Conflict(ConflictReason::DuplicatePayment));
            }
        }

        if event.status != EventStatus::Published {
            return Err(UniventError::EventNotOpen { status: event.status });
        }

        if event.pricing.is_paid() && registration.ticket.is_none() {
            return Err(UniventError::validation(
                "ticket",
                "A ticket is required for paid events",
            ));
        }

        if event.active_attendee(registration.user_id).is_some() {
            return Err(UniventError::Conflict(ConflictReason::AlreadyRegistered));
        }

        if event.is_full() {
            return Err(UniventError::CapacityExceeded { capacity: event.capacity });
        }

        // All checks passed; from here on nothing can fail
        let ticket = registration.ticket.map(|ticket| EventTicket {
            id: TicketId::new(),
            event_id: registration.event_id,
            user_id: registration.user_id,
            purchase_date: registration.joined_at,
            price: ticket.price,
            currency: ticket.currency,
            payment_intent_id: ticket.payment_intent_id,
            status: TicketStatus::Paid,
            qr_code: ticket.qr_code,
        });

        let attendee = EventAttendee {
            id: AttendeeId::new(),
            event_id: registration.event_id,
            user_id: registration.user_id,
            user_name: registration.user_name,
            joined_at: registration.joined_at,
            ticket_id: ticket.as_ref().map(|t| t.id),
            status: AttendeeStatus::Registered,
        };

        if let Some(event) = self.events.get_mut(&registration.event_id) {
            event.attendees.push(attendee.clone());
            event.current_attendees += 1;
            event.updated_at = now;
        }
        if let Some(ticket) = &ticket {
            self.tickets.push(ticket.clone());
        }

        Ok(Registered { attendee, ticket })
    }
}

/// In-memory event repository
///
/// All tables sit behind one mutex, which makes every operation atomic.
/// The database can be taken offline to exercise transport failures.
#[derive(Clone)]
pub struct InMemoryEventRepository {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventRepository")
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventRepository {
    /// Creates an empty repository using wall-clock time
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty repository stamping writes with `clock`
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            offline: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn EventRepository> {
        Arc::new(Self::new())
    }

    /// Simulate an unreachable database
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn run<T, F>(&self, operation: &'static str, f: F) -> RepositoryFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables, DateTime<Utc>) -> Result<T>,
    {
        let result = if self.offline.load(Ordering::SeqCst) {
            tracing::debug!(operation, "Event database offline");
            Err(UniventError::Network("event database unreachable".to_string()))
        } else {
            let now = self.clock.now();
            self.tables
                .lock()
                .map_err(|_| UniventError::Network("event database lock poisoned".to_string()))
                .and_then(|mut tables| f(&mut tables, now))
        };

        Box::pin(async move { result })
    }
}

fn newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl EventRepository for InMemoryEventRepository {
    fn list_published(&self) -> RepositoryFuture<Vec<Event>> {
        self.run("list_published", |tables, _| {
            let mut events: Vec<Event> = tables
                .events
                .values()
                .filter(|e| e.status == EventStatus::Published)
                .cloned()
                .collect();
            newest_first(&mut events);
            Ok(events)
        })
    }

    fn find_event(&self, event_id: EventId) -> RepositoryFuture<Option<Event>> {
        self.run("find_event", move |tables, _| Ok(tables.events.get(&event_id).cloned()))
    }

    fn insert_event(&self, event: Event) -> RepositoryFuture<Event> {
        self.run("insert_event", move |tables, _| {
            if tables.events.contains_key(&event.id) {
                return Err(UniventError::Storage(format!("event {} already exists", event.id)));
            }
            tables.events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn update_status(&self, event_id: EventId, status: EventStatus) -> RepositoryFuture<Event> {
        self.run("update_status", move |tables, now| {
            let event = tables
                .events
                .get_mut(&event_id)
                .ok_or_else(|| UniventError::not_found("event", event_id))?;
            event.status = status;
            event.updated_at = now;
            Ok(event.clone())
        })
    }

    fn register_attendee(&self, registration: Registration) -> RepositoryFuture<Registered> {
        self.run("register_attendee", move |tables, now| tables.register(registration, now))
    }

    fn events_by_organizer(&self, organizer_id: UserId) -> RepositoryFuture<Vec<Event>> {
        self.run("events_by_organizer", move |tables, _| {
            let mut events: Vec<Event> = tables
                .events
                .values()
                .filter(|e| e.organizer_id == organizer_id)
                .cloned()
                .collect();
            newest_first(&mut events);
            Ok(events)
        })
    }

    fn tickets_for_user(&self, user_id: UserId) -> RepositoryFuture<Vec<EventTicket>> {
        self.run("tickets_for_user", move |tables, _| {
            let mut tickets: Vec<EventTicket> = tables
                .tickets
                .iter()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            tickets.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
            Ok(tickets)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use univent_testing::fixtures::{self, EventBuilder};
    use univent_testing::mocks::test_clock;

    fn repository() -> InMemoryEventRepository {
        InMemoryEventRepository::with_clock(Arc::new(test_clock()))
    }

    fn registration(event: &Event, user_id: UserId) -> Registration {
        Registration {
            event_id: event.id,
            user_id,
            user_name: "Alex Johnson".to_string(),
            joined_at: test_clock().now(),
            ticket: None,
        }
    }

    fn ticket(intent: &str) -> NewTicket {
        NewTicket {
            payment_intent_id: PaymentIntentId::new(intent.to_string()),
            price: Money::from_cents(2500),
            currency: Currency::usd(),
            qr_code: "qr_test".to_string(),
        }
    }

    #[tokio::test]
    async fn register_increments_counter_and_records_attendee() {
        let repo = repository();
        let event = repo.insert_event(EventBuilder::free().capacity(2).build()).await.unwrap();
        let user = UserId::new();

        let registered = repo.register_attendee(registration(&event, user)).await.unwrap();

        let stored = repo.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.current_attendees, 1);
        assert_eq!(stored.attendees, vec![registered.attendee]);
        assert!(registered.ticket.is_none());
    }

    #[tokio::test]
    async fn full_event_rejects_without_writing() {
        let repo = repository();
        let event = repo
            .insert_event(EventBuilder::free().capacity(1).attendees(1).build())
            .await
            .unwrap();

        let err = repo.register_attendee(registration(&event, UserId::new())).await.unwrap_err();

        assert_eq!(err, UniventError::CapacityExceeded { capacity: 1 });
        let stored = repo.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.current_attendees, 1);
        assert!(stored.attendees.is_empty());
    }

    #[tokio::test]
    async fn second_registration_conflicts() {
        let repo = repository();
        let event = repo.insert_event(EventBuilder::free().build()).await.unwrap();
        let user = UserId::new();

        repo.register_attendee(registration(&event, user)).await.unwrap();
        let err = repo.register_attendee(registration(&event, user)).await.unwrap_err();

        assert_eq!(err, UniventError::Conflict(ConflictReason::AlreadyRegistered));
    }

    #[tokio::test]
    async fn holder_of_the_last_spot_conflicts() {
        let repo = repository();
        let event = repo.insert_event(EventBuilder::free().capacity(1).build()).await.unwrap();
        let user = UserId::new();

        repo.register_attendee(registration(&event, user)).await.unwrap();
        let err = repo.register_attendee(registration(&event, user)).await.unwrap_err();

        assert_eq!(err, UniventError::Conflict(ConflictReason::AlreadyRegistered));
        assert_eq!(repo.find_event(event.id).await.unwrap().unwrap().current_attendees, 1);
    }

    #[tokio::test]
    async fn payment_intent_is_used_once() {
        let repo = repository();
        let event = repo.insert_event(EventBuilder::paid(2500).build()).await.unwrap();

        let mut first = registration(&event, UserId::new());
        first.ticket = Some(ticket("pi_1"));
        let registered = repo.register_attendee(first).await.unwrap();
        assert_eq!(registered.attendee.ticket_id, registered.ticket.as_ref().map(|t| t.id));

        let mut replay = registration(&event, UserId::new());
        replay.ticket = Some(ticket("pi_1"));
        let err = repo.register_attendee(replay).await.unwrap_err();

        assert_eq!(err, UniventError::Conflict(ConflictReason::DuplicatePayment));
        assert_eq!(repo.find_event(event.id).await.unwrap().unwrap().current_attendees, 1);
    }

    #[tokio::test]
    async fn paid_event_requires_ticket() {
        let repo = repository();
        let event = repo.insert_event(EventBuilder::paid(2500).build()).await.unwrap();

        let err = repo.register_attendee(registration(&event, UserId::new())).await.unwrap_err();
        assert_eq!(err.kind(), univent_core::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn cancelled_event_is_not_open() {
        let repo = repository();
        let event = repo
            .insert_event(EventBuilder::free().status(EventStatus::Cancelled).build())
            .await
            .unwrap();

        let err = repo.register_attendee(registration(&event, UserId::new())).await.unwrap_err();
        assert_eq!(err, UniventError::EventNotOpen { status: EventStatus::Cancelled });
    }

    #[tokio::test]
    async fn listing_hides_unpublished_events() {
        let repo = repository();
        let organizer = fixtures::admin();
        repo.insert_event(EventBuilder::free().organizer(&organizer).build()).await.unwrap();
        repo.insert_event(
            EventBuilder::free()
                .organizer(&organizer)
                .status(EventStatus::Draft)
                .build(),
        )
        .await
        .unwrap();

        assert_eq!(repo.list_published().await.unwrap().len(), 1);
        assert_eq!(repo.events_by_organizer(organizer.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn offline_database_reports_network_error() {
        let repo = repository();
        repo.set_offline(true);

        let err = repo.list_published().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
