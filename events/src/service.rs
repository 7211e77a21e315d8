//! Event catalog operations.
//!
//! [`EventService`] is what the screens call to browse, create and cancel
//! events. Reads degrade to "nothing found" when the backend is
//! unreachable; writes report every failure.

use std::sync::Arc;

use univent_core::environment::Clock;
use univent_core::types::{
    DraftPricing, Event, EventCategory, EventDraft, EventId, EventStatus, EventTicket, Money,
    Pricing, Session, UserId,
};
use univent_core::{Result, UniventError};

use crate::repository::EventRepository;

/// Filter for the browse screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Case-insensitive text matched against title and description
    pub text: Option<String>,
    /// Only events of this category
    pub category: Option<EventCategory>,
}

impl EventQuery {
    fn matches(&self, event: &Event) -> bool {
        if self.category.is_some_and(|category| category != event.category) {
            return false;
        }

        match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                event.title.to_lowercase().contains(&needle)
                    || event.description.to_lowercase().contains(&needle)
            },
        }
    }
}

/// Event catalog service
#[derive(Clone)]
pub struct EventService {
    repository: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

fn require(field: &str, label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UniventError::validation(field, format!("{label} is required")));
    }
    Ok(())
}

fn require_some<T>(field: &str, label: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| UniventError::validation(field, format!("{label} is required")))
}

impl EventService {
    /// Creates a new `EventService`
    #[must_use]
    pub fn new(repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Published events, newest first.
    ///
    /// Returns an empty list when the backend cannot be reached.
    #[tracing::instrument(skip(self))]
    pub async fn get_events(&self) -> Vec<Event> {
        match self.repository.list_published().await {
            Ok(events) => events,
            Err(error) => {
                tracing::error!(%error, "Failed to load events");
                Vec::new()
            },
        }
    }

    /// A single event with its attendees.
    ///
    /// `None` both for unknown ids and an unreachable backend.
    #[tracing::instrument(skip(self))]
    pub async fn get_event(&self, event_id: EventId) -> Option<Event> {
        match self.repository.find_event(event_id).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(%error, "Failed to load event");
                None
            },
        }
    }

    /// Publish a new event organized by the session's user.
    ///
    /// The draft is checked field by field; the first failing field is
    /// reported.
    ///
    /// # Errors
    ///
    /// - `UniventError::AuthRequired`: no session
    /// - `UniventError::Validation`: a missing field, zero capacity, or a paid event without a price
    /// - `UniventError::Network`: the backend is unreachable
    #[tracing::instrument(skip_all)]
    pub async fn create_event(&self, session: Option<&Session>, draft: EventDraft) -> Result<Event> {
        let session = session.ok_or(UniventError::AuthRequired)?;

        require("title", "Event title", &draft.title)?;
        require("description", "Event description", &draft.description)?;
        let date = require_some("date", "Event date", draft.date)?;
        let time = require_some("time", "Event time", draft.time)?;
        require("location", "Event location", &draft.location)?;

        if draft.capacity < 1 {
            return Err(UniventError::validation("capacity", "Capacity must be at least 1"));
        }
        let pricing = match draft.pricing {
            DraftPricing::Free => Pricing::Free,
            DraftPricing::Paid { price: 0, .. } => {
                return Err(UniventError::validation(
                    "price",
                    "Price is required for paid events",
                ));
            },
            DraftPricing::Paid { price, currency } => Pricing::Paid {
                price: Money::checked_from_major_units(price)
                    .ok_or_else(|| UniventError::validation("price", "Price is too large"))?,
                currency,
            },
        };

        let now = self.clock.now();
        let organizer = &session.user;
        let event = Event {
            id: EventId::new(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            date,
            time,
            location: draft.location.trim().to_string(),
            capacity: draft.capacity,
            current_attendees: 0,
            cover_image: draft.cover_image,
            category: draft.category,
            pricing,
            organizer_id: organizer.id,
            organizer_name: organizer.full_name(),
            organizer_avatar: organizer.avatar_url.clone(),
            status: EventStatus::Published,
            tags: draft.tags,
            requirements: draft.requirements,
            attendees: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let event = self.repository.insert_event(event).await?;
        tracing::info!(event_id = %event.id, organizer_id = %organizer.id, "Event published");
        Ok(event)
    }

    /// Cancel an event.
    ///
    /// Only the organizer or an admin may cancel. Cancelling an event that
    /// is already cancelled succeeds without writing anything.
    ///
    /// # Errors
    ///
    /// - `UniventError::AuthRequired`: no session
    /// - `UniventError::NotFound`: unknown event
    /// - `UniventError::Forbidden`: the user neither organizes the event nor is an admin
    /// - `UniventError::Validation`: the event already took place
    /// - `UniventError::Network`: the backend is unreachable
    #[tracing::instrument(skip(self, session))]
    pub async fn cancel_event(&self, session: Option<&Session>, event_id: EventId) -> Result<Event> {
        let session = session.ok_or(UniventError::AuthRequired)?;

        let event = self
            .repository
            .find_event(event_id)
            .await?
            .ok_or_else(|| UniventError::not_found("event", event_id))?;

        if event.organizer_id != session.user.id && !session.user.is_admin() {
            tracing::warn!(user_id = %session.user.id, "Cancellation refused");
            return Err(UniventError::Forbidden);
        }

        match event.status {
            EventStatus::Cancelled => Ok(event),
            EventStatus::Completed => Err(UniventError::validation(
                "status",
                "A completed event cannot be cancelled",
            )),
            EventStatus::Draft | EventStatus::Published => {
                let event = self
                    .repository
                    .update_status(event_id, EventStatus::Cancelled)
                    .await?;
                tracing::info!(user_id = %session.user.id, "Event cancelled");
                Ok(event)
            },
        }
    }

    /// Published events matching `query`, newest first.
    ///
    /// Like [`get_events`](Self::get_events), empty when the backend cannot be reached.
    pub async fn search(&self, query: &EventQuery) -> Vec<Event> {
        self.get_events()
            .await
            .into_iter()
            .filter(|event| query.matches(event))
            .collect()
    }

    /// Events organized by `user_id` in any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the backend is unreachable
    pub async fn organizer_events(&self, user_id: UserId) -> Result<Vec<Event>> {
        self.repository.events_by_organizer(user_id).await
    }

    /// Tickets bought by `user_id`, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `UniventError::Network` if the backend is unreachable
    pub async fn user_tickets(&self, user_id: UserId) -> Result<Vec<EventTicket>> {
        self.repository.tickets_for_user(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::InMemoryEventRepository;
    use univent_core::ErrorKind;
    use univent_core::types::Currency;
    use univent_testing::fixtures::{self, EventBuilder};
    use univent_testing::mocks::test_clock;

    fn setup() -> (EventService, InMemoryEventRepository) {
        let repository = InMemoryEventRepository::with_clock(Arc::new(test_clock()));
        let service = EventService::new(Arc::new(repository.clone()), Arc::new(test_clock()));
        (service, repository)
    }

    fn organizer_session() -> Session {
        fixtures::session_for(fixtures::student("sam@university.edu"))
    }

    #[tokio::test]
    async fn create_publishes_with_organizer_details() {
        let (service, _) = setup();
        let session = organizer_session();

        let event = service.create_event(Some(&session), fixtures::valid_draft()).await.unwrap();

        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.current_attendees, 0);
        assert_eq!(event.organizer_id, session.user.id);
        assert_eq!(event.organizer_name, "Alex Johnson");
        assert_eq!(event.created_at, test_clock().now());
        assert_eq!(service.get_event(event.id).await, Some(event));
    }

    #[tokio::test]
    async fn create_requires_a_session() {
        let (service, _) = setup();

        let err = service.create_event(None, fixtures::valid_draft()).await.unwrap_err();

        assert_eq!(err, UniventError::AuthRequired);
    }

    #[tokio::test]
    async fn create_reports_the_first_invalid_field() {
        let (service, _) = setup();
        let session = organizer_session();
        let draft = EventDraft {
            description: "   ".to_string(),
            date: None,
            capacity: 0,
            ..fixtures::valid_draft()
        };

        let err = service.create_event(Some(&session), draft).await.unwrap_err();

        assert_eq!(
            err,
            UniventError::validation("description", "Event description is required")
        );
    }

    #[tokio::test]
    async fn create_rejects_zero_capacity_and_free_paid_events() {
        let (service, _) = setup();
        let session = organizer_session();

        let zero_capacity = EventDraft { capacity: 0, ..fixtures::valid_draft() };
        let err = service.create_event(Some(&session), zero_capacity).await.unwrap_err();
        assert_eq!(err, UniventError::validation("capacity", "Capacity must be at least 1"));

        let unpriced = EventDraft {
            pricing: DraftPricing::Paid { price: 0, currency: Currency::usd() },
            ..fixtures::valid_draft()
        };
        let err = service.create_event(Some(&session), unpriced).await.unwrap_err();
        assert_eq!(err, UniventError::validation("price", "Price is required for paid events"));
    }

    #[tokio::test]
    async fn create_stores_paid_price_in_cents() {
        let (service, _) = setup();
        let session = organizer_session();

        let draft = EventDraft {
            pricing: DraftPricing::Paid { price: 25, currency: Currency::usd() },
            ..fixtures::valid_draft()
        };
        let event = service.create_event(Some(&session), draft).await.unwrap();

        assert_eq!(
            event.pricing,
            Pricing::Paid { price: Money::from_cents(2500), currency: Currency::usd() }
        );

        let overflowing = EventDraft {
            pricing: DraftPricing::Paid { price: u64::MAX, currency: Currency::usd() },
            ..fixtures::valid_draft()
        };
        let err = service.create_event(Some(&session), overflowing).await.unwrap_err();
        assert_eq!(err, UniventError::validation("price", "Price is too large"));
    }

    #[tokio::test]
    async fn get_events_is_empty_when_offline() {
        let (service, repository) = setup();
        repository.insert_event(EventBuilder::free().build()).await.unwrap();
        repository.set_offline(true);

        assert!(service.get_events().await.is_empty());
        assert!(service.get_event(EventId::new()).await.is_none());
    }

    #[tokio::test]
    async fn organizer_cancels_once() {
        let (service, repository) = setup();
        let session = organizer_session();
        let event = repository
            .insert_event(EventBuilder::free().organizer(&session.user).build())
            .await
            .unwrap();

        let cancelled = service.cancel_event(Some(&session), event.id).await.unwrap();
        assert_eq!(cancelled.status, EventStatus::Cancelled);

        let again = service.cancel_event(Some(&session), event.id).await.unwrap();
        assert_eq!(again, cancelled);
        assert!(service.get_events().await.is_empty());
    }

    #[tokio::test]
    async fn only_organizer_or_admin_may_cancel() {
        let (service, repository) = setup();
        let event = repository.insert_event(EventBuilder::free().build()).await.unwrap();
        let stranger = fixtures::session_for(fixtures::student("someone@university.edu"));
        let admin = fixtures::session_for(fixtures::admin());

        let err = service.cancel_event(Some(&stranger), event.id).await.unwrap_err();
        assert_eq!(err, UniventError::Forbidden);

        let cancelled = service.cancel_event(Some(&admin), event.id).await.unwrap();
        assert_eq!(cancelled.status, EventStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_unknown_or_completed_event_fails() {
        let (service, repository) = setup();
        let admin = fixtures::session_for(fixtures::admin());
        let completed = repository
            .insert_event(EventBuilder::free().status(EventStatus::Completed).build())
            .await
            .unwrap();

        let err = service.cancel_event(Some(&admin), EventId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service.cancel_event(Some(&admin), completed.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.cancel_event(None, completed.id).await.unwrap_err();
        assert_eq!(err, UniventError::AuthRequired);
    }

    #[tokio::test]
    async fn search_filters_by_text_and_category() {
        let (service, repository) = setup();
        repository
            .insert_event(
                EventBuilder::free()
                    .title("Rust Workshop")
                    .category(EventCategory::Tech)
                    .build(),
            )
            .await
            .unwrap();
        repository
            .insert_event(
                EventBuilder::free()
                    .title("Study Group")
                    .description("Weekly rust reading circle")
                    .category(EventCategory::Academic)
                    .build(),
            )
            .await
            .unwrap();
        repository.insert_event(EventBuilder::free().build()).await.unwrap();

        let by_text = service
            .search(&EventQuery { text: Some("RUST".to_string()), category: None })
            .await;
        assert_eq!(by_text.len(), 2);

        let by_both = service
            .search(&EventQuery {
                text: Some("rust".to_string()),
                category: Some(EventCategory::Academic),
            })
            .await;
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].title, "Study Group");

        assert_eq!(service.search(&EventQuery::default()).await.len(), 3);
    }

    #[tokio::test]
    async fn organizer_events_include_cancelled() {
        let (service, repository) = setup();
        let session = organizer_session();
        let event = repository
            .insert_event(EventBuilder::free().organizer(&session.user).build())
            .await
            .unwrap();
        service.cancel_event(Some(&session), event.id).await.unwrap();

        let events = service.organizer_events(session.user.id).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::Cancelled);
        assert!(service.user_tickets(session.user.id).await.unwrap().is_empty());
    }
}
