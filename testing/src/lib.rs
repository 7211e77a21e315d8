//! # Univent Testing
//!
//! Testing utilities and helpers for the Univent crates.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - Domain fixtures (users, sessions, events)
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use univent_testing::{fixtures, ReducerTest};
//!
//! #[test]
//! fn joining_requires_a_session() {
//!     let event = fixtures::EventBuilder::free().capacity(10).build();
//!
//!     ReducerTest::new(ParticipationReducer::new())
//!         .with_env(test_env())
//!         .given_state(ParticipationState::new(event.id, None))
//!         .when_action(ParticipationAction::JoinFreeEvent)
//!         .then_effects(|effects| assert_eq!(effects.len(), 1))
//!         .run();
//! }
//! ```

use chrono::{DateTime, Utc};
use univent_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use univent_testing::mocks::FixedClock;
    /// use univent_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Domain fixtures
///
/// Builders for the records most tests need. Every value is deterministic
/// apart from the generated ids.
pub mod fixtures {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use univent_core::types::{
        Currency, DraftPricing, Event, EventCategory, EventDraft, EventId, EventStatus, Money,
        Pricing, Session, SessionToken, User, UserId, UserRole,
    };

    /// A verified student account
    #[must_use]
    pub fn student(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            first_name: "Alex".to_string(),
            last_name: "Johnson".to_string(),
            university: "State University".to_string(),
            major: "Computer Science".to_string(),
            is_verified: true,
            role: UserRole::Student,
            avatar_url: None,
        }
    }

    /// An administrator account
    #[must_use]
    pub fn admin() -> User {
        User {
            first_name: "Morgan".to_string(),
            last_name: "Lee".to_string(),
            role: UserRole::Admin,
            ..student("admin@university.edu")
        }
    }

    /// A session for the given user with a fixed token
    #[must_use]
    pub fn session_for(user: User) -> Session {
        Session {
            user,
            token: SessionToken::new("test-token".to_string()),
        }
    }

    /// A draft that passes every creation rule
    #[must_use]
    pub fn valid_draft() -> EventDraft {
        EventDraft {
            title: "Spring Hackathon".to_string(),
            description: "Build something in 24 hours".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 12),
            time: NaiveTime::from_hms_opt(9, 0, 0),
            location: "Engineering Hall".to_string(),
            capacity: 50,
            cover_image: String::new(),
            category: EventCategory::Tech,
            pricing: DraftPricing::Free,
            tags: BTreeSet::from(["coding".to_string()]),
            requirements: Vec::new(),
        }
    }

    /// Builder for [`Event`] records
    ///
    /// ```
    /// use univent_testing::fixtures::EventBuilder;
    ///
    /// let event = EventBuilder::paid(2500).capacity(3).attendees(3).build();
    /// assert!(event.is_full());
    /// ```
    #[derive(Debug, Clone)]
    pub struct EventBuilder {
        event: Event,
    }

    impl EventBuilder {
        /// A published free event with 10 spots
        #[must_use]
        pub fn free() -> Self {
            let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default();

            Self {
                event: Event {
                    id: EventId::new(),
                    title: "Board Game Night".to_string(),
                    description: "Bring your favourite game".to_string(),
                    date: NaiveDate::from_ymd_opt(2025, 2, 20).unwrap_or_default(),
                    time: NaiveTime::from_hms_opt(19, 30, 0).unwrap_or_default(),
                    location: "Student Union".to_string(),
                    capacity: 10,
                    current_attendees: 0,
                    cover_image: String::new(),
                    category: EventCategory::Social,
                    pricing: Pricing::Free,
                    organizer_id: UserId::new(),
                    organizer_name: "Sam Rivera".to_string(),
                    organizer_avatar: None,
                    status: EventStatus::Published,
                    tags: BTreeSet::new(),
                    requirements: Vec::new(),
                    attendees: Vec::new(),
                    created_at: created,
                    updated_at: created,
                },
            }
        }

        /// A published paid event with the given price in cents
        #[must_use]
        pub fn paid(price_cents: u64) -> Self {
            Self::free()
                .title("Spring Gala")
                .pricing(Pricing::Paid {
                    price: Money::from_cents(price_cents),
                    currency: Currency::usd(),
                })
        }

        /// Set the title
        #[must_use]
        pub fn title(mut self, title: &str) -> Self {
            self.event.title = title.to_string();
            self
        }

        /// Set the description
        #[must_use]
        pub fn description(mut self, description: &str) -> Self {
            self.event.description = description.to_string();
            self
        }

        /// Set the capacity
        #[must_use]
        pub const fn capacity(mut self, capacity: u32) -> Self {
            self.event.capacity = capacity;
            self
        }

        /// Set the attendee counter
        #[must_use]
        pub const fn attendees(mut self, count: u32) -> Self {
            self.event.current_attendees = count;
            self
        }

        /// Set the lifecycle status
        #[must_use]
        pub const fn status(mut self, status: EventStatus) -> Self {
            self.event.status = status;
            self
        }

        /// Set the category
        #[must_use]
        pub const fn category(mut self, category: EventCategory) -> Self {
            self.event.category = category;
            self
        }

        /// Set the pricing
        #[must_use]
        pub fn pricing(mut self, pricing: Pricing) -> Self {
            self.event.pricing = pricing;
            self
        }

        /// Set the organizer
        #[must_use]
        pub fn organizer(mut self, organizer: &User) -> Self {
            self.event.organizer_id = organizer.id;
            self.event.organizer_name = organizer.full_name();
            self
        }

        /// Finish building
        #[must_use]
        pub fn build(self) -> Event {
            self.event
        }
    }
}

/// Test helpers
pub mod helpers {
    /// Install a test-friendly tracing subscriber
    ///
    /// Safe to call from every test; only the first call installs anything.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
