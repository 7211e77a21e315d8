//! Domain types for Univent.
//!
//! Value objects, entities and the session type shared by the auth,
//! events and app crates.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendee record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendeeId(Uuid);

impl AttendeeId {
    /// Creates a new random `AttendeeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttendeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment provider handle for an in-progress charge (`pi_...`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentIntentId(String);

impl PaymentIntentId {
    /// Wraps a provider-issued id
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Users and sessions
// ============================================================================

/// Role of a user on the platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular student account
    Student,
    /// Platform administrator
    Admin,
}

/// A platform user profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Login email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// University the user attends
    pub university: String,
    /// Field of study
    pub major: String,
    /// Whether the email has been verified
    pub is_verified: bool,
    /// Platform role
    pub role: UserRole,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
}

impl User {
    /// `"{first} {last}"`, as shown on attendee lists and event cards
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the user has administrator rights
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Opaque bearer token issued by the identity service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token string
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never show up in logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// An authenticated user together with the token that proves it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user
    pub user: User,
    /// Session token
    pub token: SessionToken,
}

// ============================================================================
// Money
// ============================================================================

/// Money held in minor currency units (cents)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Converts a major-unit amount (e.g. dollars) to minor units
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub const fn checked_from_major_units(amount: u64) -> Option<Self> {
        match amount.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// ISO currency code, stored lowercase (`usd`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Creates a currency from a code, normalising to lowercase
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_lowercase())
    }

    /// US dollars, the platform default
    #[must_use]
    pub fn usd() -> Self {
        Self("usd".to_string())
    }

    /// Returns the code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Event category shown in the browse filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Lectures, workshops, study groups
    Academic,
    /// Parties and meetups
    Social,
    /// Games and tournaments
    Sports,
    /// Arts and culture
    Cultural,
    /// Fairs and recruiting
    Career,
    /// Hackathons and tech talks
    Tech,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Academic => "academic",
            Self::Social => "social",
            Self::Sports => "sports",
            Self::Cultural => "cultural",
            Self::Career => "career",
            Self::Tech => "tech",
        };
        f.write_str(name)
    }
}

/// Event lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Not visible yet
    Draft,
    /// Visible and open for registration
    Published,
    /// Cancelled by the organizer
    Cancelled,
    /// Already took place
    Completed,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Whether an event is free or requires a ticket
///
/// Price and currency exist only for paid events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Pricing {
    /// Free to join
    Free,
    /// Ticket required
    Paid {
        /// Ticket price
        price: Money,
        /// Currency of the price
        currency: Currency,
    },
}

impl Pricing {
    /// Whether this is a paid event
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }
}

/// Pricing as the organizer enters it, in major currency units
///
/// Converted to [`Pricing`] when the event is published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DraftPricing {
    /// Free to join
    Free,
    /// Ticket required
    Paid {
        /// Ticket price in major units (dollars for `usd`)
        price: u64,
        /// Currency of the price
        currency: Currency,
    },
}

/// Participation status of an attendee
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    /// Signed up
    Registered,
    /// Checked in at the event
    Attended,
    /// Gave up the spot
    Cancelled,
}

/// A user's participation in an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendee {
    /// Record identifier
    pub id: AttendeeId,
    /// Event joined
    pub event_id: EventId,
    /// Participating user
    pub user_id: UserId,
    /// Display name at join time
    pub user_name: String,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
    /// Ticket for paid events
    pub ticket_id: Option<TicketId>,
    /// Participation status
    pub status: AttendeeStatus,
}

impl EventAttendee {
    /// Whether the record holds a spot (anything but cancelled)
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != AttendeeStatus::Cancelled
    }
}

/// Ticket status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Awaiting payment
    Pending,
    /// Paid and valid
    Paid,
    /// Money returned
    Refunded,
    /// Voided
    Cancelled,
}

/// A purchased ticket for a paid event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTicket {
    /// Ticket identifier
    pub id: TicketId,
    /// Event the ticket is for
    pub event_id: EventId,
    /// Ticket holder
    pub user_id: UserId,
    /// When the ticket was bought
    pub purchase_date: DateTime<Utc>,
    /// Price paid
    pub price: Money,
    /// Currency paid in
    pub currency: Currency,
    /// Payment intent that funded the ticket
    pub payment_intent_id: PaymentIntentId,
    /// Ticket status
    pub status: TicketStatus,
    /// Opaque check-in token
    pub qr_code: String,
}

/// An event as stored by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time
    pub time: NaiveTime,
    /// Where it happens
    pub location: String,
    /// Maximum number of attendees (> 0)
    pub capacity: u32,
    /// Active attendee count (never above `capacity`)
    pub current_attendees: u32,
    /// Cover image URL
    pub cover_image: String,
    /// Category
    pub category: EventCategory,
    /// Free or paid
    pub pricing: Pricing,
    /// Organizer user
    pub organizer_id: UserId,
    /// Organizer display name
    pub organizer_name: String,
    /// Organizer avatar URL
    pub organizer_avatar: Option<String>,
    /// Lifecycle status
    pub status: EventStatus,
    /// Free-form tags
    pub tags: BTreeSet<String>,
    /// Things attendees must bring or know, in order
    pub requirements: Vec<String>,
    /// Attendee records
    pub attendees: Vec<EventAttendee>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Remaining spots
    #[must_use]
    pub const fn available_spots(&self) -> u32 {
        self.capacity.saturating_sub(self.current_attendees)
    }

    /// Whether no spots are left
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_attendees >= self.capacity
    }

    /// The active attendee record of `user_id`, if any
    #[must_use]
    pub fn active_attendee(&self, user_id: UserId) -> Option<&EventAttendee> {
        self.attendees
            .iter()
            .find(|attendee| attendee.user_id == user_id && attendee.is_active())
    }
}

/// Organizer input for a new event
///
/// Date and time are optional here so that a half-filled form can be
/// validated and reported field by field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Calendar date
    pub date: Option<NaiveDate>,
    /// Start time
    pub time: Option<NaiveTime>,
    /// Location
    pub location: String,
    /// Capacity
    pub capacity: u32,
    /// Cover image URL
    pub cover_image: String,
    /// Category
    pub category: EventCategory,
    /// Free or paid
    pub pricing: DraftPricing,
    /// Tags
    pub tags: BTreeSet<String>,
    /// Requirements
    pub requirements: Vec<String>,
}

// ============================================================================
// Payments
// ============================================================================

/// Lifecycle of a payment intent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    /// Created, waiting for the customer
    RequiresPaymentMethod,
    /// Submitted to the provider
    Processing,
    /// Funds captured
    Succeeded,
    /// Abandoned
    Canceled,
    /// Captured funds returned
    Refunded,
}

/// A payment provider handle for one purchase attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider id
    pub id: PaymentIntentId,
    /// Amount in minor units
    pub amount: Money,
    /// Currency
    pub currency: Currency,
    /// Lifecycle status
    pub status: PaymentIntentStatus,
    /// Secret handed to the client SDK
    pub client_secret: String,
}
