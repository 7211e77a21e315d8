//! Error taxonomy shared by every Univent component.
//!
//! Operations never raise past a component boundary: they return
//! [`Result`], and the Presentation Layer shows the `Display` text of the
//! error to the user.

use crate::types::EventStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Univent operations.
pub type Result<T> = std::result::Result<T, UniventError>;

/// Coarse classification of an error, used for routing and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing input, fixable by the user
    Validation,
    /// The identity service rejected the credentials
    InvalidCredentials,
    /// A gated action was attempted without a session
    AuthRequired,
    /// The session user lacks rights for the action
    Forbidden,
    /// The referenced entity does not exist
    NotFound,
    /// Duplicate registration, account or payment
    Conflict,
    /// The event is full
    CapacityExceeded,
    /// The event does not accept registrations in its current status
    EventNotOpen,
    /// The payment intent could not be created
    PaymentSetupFailed,
    /// The payment provider rejected the charge
    PaymentFailed,
    /// Transport or remote failure
    Network,
    /// Local persistence failure
    Storage,
}

impl ErrorKind {
    /// Stable snake_case name, used as a metrics label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AuthRequired => "auth_required",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::EventNotOpen => "event_not_open",
            Self::PaymentSetupFailed => "payment_setup_failed",
            Self::PaymentFailed => "payment_failed",
            Self::Network => "network",
            Self::Storage => "storage",
        }
    }
}

/// Why a write conflicted with existing data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictReason {
    /// The user already holds an active registration for the event
    AlreadyRegistered,
    /// An account with this email already exists
    EmailTaken,
    /// A ticket was already issued for this payment intent
    DuplicatePayment,
}

/// Every failure mode of the Univent core.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniventError {
    // ═══════════════════════════════════════════════════════════
    // Input
    // ═══════════════════════════════════════════════════════════

    /// Input failed client-side validation.
    #[error("{message}")]
    Validation {
        /// Name of the first failing field
        field: String,
        /// Human-readable message
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════

    /// Invalid credentials provided.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The action requires a signed-in user.
    #[error("Please log in to continue")]
    AuthRequired,

    /// The signed-in user may not perform the action.
    #[error("You do not have permission to do that")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // Data
    // ═══════════════════════════════════════════════════════════

    /// Entity not found.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name (e.g. "Event")
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Write conflicts with existing data.
    #[error("{}", conflict_message(*.0))]
    Conflict(ConflictReason),

    /// The event has no free spots left.
    #[error("Event is at full capacity ({capacity} spots)")]
    CapacityExceeded {
        /// Capacity of the event
        capacity: u32,
    },

    /// The event is not open for registration.
    #[error("Event is not open for registration (status: {status})")]
    EventNotOpen {
        /// Current status of the event
        status: EventStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Payments
    // ═══════════════════════════════════════════════════════════

    /// Payment intent creation failed.
    #[error("Could not set up payment: {0}")]
    PaymentSetupFailed(String),

    /// Payment capture failed.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Transport or remote service failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Local persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

const fn conflict_message(reason: ConflictReason) -> &'static str {
    match reason {
        ConflictReason::AlreadyRegistered => "You are already registered for this event",
        ConflictReason::EmailTaken => "An account with this email already exists",
        ConflictReason::DuplicatePayment => "A ticket was already issued for this payment",
    }
}

impl UniventError {
    /// Build a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use univent_core::{ConflictReason, ErrorKind, UniventError};
    /// assert_eq!(
    ///     UniventError::Conflict(ConflictReason::AlreadyRegistered).kind(),
    ///     ErrorKind::Conflict
    /// );
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::AuthRequired => ErrorKind::AuthRequired,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::EventNotOpen { .. } => ErrorKind::EventNotOpen,
            Self::PaymentSetupFailed(_) => ErrorKind::PaymentSetupFailed,
            Self::PaymentFailed(_) => ErrorKind::PaymentFailed,
            Self::Network(_) => ErrorKind::Network,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns `true` if re-invoking the operation may succeed without user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use univent_core::UniventError;
    /// assert!(UniventError::Network("timeout".into()).is_retryable());
    /// assert!(!UniventError::AuthRequired.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Storage(_))
    }
}
