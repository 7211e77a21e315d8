//! Payment gateway for ticket purchases.
//!
//! This module provides the payment-intent interface the participation
//! workflow charges through, modelled on card processors such as Stripe.
//! [`MockPaymentGateway`] stands in for a real processor in development
//! and tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;
use univent_core::types::{Currency, EventId, Money, PaymentIntent, PaymentIntentId, PaymentIntentStatus};

/// Payment gateway result
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// Boxed future returned by gateway operations
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;

/// Payment gateway error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentGatewayError {
    /// Card declined
    #[error("Card declined: {reason}")]
    CardDeclined {
        /// Decline reason
        reason: String,
    },
    /// Amount the processor refuses to charge
    #[error("Invalid amount: {reason}")]
    InvalidAmount {
        /// Invalid reason
        reason: String,
    },
    /// Gateway timeout
    #[error("Gateway timeout")]
    Timeout,
    /// Other error
    #[error("Payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Payment gateway trait
///
/// Abstraction over payment processors that work with payment intents.
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for a ticket
    ///
    /// `amount` is in minor units of `currency`.
    ///
    /// # Errors
    ///
    /// Returns error if the processor refuses to set up the payment
    fn create_payment_intent(
        &self,
        event_id: EventId,
        amount: Money,
        currency: Currency,
    ) -> GatewayFuture<PaymentIntent>;

    /// Confirm a payment intent, capturing the funds
    ///
    /// # Errors
    ///
    /// Returns error if the payment is declined
    fn confirm_payment(&self, intent: PaymentIntent) -> GatewayFuture<PaymentIntent>;

    /// Refund a captured payment
    ///
    /// Returns the refund id.
    ///
    /// # Errors
    ///
    /// Returns error if refund fails
    fn refund_payment(&self, intent_id: &PaymentIntentId, amount: Money) -> GatewayFuture<String>;
}

/// A refund issued through the mock gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRecord {
    /// Refunded intent
    pub intent_id: PaymentIntentId,
    /// Amount returned
    pub amount: Money,
    /// Gateway refund id
    pub refund_id: String,
}

#[derive(Debug, Default)]
struct Switches {
    fail_setup: AtomicBool,
    decline: AtomicBool,
    fail_refunds: AtomicBool,
}

/// Mock payment gateway (succeeds unless told otherwise)
///
/// Confirmation waits for the configured delay to mimic the processor
/// round trip. Setup, confirmation and refunds can each be made to fail.
#[derive(Clone, Debug, Default)]
pub struct MockPaymentGateway {
    confirmation_delay: Duration,
    switches: Arc<Switches>,
    intents: Arc<Mutex<Vec<PaymentIntent>>>,
    refunds: Arc<Mutex<Vec<RefundRecord>>>,
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl MockPaymentGateway {
    /// Creates a mock gateway that confirms immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock gateway whose confirmations take `delay`
    #[must_use]
    pub fn with_confirmation_delay(delay: Duration) -> Self {
        Self {
            confirmation_delay: delay,
            ..Self::default()
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }

    /// Make intent creation fail
    pub fn fail_setup(&self, fail: bool) {
        self.switches.fail_setup.store(fail, Ordering::SeqCst);
    }

    /// Make confirmations decline
    pub fn decline_payments(&self, decline: bool) {
        self.switches.decline.store(decline, Ordering::SeqCst);
    }

    /// Make refunds fail
    pub fn fail_refunds(&self, fail: bool) {
        self.switches.fail_refunds.store(fail, Ordering::SeqCst);
    }

    /// Intents created so far
    #[must_use]
    pub fn intents(&self) -> Vec<PaymentIntent> {
        self.intents.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Refunds issued so far
    #[must_use]
    pub fn refunds(&self) -> Vec<RefundRecord> {
        self.refunds.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_payment_intent(
        &self,
        event_id: EventId,
        amount: Money,
        currency: Currency,
    ) -> GatewayFuture<PaymentIntent> {
        let fail = self.switches.fail_setup.load(Ordering::SeqCst);
        let intents = Arc::clone(&self.intents);

        Box::pin(async move {
            if fail {
                return Err(PaymentGatewayError::Other {
                    message: "payment provider unavailable".to_string(),
                });
            }
            if amount.is_zero() {
                return Err(PaymentGatewayError::InvalidAmount {
                    reason: "amount must be positive".to_string(),
                });
            }

            let id = format!("pi_{}", uuid::Uuid::new_v4().simple());
            let intent = PaymentIntent {
                client_secret: format!("{id}_secret_{}", random_token(16)),
                id: PaymentIntentId::new(id),
                amount,
                currency,
                status: PaymentIntentStatus::RequiresPaymentMethod,
            };

            tracing::info!(
                event_id = %event_id,
                intent_id = %intent.id,
                amount = amount.cents(),
                "Mock payment intent created"
            );

            if let Ok(mut intents) = intents.lock() {
                intents.push(intent.clone());
            }
            Ok(intent)
        })
    }

    fn confirm_payment(&self, mut intent: PaymentIntent) -> GatewayFuture<PaymentIntent> {
        let decline = self.switches.decline.load(Ordering::SeqCst);
        let delay = self.confirmation_delay;

        Box::pin(async move {
            // Simulate processor round trip
            tokio::time::sleep(delay).await;

            if decline {
                tracing::info!(intent_id = %intent.id, "Mock payment declined");
                return Err(PaymentGatewayError::CardDeclined {
                    reason: "insufficient funds".to_string(),
                });
            }

            intent.status = PaymentIntentStatus::Succeeded;
            tracing::info!(
                intent_id = %intent.id,
                amount = intent.amount.cents(),
                "Mock payment captured"
            );
            Ok(intent)
        })
    }

    fn refund_payment(&self, intent_id: &PaymentIntentId, amount: Money) -> GatewayFuture<String> {
        let fail = self.switches.fail_refunds.load(Ordering::SeqCst);
        let refunds = Arc::clone(&self.refunds);
        let intent_id = intent_id.clone();

        Box::pin(async move {
            if fail {
                return Err(PaymentGatewayError::Timeout);
            }

            let refund_id = format!("re_{}", uuid::Uuid::new_v4().simple());

            tracing::info!(
                intent_id = %intent_id,
                amount = amount.cents(),
                refund_id = %refund_id,
                "Mock refund processed"
            );

            if let Ok(mut refunds) = refunds.lock() {
                refunds.push(RefundRecord {
                    intent_id,
                    amount,
                    refund_id: refund_id.clone(),
                });
            }
            Ok(refund_id)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn intent_then_confirm_succeeds() {
        let gateway = MockPaymentGateway::new();

        let intent = gateway
            .create_payment_intent(EventId::new(), Money::from_cents(2500), Currency::usd())
            .await
            .unwrap();

        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert!(intent.id.as_str().starts_with("pi_"));
        assert!(intent.client_secret.starts_with(&format!("{}_secret_", intent.id)));

        let confirmed = gateway.confirm_payment(intent.clone()).await.unwrap();
        assert_eq!(confirmed.status, PaymentIntentStatus::Succeeded);
        assert_eq!(confirmed.amount, Money::from_cents(2500));
        assert_eq!(gateway.intents(), vec![intent]);
    }

    #[tokio::test]
    async fn zero_amount_is_refused() {
        let gateway = MockPaymentGateway::new();

        let result = gateway
            .create_payment_intent(EventId::new(), Money::from_cents(0), Currency::usd())
            .await;

        assert!(matches!(result, Err(PaymentGatewayError::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn declined_card_fails_confirmation() {
        let gateway = MockPaymentGateway::new();
        let intent = gateway
            .create_payment_intent(EventId::new(), Money::from_cents(1000), Currency::usd())
            .await
            .unwrap();

        gateway.decline_payments(true);

        assert!(matches!(
            gateway.confirm_payment(intent).await,
            Err(PaymentGatewayError::CardDeclined { .. })
        ));
    }

    #[tokio::test]
    async fn refunds_are_recorded() {
        let gateway = MockPaymentGateway::new();
        let intent_id = PaymentIntentId::new("pi_123".to_string());

        let refund_id = gateway.refund_payment(&intent_id, Money::from_cents(500)).await.unwrap();

        assert!(refund_id.starts_with("re_"));
        assert_eq!(
            gateway.refunds(),
            vec![RefundRecord {
                intent_id,
                amount: Money::from_cents(500),
                refund_id,
            }]
        );
    }

    #[tokio::test]
    async fn confirmation_waits_for_delay() {
        let gateway = MockPaymentGateway::with_confirmation_delay(Duration::from_millis(30));
        let intent = gateway
            .create_payment_intent(EventId::new(), Money::from_cents(1000), Currency::usd())
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        gateway.confirm_payment(intent).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
