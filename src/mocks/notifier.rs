//! Recording notifier for testing.

use crate::error::{EngineError, Result};
use crate::providers::MatchNotifier;
use crate::types::{OrderId, Pass, Payment, PaymentId, TicketOrder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded notification.
#[derive(Clone, Debug)]
pub enum Notification {
    /// A payment matched an order.
    PaymentMatched {
        /// Settled order.
        order_id: OrderId,
        /// Whether a raw bearer secret was part of the delivery.
        with_secret: bool,
    },
    /// An unattributed payment was recorded.
    Unattributed {
        /// The donation payment.
        payment_id: PaymentId,
    },
}

/// Notifier that records deliveries instead of sending anything.
///
/// `set_failing(true)` makes every delivery fail, for asserting that
/// notification failure never affects the transactional outcome.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Create a notifier that records and succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle delivery failure.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything delivered so far.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, notification: Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Store("notifier down".into()));
        }
        self.sent
            .lock()
            .map_err(|_| EngineError::Store("mutex poisoned".into()))?
            .push(notification);
        Ok(())
    }
}

impl MatchNotifier for RecordingNotifier {
    async fn payment_matched(
        &self,
        order: &TicketOrder,
        _payment: &Payment,
        _pass: &Pass,
        secret: Option<&str>,
    ) -> Result<()> {
        self.record(Notification::PaymentMatched {
            order_id: order.id,
            with_secret: secret.is_some(),
        })
    }

    async fn unattributed_payment(&self, payment: &Payment) -> Result<()> {
        self.record(Notification::Unattributed {
            payment_id: payment.id,
        })
    }
}
