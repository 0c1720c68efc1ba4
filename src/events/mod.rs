use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Best-effort send: a full or closed channel is logged, never fatal.
    /// Redemption commits must not fail because a consumer lagged.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            error!("Failed to publish event {:?}: {}", event, e);
        }
    }
}

// Events emitted by the promotion services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Issuance events
    GiftCardIssued(Uuid),
    CouponCreated(Uuid),

    // Redemption events
    GiftCardRedeemed {
        code: String,
        order_id: String,
        amount: i64,
        remaining_balance: i64,
    },
    GiftCardDepleted {
        code: String,
    },
    CouponRedeemed {
        code: String,
        order_id: String,
        amount: i64,
    },
}

// Consumes events from the channel and logs them. Downstream integrations
// (seller notifications, analytics) subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::GiftCardIssued(id) => {
                info!("Gift card issued: {}", id);
            }
            Event::CouponCreated(id) => {
                info!("Coupon created: {}", id);
            }
            Event::GiftCardRedeemed {
                code,
                order_id,
                amount,
                remaining_balance,
            } => {
                info!(
                    "Gift card {} redeemed for order {}: amount={}, remaining={}",
                    code, order_id, amount, remaining_balance
                );
            }
            Event::GiftCardDepleted { code } => {
                info!("Gift card {} fully depleted", code);
            }
            Event::CouponRedeemed {
                code,
                order_id,
                amount,
            } => {
                info!(
                    "Coupon {} redeemed for order {}: amount={}",
                    code, order_id, amount
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::GiftCardDepleted { code: "GC1".into() })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::GiftCardDepleted { code }) => assert_eq!(code, "GC1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender.send_or_log(Event::CouponCreated(Uuid::new_v4())).await;
    }
}
