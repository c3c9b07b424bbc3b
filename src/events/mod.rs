//! Domain events emitted after successful writes.
//!
//! Events are informational: they are delivered over a bounded channel to a
//! background task that logs and counts them. No business state depends on
//! an event being processed.

use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::OrderStatus;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemUpdated {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        cart_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    OrderCreated {
        order_id: Uuid,
        item_count: usize,
        total: Decimal,
        from_cart: bool,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderPaymentChanged {
        order_id: Uuid,
        is_paid: bool,
    },

    ReviewCreated {
        review_id: Uuid,
        product_id: Uuid,
    },
    ReviewDeleted {
        review_id: Uuid,
        product_id: Uuid,
    },
    ProductRatingRecomputed {
        product_id: Uuid,
        reviews_count: i32,
        average_rating: Decimal,
    },

    ProductCreated(Uuid),
    WishlistItemAdded {
        wishlist_id: Uuid,
        product_id: Uuid,
    },
    WishlistItemRemoved {
        wishlist_id: Uuid,
        product_id: Uuid,
    },
    TestimonialCreated(Uuid),
    AddressSaved(Uuid),
    AddressDeleted(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CartItemAdded { .. } => "cart_item_added",
            Event::CartItemUpdated { .. } => "cart_item_updated",
            Event::CartItemRemoved { .. } => "cart_item_removed",
            Event::CartCleared(_) => "cart_cleared",
            Event::OrderCreated { .. } => "order_created",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::OrderPaymentChanged { .. } => "order_payment_changed",
            Event::ReviewCreated { .. } => "review_created",
            Event::ReviewDeleted { .. } => "review_deleted",
            Event::ProductRatingRecomputed { .. } => "product_rating_recomputed",
            Event::ProductCreated(_) => "product_created",
            Event::WishlistItemAdded { .. } => "wishlist_item_added",
            Event::WishlistItemRemoved { .. } => "wishlist_item_removed",
            Event::TestimonialCreated(_) => "testimonial_created",
            Event::AddressSaved(_) => "address_saved",
            Event::AddressDeleted(_) => "address_deleted",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("accessory_shop_events_total", 1, "event" => event.name());

        match &event {
            Event::OrderCreated {
                order_id,
                item_count,
                total,
                from_cart,
            } => {
                info!(%order_id, item_count, %total, from_cart, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "order status changed");
            }
            Event::ProductRatingRecomputed {
                product_id,
                reviews_count,
                average_rating,
            } => {
                info!(%product_id, reviews_count, %average_rating, "product rating recomputed");
            }
            other => {
                info!(event = other.name(), payload = ?other, "domain event");
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
