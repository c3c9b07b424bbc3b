pub mod addresses;
pub mod carts;
pub mod common;
pub mod merchandising;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod testimonials;
pub mod wishlists;

use crate::{
    db::DbPool,
    events::EventSender,
    services::commerce::{
        AddressService, CartService, MerchandisingService, OrderService, ProductCatalogService,
        ReviewService, TestimonialService, WishlistService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<ProductCatalogService>,
    pub cart: Arc<CartService>,
    pub order: Arc<OrderService>,
    pub review: Arc<ReviewService>,
    pub wishlist: Arc<WishlistService>,
    pub testimonial: Arc<TestimonialService>,
    pub merchandising: Arc<MerchandisingService>,
    pub address: Arc<AddressService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            product_catalog: Arc::new(ProductCatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(CartService::new(db_pool.clone(), event_sender.clone())),
            order: Arc::new(OrderService::new(db_pool.clone(), event_sender.clone())),
            review: Arc::new(ReviewService::new(db_pool.clone(), event_sender.clone())),
            wishlist: Arc::new(WishlistService::new(db_pool.clone(), event_sender.clone())),
            testimonial: Arc::new(TestimonialService::new(db_pool.clone(), event_sender.clone())),
            merchandising: Arc::new(MerchandisingService::new(db_pool.clone())),
            address: Arc::new(AddressService::new(db_pool, event_sender)),
        }
    }
}
