/// Commerce services - cart, checkout, catalog and review business logic
pub mod address_service;
pub mod cart_service;
pub mod merchandising_service;
pub mod order_service;
pub mod pricing;
pub mod product_catalog_service;
pub mod rating;
pub mod review_service;
pub mod testimonial_service;
pub mod wishlist_service;

// Re-export services for convenience
pub use address_service::{AddressInput, AddressService};
pub use cart_service::{CartLine, CartService, CartWithItems};
pub use merchandising_service::{
    BannerView, CreateBannerInput, CreateSlideInput, MerchandisingService, SlideView,
    UpdateBannerInput, UpdateSlideInput,
};
pub use order_service::{
    ExplicitOrderItem, OrderScope, OrderService, OrderWithItems, ShippingAddress,
    UpdateOrderInput,
};
pub use product_catalog_service::{
    AddProductMediaInput, CategoryNode, CreateBrandInput, CreateCategoryInput,
    CreatePhoneModelInput, CreateProductInput, ProductCatalogService, ProductFilter, ProductView,
    SetCompatibilityInput,
};
pub use review_service::{CreateReviewInput, ReviewService, UpdateReviewInput};
pub use testimonial_service::{CreateTestimonialInput, TestimonialService};
pub use wishlist_service::{WishlistService, WishlistWithItems};
