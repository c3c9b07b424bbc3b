pub mod address;
pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod phone_model;
pub mod product;
pub mod product_media;
pub mod product_phone_model;
pub mod promo_banner;
pub mod review;
pub mod slideshow_item;
pub mod testimonial;
pub mod wishlist;
pub mod wishlist_item;

// Re-export entities
pub use address::{AddressType, Entity as Address, Model as AddressModel};
pub use brand::{Entity as Brand, Model as BrandModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use phone_model::{Entity as PhoneModel, Model as PhoneModelModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_media::{Entity as ProductMedia, MediaType, Model as ProductMediaModel};
pub use product_phone_model::{Entity as ProductPhoneModel, Model as ProductPhoneModelModel};
pub use promo_banner::{BannerSize, Entity as PromoBanner, Model as PromoBannerModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use slideshow_item::{Entity as SlideshowItem, Model as SlideshowItemModel};
pub use testimonial::{Entity as Testimonial, Model as TestimonialModel};
pub use wishlist::{Entity as Wishlist, Model as WishlistModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
