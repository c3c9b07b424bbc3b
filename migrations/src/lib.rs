pub use sea_orm_migration::prelude::*;

mod m20241001_000001_create_catalog_tables;
mod m20241001_000002_create_cart_tables;
mod m20241001_000003_create_order_tables;
mod m20241001_000004_create_review_tables;
mod m20241001_000005_create_wishlist_tables;
mod m20241001_000006_create_merchandising_tables;
mod m20241001_000007_create_address_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_catalog_tables::Migration),
            Box::new(m20241001_000002_create_cart_tables::Migration),
            Box::new(m20241001_000003_create_order_tables::Migration),
            Box::new(m20241001_000004_create_review_tables::Migration),
            Box::new(m20241001_000005_create_wishlist_tables::Migration),
            Box::new(m20241001_000006_create_merchandising_tables::Migration),
            Box::new(m20241001_000007_create_address_tables::Migration),
        ]
    }
}
