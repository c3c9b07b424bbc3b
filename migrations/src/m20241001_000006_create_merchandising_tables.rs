use sea_orm_migration::prelude::*;

use super::m20241001_000001_create_catalog_tables::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SlideshowItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SlideshowItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SlideshowItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(SlideshowItems::Position)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(SlideshowItems::Position).gte(0)),
                    )
                    .col(
                        ColumnDef::new(SlideshowItems::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SlideshowItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SlideshowItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_slideshow_items_product_id")
                            .from(SlideshowItems::Table, SlideshowItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PromoBanners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoBanners::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PromoBanners::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(PromoBanners::Size)
                            .string_len(10)
                            .not_null()
                            .default("small"),
                    )
                    .col(
                        ColumnDef::new(PromoBanners::Position)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(PromoBanners::Position).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PromoBanners::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PromoBanners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromoBanners::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promo_banners_product_id")
                            .from(PromoBanners::Table, PromoBanners::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoBanners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SlideshowItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SlideshowItems {
    Table,
    Id,
    ProductId,
    Position,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PromoBanners {
    Table,
    Id,
    ProductId,
    Size,
    Position,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
