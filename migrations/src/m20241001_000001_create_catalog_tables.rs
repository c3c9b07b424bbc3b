use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Categories::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Categories::Slug)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::ParentId).uuid().null())
                    .col(ColumnDef::new(Categories::Description).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent_id")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Brands::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Brands::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Brands::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Brands::Slug)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhoneModels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneModels::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PhoneModels::BrandId).uuid().not_null())
                    .col(ColumnDef::new(PhoneModels::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(PhoneModels::Slug)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_models_brand_id")
                            .from(PhoneModels::Table, PhoneModels::BrandId)
                            .to(Brands::Table, Brands::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Products::Slug)
                            .string_len(220)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::Sku).string_len(64).null().unique_key())
                    .col(ColumnDef::new(Products::CategoryId).uuid().null())
                    .col(ColumnDef::new(Products::BrandId).uuid().null())
                    .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Products::DiscountedPrice).decimal_len(10, 2).null())
                    .col(
                        ColumnDef::new(Products::StockQuantity)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(Products::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Products::Color).string_len(50).null())
                    .col(ColumnDef::new(Products::Material).string_len(50).null())
                    .col(
                        ColumnDef::new(Products::ReviewsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::AverageRating)
                            .decimal_len(3, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::IsNewArrival)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Products::IsBestSeller)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Products::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_brand_id")
                            .from(Products::Table, Products::BrandId)
                            .to(Brands::Table, Brands::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category_id")
                    .table(Products::Table)
                    .col(Products::CategoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductPhoneModels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProductPhoneModels::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductPhoneModels::PhoneModelId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(ProductPhoneModels::ProductId)
                            .col(ProductPhoneModels::PhoneModelId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_phone_models_product_id")
                            .from(ProductPhoneModels::Table, ProductPhoneModels::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_phone_models_phone_model_id")
                            .from(ProductPhoneModels::Table, ProductPhoneModels::PhoneModelId)
                            .to(PhoneModels::Table, PhoneModels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductMedia::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductMedia::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductMedia::MediaType).string_len(10).not_null())
                    .col(ColumnDef::new(ProductMedia::Url).string_len(500).not_null())
                    .col(ColumnDef::new(ProductMedia::AltText).string_len(200).null())
                    .col(
                        ColumnDef::new(ProductMedia::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_media_product_id")
                            .from(ProductMedia::Table, ProductMedia::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductMedia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductPhoneModels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PhoneModels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brands::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Categories {
    Table,
    Id,
    Name,
    Slug,
    ParentId,
    Description,
}

#[derive(DeriveIden)]
pub(crate) enum Brands {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum PhoneModels {
    Table,
    Id,
    BrandId,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum Products {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Sku,
    CategoryId,
    BrandId,
    Price,
    DiscountedPrice,
    StockQuantity,
    IsAvailable,
    Color,
    Material,
    ReviewsCount,
    AverageRating,
    IsNewArrival,
    IsBestSeller,
    IsFeatured,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductPhoneModels {
    Table,
    ProductId,
    PhoneModelId,
}

#[derive(DeriveIden)]
enum ProductMedia {
    Table,
    Id,
    ProductId,
    MediaType,
    Url,
    AltText,
    Position,
}
