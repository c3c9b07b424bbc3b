use crate::{
    entities::{
        brand, category, phone_model, product, product_media, product_phone_model, Brand,
        BrandModel, Category, CategoryModel, MediaType, PhoneModel, PhoneModelModel, Product,
        ProductMedia, ProductMediaModel, ProductModel, ProductPhoneModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::pricing,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use unicode_normalization::UnicodeNormalization;
use validator::{Validate, ValidationError};

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").unwrap());

/// Lowercase, hyphen-separated ASCII form of `name`. Accented letters are
/// decomposed (NFKD) and keep their base letter; anything else outside ASCII
/// is dropped. Falls back to `item` when nothing usable is left.
pub fn slugify(name: &str) -> String {
    let folded: String = name.nfkd().filter(char::is_ascii).collect();
    let lowered = folded.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(stripped.trim(), "-");
    let slug = joined.trim_matches(|c: char| c == '-' || c == '_');
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug.to_string()
    }
}

/// First free slug among `base`, `base-1`, `base-2`, ...
async fn unique_slug<E, C>(conn: &C, column: E::Column, base: &str) -> Result<String, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut candidate = base.to_string();
    let mut suffix = 0u32;
    loop {
        let taken = E::find()
            .filter(column.eq(candidate.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// Catalog reads and staff-side catalog writes
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// A product together with the price a customer pays right now
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductView {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub product: ProductModel,
    #[schema(value_type = String, example = "19.99")]
    pub unit_price: Decimal,
    pub discount_percentage: Option<i64>,
}

impl From<ProductModel> for ProductView {
    fn from(product: ProductModel) -> Self {
        Self {
            unit_price: pricing::resolve_unit_price(&product),
            discount_percentage: pricing::discount_percentage(&product),
            product,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Only products compatible with this phone model
    pub phone_model_id: Option<Uuid>,
}

/// Top-level category with its subtree. `product_count` counts the products
/// filed directly under the node, available or not.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    pub product_count: u64,
    #[schema(value_type = Vec<Object>)]
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Phone models the product fits
    #[serde(default)]
    pub compatible_with: Vec<Uuid>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "24.99")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>, example = "19.99")]
    pub discounted_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub is_available: Option<bool>,
    pub color: Option<String>,
    pub material: Option<String>,
    #[serde(default)]
    pub is_new_arrival: bool,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBrandInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePhoneModelInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetCompatibilityInput {
    pub phone_model_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddProductMediaInput {
    pub media_type: MediaType,
    #[validate(url)]
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub position: i32,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("product with slug", slug))
    }

    /// Available products, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let mut query = Product::find().filter(product::Column::IsAvailable.eq(true));
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(product::Column::BrandId.eq(brand_id));
        }
        if let Some(phone_model_id) = filter.phone_model_id {
            query = query
                .join(JoinType::InnerJoin, product::Relation::Compatibility.def())
                .filter(product_phone_model::Column::PhoneModelId.eq(phone_model_id));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Creates a product with a slug derived from its name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        if let Some(category_id) = input.category_id {
            Category::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("category", category_id))?;
        }
        if let Some(brand_id) = input.brand_id {
            Brand::find_by_id(brand_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("brand", brand_id))?;
        }
        let phone_model_ids = existing_phone_models(&*self.db, &input.compatible_with).await?;
        if let Some(sku) = &input.sku {
            let clash = Product::find()
                .filter(product::Column::Sku.eq(sku.as_str()))
                .count(&*self.db)
                .await?;
            if clash > 0 {
                return Err(ServiceError::InvalidArgument(format!(
                    "SKU {} already exists",
                    sku
                )));
            }
        }

        let txn = self.db.begin().await?;
        let product = build_product(&txn, input).await?;
        let product = product.insert(&txn).await?;
        link_phone_models(&txn, product.id, &phone_model_ids).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;
        info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn list_product_media(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductMediaModel>, ServiceError> {
        self.get_product(product_id).await?;
        Ok(ProductMedia::find()
            .filter(product_media::Column::ProductId.eq(product_id))
            .order_by_asc(product_media::Column::Position)
            .all(&*self.db)
            .await?)
    }

    /// Records a media URL for a product. Uploading the file itself happens
    /// elsewhere.
    #[instrument(skip(self, input))]
    pub async fn add_product_media(
        &self,
        product_id: Uuid,
        input: AddProductMediaInput,
    ) -> Result<ProductMediaModel, ServiceError> {
        input.validate()?;
        self.get_product(product_id).await?;

        let media = product_media::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            media_type: Set(input.media_type),
            url: Set(input.url),
            alt_text: Set(input.alt_text),
            position: Set(input.position),
        };
        Ok(media.insert(&*self.db).await?)
    }

    /// Phone models the product is compatible with, by name.
    #[instrument(skip(self))]
    pub async fn list_compatible_phone_models(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<PhoneModelModel>, ServiceError> {
        let product = self.get_product(product_id).await?;
        Ok(product
            .find_related(PhoneModel)
            .order_by_asc(phone_model::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Replaces the product's compatibility set. Duplicate ids collapse; an
    /// unknown id rejects the whole update.
    #[instrument(skip(self, phone_model_ids))]
    pub async fn set_compatible_phone_models(
        &self,
        product_id: Uuid,
        phone_model_ids: &[Uuid],
    ) -> Result<Vec<PhoneModelModel>, ServiceError> {
        self.get_product(product_id).await?;
        let ids = existing_phone_models(&*self.db, phone_model_ids).await?;

        let txn = self.db.begin().await?;
        ProductPhoneModel::delete_many()
            .filter(product_phone_model::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        link_phone_models(&txn, product_id, &ids).await?;
        txn.commit().await?;

        info!(%product_id, count = ids.len(), "product compatibility replaced");
        self.list_compatible_phone_models(product_id).await
    }

    /// Top-level categories, each with its product count and subtree. Siblings
    /// are ordered by name.
    #[instrument(skip(self))]
    pub async fn category_tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        let counts: HashMap<Uuid, u64> = Product::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "product_count")
            .filter(product::Column::CategoryId.is_not_null())
            .group_by(product::Column::CategoryId)
            .into_tuple::<(Option<Uuid>, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(id, n)| id.map(|id| (id, n.max(0) as u64)))
            .collect();

        let mut by_parent: HashMap<Option<Uuid>, Vec<CategoryModel>> = HashMap::new();
        for category in categories {
            by_parent.entry(category.parent_id).or_default().push(category);
        }
        Ok(build_category_level(None, &mut by_parent, &counts))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;
        if let Some(parent_id) = input.parent_id {
            Category::find_by_id(parent_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("category", parent_id))?;
        }

        let slug =
            unique_slug::<Category, _>(&*self.db, category::Column::Slug, &slugify(&input.name))
                .await?;
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            parent_id: Set(input.parent_id),
            description: Set(input.description),
        };
        Ok(category.insert(&*self.db).await?)
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandModel>, ServiceError> {
        Ok(Brand::find()
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_brand(&self, input: CreateBrandInput) -> Result<BrandModel, ServiceError> {
        input.validate()?;
        let slug = unique_slug::<Brand, _>(&*self.db, brand::Column::Slug, &slugify(&input.name))
            .await?;
        let brand = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
        };
        Ok(brand.insert(&*self.db).await?)
    }

    pub async fn list_phone_models(
        &self,
        brand_id: Uuid,
    ) -> Result<Vec<PhoneModelModel>, ServiceError> {
        Ok(PhoneModel::find()
            .filter(phone_model::Column::BrandId.eq(brand_id))
            .order_by_asc(phone_model::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_phone_model(
        &self,
        brand_id: Uuid,
        input: CreatePhoneModelInput,
    ) -> Result<PhoneModelModel, ServiceError> {
        input.validate()?;
        Brand::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("brand", brand_id))?;

        let slug = unique_slug::<PhoneModel, _>(
            &*self.db,
            phone_model::Column::Slug,
            &slugify(&input.name),
        )
        .await?;
        let model = phone_model::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(brand_id),
            name: Set(input.name),
            slug: Set(slug),
        };
        Ok(model.insert(&*self.db).await?)
    }
}

async fn build_product<C>(
    conn: &C,
    input: CreateProductInput,
) -> Result<product::ActiveModel, ServiceError>
where
    C: ConnectionTrait,
{
    let slug = unique_slug::<Product, _>(conn, product::Column::Slug, &slugify(&input.name)).await?;
    let now = Utc::now();
    Ok(product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name),
        slug: Set(slug),
        description: Set(input.description),
        sku: Set(input.sku),
        category_id: Set(input.category_id),
        brand_id: Set(input.brand_id),
        price: Set(input.price),
        discounted_price: Set(input.discounted_price),
        stock_quantity: Set(input.stock_quantity.unwrap_or(10)),
        is_available: Set(input.is_available.unwrap_or(true)),
        color: Set(input.color),
        material: Set(input.material),
        reviews_count: Set(0),
        average_rating: Set(Decimal::ZERO),
        is_new_arrival: Set(input.is_new_arrival),
        is_best_seller: Set(input.is_best_seller),
        is_featured: Set(input.is_featured),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

/// Deduplicated `ids`, failing with NotFound on the first id that names no
/// phone model.
async fn existing_phone_models<C>(conn: &C, ids: &[Uuid]) -> Result<Vec<Uuid>, ServiceError>
where
    C: ConnectionTrait,
{
    let wanted: BTreeSet<Uuid> = ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let found: BTreeSet<Uuid> = PhoneModel::find()
        .filter(phone_model::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| model.id)
        .collect();
    if let Some(missing) = wanted.difference(&found).next() {
        return Err(ServiceError::not_found("phone model", missing));
    }
    Ok(wanted.into_iter().collect())
}

async fn link_phone_models<C>(
    conn: &C,
    product_id: Uuid,
    phone_model_ids: &[Uuid],
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if phone_model_ids.is_empty() {
        return Ok(());
    }
    let links = phone_model_ids
        .iter()
        .map(|phone_model_id| product_phone_model::ActiveModel {
            product_id: Set(product_id),
            phone_model_id: Set(*phone_model_id),
        });
    ProductPhoneModel::insert_many(links)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

fn build_category_level(
    parent_id: Option<Uuid>,
    by_parent: &mut HashMap<Option<Uuid>, Vec<CategoryModel>>,
    counts: &HashMap<Uuid, u64>,
) -> Vec<CategoryNode> {
    let Some(level) = by_parent.remove(&parent_id) else {
        return Vec::new();
    };
    level
        .into_iter()
        .map(|category| CategoryNode {
            children: build_category_level(Some(category.id), by_parent, counts),
            product_count: counts.get(&category.id).copied().unwrap_or(0),
            id: category.id,
            name: category.name,
            slug: category.slug,
            parent_id: category.parent_id,
            description: category.description,
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::product_input;
    use super::*;
    use crate::db::test_support::migrated_sqlite;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    async fn service() -> ProductCatalogService {
        let db = Arc::new(migrated_sqlite().await);
        let (tx, _rx) = mpsc::channel(64);
        ProductCatalogService::new(db, Arc::new(EventSender::new(tx)))
    }

    #[rstest]
    #[case("iPhone 15 Pro Case", "iphone-15-pro-case")]
    #[case("  MagSafe -- Charger  ", "magsafe-charger")]
    #[case("USB-C (2m) Cable!", "usb-c-2m-cable")]
    #[case("***", "item")]
    #[case("Café Crème Case", "cafe-creme-case")]
    #[case("Über_Grip ✨", "uber_grip")]
    fn slugify_cases(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slugify(name), expected);
    }

    #[tokio::test]
    async fn duplicate_names_get_numbered_slugs() {
        let svc = service().await;
        let first = svc
            .create_product(product_input("Silicone Case", dec!(10.00), None))
            .await
            .unwrap();
        let second = svc
            .create_product(product_input("Silicone Case", dec!(11.00), None))
            .await
            .unwrap();
        let third = svc
            .create_product(product_input("Silicone Case", dec!(12.00), None))
            .await
            .unwrap();

        assert_eq!(first.slug, "silicone-case");
        assert_eq!(second.slug, "silicone-case-1");
        assert_eq!(third.slug, "silicone-case-2");
        assert_eq!(first.stock_quantity, 10);
        assert!(first.is_available);

        let by_slug = svc.get_product_by_slug("silicone-case-1").await.unwrap();
        assert_eq!(by_slug.id, second.id);
    }

    #[tokio::test]
    async fn create_product_rejects_negative_price_and_unknown_brand() {
        let svc = service().await;
        assert_matches!(
            svc.create_product(product_input("Bad", dec!(-1.00), None)).await,
            Err(ServiceError::InvalidArgument(_))
        );

        let mut input = product_input("Orphan", dec!(5.00), None);
        input.brand_id = Some(Uuid::new_v4());
        assert_matches!(svc.create_product(input).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_brand_and_hides_unavailable() {
        let svc = service().await;
        let brand = svc
            .create_brand(CreateBrandInput {
                name: "Spigen".into(),
            })
            .await
            .unwrap();

        let mut branded = product_input("Rugged Armor", dec!(15.00), None);
        branded.brand_id = Some(brand.id);
        let branded = svc.create_product(branded).await.unwrap();
        svc.create_product(product_input("Generic Case", dec!(5.00), None))
            .await
            .unwrap();
        let mut hidden = product_input("Discontinued", dec!(5.00), None);
        hidden.is_available = Some(false);
        svc.create_product(hidden).await.unwrap();

        let (all, total) = svc
            .list_products(&ProductFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!((all.len(), total), (2, 2));

        let filter = ProductFilter {
            brand_id: Some(brand.id),
            ..Default::default()
        };
        let (only_brand, _) = svc.list_products(&filter, 1, 20).await.unwrap();
        assert_eq!(only_brand.len(), 1);
        assert_eq!(only_brand[0].id, branded.id);
    }

    #[tokio::test]
    async fn phone_models_and_media_hang_off_their_parents() {
        let svc = service().await;
        let brand = svc
            .create_brand(CreateBrandInput {
                name: "Apple".into(),
            })
            .await
            .unwrap();
        let model = svc
            .create_phone_model(
                brand.id,
                CreatePhoneModelInput {
                    name: "iPhone 15".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(model.slug, "iphone-15");
        assert_eq!(svc.list_phone_models(brand.id).await.unwrap().len(), 1);

        let product = svc
            .create_product(product_input("Clear Case", dec!(9.00), None))
            .await
            .unwrap();
        svc.add_product_media(
            product.id,
            AddProductMediaInput {
                media_type: MediaType::Image,
                url: "https://cdn.example.com/clear-case.jpg".into(),
                alt_text: None,
                position: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.list_product_media(product.id).await.unwrap().len(), 1);
        assert_matches!(
            svc.list_product_media(Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn compatibility_is_set_on_create_and_replaced_later() {
        let svc = service().await;
        let brand = svc
            .create_brand(CreateBrandInput {
                name: "Samsung".into(),
            })
            .await
            .unwrap();
        let mut models = Vec::new();
        for name in ["Galaxy S24", "Galaxy A55", "Galaxy Z Flip"] {
            models.push(
                svc.create_phone_model(brand.id, CreatePhoneModelInput { name: name.into() })
                    .await
                    .unwrap(),
            );
        }

        let mut input = product_input("Slim Case", dec!(14.00), None);
        input.compatible_with = vec![models[0].id, models[1].id, models[0].id];
        let product = svc.create_product(input).await.unwrap();
        let fits = svc.list_compatible_phone_models(product.id).await.unwrap();
        let names: Vec<&str> = fits.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Galaxy A55", "Galaxy S24"]);

        let filter = ProductFilter {
            phone_model_id: Some(models[1].id),
            ..Default::default()
        };
        assert_eq!(svc.list_products(&filter, 1, 20).await.unwrap().1, 1);

        let replaced = svc
            .set_compatible_phone_models(product.id, &[models[2].id])
            .await
            .unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].id, models[2].id);
        assert_eq!(svc.list_products(&filter, 1, 20).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn unknown_phone_model_rejects_the_product() {
        let svc = service().await;
        let mut input = product_input("Mystery Case", dec!(7.00), None);
        input.compatible_with = vec![Uuid::new_v4()];
        assert_matches!(svc.create_product(input).await, Err(ServiceError::NotFound(_)));
        let (all, _) = svc
            .list_products(&ProductFilter::default(), 1, 20)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn category_tree_nests_children_and_counts_products() {
        let svc = service().await;
        let cases = svc
            .create_category(CreateCategoryInput {
                name: "Cases".into(),
                parent_id: None,
                description: None,
            })
            .await
            .unwrap();
        let leather = svc
            .create_category(CreateCategoryInput {
                name: "Leather".into(),
                parent_id: Some(cases.id),
                description: None,
            })
            .await
            .unwrap();
        svc.create_category(CreateCategoryInput {
            name: "Audio".into(),
            parent_id: None,
            description: None,
        })
        .await
        .unwrap();

        for (name, category) in [
            ("Folio", leather.id),
            ("Wallet", leather.id),
            ("Bumper", cases.id),
        ] {
            let mut input = product_input(name, dec!(20.00), None);
            input.category_id = Some(category);
            svc.create_product(input).await.unwrap();
        }

        let tree = svc.category_tree().await.unwrap();
        let roots: Vec<&str> = tree.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(roots, vec!["Audio", "Cases"]);
        assert_eq!(tree[0].product_count, 0);
        assert!(tree[0].children.is_empty());
        assert_eq!(tree[1].product_count, 1);
        assert_eq!(tree[1].children.len(), 1);
        assert_eq!(tree[1].children[0].slug, "leather");
        assert_eq!(tree[1].children[0].product_count, 2);
    }

    #[test]
    fn product_view_exposes_price_and_discount() {
        let view = ProductView::from(crate::services::commerce::pricing::test_support::product(
            dec!(40.00),
            Some(dec!(30.00)),
        ));
        assert_eq!(view.unit_price, dec!(30.00));
        assert_eq!(view.discount_percentage, Some(25));
    }
}
