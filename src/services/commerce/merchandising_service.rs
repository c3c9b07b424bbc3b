use crate::{
    entities::{
        promo_banner, slideshow_item, BannerSize, Product, PromoBanner, PromoBannerModel,
        SlideshowItem, SlideshowItemModel,
    },
    errors::ServiceError,
    services::commerce::ProductView,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Home-page merchandising: the hero slideshow and promotional banners.
///
/// Both lists are ordered by `position`, then creation time, and each entry
/// points at one catalog product.
#[derive(Clone)]
pub struct MerchandisingService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlideView {
    pub id: Uuid,
    pub product: ProductView,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BannerView {
    pub id: Uuid,
    pub product: ProductView,
    pub size: BannerSize,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSlideInput {
    pub product_id: Uuid,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub position: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSlideInput {
    #[validate(range(min = 0))]
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBannerInput {
    pub product_id: Uuid,
    #[serde(default)]
    pub size: BannerSize,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub position: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBannerInput {
    pub size: Option<BannerSize>,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

impl MerchandisingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active slides in display order.
    #[instrument(skip(self))]
    pub async fn list_slides(&self) -> Result<Vec<SlideView>, ServiceError> {
        Ok(SlideshowItem::find()
            .filter(slideshow_item::Column::IsActive.eq(true))
            .order_by_asc(slideshow_item::Column::Position)
            .order_by_asc(slideshow_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(slide, product)| product.map(|product| slide_view(slide, product.into())))
            .collect())
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_slide(&self, input: CreateSlideInput) -> Result<SlideView, ServiceError> {
        input.validate()?;
        let product = self.product_view(input.product_id).await?;

        let now = Utc::now();
        let slide = slideshow_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            position: Set(input.position),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(slide_id = %slide.id, "slide created");
        Ok(slide_view(slide, product))
    }

    #[instrument(skip(self, input))]
    pub async fn update_slide(
        &self,
        slide_id: Uuid,
        input: UpdateSlideInput,
    ) -> Result<SlideView, ServiceError> {
        input.validate()?;
        let slide = SlideshowItem::find_by_id(slide_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("slide", slide_id))?;

        let mut active: slideshow_item::ActiveModel = slide.into();
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        let slide = active.update(&*self.db).await?;

        let product = self.product_view(slide.product_id).await?;
        Ok(slide_view(slide, product))
    }

    #[instrument(skip(self))]
    pub async fn delete_slide(&self, slide_id: Uuid) -> Result<(), ServiceError> {
        let result = SlideshowItem::delete_by_id(slide_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("slide", slide_id));
        }
        Ok(())
    }

    /// Active banners in display order.
    #[instrument(skip(self))]
    pub async fn list_banners(&self) -> Result<Vec<BannerView>, ServiceError> {
        Ok(PromoBanner::find()
            .filter(promo_banner::Column::IsActive.eq(true))
            .order_by_asc(promo_banner::Column::Position)
            .order_by_asc(promo_banner::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(banner, product)| {
                product.map(|product| banner_view(banner, product.into()))
            })
            .collect())
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_banner(
        &self,
        input: CreateBannerInput,
    ) -> Result<BannerView, ServiceError> {
        input.validate()?;
        let product = self.product_view(input.product_id).await?;

        let now = Utc::now();
        let banner = promo_banner::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            size: Set(input.size),
            position: Set(input.position),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(banner_id = %banner.id, size = ?banner.size, "banner created");
        Ok(banner_view(banner, product))
    }

    #[instrument(skip(self, input))]
    pub async fn update_banner(
        &self,
        banner_id: Uuid,
        input: UpdateBannerInput,
    ) -> Result<BannerView, ServiceError> {
        input.validate()?;
        let banner = PromoBanner::find_by_id(banner_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("banner", banner_id))?;

        let mut active: promo_banner::ActiveModel = banner.into();
        if let Some(size) = input.size {
            active.size = Set(size);
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        let banner = active.update(&*self.db).await?;

        let product = self.product_view(banner.product_id).await?;
        Ok(banner_view(banner, product))
    }

    #[instrument(skip(self))]
    pub async fn delete_banner(&self, banner_id: Uuid) -> Result<(), ServiceError> {
        let result = PromoBanner::delete_by_id(banner_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("banner", banner_id));
        }
        Ok(())
    }

    async fn product_view(&self, product_id: Uuid) -> Result<ProductView, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .map(ProductView::from)
            .ok_or_else(|| ServiceError::not_found("product", product_id))
    }
}

fn slide_view(slide: SlideshowItemModel, product: ProductView) -> SlideView {
    SlideView {
        id: slide.id,
        product,
        position: slide.position,
        is_active: slide.is_active,
        created_at: slide.created_at,
        updated_at: slide.updated_at,
    }
}

fn banner_view(banner: PromoBannerModel, product: ProductView) -> BannerView {
    BannerView {
        id: banner.id,
        product,
        size: banner.size,
        position: banner.position,
        is_active: banner.is_active,
        created_at: banner.created_at,
        updated_at: banner.updated_at,
    }
}
