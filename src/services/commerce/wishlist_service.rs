use crate::{
    entities::{
        wishlist, wishlist_item, Product, ProductModel, Wishlist, WishlistItem,
        WishlistItemModel, WishlistModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Saved-for-later products, one list per user
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WishlistWithItems {
    #[schema(value_type = Object)]
    pub wishlist: WishlistModel,
    #[schema(value_type = Vec<Object>)]
    pub products: Vec<ProductModel>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: &str) -> Result<WishlistModel, ServiceError> {
        if let Some(existing) = self.find(user_id).await? {
            return Ok(existing);
        }

        let wishlist = wishlist::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now()),
        };
        Wishlist::insert(wishlist)
            .on_conflict(
                OnConflict::column(wishlist::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        self.find(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("wishlist for user", user_id))
    }

    /// Most recently added first.
    #[instrument(skip(self))]
    pub async fn view(&self, user_id: &str) -> Result<WishlistWithItems, ServiceError> {
        let wishlist = self.get_or_create(user_id).await?;
        let products = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .order_by_desc(wishlist_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(_, product)| product)
            .collect();
        Ok(WishlistWithItems { wishlist, products })
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: Uuid,
    ) -> Result<WishlistItemModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;
        let wishlist = self.get_or_create(user_id).await?;

        let present = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await?;
        if present > 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "product {} is already in the wishlist",
                product_id
            )));
        }

        let item = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            wishlist_id: Set(wishlist.id),
            product_id: Set(product_id),
            added_at: Set(Utc::now()),
        };
        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WishlistItemAdded {
                wishlist_id: wishlist.id,
                product_id,
            })
            .await;
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: &str, product_id: Uuid) -> Result<(), ServiceError> {
        let wishlist = self
            .find(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("wishlist entry for product", product_id))?;

        let result = WishlistItem::delete_many()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found(
                "wishlist entry for product",
                product_id,
            ));
        }

        self.event_sender
            .send_or_log(Event::WishlistItemRemoved {
                wishlist_id: wishlist.id,
                product_id,
            })
            .await;
        Ok(())
    }

    /// Always succeeds, even when the user never had a wishlist.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: &str) -> Result<(), ServiceError> {
        if let Some(wishlist) = self.find(user_id).await? {
            WishlistItem::delete_many()
                .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
                .exec(&*self.db)
                .await?;
        }
        Ok(())
    }

    async fn find(&self, user_id: &str) -> Result<Option<WishlistModel>, ServiceError> {
        Ok(Wishlist::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?)
    }
}
