use crate::{
    auth::AuthUser,
    entities::{review, Product, ProductModel, Review, ReviewModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::rating,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product reviews. Creating or deleting a review refreshes the product's
/// rating aggregate afterwards; editing one does not.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 1, max = 5000))]
    pub comment: String,
    /// Required for guests; defaults to the token's display name otherwise.
    #[validate(length(min = 1, max = 100))]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    #[validate(length(min = 1, max = 5000))]
    pub comment: Option<String>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Newest first.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<ReviewModel>, ServiceError> {
        self.find_product(product_id).await?;
        Ok(Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn create_review(
        &self,
        actor: Option<&AuthUser>,
        product_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        input.validate()?;
        self.find_product(product_id).await?;

        let user_name = match (actor, input.user_name) {
            (_, Some(name)) => name,
            (Some(user), None) => user.display_name(),
            (None, None) => {
                return Err(ServiceError::InvalidArgument(
                    "user_name is required for guest reviews".to_string(),
                ))
            }
        };

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(actor.map(|a| a.user_id.clone())),
            user_name: Set(user_name),
            rating: Set(input.rating),
            comment: Set(input.comment),
            created_at: Set(Utc::now()),
        };
        let review = review.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewCreated {
                review_id: review.id,
                product_id,
            })
            .await;
        self.refresh_rating(product_id).await?;

        info!(review_id = %review.id, %product_id, rating = review.rating, "review created");
        Ok(review)
    }

    /// Owner or staff only. The product aggregate is left untouched.
    #[instrument(skip(self, actor, input))]
    pub async fn update_review(
        &self,
        actor: Option<&AuthUser>,
        review_id: Uuid,
        input: UpdateReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        input.validate()?;
        let existing = self.find_editable(actor, review_id).await?;

        let mut active: review::ActiveModel = existing.into();
        if let Some(rating) = input.rating {
            active.rating = Set(rating);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(comment);
        }
        Ok(active.update(&*self.db).await?)
    }

    /// Owner or staff only. Refreshes the product aggregate after the delete.
    #[instrument(skip(self, actor))]
    pub async fn delete_review(
        &self,
        actor: Option<&AuthUser>,
        review_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.find_editable(actor, review_id).await?;
        let product_id = existing.product_id;
        existing.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewDeleted {
                review_id,
                product_id,
            })
            .await;
        self.refresh_rating(product_id).await?;
        Ok(())
    }

    async fn find_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))
    }

    async fn find_editable(
        &self,
        actor: Option<&AuthUser>,
        review_id: Uuid,
    ) -> Result<ReviewModel, ServiceError> {
        let actor = actor.ok_or_else(|| {
            ServiceError::Unauthorized("sign in to modify reviews".to_string())
        })?;
        let review = Review::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("review", review_id))?;

        let is_owner = review.user_id.as_deref() == Some(actor.user_id.as_str());
        if !is_owner && !actor.is_staff() {
            return Err(ServiceError::Forbidden(
                "only the author or staff may modify this review".to_string(),
            ));
        }
        Ok(review)
    }

    async fn refresh_rating(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = rating::recompute_product_rating(&*self.db, product_id)
            .await
            .map_err(|e| {
                warn!(%product_id, error = %e, "rating aggregate left stale");
                e
            })?;
        self.event_sender
            .send_or_log(Event::ProductRatingRecomputed {
                product_id,
                reviews_count: product.reviews_count,
                average_rating: product.average_rating,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_support::migrated_sqlite,
        services::commerce::product_catalog_service::test_support::insert_product,
    };
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    async fn setup() -> (ReviewService, Arc<DatabaseConnection>, ProductModel) {
        let db = Arc::new(migrated_sqlite().await);
        let product = insert_product(&*db, "Magnetic Mount", dec!(22.00), None).await;
        let (tx, _rx) = mpsc::channel(64);
        (
            ReviewService::new(db.clone(), Arc::new(EventSender::new(tx))),
            db,
            product,
        )
    }

    fn user(id: &str, roles: &[&str]) -> AuthUser {
        AuthUser {
            user_id: id.into(),
            name: Some(format!("Name of {}", id)),
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn input(rating: i16) -> CreateReviewInput {
        CreateReviewInput {
            rating,
            comment: "Holds the phone firmly".into(),
            user_name: None,
        }
    }

    async fn reload(db: &DatabaseConnection, id: Uuid) -> ProductModel {
        Product::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn create_and_delete_drive_the_aggregate() {
        let (svc, db, product) = setup().await;
        let author = user("user-1", &[]);

        let review = svc
            .create_review(Some(&author), product.id, input(5))
            .await
            .unwrap();
        assert_eq!(review.user_name, "Name of user-1");
        let after_create = reload(&db, product.id).await;
        assert_eq!(after_create.reviews_count, 1);
        assert_eq!(after_create.average_rating, dec!(5));

        svc.delete_review(Some(&author), review.id).await.unwrap();
        let after_delete = reload(&db, product.id).await;
        assert_eq!(after_delete.reviews_count, 0);
        assert_eq!(after_delete.average_rating, Decimal::ZERO);
    }

    #[tokio::test]
    async fn update_does_not_recompute() {
        let (svc, db, product) = setup().await;
        let author = user("user-1", &[]);
        let review = svc
            .create_review(Some(&author), product.id, input(5))
            .await
            .unwrap();

        let updated = svc
            .update_review(
                Some(&author),
                review.id,
                UpdateReviewInput {
                    rating: Some(1),
                    comment: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 1);
        assert_eq!(reload(&db, product.id).await.average_rating, dec!(5));
    }

    #[tokio::test]
    async fn guests_must_name_themselves_and_ratings_are_bounded() {
        let (svc, _db, product) = setup().await;
        assert_matches!(
            svc.create_review(None, product.id, input(4)).await,
            Err(ServiceError::InvalidArgument(_))
        );

        let mut named = input(4);
        named.user_name = Some("Walk-in".into());
        let review = svc.create_review(None, product.id, named).await.unwrap();
        assert_eq!(review.user_id, None);

        for bad in [0, 6] {
            assert_matches!(
                svc.create_review(Some(&user("u", &[])), product.id, input(bad))
                    .await,
                Err(ServiceError::InvalidArgument(_))
            );
        }
        assert_matches!(
            svc.create_review(None, Uuid::new_v4(), input(3)).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn only_owner_or_staff_may_modify() {
        let (svc, _db, product) = setup().await;
        let review = svc
            .create_review(Some(&user("owner", &[])), product.id, input(3))
            .await
            .unwrap();

        assert_matches!(
            svc.delete_review(None, review.id).await,
            Err(ServiceError::Unauthorized(_))
        );
        assert_matches!(
            svc.delete_review(Some(&user("stranger", &[])), review.id)
                .await,
            Err(ServiceError::Forbidden(_))
        );
        svc.delete_review(Some(&user("moderator", &["staff"])), review.id)
            .await
            .unwrap();
        assert_matches!(
            svc.delete_review(Some(&user("owner", &[])), review.id).await,
            Err(ServiceError::NotFound(_))
        );
    }
}
