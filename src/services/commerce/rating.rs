//! Keeps `reviews_count` and `average_rating` on a product consistent with
//! its reviews.
//!
//! Review create and delete call [`recompute_product_rating`] directly once
//! their own write has committed. The two writes are not atomic: a failure in
//! between leaves a stale aggregate until the next review event.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    entities::{product, review, Product, ProductModel, Review},
    errors::ServiceError,
};

/// Count and mean of a set of ratings; the mean is 0 for an empty set and
/// is rounded to two decimal places.
pub fn aggregate(ratings: &[i16]) -> (i32, Decimal) {
    if ratings.is_empty() {
        return (0, Decimal::ZERO);
    }
    let count = ratings.len() as i32;
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let average = (Decimal::from(sum) / Decimal::from(count)).round_dp(2);
    (count, average)
}

/// Recomputes the aggregate fields from the current review set and writes
/// only those two columns back.
#[instrument(skip(conn))]
pub async fn recompute_product_rating<C>(
    conn: &C,
    product_id: Uuid,
) -> Result<ProductModel, ServiceError>
where
    C: ConnectionTrait,
{
    let product = Product::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("product", product_id))?;

    let ratings: Vec<i16> = Review::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::ProductId.eq(product_id))
        .into_tuple()
        .all(conn)
        .await?;

    let (reviews_count, average_rating) = aggregate(&ratings);
    debug!(%product_id, reviews_count, %average_rating, "writing rating aggregate");

    let mut active: product::ActiveModel = product.into();
    active.reviews_count = Set(reviews_count);
    active.average_rating = Set(average_rating);
    Ok(active.update(conn).await?)
}
