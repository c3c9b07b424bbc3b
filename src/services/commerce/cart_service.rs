use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::pricing,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-user shopping cart.
///
/// A cart holds at most one line per product. Adding a product that is
/// already in the cart increments that line; the increment happens in a
/// single `INSERT .. ON CONFLICT DO UPDATE` statement so concurrent adds for
/// the same product cannot lose an update.
///
/// # Examples
///
/// ```ignore
/// let cart = cart_service.get_or_create_cart("user-42").await?;
/// cart_service.add_item(cart.id, product_id, 2).await?;
/// cart_service.add_item(cart.id, product_id, 1).await?; // line quantity is now 3
/// ```
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// A cart line together with its product and live pricing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    #[schema(value_type = Object)]
    pub item: CartItemModel,
    #[schema(value_type = Object)]
    pub product: ProductModel,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartWithItems {
    #[schema(value_type = Object)]
    pub cart: CartModel,
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: &str) -> Result<CartModel, ServiceError> {
        get_or_create_cart(&*self.db, user_id).await
    }

    /// Returns the user's cart without creating one.
    #[instrument(skip(self))]
    pub async fn find_cart(&self, user_id: &str) -> Result<Option<CartModel>, ServiceError> {
        find_cart(&*self.db, user_id).await
    }

    /// Adds `quantity` of a product to the cart.
    ///
    /// # Returns
    ///
    /// * `Ok(CartItemModel)` - The line after the merge
    /// * `Err(ServiceError::InvalidArgument)` - `quantity` is below 1, or the
    ///   merged quantity would not fit in an `i32`
    /// * `Err(ServiceError::NotFound)` - Cart or product does not exist
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemModel, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("cart", cart_id))?;
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;

        // The upsert is the first statement so the transaction takes the
        // write lock before it reads anything.
        let txn = self.db.begin().await?;

        let line = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
        };
        // The WHERE clause skips the update instead of overflowing the column.
        let on_conflict = OnConflict::columns([cart_item::Column::CartId, cart_item::Column::ProductId])
            .value(
                cart_item::Column::Quantity,
                Expr::col((cart_item::Entity, cart_item::Column::Quantity)).add(quantity),
            )
            .action_and_where(
                Expr::col((cart_item::Entity, cart_item::Column::Quantity))
                    .lte(i32::MAX - quantity),
            )
            .to_owned();
        let written = CartItem::insert(line)
            .on_conflict(on_conflict)
            .exec_without_returning(&txn)
            .await?;
        if written == 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "quantity for product {} would exceed {}",
                product_id,
                i32::MAX
            )));
        }

        let item = find_line(&txn, cart_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cart line for product", product_id))?;
        touch_cart(&txn, cart_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id,
                quantity,
            })
            .await;

        info!(%cart_id, %product_id, quantity = item.quantity, "cart line merged");
        Ok(item)
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// A missing line is reported before the quantity is checked. Neither
    /// rejection writes anything.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        new_quantity: i32,
    ) -> Result<CartItemModel, ServiceError> {
        let item = find_line(&*self.db, cart_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cart line for product", product_id))?;

        if new_quantity < 1 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        let item = active.update(&*self.db).await?;
        touch_cart(&*self.db, cart_id).await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id,
                product_id,
                quantity: new_quantity,
            })
            .await;

        Ok(item)
    }

    /// Deletes a line. Fails with `NotFound` when there is no such line,
    /// including on a repeated call.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("cart line for product", product_id));
        }
        touch_cart(&*self.db, cart_id).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id,
                product_id,
            })
            .await;

        Ok(())
    }

    /// Deletes every line in the cart. Clearing an empty cart is a no-op.
    #[instrument(skip(self))]
    pub async fn clear(&self, cart_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            touch_cart(&*self.db, cart_id).await?;
            self.event_sender.send_or_log(Event::CartCleared(cart_id)).await;
        }

        Ok(result.rows_affected)
    }

    /// The cart with each line priced at the product's current unit price.
    #[instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn cart_with_items(&self, cart: CartModel) -> Result<CartWithItems, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(Product)
            .order_by_asc(cart_item::Column::Id)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product =
                product.ok_or_else(|| ServiceError::not_found("product", item.product_id))?;
            let unit_price = pricing::resolve_unit_price(&product);
            items.push(CartLine {
                line_total: pricing::line_total(unit_price, item.quantity),
                unit_price,
                item,
                product,
            });
        }
        let subtotal = items.iter().map(|line| line.line_total).sum();

        Ok(CartWithItems {
            cart,
            items,
            subtotal,
        })
    }
}

pub(crate) async fn get_or_create_cart<C>(conn: &C, user_id: &str) -> Result<CartModel, ServiceError>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cart(conn, user_id).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let cart = cart::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    // A concurrent first access may win the insert; either way one cart exists.
    Cart::insert(cart)
        .on_conflict(OnConflict::column(cart::Column::UserId).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    find_cart(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("cart for user", user_id))
}

pub(crate) async fn find_cart<C>(conn: &C, user_id: &str) -> Result<Option<CartModel>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(conn)
        .await?)
}

async fn find_line<C>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
) -> Result<Option<CartItemModel>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(conn)
        .await?)
}

async fn touch_cart<C>(conn: &C, cart_id: Uuid) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    Cart::update_many()
        .col_expr(cart::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(cart::Column::Id.eq(cart_id))
        .exec(conn)
        .await?;
    Ok(())
}
