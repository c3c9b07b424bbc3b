use crate::{
    auth::AuthUser,
    entities::{
        cart_item, order, order_item, CartItem, Order, OrderItem, OrderItemModel, OrderModel,
        OrderStatus, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::{cart_service, pricing},
};
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Order placement, lookup and staff updates.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Delivery details copied onto the order header
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ShippingAddress {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub street_address: String,
    #[validate(length(max = 255))]
    pub apartment_address: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

/// A caller-priced line. The price is stored exactly as given.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExplicitOrderItem {
    pub product_id: Uuid,
    #[schema(value_type = String, example = "9.99")]
    pub price: Decimal,
    pub quantity: i32,
}

/// Staff-writable order fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderInput {
    pub status: Option<OrderStatus>,
    pub is_paid: Option<bool>,
}

/// Which orders a principal may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    All,
    User(String),
}

impl From<&AuthUser> for OrderScope {
    fn from(user: &AuthUser) -> Self {
        if user.is_staff() {
            OrderScope::All
        } else {
            OrderScope::User(user.user_id.clone())
        }
    }
}

impl OrderScope {
    fn apply(&self, query: Select<Order>) -> Select<Order> {
        match self {
            OrderScope::All => query,
            OrderScope::User(user_id) => query.filter(order::Column::UserId.eq(user_id.as_str())),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[schema(value_type = Object)]
    pub order: OrderModel,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<OrderItemModel>,
}

impl OrderWithItems {
    /// Sum of frozen line prices times quantities.
    pub fn total_cost(&self) -> Decimal {
        total_of(&self.items)
    }
}

fn total_of(items: &[OrderItemModel]) -> Decimal {
    items.iter().map(OrderItemModel::cost).sum()
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order with caller-supplied prices. `buyer` is `None` for
    /// guest checkout.
    #[instrument(skip(self, address, items), fields(item_count = items.len()))]
    pub async fn create_order_explicit(
        &self,
        buyer: Option<&str>,
        address: ShippingAddress,
        items: Vec<ExplicitOrderItem>,
    ) -> Result<OrderWithItems, ServiceError> {
        address.validate()?;
        if items.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in &items {
            if item.quantity < 1 {
                return Err(ServiceError::InvalidArgument(format!(
                    "quantity for product {} must be at least 1",
                    item.product_id
                )));
            }
            if item.price < Decimal::ZERO {
                return Err(ServiceError::InvalidArgument(format!(
                    "price for product {} must not be negative",
                    item.product_id
                )));
            }
        }

        let txn = self.db.begin().await?;

        for item in &items {
            Product::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("product", item.product_id))?;
        }

        let header = insert_header(&txn, buyer, &address).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            lines.push(insert_line(&txn, header.id, item.product_id, item.price, item.quantity).await?);
        }

        txn.commit().await?;

        let placed = OrderWithItems {
            order: header,
            items: lines,
        };
        self.record_created(&placed, false).await;
        Ok(placed)
    }

    /// Converts the user's cart into an order at current prices and empties
    /// the cart. Nothing is written unless every step succeeds.
    #[instrument(skip(self, address))]
    pub async fn create_order_from_cart(
        &self,
        user_id: &str,
        address: ShippingAddress,
    ) -> Result<OrderWithItems, ServiceError> {
        address.validate()?;

        let txn = self.db.begin().await?;

        let cart = cart_service::find_cart(&txn, user_id)
            .await?
            .ok_or_else(|| ServiceError::InvalidState("cart is empty".to_string()))?;
        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(Product)
            .all(&txn)
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::InvalidState("cart is empty".to_string()));
        }

        let header = insert_header(&txn, Some(user_id), &address).await?;
        let mut lines = Vec::with_capacity(rows.len());
        for (cart_line, product) in rows {
            let product =
                product.ok_or_else(|| ServiceError::not_found("product", cart_line.product_id))?;
            let price = pricing::resolve_unit_price(&product);
            lines.push(insert_line(&txn, header.id, product.id, price, cart_line.quantity).await?);
        }

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        let placed = OrderWithItems {
            order: header,
            items: lines,
        };
        self.record_created(&placed, true).await;
        self.event_sender.send_or_log(Event::CartCleared(cart.id)).await;
        Ok(placed)
    }

    /// Total of an order, derived from its items on every call.
    #[instrument(skip(self))]
    pub async fn get_total_cost(&self, order_id: Uuid) -> Result<Decimal, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;
        let items = load_items(&*self.db, order_id).await?;
        Ok(total_of(&items))
    }

    /// Orders outside the caller's scope are reported as missing.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        scope: &OrderScope,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = scope
            .apply(Order::find_by_id(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;
        let items = load_items(&*self.db, order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        scope: &OrderScope,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderWithItems>, u64), ServiceError> {
        let paginator = scope
            .apply(Order::find())
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = load_items(&*self.db, order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok((result, total))
    }

    /// Staff-only update of status and payment flag. Any status may follow
    /// any other.
    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id))]
    pub async fn update_order(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<OrderWithItems, ServiceError> {
        actor.require_staff()?;

        let existing = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;
        let old_status = existing.status;
        let old_paid = existing.is_paid;

        let mut active: order::ActiveModel = existing.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(is_paid) = input.is_paid {
            active.is_paid = Set(is_paid);
        }
        active.updated_at = Set(Utc::now());
        let order = active.update(&*self.db).await?;

        if order.status != old_status {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: order.status,
                })
                .await;
        }
        if order.is_paid != old_paid {
            self.event_sender
                .send_or_log(Event::OrderPaymentChanged {
                    order_id,
                    is_paid: order.is_paid,
                })
                .await;
        }

        let items = load_items(&*self.db, order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    async fn record_created(&self, placed: &OrderWithItems, from_cart: bool) {
        let source = if from_cart { "cart" } else { "explicit" };
        counter!("orders_created_total", 1, "source" => source);

        let total = placed.total_cost();
        info!(
            order_id = %placed.order.id,
            item_count = placed.items.len(),
            %total,
            source,
            "order placed"
        );
        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id: placed.order.id,
                item_count: placed.items.len(),
                total,
                from_cart,
            })
            .await;
    }
}

async fn insert_header<C>(
    conn: &C,
    buyer: Option<&str>,
    address: &ShippingAddress,
) -> Result<OrderModel, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let header = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(buyer.map(str::to_string)),
        first_name: Set(address.first_name.clone()),
        last_name: Set(address.last_name.clone()),
        email: Set(address.email.clone()),
        street_address: Set(address.street_address.clone()),
        apartment_address: Set(address.apartment_address.clone()),
        postal_code: Set(address.postal_code.clone()),
        city: Set(address.city.clone()),
        country: Set(address.country.clone()),
        status: Set(OrderStatus::Pending),
        is_paid: Set(false),
        payment_transaction_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(header.insert(conn).await?)
}

async fn insert_line<C>(
    conn: &C,
    order_id: Uuid,
    product_id: Uuid,
    price: Decimal,
    quantity: i32,
) -> Result<OrderItemModel, ServiceError>
where
    C: ConnectionTrait,
{
    let line = order_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_id: Set(product_id),
        price: Set(price),
        quantity: Set(quantity),
    };
    Ok(line.insert(conn).await?)
}

async fn load_items<C>(conn: &C, order_id: Uuid) -> Result<Vec<OrderItemModel>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_support::migrated_sqlite,
        services::commerce::{
            cart_service::CartService, product_catalog_service::test_support::insert_product,
        },
    };
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::IntoActiveModel;
    use tokio::sync::mpsc;

    struct Fixture {
        db: Arc<DatabaseConnection>,
        orders: OrderService,
        carts: CartService,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(migrated_sqlite().await);
        let (tx, _rx) = mpsc::channel(64);
        let events = Arc::new(EventSender::new(tx));
        Fixture {
            orders: OrderService::new(db.clone(), events.clone()),
            carts: CartService::new(db.clone(), events),
            db,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            street_address: "12 Analytical Row".into(),
            apartment_address: None,
            postal_code: "10115".into(),
            city: "Berlin".into(),
            country: "DE".into(),
        }
    }

    fn staff() -> AuthUser {
        AuthUser {
            user_id: "staff-1".into(),
            name: Some("Sam".into()),
            email: None,
            roles: vec!["staff".into()],
        }
    }

    fn customer(id: &str) -> AuthUser {
        AuthUser {
            user_id: id.into(),
            name: None,
            email: None,
            roles: vec![],
        }
    }

    async fn order_count(db: &DatabaseConnection) -> u64 {
        Order::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn explicit_order_keeps_caller_prices() {
        let fx = fixture().await;
        let product = insert_product(&*fx.db, "Tempered Glass", dec!(15.00), Some(dec!(12.00))).await;

        let placed = fx
            .orders
            .create_order_explicit(
                None,
                address(),
                vec![ExplicitOrderItem {
                    product_id: product.id,
                    price: dec!(3.33),
                    quantity: 3,
                }],
            )
            .await
            .unwrap();

        assert_eq!(placed.order.user_id, None);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.items[0].price, dec!(3.33));
        assert_eq!(placed.total_cost(), dec!(9.99));
    }

    #[tokio::test]
    async fn explicit_order_rejects_bad_lines_without_writing() {
        let fx = fixture().await;
        let product = insert_product(&*fx.db, "Stylus", dec!(4.00), None).await;

        assert_matches!(
            fx.orders.create_order_explicit(None, address(), vec![]).await,
            Err(ServiceError::InvalidArgument(_))
        );
        let zero_qty = ExplicitOrderItem {
            product_id: product.id,
            price: dec!(4.00),
            quantity: 0,
        };
        assert_matches!(
            fx.orders
                .create_order_explicit(None, address(), vec![zero_qty])
                .await,
            Err(ServiceError::InvalidArgument(_))
        );
        let unknown = ExplicitOrderItem {
            product_id: Uuid::new_v4(),
            price: dec!(1.00),
            quantity: 1,
        };
        assert_matches!(
            fx.orders
                .create_order_explicit(Some("user-1"), address(), vec![unknown])
                .await,
            Err(ServiceError::NotFound(_))
        );
        assert_eq!(order_count(&fx.db).await, 0);
    }

    #[tokio::test]
    async fn checkout_from_empty_or_missing_cart_is_invalid_state() {
        let fx = fixture().await;
        assert_matches!(
            fx.orders.create_order_from_cart("user-1", address()).await,
            Err(ServiceError::InvalidState(_))
        );

        fx.carts.get_or_create_cart("user-1").await.unwrap();
        assert_matches!(
            fx.orders.create_order_from_cart("user-1", address()).await,
            Err(ServiceError::InvalidState(_))
        );
        assert_eq!(order_count(&fx.db).await, 0);
    }

    #[tokio::test]
    async fn checkout_prices_lines_and_empties_cart() {
        let fx = fixture().await;
        let case = insert_product(&*fx.db, "Leather Case", dec!(20.00), Some(dec!(15.00))).await;
        let cable = insert_product(&*fx.db, "Cable", dec!(9.99), None).await;
        let cart = fx.carts.get_or_create_cart("user-1").await.unwrap();
        fx.carts.add_item(cart.id, case.id, 1).await.unwrap();
        fx.carts.add_item(cart.id, cable.id, 2).await.unwrap();

        let placed = fx
            .orders
            .create_order_from_cart("user-1", address())
            .await
            .unwrap();

        assert_eq!(placed.order.user_id.as_deref(), Some("user-1"));
        assert_eq!(placed.items.len(), 2);
        let case_line = placed.items.iter().find(|i| i.product_id == case.id).unwrap();
        assert_eq!(case_line.price, dec!(15.00));
        let cable_line = placed.items.iter().find(|i| i.product_id == cable.id).unwrap();
        assert_eq!((cable_line.price, cable_line.quantity), (dec!(9.99), 2));
        assert_eq!(placed.total_cost(), dec!(34.98));

        let view = fx.carts.cart_with_items(cart).await.unwrap();
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn total_ignores_later_price_changes() {
        let fx = fixture().await;
        let product = insert_product(&*fx.db, "Cable", dec!(9.99), None).await;
        let cart = fx.carts.get_or_create_cart("user-1").await.unwrap();
        fx.carts.add_item(cart.id, product.id, 2).await.unwrap();
        let placed = fx
            .orders
            .create_order_from_cart("user-1", address())
            .await
            .unwrap();

        let mut repriced = product.into_active_model();
        repriced.price = Set(dec!(50.00));
        repriced.discounted_price = Set(Some(dec!(45.00)));
        repriced.update(&*fx.db).await.unwrap();

        let total = fx.orders.get_total_cost(placed.order.id).await.unwrap();
        assert_eq!(total, dec!(19.98));
    }

    #[tokio::test]
    async fn customers_only_see_their_own_orders() {
        let fx = fixture().await;
        let product = insert_product(&*fx.db, "Charger", dec!(10.00), None).await;
        let line = || {
            vec![ExplicitOrderItem {
                product_id: product.id,
                price: dec!(10.00),
                quantity: 1,
            }]
        };
        let mine = fx
            .orders
            .create_order_explicit(Some("user-1"), address(), line())
            .await
            .unwrap();
        fx.orders
            .create_order_explicit(Some("user-2"), address(), line())
            .await
            .unwrap();

        let own_scope = OrderScope::from(&customer("user-1"));
        let (own, total) = fx.orders.list_orders(&own_scope, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(own[0].order.id, mine.order.id);

        let other_scope = OrderScope::from(&customer("user-2"));
        assert_matches!(
            fx.orders.get_order(&other_scope, mine.order.id).await,
            Err(ServiceError::NotFound(_))
        );

        let (all, total) = fx
            .orders
            .list_orders(&OrderScope::from(&staff()), 1, 20)
            .await
            .unwrap();
        assert_eq!((all.len(), total), (2, 2));
    }

    #[tokio::test]
    async fn only_staff_update_orders_and_transitions_are_free() {
        let fx = fixture().await;
        let product = insert_product(&*fx.db, "Charger", dec!(10.00), None).await;
        let placed = fx
            .orders
            .create_order_explicit(
                Some("user-1"),
                address(),
                vec![ExplicitOrderItem {
                    product_id: product.id,
                    price: dec!(10.00),
                    quantity: 1,
                }],
            )
            .await
            .unwrap();

        let input = UpdateOrderInput {
            status: Some(OrderStatus::Delivered),
            is_paid: Some(true),
        };
        assert_matches!(
            fx.orders
                .update_order(&customer("user-1"), placed.order.id, input.clone())
                .await,
            Err(ServiceError::Forbidden(_))
        );

        let delivered = fx
            .orders
            .update_order(&staff(), placed.order.id, input)
            .await
            .unwrap();
        assert_eq!(delivered.order.status, OrderStatus::Delivered);
        assert!(delivered.order.is_paid);

        let back = fx
            .orders
            .update_order(
                &staff(),
                placed.order.id,
                UpdateOrderInput {
                    status: Some(OrderStatus::Pending),
                    is_paid: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(back.order.status, OrderStatus::Pending);
        assert!(back.order.is_paid);
    }
}
