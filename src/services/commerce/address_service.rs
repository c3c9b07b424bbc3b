use crate::{
    entities::{address, Address, AddressModel, AddressType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Per-user address book. Every lookup is scoped to the owner, so another
/// user's address reads as not found.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Full address body, used for both create and replace.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 255))]
    pub street_address: String,
    #[validate(length(max = 255))]
    pub apartment_address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state_province: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Defaults first, then newest.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<AddressModel>, ServiceError> {
        Ok(Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &str, address_id: Uuid) -> Result<AddressModel, ServiceError> {
        owned_address(&*self.db, user_id, address_id).await
    }

    /// Saves a new address. Marking it default clears the flag on the user's
    /// other addresses of the same type.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: &str,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        if input.is_default {
            clear_defaults(&txn, user_id, input.address_type, None).await?;
        }
        let now = Utc::now();
        let saved = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            street_address: Set(input.street_address),
            apartment_address: Set(input.apartment_address),
            city: Set(input.city),
            state_province: Set(input.state_province),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            address_type: Set(input.address_type),
            is_default: Set(input.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressSaved(saved.id))
            .await;
        info!(address_id = %saved.id, "address created");
        Ok(saved)
    }

    /// Replaces every field of an owned address.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: &str,
        address_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let existing = owned_address(&txn, user_id, address_id).await?;
        if input.is_default {
            clear_defaults(&txn, user_id, input.address_type, Some(address_id)).await?;
        }
        let mut active: address::ActiveModel = existing.into();
        active.street_address = Set(input.street_address);
        active.apartment_address = Set(input.apartment_address);
        active.city = Set(input.city);
        active.state_province = Set(input.state_province);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.address_type = Set(input.address_type);
        active.is_default = Set(input.is_default);
        active.updated_at = Set(Utc::now());
        let saved = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressSaved(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, address_id: Uuid) -> Result<(), ServiceError> {
        let result = Address::delete_many()
            .filter(address::Column::Id.eq(address_id))
            .filter(address::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("address", address_id));
        }

        self.event_sender
            .send_or_log(Event::AddressDeleted(address_id))
            .await;
        Ok(())
    }
}

async fn owned_address<C>(
    conn: &C,
    user_id: &str,
    address_id: Uuid,
) -> Result<AddressModel, ServiceError>
where
    C: ConnectionTrait,
{
    Address::find_by_id(address_id)
        .filter(address::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("address", address_id))
}

async fn clear_defaults<C>(
    conn: &C,
    user_id: &str,
    address_type: AddressType,
    keep: Option<Uuid>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let mut update = Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::AddressType.eq(address_type))
        .filter(address::Column::IsDefault.eq(true));
    if let Some(id) = keep {
        update = update.filter(address::Column::Id.ne(id));
    }
    update.exec(conn).await?;
    Ok(())
}
