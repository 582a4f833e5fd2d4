use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::user;

/// Pizza size. Stored lower-case, exchanged over the API in upper snake case.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSize {
    #[default]
    #[sea_orm(string_value = "small")]
    Small,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "large")]
    Large,
    #[sea_orm(string_value = "extra-large")]
    ExtraLarge,
}

/// Delivery progress of an order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in-transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

/// A pizza order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub size: OrderSize,
    pub status: OrderStatus,
    pub flavour: String,
    #[sea_orm(default_value = "1")]
    pub quantity: i32,
    /// Set once on insert, never updated.
    pub date_created: NaiveDateTime,
    /// The customer who placed the order. Orders may exist without one.
    pub customer_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::CustomerId",
        to = "user::Column::Id",
        on_delete = "SetNull"
    )]
    Customer,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Model {
    /// Whether `user_id` is the customer who owns this order.
    /// Orders without a customer are owned by nobody.
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.customer_id == Some(user_id)
    }
}

pub fn check_quantity(quantity: i32) -> Result<(), DbErr> {
    if quantity < 1 {
        return Err(DbErr::Custom(format!(
            "quantity must be a positive integer, got {}",
            quantity
        )));
    }
    Ok(())
}

pub fn check_flavour(flavour: &str) -> Result<(), DbErr> {
    if flavour.trim().is_empty() {
        return Err(DbErr::Custom("flavour must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(quantity) | ActiveValue::Unchanged(quantity) = &self.quantity {
            check_quantity(*quantity).inspect_err(|e| warn!("Rejecting order row: {}", e))?;
        }
        if let ActiveValue::Set(flavour) | ActiveValue::Unchanged(flavour) = &self.flavour {
            check_flavour(flavour).inspect_err(|e| warn!("Rejecting order row: {}", e))?;
        }

        if insert {
            if self.size.is_not_set() {
                self.size = ActiveValue::Set(OrderSize::default());
            }
            if self.status.is_not_set() {
                self.status = ActiveValue::Set(OrderStatus::default());
            }
            if self.quantity.is_not_set() {
                self.quantity = ActiveValue::Set(1);
            }
            if self.date_created.is_not_set() {
                self.date_created = ActiveValue::Set(Utc::now().naive_utc());
            }
        } else if self.date_created.is_set() {
            return Err(DbErr::Custom("date_created is immutable".to_string()));
        }

        Ok(self)
    }
}
