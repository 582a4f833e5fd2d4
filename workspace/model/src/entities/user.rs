use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use tracing::warn;

/// Longest username the `users` table accepts.
pub const USERNAME_MAX_LEN: usize = 50;
/// Longest email the `users` table accepts.
pub const EMAIL_MAX_LEN: usize = 120;

/// A registered customer (or staff member) of the pizza shop.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// One-way bcrypt hash. The raw password is never stored.
    pub password_hash: String,
    #[sea_orm(default_value = "false")]
    pub is_staff: bool,
    #[sea_orm(default_value = "false")]
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // A user can place multiple orders.
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

/// Checks a username against the column constraints.
pub fn check_username(username: &str) -> Result<(), DbErr> {
    if username.trim().is_empty() {
        return Err(DbErr::Custom("username must not be empty".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DbErr::Custom(format!(
            "username must be at most {} characters",
            USERNAME_MAX_LEN
        )));
    }
    Ok(())
}

/// Checks an email against the column constraints.
pub fn check_email(email: &str) -> Result<(), DbErr> {
    if email.trim().is_empty() {
        return Err(DbErr::Custom("email must not be empty".to_string()));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(DbErr::Custom(format!(
            "email must be at most {} characters",
            EMAIL_MAX_LEN
        )));
    }
    Ok(())
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(username) | ActiveValue::Unchanged(username) = &self.username {
            check_username(username).inspect_err(|e| warn!("Rejecting user row: {}", e))?;
        }
        if let ActiveValue::Set(email) | ActiveValue::Unchanged(email) = &self.email {
            check_email(email).inspect_err(|e| warn!("Rejecting user row: {}", e))?;
        }
        Ok(self)
    }
}
