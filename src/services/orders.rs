//! Order operations and the ownership rules guarding them.
//!
//! Reads are open to any authenticated caller. Updates, status changes and
//! deletes are only allowed for the customer who placed the order.

use chrono::Utc;
use model::entities::order::{self, OrderSize, OrderStatus};
use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument, warn};

use super::users::find_by_username;
use crate::error::{AppError, OrderAction, Result};

/// Fields of a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub size: OrderSize,
    pub flavour: String,
    pub quantity: i32,
}

/// Replacement values for a full order update. Status is not part of it.
#[derive(Debug, Clone)]
pub struct OrderChanges {
    pub size: OrderSize,
    pub flavour: String,
    pub quantity: i32,
}

/// Fails with [`AppError::NotOwner`] unless `caller_id` owns `order`.
///
/// A caller that does not resolve to a stored user owns nothing, and an
/// order without a customer cannot be changed by anyone.
pub fn ensure_owner(caller_id: Option<i32>, order: &order::Model, action: OrderAction) -> Result<()> {
    match caller_id {
        Some(id) if order.is_owned_by(id) => Ok(()),
        _ => Err(AppError::NotOwner(action)),
    }
}

pub struct OrderService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrderService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    async fn caller_id(&self, caller: &str) -> Result<Option<i32>> {
        let id = find_by_username(self.db, caller).await?.map(|u| u.id);
        if id.is_none() {
            warn!("Token identity {} does not match any stored user", caller);
        }
        Ok(id)
    }

    /// Loads the order and checks that `caller` may perform `action` on it.
    async fn owned_order(&self, caller: &str, order_id: i32, action: OrderAction) -> Result<order::Model> {
        let existing = self.get_by_id(order_id).await?;
        let caller_id = self.caller_id(caller).await?;

        ensure_owner(caller_id, &existing, action).inspect_err(|_| {
            warn!(
                "User {} tried to {} {} owned by {:?}",
                caller,
                match action {
                    OrderAction::Update => "update",
                    OrderAction::UpdateStatus => "change the status of",
                    OrderAction::Delete => "delete",
                },
                order_id,
                existing.customer_id
            )
        })?;

        Ok(existing)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, caller: &str, new_order: NewOrder) -> Result<order::Model> {
        let customer_id = self.caller_id(caller).await?;

        let active = order::ActiveModel {
            size: Set(new_order.size),
            status: Set(OrderStatus::Pending),
            flavour: Set(new_order.flavour),
            quantity: Set(new_order.quantity),
            date_created: Set(Utc::now().naive_utc()),
            customer_id: Set(customer_id),
            ..Default::default()
        };

        let created = active.insert(self.db).await?;
        info!("Order {} created for customer {:?}", created.id, created.customer_id);
        Ok(created)
    }

    pub async fn list_all(&self) -> Result<Vec<order::Model>> {
        Ok(order::Entity::find()
            .order_by_asc(order::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn get_by_id(&self, order_id: i32) -> Result<order::Model> {
        order::Entity::find_by_id(order_id)
            .one(self.db)
            .await?
            .ok_or_else(|| {
                debug!("Order {} not found", order_id);
                AppError::NotFound
            })
    }

    #[instrument(skip(self))]
    pub async fn update(&self, caller: &str, order_id: i32, changes: OrderChanges) -> Result<order::Model> {
        let existing = self.owned_order(caller, order_id, OrderAction::Update).await?;

        let mut active = existing.into_active_model();
        active.size = Set(changes.size);
        active.flavour = Set(changes.flavour);
        active.quantity = Set(changes.quantity);

        let updated = active.update(self.db).await?;
        info!("Order {} updated by {}", updated.id, caller);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, caller: &str, order_id: i32, status: OrderStatus) -> Result<order::Model> {
        let existing = self.owned_order(caller, order_id, OrderAction::UpdateStatus).await?;

        let mut active = existing.into_active_model();
        active.status = Set(status);

        let updated = active.update(self.db).await?;
        info!("Order {} status set to {:?} by {}", updated.id, updated.status, caller);
        Ok(updated)
    }

    /// Deletes the order and returns the removed row.
    #[instrument(skip(self))]
    pub async fn delete(&self, caller: &str, order_id: i32) -> Result<order::Model> {
        let existing = self.owned_order(caller, order_id, OrderAction::Delete).await?;

        existing.clone().delete(self.db).await?;
        info!("Order {} deleted by {}", existing.id, caller);
        Ok(existing)
    }

    pub async fn list_by_user(&self, user_id: i32) -> Result<Vec<order::Model>> {
        let customer = user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(customer
            .find_related(order::Entity)
            .order_by_asc(order::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn get_by_user_and_order(&self, user_id: i32, order_id: i32) -> Result<order::Model> {
        let customer = user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        order::Entity::find_by_id(order_id)
            .filter(order::Column::CustomerId.eq(customer.id))
            .one(self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::users::{AuthService, NewUser};
    use crate::test_utils::test_utils::setup_test_app_state;
    use chrono::NaiveDateTime;

    fn order_owned_by(customer_id: Option<i32>) -> order::Model {
        order::Model {
            id: 1,
            size: OrderSize::Small,
            status: OrderStatus::Pending,
            flavour: "Margherita".to_string(),
            quantity: 1,
            date_created: NaiveDateTime::default(),
            customer_id,
        }
    }

    fn pepperoni() -> NewOrder {
        NewOrder {
            size: OrderSize::Medium,
            flavour: "Pepperoni".to_string(),
            quantity: 2,
        }
    }

    async fn register(state: &crate::schemas::AppState, name: &str) -> user::Model {
        AuthService::from_state(state)
            .register(NewUser {
                username: name.to_string(),
                email: format!("{}@x.com", name),
                password: "pw".to_string(),
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_ensure_owner() {
        let order = order_owned_by(Some(7));
        assert!(ensure_owner(Some(7), &order, OrderAction::Update).is_ok());
        assert!(matches!(
            ensure_owner(Some(8), &order, OrderAction::Delete),
            Err(AppError::NotOwner(OrderAction::Delete))
        ));
        assert!(ensure_owner(None, &order, OrderAction::Update).is_err());
    }

    #[test]
    fn test_unowned_order_is_immutable() {
        let order = order_owned_by(None);
        for caller in [None, Some(1), Some(2)] {
            assert!(ensure_owner(caller, &order, OrderAction::UpdateStatus).is_err());
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let state = setup_test_app_state().await;
        let alice = register(&state, "alice").await;
        let service = OrderService::new(&state.db);

        let created = service.create("alice", pepperoni()).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched.size, OrderSize::Medium);
        assert_eq!(fetched.flavour, "Pepperoni");
        assert_eq!(fetched.quantity, 2);
        assert_eq!(fetched.status, OrderStatus::Pending);
        assert_eq!(fetched.customer_id, Some(alice.id));
    }

    #[tokio::test]
    async fn test_create_for_unknown_identity_has_no_owner() {
        let state = setup_test_app_state().await;
        let service = OrderService::new(&state.db);

        let created = service.create("ghost", pepperoni()).await.unwrap();
        assert_eq!(created.customer_id, None);

        // Nobody can change it afterwards
        assert!(matches!(
            service.delete("ghost", created.id).await,
            Err(AppError::NotOwner(OrderAction::Delete))
        ));
    }

    #[tokio::test]
    async fn test_ownership_enforced_for_mutations() {
        let state = setup_test_app_state().await;
        register(&state, "alice").await;
        register(&state, "bob").await;
        let service = OrderService::new(&state.db);
        let order = service.create("alice", pepperoni()).await.unwrap();

        let changes = OrderChanges {
            size: OrderSize::Large,
            flavour: "Hawaiian".to_string(),
            quantity: 3,
        };

        assert!(matches!(
            service.update("bob", order.id, changes.clone()).await,
            Err(AppError::NotOwner(OrderAction::Update))
        ));
        assert!(matches!(
            service.update_status("bob", order.id, OrderStatus::Delivered).await,
            Err(AppError::NotOwner(OrderAction::UpdateStatus))
        ));
        assert!(matches!(
            service.delete("bob", order.id).await,
            Err(AppError::NotOwner(OrderAction::Delete))
        ));

        // Denied attempts left the row untouched
        assert_eq!(service.get_by_id(order.id).await.unwrap(), order);

        let updated = service.update("alice", order.id, changes).await.unwrap();
        assert_eq!(updated.size, OrderSize::Large);
        assert_eq!(updated.flavour, "Hawaiian");
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.status, OrderStatus::Pending);
        assert_eq!(updated.date_created, order.date_created);

        let delivered = service
            .update_status("alice", order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.flavour, "Hawaiian");

        let deleted = service.delete("alice", order.id).await.unwrap();
        assert_eq!(deleted.id, order.id);
        assert!(matches!(service.get_by_id(order.id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_missing_order_reported_before_ownership() {
        let state = setup_test_app_state().await;
        register(&state, "bob").await;
        let service = OrderService::new(&state.db);

        assert!(matches!(service.get_by_id(999).await, Err(AppError::NotFound)));
        assert!(matches!(
            service.update_status("bob", 999, OrderStatus::InTransit).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(service.delete("bob", 999).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_quantity() {
        let state = setup_test_app_state().await;
        register(&state, "alice").await;
        let service = OrderService::new(&state.db);
        let order = service.create("alice", pepperoni()).await.unwrap();

        let result = service
            .update(
                "alice",
                order.id,
                OrderChanges {
                    size: OrderSize::Small,
                    flavour: "Pepperoni".to_string(),
                    quantity: 0,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_user_scoped_reads() {
        let state = setup_test_app_state().await;
        let alice = register(&state, "alice").await;
        let bob = register(&state, "bob").await;
        let service = OrderService::new(&state.db);

        let first = service.create("alice", pepperoni()).await.unwrap();
        let second = service.create("alice", pepperoni()).await.unwrap();
        let bobs = service.create("bob", pepperoni()).await.unwrap();

        assert_eq!(service.list_all().await.unwrap().len(), 3);

        let alices: Vec<i32> = service
            .list_by_user(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(alices, vec![first.id, second.id]);

        assert_eq!(
            service.get_by_user_and_order(bob.id, bobs.id).await.unwrap(),
            bobs
        );
        assert!(matches!(
            service.get_by_user_and_order(bob.id, first.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.get_by_user_and_order(4242, first.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(service.list_by_user(4242).await, Err(AppError::NotFound)));
    }
}
