//! SeaORM entities of the pizza delivery service.
//!
//! `user` owns zero or more `order` rows through the nullable
//! `orders.customer_id` foreign key.

pub mod order;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::order::Entity as Order;
    pub use super::user::Entity as User;
}
