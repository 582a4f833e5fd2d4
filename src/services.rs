pub mod orders;
pub mod users;

pub use orders::{NewOrder, OrderChanges, OrderService};
pub use users::{AuthService, NewUser};
