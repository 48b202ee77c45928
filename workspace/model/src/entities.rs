//! SeaORM entities for the account store: registered users and their login
//! sessions.

pub mod session;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::session::Entity as Session;
    pub use super::user::Entity as User;
}
