//! Library exports for the drinks client, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod startup;
pub mod store;
pub mod transport;
pub mod utils;

pub use error::{StoreError, TransportError};
pub use models::{Drink, DrinkId, Ingredient};
pub use store::DrinkStore;
