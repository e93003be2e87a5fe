pub mod cache;
pub mod drink_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{DrinkStore, DrinkCache};"
pub use cache::{DrinkCache, Generation};
pub use drink_store::DrinkStore;
