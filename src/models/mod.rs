pub mod drink;
pub mod envelope;

// Re-export so callers can do "use crate::models::{Drink, DrinkId};"
pub use drink::{Drink, DrinkId, DrinkPayload, Ingredient};
pub use envelope::Envelope;
