//! Data models
//!
//! Edit state and the planning service's view of an ingredient.

mod ingredient;

pub use ingredient::{IngredientEditState, IngredientSnapshot, IngredientUpdate};
