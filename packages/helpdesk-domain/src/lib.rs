pub mod category;
pub mod passage;
pub mod query;

pub use category::{Category, CategoryBooster};
pub use passage::Passage;
