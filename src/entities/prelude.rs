//! `SeaORM` Entity prelude

pub use super::properties::Entity as Properties;
pub use super::property_history::Entity as PropertyHistory;
