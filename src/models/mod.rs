pub mod common;
pub mod history;
pub mod portfolio;
pub mod property;
