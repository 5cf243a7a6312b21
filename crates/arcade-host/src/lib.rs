pub mod autoplay;
pub mod catalog;
pub mod config;
pub mod store;
