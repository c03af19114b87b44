pub mod engine;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;
