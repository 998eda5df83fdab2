pub mod analytics;
pub mod cache;
pub mod holding;
pub mod price;
pub mod rate;
pub mod settings;
pub mod snapshot;
