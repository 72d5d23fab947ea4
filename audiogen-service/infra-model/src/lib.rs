mod cache;
mod rest;

pub use cache::CachedModelRegistry;
pub use rest::{ModelBackendSettings, RestGenerativeModel, RestModelRegistry};
