//! HTTP API handlers for kinocat

pub mod health;
pub mod import;
pub mod subscribe;

pub use health::health_routes;
pub use import::import_routes;
pub use subscribe::sse_routes;
