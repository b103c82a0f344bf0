//! HTTP API handlers

pub mod fusion;
pub mod health;
pub mod sources;
pub mod tips;

pub use fusion::fusion_routes;
pub use health::health_routes;
pub use sources::source_routes;
pub use tips::tips_routes;
