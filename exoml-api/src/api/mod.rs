//! HTTP API handlers for exoml-api

pub mod health;
pub mod info;
pub mod predict;

pub use health::health_routes;
pub use info::info_routes;
pub use predict::predict_routes;
