//! Reservoir geometry ingestion

pub mod geometry_api;
pub mod reservoir;

pub use geometry_api::GeometryApi;
pub use reservoir::{geometry_from_geojson, reservoir_from_feature, reservoirs_from_features};
