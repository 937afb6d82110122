//! Reservoir geometry API client
//!
//! Looks up reservoir records intersecting a GeoJSON geometry by POSTing
//! it to the external geometry service. Failures (transport errors,
//! non-2xx responses, malformed GeoJSON) are fatal to the lookup and
//! propagate to the caller.

use crate::io::reservoir::reservoirs_from_features;
use crate::types::{Reservoir, WaterError, WaterResult};
use geojson::{FeatureCollection, GeoJson, Geometry};
use std::time::Duration;

/// Blocking client for the reservoir geometry service
pub struct GeometryApi {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl GeometryApi {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> WaterResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    /// Endpoint for geometry lookups
    pub fn geometry_url(&self) -> String {
        format!("{}/reservoir/geometry", self.base_url)
    }

    /// Fetch the reservoirs intersecting `geometry`
    pub fn fetch_by_geometry(&self, geometry: &Geometry) -> WaterResult<Vec<Reservoir>> {
        let url = self.geometry_url();
        log::info!("Looking up reservoirs at {}", url);

        let response = self.client.post(&url).json(geometry).send()?;
        if !response.status().is_success() {
            return Err(WaterError::Processing(format!(
                "geometry lookup failed with status {}",
                response.status()
            )));
        }

        let body = response.text()?;
        let geojson: GeoJson = body
            .parse()
            .map_err(|e| WaterError::Geometry(format!("invalid GeoJSON response: {}", e)))?;
        let collection = FeatureCollection::try_from(geojson)
            .map_err(|_| WaterError::Geometry("response is not a feature collection".to_string()))?;

        let reservoirs = reservoirs_from_features(&collection)?;
        log::info!("Geometry lookup returned {} reservoirs", reservoirs.len());
        Ok(reservoirs)
    }
}
