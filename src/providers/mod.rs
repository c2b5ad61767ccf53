//! Upstream API providers. Each module wraps one external HTTP API as one or
//! more typed endpoints.

pub mod emissions;
pub mod evcharge;
pub mod people;
pub mod sbb;
pub mod transit;

use tracing::info;

use crate::config::OdmcpConfig;
use crate::error::ToolError;
use crate::http::HttpClient;
use crate::tools::ToolRegistry;

use emissions::EmissionsClient;
use evcharge::EvChargeClient;
use people::PeopleSearchClient;
use sbb::SbbClient;
use transit::TransitClient;

/// Register every provider's tools, all sharing one HTTP client.
pub fn register_all(registry: &mut ToolRegistry, config: &OdmcpConfig) -> Result<(), ToolError> {
    let http = HttpClient::new(config)?;

    registry.register_endpoint(TransitClient::new(&config.transit.base_url, http.clone()))?;

    let sbb = SbbClient::new(&config.sbb.base_url, http.clone());
    registry.register_endpoint(sbb.rail_traffic_endpoint())?;
    registry.register_endpoint(sbb.railway_lines_endpoint())?;

    registry.register_endpoint(EvChargeClient::new(&config.evcharge.base_url, http.clone()))?;
    registry.register_endpoint(EmissionsClient::new(&config.emissions.base_url, http.clone()))?;
    registry.register_endpoint(PeopleSearchClient::new(config.people_search.clone(), http))?;

    info!("Registered {} tools", registry.len());
    Ok(())
}

/// A registry holding every provider's tools.
pub fn default_registry(config: &OdmcpConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    register_all(&mut registry, config)?;
    Ok(registry)
}
