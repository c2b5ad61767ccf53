//! Swiss EV charging stations from the ich-tanke-strom GeoServer (WFS).

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ToolError;
use crate::http::HttpClient;
use crate::query::QueryString;
use crate::schema::ToolInput;
use crate::tools::Endpoint;

pub const TOOL_NAME: &str = "charging-stations";

const FEATURE_TYPE: &str = "ich-tanke-strom:evse";

/// WFS client for the charging station layer.
#[derive(Debug, Clone)]
pub struct EvChargeClient {
    base_url: String,
    http: HttpClient,
}

// -- Input --------------------------------------------------------------------

fn default_limit() -> u32 {
    3
}

fn default_renewable() -> Option<bool> {
    Some(true)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChargingStationParams {
    /// Maximum number of stations to return (1-100).
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 100))]
    pub limit: u32,

    /// Only stations powered by renewable energy (true), or only those that
    /// are not (false). Null disables the filter.
    #[serde(default = "default_renewable")]
    pub renewable_energy: Option<bool>,

    /// Only stations open around the clock.
    #[serde(default)]
    pub open_24_hours: Option<bool>,

    /// Case-insensitive substring match on the station's city, e.g. "Zürich".
    #[serde(default)]
    pub city: Option<String>,
}

impl ToolInput for ChargingStationParams {}

impl ChargingStationParams {
    /// Combined CQL filter, or `None` when no filter is active.
    pub fn cql_filter(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(renewable) = self.renewable_energy {
            clauses.push(format!("RenewableEnergy={renewable}"));
        }
        if let Some(open) = self.open_24_hours {
            clauses.push(format!("IsOpen24Hours={open}"));
        }
        if let Some(city) = self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            clauses.push(format!(
                "Address.City ILIKE '%{}%'",
                city.trim().replace('\'', "''")
            ));
        }
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push("service", "WFS")
            .push("version", "1.0.0")
            .push("request", "GetFeature")
            .push("typeName", FEATURE_TYPE)
            .push("maxFeatures", self.limit)
            .push("outputFormat", "application/json")
            .push_opt("cql_filter", self.cql_filter())
    }
}

// -- Response -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChargingStationResponse {
    pub r#type: String,
    pub features: Vec<ChargingStation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChargingStation {
    pub r#type: String,
    pub id: String,
    pub geometry: Geometry,
    pub properties: StationProperties,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Geometry {
    pub r#type: String,
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationProperties {
    #[serde(rename = "@featureType")]
    pub feature_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub evse_status: String,
    pub plugs: String,
    pub authentication_modes: Vec<String>,
    pub accessibility_location: String,
    pub address: Address,
    pub payment_options: Vec<String>,
    pub renewable_energy: bool,
    pub charging_facilities: Vec<ChargingFacility>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub postal_code: String,
    pub city: String,
    pub street: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChargingFacility {
    pub power: f64,
    pub voltage: Option<f64>,
    pub power_type: String,
}

// -- Client -------------------------------------------------------------------

impl EvChargeClient {
    pub fn new(base_url: &str, http: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Query charging stations matching the given filters.
    pub async fn stations(
        &self,
        params: &ChargingStationParams,
    ) -> Result<ChargingStationResponse, ToolError> {
        let url = params.to_query().append_to(&self.base_url);
        debug!("EV charging stations (max {}, filter {:?})", params.limit, params.cql_filter());
        self.http.get_json(&url).await
    }
}

#[async_trait]
impl Endpoint for EvChargeClient {
    type Input = ChargingStationParams;
    type Output = ChargingStationResponse;

    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Find electric vehicle charging stations in Switzerland, with address, plugs, \
         power, payment options and live availability status."
    }

    async fn fetch(&self, input: ChargingStationParams) -> Result<ChargingStationResponse, ToolError> {
        self.stations(&input).await
    }
}
