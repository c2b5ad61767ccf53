//! Swiss public transit connections via transport.opendata.ch.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ToolError, ValidationErrors, Violation};
use crate::http::HttpClient;
use crate::query::QueryString;
use crate::schema::ToolInput;
use crate::tools::Endpoint;

pub const TOOL_NAME: &str = "transit-connections";

/// Transit API client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    base_url: String,
    http: HttpClient,
}

// -- Input --------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConnectionParams {
    /// Station or city to travel from, e.g. "Zürich HB".
    pub origin: String,

    /// Station or city to travel to, e.g. "Basel SBB".
    pub to: String,

    /// Up to five intermediate stations the connection must pass through.
    #[serde(default)]
    #[schemars(length(max = 5))]
    pub via: Vec<String>,

    /// Travel date, YYYY-MM-DD. Defaults to today.
    #[serde(default)]
    pub date: Option<String>,

    /// Travel time, HH:MM. Defaults to now.
    #[serde(default)]
    pub time: Option<String>,

    /// Treat `time` as the latest arrival instead of the earliest departure.
    #[serde(default)]
    pub is_arrival_time: bool,

    /// Number of connections to return (1-16).
    #[serde(default)]
    #[schemars(range(min = 1, max = 16))]
    pub limit: Option<u32>,
}

impl ToolInput for ConnectionParams {
    fn check_args(args: &Map<String, Value>, errs: &mut ValidationErrors) {
        if let Some(date) = args.get("date").and_then(Value::as_str) {
            if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                errs.push(
                    "date",
                    Violation::Invalid {
                        reason: format!("`{date}` is not a YYYY-MM-DD date"),
                    },
                );
            }
        }
        if let Some(time) = args.get("time").and_then(Value::as_str) {
            if chrono::NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                errs.push(
                    "time",
                    Violation::Invalid {
                        reason: format!("`{time}` is not an HH:MM time"),
                    },
                );
            }
        }
    }
}

impl ConnectionParams {
    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push("from", &self.origin)
            .push("to", &self.to)
            .push_list("via", &self.via)
            .push_opt("date", self.date.as_deref())
            .push_opt("time", self.time.as_deref())
            .push_opt("isArrivalTime", self.is_arrival_time.then_some(1))
            .push_opt("limit", self.limit)
    }
}

// -- Response -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Connection {
    pub from: Departure,
    pub to: Arrival,
    pub duration: String,
    pub transfers: u32,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Departure {
    pub station: Location,
    pub departure: String,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Arrival {
    pub station: Location,
    pub arrival: String,
    pub platform: Option<String>,
}

/// One leg of a connection. Walking legs carry no journey.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Section {
    pub journey: Option<Journey>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Journey {
    pub name: String,
    pub category: String,
    pub number: String,
    pub operator: String,
    pub to: String,
    #[serde(rename = "passList")]
    pub pass_list: Vec<Stop>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Stop {
    pub station: Location,
    pub arrival: Option<String>,
    pub departure: Option<String>,
    pub delay: Option<i32>,
}

// -- Client -------------------------------------------------------------------

impl TransitClient {
    pub fn new(base_url: &str, http: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Look up connections between two stations.
    pub async fn connections(
        &self,
        params: &ConnectionParams,
    ) -> Result<ConnectionsResponse, ToolError> {
        let url = params
            .to_query()
            .append_to(&format!("{}/connections", self.base_url));
        debug!("Transit connections: {} -> {}", params.origin, params.to);

        self.http.get_json(&url).await
    }
}

#[async_trait]
impl Endpoint for TransitClient {
    type Input = ConnectionParams;
    type Output = ConnectionsResponse;

    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Find public transport connections in Switzerland between two stations, \
         with departure/arrival times, platforms, transfers and intermediate stops."
    }

    async fn fetch(&self, input: ConnectionParams) -> Result<ConnectionsResponse, ToolError> {
        self.connections(&input).await
    }
}
