//! SBB open data portal (data.sbb.ch, Opendatasoft Explore API v2.1).
//!
//! Two datasets are exposed as tools: rail traffic information (disruptions
//! and maintenance notices) and the railway line register.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ToolError;
use crate::http::HttpClient;
use crate::query::QueryString;
use crate::schema::ToolInput;
use crate::tools::Endpoint;

pub const RAIL_TRAFFIC_TOOL: &str = "rail-traffic-info";
pub const RAILWAY_LINES_TOOL: &str = "railway-lines";

const RAIL_TRAFFIC_DATASET: &str = "rail-traffic-information";
const RAILWAY_LINES_DATASET: &str = "linie";

/// SBB data portal client.
#[derive(Debug, Clone)]
pub struct SbbClient {
    base_url: String,
    http: HttpClient,
}

fn default_limit() -> u32 {
    10
}

fn default_timezone() -> String {
    "UTC".into()
}

/// Response language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    De,
    Fr,
    It,
    En,
}

impl Lang {
    fn as_str(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
            Self::En => "en",
        }
    }
}

// ---------------------------------------------------------------------------
// Rail traffic information
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TrafficInfoParams {
    /// Fields to select, e.g. "title,description" or "title,validitybegin,validityend".
    #[serde(default)]
    pub select: Option<String>,

    /// Filter expression, e.g. "validitybegin >= NOW()" or 'description LIKE "*Zürich*"'.
    #[serde(default)]
    pub r#where: Option<String>,

    /// Group results by a field, e.g. "author".
    #[serde(default)]
    pub group_by: Option<String>,

    /// Sort order, e.g. "validitybegin ASC" or "published DESC".
    #[serde(default)]
    pub order_by: Option<String>,

    /// Maximum number of entries to return (1-100).
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 100))]
    pub limit: u32,

    /// Number of entries to skip, for pagination.
    #[serde(default)]
    pub offset: u32,

    /// Facet refinement, e.g. "author:SBB".
    #[serde(default)]
    pub refine: Option<String>,

    /// Facet exclusion, e.g. "author:SBB".
    #[serde(default)]
    pub exclude: Option<String>,

    /// Language of the notices.
    #[serde(default)]
    pub lang: Option<Lang>,

    /// Timezone for timestamps, e.g. "Europe/Zurich".
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Include related links in the response.
    #[serde(default)]
    pub include_links: bool,

    /// Include application metadata in the response.
    #[serde(default)]
    pub include_app_metas: bool,
}

impl ToolInput for TrafficInfoParams {}

impl TrafficInfoParams {
    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push_opt("select", self.select.as_deref())
            .push_opt("where", self.r#where.as_deref())
            .push_opt("group_by", self.group_by.as_deref())
            .push_opt("order_by", self.order_by.as_deref())
            .push("limit", self.limit)
            .push("offset", self.offset)
            .push_opt("refine", self.refine.as_deref())
            .push_opt("exclude", self.exclude.as_deref())
            .push_opt("lang", self.lang.map(Lang::as_str))
            .push("timezone", &self.timezone)
            .push("include_links", self.include_links)
            .push("include_app_metas", self.include_app_metas)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrafficInfoResponse {
    pub total_count: u64,
    pub results: Vec<TrafficInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrafficInfo {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: DateTime<Utc>,
    pub author: String,
    pub validitybegin: DateTime<Utc>,
    pub validityend: DateTime<Utc>,
    pub description_html: String,
}

// ---------------------------------------------------------------------------
// Railway lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RailwayLineParams {
    /// Fields to select, e.g. "linie,linienname" or "bpk_anfang,bpk_ende".
    #[serde(default)]
    pub select: Option<String>,

    /// Filter expression, e.g. "linie = 100" or 'bpk_anfang LIKE "*Zürich*"'.
    #[serde(default)]
    pub r#where: Option<String>,

    /// Group results by a field, e.g. "bpk_anfang".
    #[serde(default)]
    pub group_by: Option<String>,

    /// Sort order, e.g. "linie ASC" or "km_ende DESC".
    #[serde(default)]
    pub order_by: Option<String>,

    /// Maximum number of lines to return (1-100).
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 100))]
    pub limit: u32,

    /// Number of lines to skip, for pagination.
    #[serde(default)]
    pub offset: u32,
}

impl ToolInput for RailwayLineParams {}

impl RailwayLineParams {
    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push_opt("select", self.select.as_deref())
            .push_opt("where", self.r#where.as_deref())
            .push_opt("group_by", self.group_by.as_deref())
            .push_opt("order_by", self.order_by.as_deref())
            .push("limit", self.limit)
            .push("offset", self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RailwayLineResponse {
    pub total_count: u64,
    pub results: Vec<RailwayLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RailwayLine {
    pub linie: u32,
    pub linienname: String,
    pub bpk_anfang: String,
    pub bpk_ende: String,
    pub km_anfang: f64,
    pub km_ende: f64,
    pub stationierung_anfang: i64,
    pub stationierung_ende: i64,
    pub tst: LineFeature,
    pub geo_point_2d: GeoPoint2D,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LineFeature {
    pub r#type: String,
    pub geometry: LineGeometry,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LineGeometry {
    pub r#type: String,
    /// `[lon, lat]` pairs.
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint2D {
    pub lon: f64,
    pub lat: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl SbbClient {
    pub fn new(base_url: &str, http: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn records_url(&self, dataset: &str, query: &QueryString) -> String {
        query.append_to(&format!(
            "{}/catalog/datasets/{}/records",
            self.base_url, dataset
        ))
    }

    /// Fetch rail traffic notices.
    pub async fn rail_traffic_info(
        &self,
        params: &TrafficInfoParams,
    ) -> Result<TrafficInfoResponse, ToolError> {
        let url = self.records_url(RAIL_TRAFFIC_DATASET, &params.to_query());
        debug!("SBB rail traffic info (limit {})", params.limit);
        self.http.get_json(&url).await
    }

    /// Fetch railway line records.
    pub async fn railway_lines(
        &self,
        params: &RailwayLineParams,
    ) -> Result<RailwayLineResponse, ToolError> {
        let url = self.records_url(RAILWAY_LINES_DATASET, &params.to_query());
        debug!("SBB railway lines (limit {})", params.limit);
        self.http.get_json(&url).await
    }

    pub fn rail_traffic_endpoint(&self) -> RailTrafficInfo {
        RailTrafficInfo(self.clone())
    }

    pub fn railway_lines_endpoint(&self) -> RailwayLines {
        RailwayLines(self.clone())
    }
}

/// Tool endpoint for rail traffic information.
pub struct RailTrafficInfo(SbbClient);

#[async_trait]
impl Endpoint for RailTrafficInfo {
    type Input = TrafficInfoParams;
    type Output = TrafficInfoResponse;

    fn name(&self) -> &'static str {
        RAIL_TRAFFIC_TOOL
    }

    fn description(&self) -> &'static str {
        "Fetch current SBB rail traffic information: disruptions, maintenance work \
         and their validity periods."
    }

    async fn fetch(&self, input: TrafficInfoParams) -> Result<TrafficInfoResponse, ToolError> {
        self.0.rail_traffic_info(&input).await
    }
}

/// Tool endpoint for the railway line register.
pub struct RailwayLines(SbbClient);

#[async_trait]
impl Endpoint for RailwayLines {
    type Input = RailwayLineParams;
    type Output = RailwayLineResponse;

    fn name(&self) -> &'static str {
        RAILWAY_LINES_TOOL
    }

    fn description(&self) -> &'static str {
        "Fetch SBB railway line information: line numbers, start and end stations, \
         kilometre markers and line geometry."
    }

    async fn fetch(&self, input: RailwayLineParams) -> Result<RailwayLineResponse, ToolError> {
        self.0.railway_lines(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Violation;
    use serde_json::json;

    #[test]
    fn traffic_defaults_are_sent() {
        let params = TrafficInfoParams::from_args(json!({})).unwrap();
        assert_eq!(
            params.to_query().render(),
            "limit=10&offset=0&timezone=UTC&include_links=false&include_app_metas=false"
        );
    }

    #[test]
    fn where_clause_is_encoded() {
        let params = RailwayLineParams::from_args(json!({
            "where": "linie = 100",
            "limit": 2
        }))
        .unwrap();
        assert_eq!(
            params.to_query().render(),
            "where=linie%20%3D%20100&limit=2&offset=0"
        );
    }

    #[test]
    fn limit_bounds() {
        for bad in [0, 101] {
            let errs = RailwayLineParams::from_args(json!({ "limit": bad })).unwrap_err();
            assert!(errs.mentions("limit"), "limit {bad} should be rejected");
        }
        assert!(RailwayLineParams::from_args(json!({ "limit": 100 })).is_ok());
        assert!(RailwayLineParams::from_args(json!({ "limit": 1 })).is_ok());
    }

    #[test]
    fn negative_offset_is_rejected() {
        let errs = TrafficInfoParams::from_args(json!({ "offset": -1 })).unwrap_err();
        assert!(errs.mentions("offset"));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let errs = TrafficInfoParams::from_args(json!({ "lang": "rm" })).unwrap_err();
        assert!(matches!(
            errs.violations()[0].violation,
            Violation::UnknownEnumValue { .. }
        ));

        let ok = TrafficInfoParams::from_args(json!({ "lang": "fr" })).unwrap();
        assert!(ok.to_query().render().contains("lang=fr"));
    }

    #[test]
    fn timestamps_accept_offsets() {
        let info: TrafficInfo = serde_json::from_value(json!({
            "title": "Delays in Bern",
            "link": "https://data.sbb.ch/info/2",
            "description": "Signal failure",
            "published": "2024-01-01T11:00:00+01:00",
            "author": "SBB",
            "validitybegin": "2024-01-01T11:00:00Z",
            "validityend": "2024-01-01T15:00:00Z",
            "description_html": "<p>Signal failure</p>"
        }))
        .unwrap();
        assert_eq!(info.published.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }
}
