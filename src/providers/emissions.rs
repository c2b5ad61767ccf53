//! Historical greenhouse gas emissions from Climate Watch.
//!
//! The endpoint is paginated with a `next` cursor; every page is fetched and
//! the records are concatenated before being returned.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ToolError, ValidationErrors, Violation};
use crate::http::{HttpClient, Page};
use crate::query::QueryString;
use crate::schema::ToolInput;
use crate::tools::Endpoint;

pub const TOOL_NAME: &str = "historical-emissions";

/// Climate Watch client.
#[derive(Debug, Clone)]
pub struct EmissionsClient {
    base_url: String,
    http: HttpClient,
}

// -- Input --------------------------------------------------------------------

fn default_regions() -> Vec<String> {
    vec!["EUU".into()]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EmissionsParams {
    /// ISO 3166 alpha-3 region codes. WORLD and EUU (European Union) are also accepted.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// First year to include.
    #[serde(default)]
    #[schemars(range(min = 1850, max = 2100))]
    pub start_year: Option<i32>,

    /// Last year to include.
    #[serde(default)]
    #[schemars(range(min = 1850, max = 2100))]
    pub end_year: Option<i32>,
}

impl ToolInput for EmissionsParams {
    fn check_args(args: &Map<String, Value>, errs: &mut ValidationErrors) {
        let year = |key: &str| args.get(key).and_then(Value::as_i64);
        if let (Some(start), Some(end)) = (year("start_year"), year("end_year")) {
            if start > end {
                errs.push(
                    "start_year",
                    Violation::Invalid {
                        reason: format!("start_year {start} is after end_year {end}"),
                    },
                );
            }
        }
    }
}

impl EmissionsParams {
    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push_list("regions", &self.regions)
            .push_opt("start_year", self.start_year)
            .push_opt("end_year", self.end_year)
    }
}

// -- Response -----------------------------------------------------------------

/// All records across every page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmissionsResponse {
    pub data: Vec<EmissionRecord>,
}

/// One page as returned by the API.
#[derive(Debug, Deserialize)]
pub struct EmissionsPage {
    pub data: Vec<EmissionRecord>,
    #[serde(default)]
    pub next: Option<String>,
}

impl Page for EmissionsPage {
    type Item = EmissionRecord;

    fn into_parts(self) -> (Vec<EmissionRecord>, Option<String>) {
        (self.data, self.next)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmissionRecord {
    pub id: i64,
    pub iso_code3: String,
    pub country: String,
    pub data_source: String,
    pub sector: String,
    pub gas: String,
    pub unit: String,
    pub emissions: Vec<YearlyEmissions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct YearlyEmissions {
    pub year: i32,
    pub value: Option<f64>,
}

// -- Client -------------------------------------------------------------------

impl EmissionsClient {
    pub fn new(base_url: &str, http: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Fetch every page of historical emissions for the given regions and years.
    pub async fn historical_emissions(
        &self,
        params: &EmissionsParams,
    ) -> Result<EmissionsResponse, ToolError> {
        let url = params
            .to_query()
            .append_to(&format!("{}/data/historical_emissions", self.base_url));

        let data = self.http.fetch_paged::<EmissionsPage>(&url).await?;
        info!("Fetched {} emission records", data.len());
        Ok(EmissionsResponse { data })
    }
}

#[async_trait]
impl Endpoint for EmissionsClient {
    type Input = EmissionsParams;
    type Output = EmissionsResponse;

    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Fetch historical greenhouse gas emissions by country or region, sector and gas, \
         as yearly time series."
    }

    async fn fetch(&self, input: EmissionsParams) -> Result<EmissionsResponse, ToolError> {
        self.historical_emissions(&input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn regions_default_to_the_eu() {
        let params = EmissionsParams::from_args(json!({ "start_year": 2009, "end_year": 2010 })).unwrap();
        assert_eq!(
            params.to_query().render(),
            "regions[]=EUU&start_year=2009&end_year=2010"
        );
    }

    #[test]
    fn empty_region_list_sends_no_regions() {
        let params = EmissionsParams::from_args(json!({ "regions": [] })).unwrap();
        assert!(params.to_query().is_empty());
    }

    #[test]
    fn year_order_is_checked() {
        let errs = EmissionsParams::from_args(json!({ "start_year": 2012, "end_year": 2010 })).unwrap_err();
        assert!(errs.mentions("start_year"));
    }

    #[test]
    fn year_order_is_checked_alongside_other_violations() {
        let errs = EmissionsParams::from_args(json!({
            "regions": "CHE",
            "start_year": 2012,
            "end_year": 2010
        }))
        .unwrap_err();
        assert!(errs.mentions("regions"));
        assert!(errs.mentions("start_year"));
    }

    #[test]
    fn years_are_bounded_and_typed() {
        let errs = EmissionsParams::from_args(json!({ "start_year": 1700, "end_year": "2010" })).unwrap_err();
        assert!(errs.mentions("start_year"));
        assert!(errs.mentions("end_year"));
    }
}
