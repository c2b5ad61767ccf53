//! People search (Apollo `mixed_people/search`).
//!
//! Requires an API key. It is resolved on every call, so a missing key fails
//! the first request with a configuration error instead of sending an empty
//! credential.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PeopleSearchConfig;
use crate::error::ToolError;
use crate::http::HttpClient;
use crate::query::QueryString;
use crate::schema::ToolInput;
use crate::tools::Endpoint;

pub const TOOL_NAME: &str = "people-search";

/// People search client.
#[derive(Debug, Clone)]
pub struct PeopleSearchClient {
    config: PeopleSearchConfig,
    http: HttpClient,
}

// -- Input --------------------------------------------------------------------

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PeopleSearchParams {
    /// Job titles held by the people you want to find.
    #[serde(default)]
    pub person_titles: Vec<String>,

    /// Locations where the people live.
    #[serde(default)]
    pub person_locations: Vec<String>,

    /// Job seniorities, e.g. "senior", "director".
    #[serde(default)]
    pub person_seniorities: Vec<String>,

    /// Headquarters locations of the person's current employer.
    #[serde(default)]
    pub organization_locations: Vec<String>,

    /// Domain names of the person's employer.
    #[serde(default)]
    pub q_organization_domains: Vec<String>,

    /// Email statuses, e.g. "verified", "likely to engage".
    #[serde(default)]
    pub contact_email_status: Vec<String>,

    /// Provider IDs of the employers.
    #[serde(default)]
    pub organization_ids: Vec<String>,

    /// Employee count ranges of the current employer, e.g. "1,10".
    #[serde(default)]
    pub organization_num_employees_ranges: Vec<String>,

    /// Free-text keywords.
    #[serde(default)]
    pub q_keywords: Option<String>,

    /// Page number of the results.
    #[serde(default = "default_page")]
    #[schemars(range(min = 1, max = 500))]
    pub page: u32,

    /// Results per page (1-100).
    #[serde(default)]
    #[schemars(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

impl ToolInput for PeopleSearchParams {}

impl PeopleSearchParams {
    pub fn to_query(&self) -> QueryString {
        QueryString::new()
            .push_list("person_titles", &self.person_titles)
            .push_list("person_locations", &self.person_locations)
            .push_list("person_seniorities", &self.person_seniorities)
            .push_list("organization_locations", &self.organization_locations)
            .push_list("q_organization_domains", &self.q_organization_domains)
            .push_list("contact_email_status", &self.contact_email_status)
            .push_list("organization_ids", &self.organization_ids)
            .push_list(
                "organization_num_employees_ranges",
                &self.organization_num_employees_ranges,
            )
            .push_opt("q_keywords", self.q_keywords.as_deref())
            .push("page", self.page)
            .push_opt("per_page", self.per_page)
    }
}

// -- Response -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PeopleSearchResponse {
    /// Required, but the API sends `null` when nothing matches.
    #[serde(deserialize_with = "Option::deserialize")]
    pub people: Option<Vec<Person>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub total_entries: Option<u64>,
    pub total_pages: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Person {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub linkedin_url: Option<String>,
    pub title: Option<String>,
    pub email_status: Option<String>,
    pub extrapolated_email_confidence: Option<f64>,
    pub headline: Option<String>,
    pub email: Option<String>,
    pub employment_history: Option<Vec<EmploymentEntry>>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contact: Option<Contact>,
    pub organization: Option<Organization>,
    pub seniority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmploymentEntry {
    pub created_at: Option<String>,
    pub current: Option<bool>,
    pub degree: Option<String>,
    pub description: Option<String>,
    pub emails: Option<String>,
    pub end_date: Option<String>,
    pub grade_level: Option<String>,
    pub kind: Option<String>,
    pub major: Option<String>,
    pub organization_name: Option<String>,
    pub start_date: Option<String>,
    pub title: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Contact {
    pub name: Option<String>,
    pub linkedin_url: Option<String>,
    pub organization_name: Option<String>,
    pub email: Option<String>,
    pub email_true_status: Option<String>,
    pub contact_emails: Option<Vec<ContactEmail>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContactEmail {
    pub email: Option<String>,
    pub email_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Organization {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub estimated_num_employees: Option<u64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub annual_revenue: Option<f64>,
    pub technology_names: Option<Vec<String>>,
    pub current_technologies: Option<Vec<Technology>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Technology {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
}

// -- Client -------------------------------------------------------------------

impl PeopleSearchClient {
    pub fn new(config: PeopleSearchConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    fn api_key(&self) -> Result<String, ToolError> {
        self.config.resolve_api_key().ok_or_else(|| {
            ToolError::Config(format!(
                "people search API key is not set (config `people_search.api_key` or env `{}`)",
                self.config.api_key_env
            ))
        })
    }

    /// Search for people. All parameters travel in the query string; the body is empty.
    pub async fn search(
        &self,
        params: &PeopleSearchParams,
    ) -> Result<PeopleSearchResponse, ToolError> {
        let api_key = self.api_key()?;
        let url = params.to_query().append_to(&format!(
            "{}/mixed_people/search",
            self.config.base_url.trim_end_matches('/')
        ));
        debug!("People search (page {})", params.page);

        let req = self
            .http
            .post(&url)
            .header("accept", "application/json")
            .header("Cache-Control", "no-cache")
            .header("Content-Type", "application/json")
            .header("x-api-key", api_key);

        self.http.send_json(req).await
    }
}

#[async_trait]
impl Endpoint for PeopleSearchClient {
    type Input = PeopleSearchParams;
    type Output = PeopleSearchResponse;

    fn name(&self) -> &'static str {
        TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Search for people by job title, seniority, location and employer, returning \
         profiles with employment history and organization details."
    }

    async fn fetch(&self, input: PeopleSearchParams) -> Result<PeopleSearchResponse, ToolError> {
        self.search(&input).await
    }
}
