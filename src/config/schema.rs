//! Configuration schema for odmcp.toml.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OdmcpConfig {
    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Deadline for a single outbound HTTP request.
    pub request_timeout_secs: u64,

    /// Deadline for a whole paged fetch, all pages included.
    pub paging_timeout_secs: u64,

    /// Maximum number of pages a paged fetch may request.
    pub max_pages: u32,

    /// User-Agent sent with every upstream request.
    pub user_agent: String,

    /// Public transit connections (transport.opendata.ch).
    pub transit: EndpointConfig,

    /// SBB open data portal.
    pub sbb: EndpointConfig,

    /// Swiss EV charging stations WFS.
    pub evcharge: EndpointConfig,

    /// Climate Watch historical emissions.
    pub emissions: EndpointConfig,

    /// People search API.
    pub people_search: PeopleSearchConfig,
}

/// A provider table that only overrides the base URL. When the table is
/// present, `base_url` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
}

impl EndpointConfig {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeopleSearchConfig {
    pub base_url: String,

    /// API key. Leave unset to read it from `api_key_env` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for PeopleSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.apollo.io/api/v1".into(),
            api_key: None,
            api_key_env: "PERSONAL_API_KEY".into(),
        }
    }
}

impl PeopleSearchConfig {
    /// The configured key, falling back to the environment. Empty values count
    /// as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for OdmcpConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            request_timeout_secs: 30,
            paging_timeout_secs: 120,
            max_pages: 20,
            user_agent: concat!("odmcp/", env!("CARGO_PKG_VERSION")).into(),
            transit: EndpointConfig::new("https://transport.opendata.ch/v1"),
            sbb: EndpointConfig::new("https://data.sbb.ch/api/explore/v2.1"),
            evcharge: EndpointConfig::new(
                "http://ich-tanke-strom.switzerlandnorth.cloudapp.azure.com:8080/geoserver/ich-tanke-strom/ows",
            ),
            emissions: EndpointConfig::new("https://www.climatewatchdata.org/api/v1"),
            people_search: PeopleSearchConfig::default(),
        }
    }
}

impl OdmcpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn paging_timeout(&self) -> Duration {
        Duration::from_secs(self.paging_timeout_secs)
    }

    /// Point every provider at the same base URL. Used to aim the whole
    /// server at a local mock.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.transit.base_url = base_url.into();
        self.sbb.base_url = base_url.into();
        self.evcharge.base_url = base_url.into();
        self.emissions.base_url = base_url.into();
        self.people_search.base_url = base_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: OdmcpConfig = toml::from_str(
            r#"
            request_timeout_secs = 5

            [transit]
            base_url = "http://localhost:9000"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.transit.base_url, "http://localhost:9000");
        assert_eq!(cfg.sbb.base_url, "https://data.sbb.ch/api/explore/v2.1");
        assert_eq!(cfg.max_pages, 20);
        assert_eq!(cfg.people_search.api_key_env, "PERSONAL_API_KEY");
    }

    #[test]
    fn explicit_key_wins_and_blank_is_absent() {
        let mut people = PeopleSearchConfig {
            api_key: Some("abc".into()),
            api_key_env: "ODMCP_TEST_UNSET_KEY_VAR".into(),
            ..PeopleSearchConfig::default()
        };
        assert_eq!(people.resolve_api_key().as_deref(), Some("abc"));

        people.api_key = Some("   ".into());
        assert_eq!(people.resolve_api_key(), None);
    }
}
