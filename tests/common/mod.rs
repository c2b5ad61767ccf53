#![allow(dead_code)]

use httpmock::MockServer;
use odmcp::config::OdmcpConfig;
use odmcp::providers;
use odmcp::tools::ToolRegistry;
use odmcp::types::Content;
use serde_json::Value;

/// Defaults with every provider pointed at `server`.
pub fn config_for(server: &MockServer) -> OdmcpConfig {
    let mut cfg = OdmcpConfig::default().with_base_url(&server.base_url());
    cfg.request_timeout_secs = 5;
    cfg.people_search.api_key = Some("test-key".into());
    cfg
}

pub fn registry(cfg: &OdmcpConfig) -> ToolRegistry {
    providers::default_registry(cfg).expect("registry builds")
}

/// The single text item of a tool result.
pub fn only_text(content: &[Content]) -> &str {
    assert_eq!(content.len(), 1, "expected exactly one content item");
    content[0].as_text().expect("text content")
}

pub fn only_json(content: &[Content]) -> Value {
    serde_json::from_str(only_text(content)).expect("rendered output is JSON")
}
