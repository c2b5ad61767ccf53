//! Outbound HTTP: one request per call, typed failures, bounded paging.

use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::OdmcpConfig;
use crate::error::ToolError;

/// Shared HTTP client used by every provider.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    timeout: Duration,
    paging_timeout: Duration,
    max_pages: u32,
}

/// A single page of a cursor-paginated response.
pub trait Page: DeserializeOwned {
    type Item;

    /// Split the page into its items and the cursor for the next page, if any.
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl HttpClient {
    pub fn new(config: &OdmcpConfig) -> Result<Self, ToolError> {
        let timeout = config.request_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ToolError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            timeout,
            paging_timeout: config.paging_timeout(),
            max_pages: config.max_pages,
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ToolError> {
        self.send_json(self.get(url)).await
    }

    /// Send a prepared request and decode the JSON body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ToolError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ToolError::from_reqwest(e, self.timeout))?;

        let status = resp.status();
        let url = resp.url().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %redact(&url), "upstream returned an error status");
            return Err(ToolError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), url = %redact(&url), bytes = body.len(), "upstream response");
        decode_json(&body)
    }

    /// Follow `next` cursors from `first_url`, concatenating every page's items.
    ///
    /// Stops when a page carries no cursor. Fails with `PageLimit` once
    /// `max_pages` pages have been fetched and a cursor is still present, and
    /// with `Timeout` when the whole walk exceeds the paging deadline.
    pub async fn fetch_paged<P: Page>(&self, first_url: &str) -> Result<Vec<P::Item>, ToolError> {
        match tokio::time::timeout(self.paging_timeout, self.walk_pages::<P>(first_url)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                after: self.paging_timeout,
            }),
        }
    }

    async fn walk_pages<P: Page>(&self, first_url: &str) -> Result<Vec<P::Item>, ToolError> {
        let mut items = Vec::new();
        let mut next = Some(first_url.to_string());
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            if pages >= self.max_pages {
                warn!(pages, "paging bound reached with a cursor outstanding");
                return Err(ToolError::PageLimit { pages });
            }

            let page: P = self.get_json(&url).await?;
            pages += 1;

            let (mut page_items, cursor) = page.into_parts();
            debug!(page = pages, items = page_items.len(), "fetched page");
            items.append(&mut page_items);

            next = match cursor {
                Some(c) if !c.trim().is_empty() => Some(resolve_cursor(&url, &c)?),
                _ => None,
            };
        }

        Ok(items)
    }
}

/// Decode a JSON body, naming the offending field on mismatch.
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ToolError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let path = e.path().to_string();
        ToolError::ResponseParse {
            path,
            message: e.into_inner().to_string(),
        }
    })
}

/// Cursors may be absolute URLs or relative to the page that returned them.
fn resolve_cursor(current: &str, cursor: &str) -> Result<String, ToolError> {
    let base = Url::parse(current).map_err(|e| ToolError::ResponseParse {
        path: "next".into(),
        message: format!("cannot resolve cursor against {current}: {e}"),
    })?;
    base.join(cursor)
        .map(String::from)
        .map_err(|e| ToolError::ResponseParse {
            path: "next".into(),
            message: format!("invalid cursor `{cursor}`: {e}"),
        })
}

/// Drop the query string so API parameters never end up in the logs verbatim.
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[allow(dead_code)]
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize)]
    struct Item {
        #[allow(dead_code)]
        id: u32,
    }

    #[test]
    fn decode_names_the_missing_field() {
        let err = decode_json::<Body>(r#"{"items":[{"id":1},{}]}"#).unwrap_err();
        match err {
            ToolError::ResponseParse { path, message } => {
                assert_eq!(path, "items[1]");
                assert!(message.contains("missing field `id`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_names_the_mistyped_field() {
        let err = decode_json::<Body>(r#"{"items":[{"id":"one"}]}"#).unwrap_err();
        assert!(matches!(err, ToolError::ResponseParse { ref path, .. } if path == "items[0].id"));
    }

    #[test]
    fn cursors_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_cursor("https://api.example.org/v1/data?page=1", "/v1/data?page=2").unwrap(),
            "https://api.example.org/v1/data?page=2"
        );
        assert_eq!(
            resolve_cursor("https://api.example.org/v1/data", "https://other.org/p/3").unwrap(),
            "https://other.org/p/3"
        );
    }

    #[test]
    fn redaction_drops_query() {
        let url = Url::parse("https://api.example.org/search?x-api-key=secret").unwrap();
        assert_eq!(redact(&url), "https://api.example.org/search");
    }
}
