//! REST client for the hosted tables (PostgREST conventions)

use serde_json::Value;
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use super::{Filter, Query, RestBackend};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::rows::Table;

/// Upper bound for a single response body (large playlists run to tens of MB)
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

pub struct RestClient {
    agent: Agent,
    config: BackendConfig,
}

impl RestClient {
    /// No timeouts: requests rely on the transport defaults.
    pub fn new(config: BackendConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, config }
    }

    /// Like `new`, but refuses a placeholder key.
    pub fn connect(config: BackendConfig) -> Result<Self> {
        Ok(Self::new(config.require_key()?))
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        request
            .header("apikey", self.config.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    fn with_filters<B>(request: RequestBuilder<B>, filters: &[Filter]) -> RequestBuilder<B> {
        filters.iter().fold(request, |request, filter| {
            request.query(filter.column.as_str(), format!("eq.{}", filter.value))
        })
    }

    fn read_body(result: std::result::Result<Response<Body>, ureq::Error>) -> Result<String> {
        let mut response = result?;
        let status = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }
}

/// The backend's `message` field when the body is a JSON error, else the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl RestBackend for RestClient {
    fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let url = self.config.rest_url(table.as_str());
        log::debug!("GET {} {:?}", url, query);

        let mut request = self.authorize(self.agent.get(&url)).query("select", "*");
        request = Self::with_filters(request, &query.filters);
        if let Some((column, ascending)) = &query.order {
            let direction = if *ascending { "asc" } else { "desc" };
            request = request.query("order", format!("{}.{}", column, direction));
        }
        if let Some(limit) = query.limit {
            request = request.query("limit", limit.to_string());
        }

        let body = Self::read_body(request.call())?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn insert(&self, table: Table, rows: Vec<Value>) -> Result<()> {
        let url = self.config.rest_url(table.as_str());
        log::debug!("POST {} ({} rows)", url, rows.len());

        let payload = serde_json::to_string(&rows)?;
        let request = self
            .authorize(self.agent.post(&url))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal");
        Self::read_body(request.send(payload))?;
        Ok(())
    }

    fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<()> {
        let url = self.config.rest_url(table.as_str());
        log::debug!("PATCH {} where {}={}", url, filter.column, filter.value);

        let payload = serde_json::to_string(&patch)?;
        let request = Self::with_filters(self.authorize(self.agent.patch(&url)), std::slice::from_ref(filter))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal");
        Self::read_body(request.send(payload))?;
        Ok(())
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<()> {
        let url = self.config.rest_url(table.as_str());
        log::debug!("DELETE {} where {}={}", url, filter.column, filter.value);

        let request = Self::with_filters(self.authorize(self.agent.delete(&url)), std::slice::from_ref(filter));
        Self::read_body(request.call())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message() {
        let body = r#"{"code":"42P01","message":"relation \"user_playlists\" does not exist"}"#;
        assert_eq!(error_message(body), "relation \"user_playlists\" does not exist");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }
}
