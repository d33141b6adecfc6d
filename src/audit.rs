//! Backend health audit: one authenticated GET per endpoint, in order

use std::io::Write;

use ureq::Agent;

use crate::config::{BackendConfig, KEY_ENV};
use crate::console::Console;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStatus {
    Healthy(u16),
    Unhealthy(u16),
    Unreachable(String),
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub results: Vec<(String, EndpointStatus)>,
    pub placeholder_key: bool,
}

impl AuditReport {
    pub fn all_healthy(&self) -> bool {
        self.results
            .iter()
            .all(|(_, status)| matches!(status, EndpointStatus::Healthy(_)))
    }
}

pub struct HealthAuditor {
    agent: Agent,
    api_key: String,
    placeholder_key: bool,
    endpoints: Vec<String>,
}

impl HealthAuditor {
    /// Uses whatever key was resolved, placeholder included.
    pub fn new(config: &BackendConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            api_key: config.api_key.clone(),
            placeholder_key: config.is_placeholder(),
            endpoints: vec![format!("{}?select=id&limit=1", config.rest_url("user_playlists"))],
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn check_endpoint(&self, url: &str) -> EndpointStatus {
        let result = self
            .agent
            .get(url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .call();

        match result {
            Ok(response) if response.status().is_success() => {
                EndpointStatus::Healthy(response.status().as_u16())
            }
            Ok(response) => EndpointStatus::Unhealthy(response.status().as_u16()),
            Err(e) => EndpointStatus::Unreachable(e.to_string()),
        }
    }

    /// Check every endpoint and print the verdicts. Never fails.
    pub fn run<O: Write, E: Write>(&self, console: &mut Console<O, E>) -> AuditReport {
        console.line("[AUDIT] Starting backend health audit...");

        let mut report = AuditReport {
            results: Vec::with_capacity(self.endpoints.len()),
            placeholder_key: self.placeholder_key,
        };

        for url in &self.endpoints {
            let status = self.check_endpoint(url);
            match &status {
                EndpointStatus::Healthy(code) => {
                    console.line(&format!("[AUDIT] [OK] {} responded with {}", url, code));
                }
                EndpointStatus::Unhealthy(code) => {
                    log::warn!("{} returned {}", url, code);
                    console.error_line(&format!(
                        "[AUDIT] [FAIL] {} responded with status {}. This is not healthy. Investigate immediately.",
                        url, code
                    ));
                }
                EndpointStatus::Unreachable(message) => {
                    log::warn!("{} unreachable: {}", url, message);
                    console.error_line(&format!(
                        "[AUDIT] [ERROR] {} is unreachable: {}. This is unacceptable for a production system.",
                        url, message
                    ));
                }
            }
            report.results.push((url.clone(), status));
        }

        console.line("[AUDIT] Backend audit complete. If you see any errors above, do not ignore them. Fix them before proceeding.");
        if self.placeholder_key {
            console.error_line(&format!(
                "[AUDIT] [WARN] You must set your {} as an environment variable for this audit to work.",
                KEY_ENV
            ));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, KeySource};

    #[test]
    fn test_default_endpoint_targets_playlists_table() {
        let config = BackendConfig {
            url: "http://localhost:54321".to_string(),
            api_key: "k".to_string(),
            key_source: KeySource::Environment(KEY_ENV),
        };
        let auditor = HealthAuditor::new(&config);
        assert_eq!(
            auditor.endpoints(),
            &["http://localhost:54321/rest/v1/user_playlists?select=id&limit=1".to_string()]
        );
    }

    #[test]
    fn test_placeholder_key_warns_after_checks() {
        let config = BackendConfig::resolve_from(|_| None, &AppConfig::default());
        let auditor = HealthAuditor::new(&config).with_endpoints(Vec::new());
        let mut console = Console::buffered();
        let report = auditor.run(&mut console);

        assert!(report.placeholder_key);
        assert!(report.all_healthy());
        assert!(console.out_text().contains("[AUDIT] Backend audit complete."));
        assert!(console.err_text().contains("[AUDIT] [WARN] You must set your SUPABASE_KEY"));
    }
}
