use serde::Deserialize;

use crate::models::Priority;

use super::{OracleError, TriageOracle, TriageSuggestion};

/// Adapter for a remote triage-suggestion API. The service only depends on
/// the [`TriageOracle`] trait; this is the one production implementation.
pub struct HttpTriageOracle {
    client: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct OracleResponse {
    suggestion: String,
    priority: Option<String>,
}

impl HttpTriageOracle {
    pub fn new(url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl TriageOracle for HttpTriageOracle {
    async fn suggest(&self, symptoms: &str) -> Result<TriageSuggestion, OracleError> {
        let url = self.url.as_deref().ok_or(OracleError::NotConfigured)?;

        tracing::debug!(url, "requesting triage suggestion");

        let mut request = self
            .client
            .post(url)
            .json(&serde_json::json!({ "symptoms": symptoms }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "triage oracle request failed");
            OracleError::Unreachable(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body, "triage oracle returned an error");
            return Err(OracleError::BadResponse(format!("{}: {}", status, body)));
        }

        let body: OracleResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse triage oracle response");
            OracleError::BadResponse(e.to_string())
        })?;

        let priority_hint = body
            .priority
            .as_deref()
            .and_then(parse_priority)
            .or_else(|| scan_priority(&body.suggestion));

        Ok(TriageSuggestion {
            text: body.suggestion,
            priority_hint,
            from_oracle: true,
        })
    }
}

fn parse_priority(raw: &str) -> Option<Priority> {
    match raw.trim().to_lowercase().as_str() {
        "critical" => Some(Priority::Critical),
        "high" => Some(Priority::High),
        "medium" => Some(Priority::Medium),
        "low" => Some(Priority::Low),
        _ => None,
    }
}

/// Free-text responses usually still name a priority somewhere; take the
/// most urgent one mentioned.
fn scan_priority(text: &str) -> Option<Priority> {
    let lowered = text.to_lowercase();
    for (needle, priority) in [
        ("critical", Priority::Critical),
        ("high", Priority::High),
        ("medium", Priority::Medium),
        ("low", Priority::Low),
    ] {
        if lowered.contains(needle) {
            return Some(priority);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_priority_field_wins() {
        assert_eq!(parse_priority(" High "), Some(Priority::High));
        assert_eq!(parse_priority("urgent"), None);
    }

    #[test]
    fn free_text_scan_takes_the_most_urgent_mention() {
        assert_eq!(
            scan_priority("Likely critical, though some high-priority overlap"),
            Some(Priority::Critical)
        );
        assert_eq!(scan_priority("no priority stated"), None);
    }

    #[tokio::test]
    async fn unconfigured_oracle_reports_not_configured() {
        let oracle = HttpTriageOracle::new(None, None);
        let result = oracle.suggest("fever").await;
        assert!(matches!(result, Err(OracleError::NotConfigured)));
    }
}
