//! Triage suggestion source. An external oracle proposes a priority from
//! free-text symptoms; when it is down the service degrades to a keyword
//! classifier and patient creation proceeds untouched either way.

pub mod http;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Priority;
use crate::store::Store;

pub use http::HttpTriageOracle;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("triage oracle unreachable: {0}")]
    Unreachable(String),
    #[error("triage oracle returned an unusable response: {0}")]
    BadResponse(String),
    #[error("no triage oracle configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TriageSuggestion {
    pub text: String,
    pub priority_hint: Option<Priority>,
    /// False when the text came from the rule-based fallback.
    pub from_oracle: bool,
}

#[async_trait]
pub trait TriageOracle: Send + Sync {
    async fn suggest(&self, symptoms: &str) -> Result<TriageSuggestion, OracleError>;
}

/// Injectable time source so the availability TTL is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Remembers a failed oracle call for one TTL window so every admission does
/// not pay a doomed network round-trip. Explicitly passed around, never a
/// process-wide static.
pub struct OracleStatus {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    down_since: Mutex<Option<Instant>>,
}

impl OracleStatus {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            down_since: Mutex::new(None),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock), Self::DEFAULT_TTL)
    }

    pub fn is_available(&self) -> bool {
        let mut down_since = self.down_since.lock().expect("oracle status lock poisoned");
        match *down_since {
            None => true,
            Some(failed_at) => {
                if self.clock.now().duration_since(failed_at) >= self.ttl {
                    *down_since = None;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn mark_unavailable(&self) {
        let mut down_since = self.down_since.lock().expect("oracle status lock poisoned");
        *down_since = Some(self.clock.now());
    }
}

static CRITICAL_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec!["chest pain", "difficulty breathing", "severe pain", "unconscious"]
});
static HIGH_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| vec!["fever", "vomiting", "infection"]);
static MEDIUM_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| vec!["cough", "headache"]);

/// Deterministic keyword fallback used whenever the oracle is unavailable.
pub fn classify_symptoms(symptoms: &str) -> Priority {
    let lowered = symptoms.to_lowercase();
    if CRITICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Priority::Critical
    } else if HIGH_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Priority::High
    } else if MEDIUM_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn fallback_suggestion(symptoms: &str) -> TriageSuggestion {
    let priority = classify_symptoms(symptoms);
    TriageSuggestion {
        text: format!(
            "Triage assistant unavailable; rule-based priority {}. Not medical advice.",
            priority
        ),
        priority_hint: Some(priority),
        from_oracle: false,
    }
}

/// Consults the oracle unless it is known to be down, falling back to the
/// keyword classifier. Oracle failures are absorbed here and only mark the
/// availability cache.
pub async fn suggest_with_fallback(
    oracle: &dyn TriageOracle,
    status: &OracleStatus,
    symptoms: &str,
) -> TriageSuggestion {
    if status.is_available() {
        match oracle.suggest(symptoms).await {
            Ok(suggestion) => return suggestion,
            Err(err) => {
                tracing::warn!(error = %err, "triage oracle failed; falling back to keyword rules");
                status.mark_unavailable();
            }
        }
    }
    fallback_suggestion(symptoms)
}

/// Best-effort follow-up after an admission: store the advisory text and let
/// the oracle raise the stored priority. Runs outside the assignment
/// transaction and never affects whether the patient was created.
pub async fn enrich_patient(
    store: Arc<dyn Store>,
    oracle: Arc<dyn TriageOracle>,
    status: Arc<OracleStatus>,
    patient_id: Uuid,
    requested_by: Uuid,
) {
    let Some(mut patient) = store.patient(patient_id).await else {
        return;
    };
    if patient.symptoms.is_empty() {
        return;
    }

    let suggestion = suggest_with_fallback(oracle.as_ref(), status.as_ref(), &patient.symptoms).await;

    patient.ai_suggestion = Some(suggestion.text.clone());
    if let Some(hint) = suggestion.priority_hint {
        if hint != patient.priority {
            tracing::info!(
                patient_id = %patient.id,
                old = %patient.priority,
                new = %hint,
                requested_by = %requested_by,
                "triage suggestion updated patient priority"
            );
            patient.priority = hint;
        }
    }

    if !store.update_patient(patient).await {
        tracing::debug!(patient_id = %patient_id, "patient vanished before triage enrichment landed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_fallback_matches_the_rule_table() {
        assert_eq!(classify_symptoms("sudden chest pain at rest"), Priority::Critical);
        assert_eq!(classify_symptoms("Difficulty Breathing"), Priority::Critical);
        assert_eq!(classify_symptoms("high fever since yesterday"), Priority::High);
        assert_eq!(classify_symptoms("persistent cough"), Priority::Medium);
        assert_eq!(classify_symptoms("sprained ankle"), Priority::Low);
        assert_eq!(classify_symptoms(""), Priority::Low);
    }

    struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn availability_cache_expires_after_ttl() {
        let clock = Arc::new(FakeClock {
            now: Mutex::new(Instant::now()),
        });
        let status = OracleStatus::new(clock.clone(), Duration::from_secs(300));

        assert!(status.is_available());
        status.mark_unavailable();
        assert!(!status.is_available());

        clock.advance(Duration::from_secs(299));
        assert!(!status.is_available());

        clock.advance(Duration::from_secs(1));
        assert!(status.is_available());
    }

    struct DownOracle;

    #[async_trait]
    impl TriageOracle for DownOracle {
        async fn suggest(&self, _symptoms: &str) -> Result<TriageSuggestion, OracleError> {
            Err(OracleError::Unreachable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_fallback_and_marks_cache() {
        let status = OracleStatus::with_system_clock();
        let suggestion = suggest_with_fallback(&DownOracle, &status, "vomiting and fever").await;
        assert!(!suggestion.from_oracle);
        assert_eq!(suggestion.priority_hint, Some(Priority::High));
        // The failure is remembered; the next call skips the oracle.
        assert!(!status.is_available());
    }
}
