use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub triage_api_url: Option<String>,
    pub triage_api_key: Option<String>,
    /// Hard ceiling for one assignment attempt. Exceeding it aborts the
    /// transaction and reports a Timeout outcome.
    pub assignment_deadline: Duration,
    pub session_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // No triage URL means the oracle is treated as unavailable and every
        // suggestion comes from the rule-based fallback.
        let triage_api_url = env::var("TRIAGE_API_URL").ok().filter(|s| !s.is_empty());
        let triage_api_key = env::var("TRIAGE_API_KEY").ok().filter(|s| !s.is_empty());

        let assignment_deadline = parse_secs("ASSIGNMENT_DEADLINE_SECS", 10)?;
        let session_ttl = parse_secs("SESSION_TTL_SECS", 12 * 60 * 60)?;

        Ok(Self {
            bind_addr,
            triage_api_url,
            triage_api_key,
            assignment_deadline,
            session_ttl,
        })
    }
}

fn parse_secs(var: &str, default: u64) -> Result<Duration, String> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("{} must be a whole number of seconds", var)),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
