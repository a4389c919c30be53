use std::net::IpAddr;

use ipnet::IpNet;

/// Phrases rejected by the spam check unless extended via `FORMGUARD_SPAM_PHRASES`.
pub const DEFAULT_SPAM_PHRASES: &[&str] = &[
    "viagra",
    "casino",
    "lottery",
    "winner",
    "nigerian prince",
    "bitcoin investment",
    "crypto doubler",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub store_path: Option<String>,
    /// How often stale sessions, profiles and ledgers are swept.
    pub cleanup_interval_secs: u64,
    pub relay: Option<RelayConfig>,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

/// Immutable guard settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub min_submission_delay_ms: i64,
    pub rate_limit: usize,
    pub rate_window_ms: i64,
    /// Form sessions older than this are forgotten by the sweep.
    pub session_ttl_ms: i64,
    pub max_lengths: Vec<(String, usize)>,
    pub honeypot_field: String,
    pub ledger_key: String,
    pub session_key_prefix: String,
    pub spam_phrases: Vec<String>,
    pub gibberish: GibberishThresholds,
}

/// Hand-tuned bounds for the gibberish detector.
#[derive(Debug, Clone, PartialEq)]
pub struct GibberishThresholds {
    pub min_chars: usize,
    pub vowel_ratio_min: f64,
    pub vowel_ratio_max: f64,
    pub consonant_run_limit: usize,
    pub case_check_min_letters: usize,
    pub max_case_change_ratio: f64,
    pub digraph_check_min_letters: usize,
    pub max_message_len: usize,
}

impl Default for GibberishThresholds {
    fn default() -> Self {
        Self {
            min_chars: 6,
            vowel_ratio_min: 0.2,
            vowel_ratio_max: 0.7,
            consonant_run_limit: 5,
            case_check_min_letters: 8,
            max_case_change_ratio: 0.5,
            digraph_check_min_letters: 10,
            max_message_len: 100,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            min_submission_delay_ms: 3000,
            rate_limit: 3,
            rate_window_ms: 60_000,
            session_ttl_ms: 86_400_000,
            max_lengths: vec![
                ("name".to_string(), 100),
                ("email".to_string(), 254),
                ("subject".to_string(), 200),
                ("message".to_string(), 5000),
            ],
            honeypot_field: "website_url".to_string(),
            ledger_key: "formguard_submissions".to_string(),
            session_key_prefix: "formguard_session_".to_string(),
            spam_phrases: DEFAULT_SPAM_PHRASES.iter().map(|s| s.to_string()).collect(),
            gibberish: GibberishThresholds::default(),
        }
    }
}

impl SecurityConfig {
    /// Maximum length for a field, if that field is constrained.
    pub fn max_length(&self, field: &str) -> Option<usize> {
        self.max_lengths
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, max)| *max)
    }

    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let min_submission_delay_ms: i64 =
            env_or("FORMGUARD_MIN_DELAY_MS", &defaults.min_submission_delay_ms.to_string())
                .parse()
                .map_err(|e| format!("Invalid FORMGUARD_MIN_DELAY_MS: {e}"))?;

        let rate_limit: usize = env_or("FORMGUARD_RATE_LIMIT", &defaults.rate_limit.to_string())
            .parse()
            .map_err(|e| format!("Invalid FORMGUARD_RATE_LIMIT: {e}"))?;

        let rate_window_ms: i64 =
            env_or("FORMGUARD_RATE_WINDOW_MS", &defaults.rate_window_ms.to_string())
                .parse()
                .map_err(|e| format!("Invalid FORMGUARD_RATE_WINDOW_MS: {e}"))?;

        let session_ttl_ms: i64 =
            env_or("FORMGUARD_SESSION_TTL_MS", &defaults.session_ttl_ms.to_string())
                .parse()
                .map_err(|e| format!("Invalid FORMGUARD_SESSION_TTL_MS: {e}"))?;

        let honeypot_field = env_or("FORMGUARD_HONEYPOT_FIELD", &defaults.honeypot_field);
        if honeypot_field.trim().is_empty() {
            return Err("FORMGUARD_HONEYPOT_FIELD must not be empty".to_string());
        }

        let mut spam_phrases = defaults.spam_phrases.clone();
        spam_phrases.extend(
            env_or("FORMGUARD_SPAM_PHRASES", "")
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        );

        Ok(SecurityConfig {
            min_submission_delay_ms,
            rate_limit,
            rate_window_ms,
            session_ttl_ms,
            honeypot_field,
            spam_phrases,
            ..defaults
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FORMGUARD_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMGUARD_HOST: {e}"))?;

        let port: u16 = env_or("FORMGUARD_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMGUARD_PORT: {e}"))?;

        let max_body_size: usize = env_or("FORMGUARD_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMGUARD_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("FORMGUARD_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid FORMGUARD_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("FORMGUARD_LOG_LEVEL", "info");

        let store_path = std::env::var("FORMGUARD_STORE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let cleanup_interval_secs: u64 = env_or("FORMGUARD_CLEANUP_INTERVAL_SECS", "300")
            .parse()
            .map_err(|e| format!("Invalid FORMGUARD_CLEANUP_INTERVAL_SECS: {e}"))?;

        let relay = match std::env::var("FORMGUARD_RELAY_URL").ok().filter(|s| !s.is_empty()) {
            Some(url) => Some(RelayConfig {
                url,
                max_retries: env_or("FORMGUARD_RELAY_MAX_RETRIES", "3")
                    .parse()
                    .map_err(|e| format!("Invalid FORMGUARD_RELAY_MAX_RETRIES: {e}"))?,
                backoff_ms: env_or("FORMGUARD_RELAY_BACKOFF_MS", "1000")
                    .parse()
                    .map_err(|e| format!("Invalid FORMGUARD_RELAY_BACKOFF_MS: {e}"))?,
            }),
            None => None,
        };

        let security = SecurityConfig::from_env()?;

        Ok(Config {
            host,
            port,
            max_body_size,
            trusted_proxies,
            log_level,
            store_path,
            cleanup_interval_secs,
            relay,
            security,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
