pub mod fingerprint;
pub mod gibberish;
pub mod sanitize;
pub mod spam;

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::error::StoreError;
use crate::store::KeyValueStore;

use spam::{SpamFilter, SpamInput};

/// Submitted form values keyed by field name.
pub type FormFields = BTreeMap<String, String>;

pub const TIME_GATE_MESSAGE: &str =
    "Please take a moment to review your message before submitting.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";

/// Metadata fields appended by `prepare_for_transmission`.
pub const SUBMITTED_AT_FIELD: &str = "_submitted_at";
pub const TIMEZONE_FIELD: &str = "_timezone";

/// Which check produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Honeypot,
    TimeGate,
    RateLimit,
    Input,
    Spam,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckKind::Honeypot => "honeypot",
            CheckKind::TimeGate => "time_gate",
            CheckKind::RateLimit => "rate_limit",
            CheckKind::Input => "input",
            CheckKind::Spam => "spam",
        };
        f.write_str(s)
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Positively identified automation. The caller must render success and reveal nothing.
    Silent,
    /// A reason the submitter is shown.
    Explained(String),
}

impl Rejection {
    pub fn message(&self) -> Option<&str> {
        match self {
            Rejection::Silent => None,
            Rejection::Explained(msg) => Some(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<Rejection>,
    pub is_bot: Option<bool>,
    pub check: Option<CheckKind>,
}

impl ValidationResult {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
            is_bot: None,
            check: None,
        }
    }

    fn silent(check: CheckKind) -> Self {
        Self {
            valid: false,
            error: Some(Rejection::Silent),
            is_bot: Some(true),
            check: Some(check),
        }
    }

    fn explained(check: CheckKind, message: impl Into<String>, is_bot: Option<bool>) -> Self {
        Self {
            valid: false,
            error: Some(Rejection::Explained(message.into())),
            is_bot,
            check: Some(check),
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self.error, Some(Rejection::Silent))
    }
}

/// In-process record of when each form instance became interactive.
pub struct FormSessions {
    loaded: DashMap<String, i64>,
}

impl FormSessions {
    pub fn new() -> Self {
        Self {
            loaded: DashMap::new(),
        }
    }

    pub fn loaded_at(&self, form_id: &str) -> Option<i64> {
        self.loaded.get(form_id).map(|v| *v.value())
    }

    pub fn reset(&self, form_id: &str) {
        self.loaded.remove(form_id);
    }

    /// Forget sessions that began before `cutoff`. Returns how many were dropped.
    pub fn prune(&self, cutoff: i64) -> usize {
        let before = self.loaded.len();
        self.loaded.retain(|_, loaded_at| *loaded_at >= cutoff);
        before - self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl Default for FormSessions {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FormGuard {
    config: SecurityConfig,
    clock: Arc<dyn Clock>,
    spam: SpamFilter,
}

impl FormGuard {
    pub fn new(config: SecurityConfig, clock: Arc<dyn Clock>) -> Result<Self, String> {
        let spam = SpamFilter::new(&config.spam_phrases, config.gibberish.clone())
            .map_err(|e| format!("Invalid spam phrase list: {e}"))?;
        Ok(Self {
            config,
            clock,
            spam,
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Remember the current time as the load time of `form_id`, mirrored into the
    /// durable store. Store failures are logged and otherwise ignored.
    pub fn begin_session(
        &self,
        sessions: &FormSessions,
        store: &dyn KeyValueStore,
        form_id: &str,
    ) -> i64 {
        let now = self.clock.now_millis();
        sessions.loaded.insert(form_id.to_string(), now);

        let key = self.session_key(form_id);
        if let Err(e) = store.set(&key, &now.to_string()) {
            tracing::warn!("Could not mirror session for form {form_id}: {e}");
        }

        tracing::debug!("Session started for form {form_id} at {now}");
        now
    }

    /// Run every check in order and stop at the first failure.
    pub fn validate(
        &self,
        sessions: &FormSessions,
        store: &dyn KeyValueStore,
        fields: &FormFields,
        honeypot_value: Option<&str>,
        form_id: &str,
    ) -> ValidationResult {
        let result = self.check_honeypot(honeypot_value);
        if !result.valid {
            return result;
        }

        let result = self.check_time_gate(sessions, store, form_id);
        if !result.valid {
            return result;
        }

        let result = self.check_rate_limit(store);
        if !result.valid {
            return result;
        }

        let result = self.check_input(fields);
        if !result.valid {
            return result;
        }

        self.check_spam(fields)
    }

    pub fn check_honeypot(&self, honeypot_value: Option<&str>) -> ValidationResult {
        match honeypot_value {
            Some(v) if !v.trim().is_empty() => ValidationResult::silent(CheckKind::Honeypot),
            _ => ValidationResult::accepted(),
        }
    }

    /// Reject submissions that arrive faster than a person could fill the form.
    /// Missing or unreadable sessions are allowed through.
    pub fn check_time_gate(
        &self,
        sessions: &FormSessions,
        store: &dyn KeyValueStore,
        form_id: &str,
    ) -> ValidationResult {
        let loaded_at = match sessions.loaded_at(form_id) {
            Some(t) => Some(t),
            None => match self.stored_session(store, form_id) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Session lookup failed for form {form_id}, allowing: {e}");
                    None
                }
            },
        };

        let Some(loaded_at) = loaded_at else {
            tracing::debug!("No session for form {form_id}, allowing");
            return ValidationResult::accepted();
        };

        let elapsed = self.clock.now_millis() - loaded_at;
        if elapsed < self.config.min_submission_delay_ms {
            return ValidationResult::explained(CheckKind::TimeGate, TIME_GATE_MESSAGE, Some(true));
        }

        ValidationResult::accepted()
    }

    pub fn check_rate_limit(&self, store: &dyn KeyValueStore) -> ValidationResult {
        let now = self.clock.now_millis();
        let ledger = match self.load_ledger(store, now) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!("Submission ledger unavailable, allowing: {e}");
                return ValidationResult::accepted();
            }
        };

        if ledger.len() < self.config.rate_limit {
            return ValidationResult::accepted();
        }

        let oldest = ledger.iter().copied().min().unwrap_or(now);
        let remaining_ms = self.config.rate_window_ms - (now - oldest);
        let wait_secs = (remaining_ms.max(0) + 999) / 1000;

        ValidationResult::explained(
            CheckKind::RateLimit,
            format!("Too many submissions. Please wait {wait_secs} seconds before trying again."),
            None,
        )
    }

    pub fn check_input(&self, fields: &FormFields) -> ValidationResult {
        for (name, value) in fields {
            if *name == self.config.honeypot_field {
                continue;
            }

            if let Some(max) = self.config.max_length(name) {
                if value.chars().count() > max {
                    return ValidationResult::explained(
                        CheckKind::Input,
                        format!("The {name} field exceeds the maximum length of {max} characters."),
                        None,
                    );
                }
            }

            if sanitize::contains_injection(value) {
                return ValidationResult::explained(
                    CheckKind::Input,
                    format!("The {name} field contains content that is not allowed."),
                    None,
                );
            }

            if name == "email" && !value.trim().is_empty() && !sanitize::is_valid_email(value.trim())
            {
                return ValidationResult::explained(CheckKind::Input, INVALID_EMAIL_MESSAGE, None);
            }
        }

        ValidationResult::accepted()
    }

    pub fn check_spam(&self, fields: &FormFields) -> ValidationResult {
        let input = SpamInput {
            name: field(fields, "name"),
            subject: field(fields, "subject"),
            message: field(fields, "message"),
        };

        match self.spam.first_match(&input) {
            Some(rule) => {
                tracing::debug!("Spam rule {rule:?} matched");
                ValidationResult::explained(CheckKind::Spam, rule.reason(), None)
            }
            None => ValidationResult::accepted(),
        }
    }

    /// Append the current time to the ledger. Call only once the submission has been
    /// accepted downstream.
    pub fn record_submission(&self, store: &dyn KeyValueStore) {
        let now = self.clock.now_millis();
        let mut ledger = self.load_ledger(store, now).unwrap_or_else(|e| {
            tracing::warn!("Submission ledger unreadable, starting fresh: {e}");
            Vec::new()
        });
        ledger.push(now);

        if let Err(e) = self.save_ledger(store, &ledger) {
            tracing::warn!("Could not record submission: {e}");
        }
    }

    /// Sanitize every visible field, drop the honeypot, and append submission metadata.
    pub fn prepare_for_transmission(&self, fields: &FormFields, timezone: Option<&str>) -> FormFields {
        let mut prepared: FormFields = fields
            .iter()
            .filter(|(name, _)| **name != self.config.honeypot_field)
            .map(|(name, value)| (name.clone(), sanitize::sanitize(value)))
            .collect();

        let submitted_at = chrono::DateTime::from_timestamp_millis(self.clock.now_millis())
            .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default();
        let timezone = timezone
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or("unknown");

        prepared.insert(SUBMITTED_AT_FIELD.to_string(), submitted_at);
        prepared.insert(TIMEZONE_FIELD.to_string(), timezone.to_string());
        prepared
    }

    /// Oldest load time a session may have and still be kept.
    pub fn session_cutoff(&self) -> i64 {
        self.clock.now_millis() - self.config.session_ttl_ms
    }

    /// Remove expired session mirrors and ledgers with nothing left in the window.
    /// Unreadable entries are removed too. Returns the number of keys removed.
    pub fn sweep_store(&self, store: &dyn KeyValueStore) -> Result<usize, StoreError> {
        let now = self.clock.now_millis();
        let cutoff = self.session_cutoff();
        let mut removed = 0;

        for key in store.keys("")? {
            let stale = if key.starts_with(&self.config.session_key_prefix) {
                store
                    .get(&key)?
                    .is_some_and(|raw| raw.trim().parse::<i64>().map_or(true, |t| t < cutoff))
            } else if key == self.config.ledger_key {
                self.load_ledger(store, now).map_or(true, |ledger| ledger.is_empty())
            } else {
                false
            };

            if stale {
                store.remove(&key)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn session_key(&self, form_id: &str) -> String {
        format!("{}{form_id}", self.config.session_key_prefix)
    }

    fn stored_session(
        &self,
        store: &dyn KeyValueStore,
        form_id: &str,
    ) -> Result<Option<i64>, StoreError> {
        let Some(raw) = store.get(&self.session_key(form_id))? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| StoreError::Corrupt(format!("session timestamp '{raw}': {e}")))
    }

    /// Ledger entries still inside the trailing window, oldest first.
    fn load_ledger(&self, store: &dyn KeyValueStore, now: i64) -> Result<Vec<i64>, StoreError> {
        let Some(raw) = store.get(&self.config.ledger_key)? else {
            return Ok(Vec::new());
        };
        let mut ledger: Vec<i64> = serde_json::from_str(&raw)?;
        ledger.retain(|t| now - *t < self.config.rate_window_ms);
        ledger.sort_unstable();
        Ok(ledger)
    }

    fn save_ledger(&self, store: &dyn KeyValueStore, ledger: &[i64]) -> Result<(), StoreError> {
        store.set(&self.config.ledger_key, &serde_json::to_string(ledger)?)
    }
}

fn field<'a>(fields: &'a FormFields, name: &str) -> &'a str {
    fields.get(name).map(String::as_str).unwrap_or("")
}
