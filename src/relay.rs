use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::guard::FormFields;

/// Forwards accepted submissions to the downstream endpoint.
pub struct Relay {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    backoff: Duration,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build relay client: {e}"))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Deliver a prepared submission, retrying with exponential backoff.
    /// Returns the downstream status code of the accepted attempt.
    pub async fn deliver(
        &self,
        submission_id: Uuid,
        form_id: &str,
        fields: &FormFields,
    ) -> Result<u16, String> {
        let body = json!({
            "submission_id": submission_id,
            "form_id": form_id,
            "fields": fields,
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff * 2u32.saturating_pow(attempt - 1);
                tracing::debug!("Retrying relay of {submission_id} in {delay:?} (attempt {attempt})");
                tokio::time::sleep(delay).await;
            }

            match self.client.post(&self.url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp.status().as_u16()),
                Ok(resp) if resp.status().is_client_error() => {
                    // 4xx is final
                    return Err(format!("Downstream rejected submission: {}", resp.status()));
                }
                Ok(resp) => last_error = format!("Downstream returned {}", resp.status()),
                Err(e) => last_error = format!("Relay request failed: {e}"),
            }

            tracing::warn!("Relay attempt {attempt} for {submission_id} failed: {last_error}");
        }

        Err(last_error)
    }
}
