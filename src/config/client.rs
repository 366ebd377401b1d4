//! Configuration service client.

use super::types::StageConfig;

/// Fetch display/character settings from the configuration service.
///
/// One-shot: called once at startup. Errors are strings for the log; the
/// caller falls back to `StageConfig::default()`.
pub async fn fetch_stage_config(endpoint: &str) -> Result<StageConfig, String> {
    let response = reqwest::Client::new()
        .get(endpoint)
        .send()
        .await
        .map_err(|e| format!("Network error fetching stage config: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Config service error {}: {}", status, body));
    }

    response
        .json::<StageConfig>()
        .await
        .map_err(|e| format!("Failed to parse stage config: {}", e))
}
