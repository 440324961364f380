use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use moveline_core::script::states::FieldRequest;

#[async_trait]
pub trait NluClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Completion client for an Ollama-compatible generate endpoint.
pub struct HttpNluClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl HttpNluClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self { client, base_url: base_url.into(), model: model.into(), api_key }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.context("nlu request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("nlu service returned status {}", response.status()));
        }
        let payload: GenerateResponse =
            response.json().await.context("nlu response was not valid JSON")?;
        Ok(payload.response)
    }
}

/// One extraction round trip: schema-described prompt, bounded by `timeout`,
/// JSON response with markdown fences tolerated.
pub async fn extract_value(
    client: &dyn NluClient,
    request: FieldRequest,
    utterance: &str,
    timeout: Duration,
) -> Result<String> {
    let prompt = extraction_prompt(request, utterance);
    let raw = tokio::time::timeout(timeout, client.complete(&prompt))
        .await
        .map_err(|_| anyhow!("nlu extraction timed out after {timeout:?}"))??;
    parse_value(&raw)
}

fn extraction_prompt(request: FieldRequest, utterance: &str) -> String {
    format!(
        "Extract a single field from a phone caller's utterance.\n\
         Field: {}\n\
         Utterance: {utterance:?}\n\
         Respond with JSON only, exactly: {{\"value\": \"<extracted value>\"}}.\n\
         Use an empty string when the utterance does not contain the field.",
        schema_description(request)
    )
}

fn schema_description(request: FieldRequest) -> &'static str {
    match request {
        FieldRequest::Address => {
            "a street address including city, e.g. \"100 Elm St, Austin\""
        }
        FieldRequest::PersonName => "the caller's full name, e.g. \"Jordan Avery\"",
        FieldRequest::Email => "an email address, e.g. \"jordan@example.com\"",
        FieldRequest::MoveDate => "a calendar date in YYYY-MM-DD form",
        FieldRequest::Bedrooms => "a bedroom count as a number",
        FieldRequest::FreeText => "a short free-text description",
    }
}

fn parse_value(raw: &str) -> Result<String> {
    let stripped = strip_code_fences(raw);

    #[derive(Deserialize)]
    struct ValuePayload {
        value: serde_json::Value,
    }

    let payload: ValuePayload = serde_json::from_str(stripped.trim())
        .with_context(|| format!("nlu returned non-parseable output: {raw:?}"))?;

    let value = match payload.value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => number.to_string(),
        other => return Err(anyhow!("nlu value had unexpected type: {other}")),
    };
    if value.trim().is_empty() {
        return Err(anyhow!("nlu could not find the field in the utterance"));
    }
    Ok(value)
}

/// Tolerates ``` and ```json fences around the JSON body.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest)
}
