//! Generative-language providers.
//!
//! A provider turns one prompt into one text answer with a single blocking
//! HTTP call. Callers treat every failure as recoverable and fall back to a
//! non-AI path where one exists.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use ureq::Agent;
use url::Url;

/// Model provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
    Openai,
    Offline,
}

impl ProviderType {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderType::Openai => "https://api.openai.com/v1",
            ProviderType::Offline => "",
        }
    }

    /// Model used when `ai.model` is not set
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-1.5-flash",
            ProviderType::Openai => "gpt-4o-mini",
            ProviderType::Offline => "",
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Openai => Some("OPENAI_API_KEY"),
            ProviderType::Offline => None,
        }
    }
}

/// Trait for model providers
pub trait ModelProvider {
    fn complete(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Validate an endpoint and join a path onto it.
pub fn endpoint_url(endpoint: &str, path: &str) -> Result<Url> {
    let base = Url::parse(endpoint.trim_end_matches('/'))
        .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        bail!("Invalid endpoint URL: {} (expected http or https)", endpoint);
    }
    Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), path))
        .with_context(|| format!("Invalid endpoint URL: {}", endpoint))
}

fn resolve_key(configured: &Option<String>, provider: ProviderType) -> Result<String> {
    if let Some(key) = configured.as_ref().filter(|k| !k.trim().is_empty()) {
        return Ok(key.clone());
    }
    let var = provider
        .api_key_env()
        .ok_or_else(|| anyhow!("Provider has no API key"))?;
    std::env::var(var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow!("{} environment variable not set", var))
}

fn post_json(agent: &Agent, url: &Url, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
    let mut request = agent
        .post(url.as_str())
        .set("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.set(name, value);
    }

    tracing::debug!(host = url.host_str().unwrap_or(""), path = url.path(), "AI request");

    match request.send_json(body) {
        Ok(response) => response
            .into_json::<Value>()
            .context("AI response is not valid JSON"),
        Err(ureq::Error::Status(code @ (401 | 403), _)) => {
            Err(anyhow!("Authentication failed (HTTP {}). Check the API key", code))
        }
        Err(ureq::Error::Status(code, response)) => Err(anyhow!(
            "HTTP {}: {}",
            code,
            response.status_text()
        )),
        Err(e) => Err(anyhow!("HTTP request failed: {}", e)),
    }
}

fn build_agent(timeout: Duration) -> Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Google generative-language `generateContent` endpoint
pub struct GeminiProvider {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ModelProvider for GeminiProvider {
    fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = resolve_key(&self.api_key, ProviderType::Gemini)?;
        let url = endpoint_url(
            &self.endpoint,
            &format!("models/{}:generateContent", self.model),
        )?;

        let body = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = post_json(
            &build_agent(self.timeout),
            &url,
            &[("x-goog-api-key", api_key.as_str())],
            &body,
        )?;

        extract_gemini_text(&response).ok_or_else(|| anyhow!("Empty response from Gemini API"))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Concatenated text parts of the first candidate
pub fn extract_gemini_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// OpenAI-compatible chat completions endpoint
pub struct OpenaiProvider {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ModelProvider for OpenaiProvider {
    fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = resolve_key(&self.api_key, ProviderType::Openai)?;
        let url = endpoint_url(&self.endpoint, "chat/completions")?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
        });

        let bearer = format!("Bearer {}", api_key);
        let response = post_json(
            &build_agent(self.timeout),
            &url,
            &[("Authorization", bearer.as_str())],
            &body,
        )?;

        extract_openai_text(&response).ok_or_else(|| anyhow!("Empty response from OpenAI API"))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Message content of the first choice
pub fn extract_openai_text(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.to_string())
}

/// Provider that never answers, forcing every caller onto its fallback
pub struct OfflineProvider;

impl ModelProvider for OfflineProvider {
    fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("AI provider is offline")
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url(
            "https://generativelanguage.googleapis.com/v1beta/",
            "models/gemini-1.5-flash:generateContent",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_endpoint_url_rejects_other_schemes() {
        assert!(endpoint_url("ftp://example.com", "x").is_err());
        assert!(endpoint_url("not a url", "x").is_err());
    }

    #[test]
    fn test_extract_gemini_text() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        });
        assert_eq!(extract_gemini_text(&response).unwrap(), "Hello world");
        assert!(extract_gemini_text(&json!({"candidates": []})).is_none());
        assert!(extract_gemini_text(&json!({"error": {"code": 400}})).is_none());
    }

    #[test]
    fn test_extract_openai_text() {
        let response = json!({"choices": [{"message": {"content": "{\"a\": 1}"}}]});
        assert_eq!(extract_openai_text(&response).unwrap(), "{\"a\": 1}");
        assert!(extract_openai_text(&json!({"choices": [{"message": {"content": " "}}]})).is_none());
    }

    #[test]
    fn test_offline_provider_fails() {
        assert!(OfflineProvider.complete("hi").is_err());
        assert_eq!(OfflineProvider.name(), "offline");
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        std::env::remove_var("GEMINI_API_KEY");
        let provider = GeminiProvider {
            endpoint: ProviderType::Gemini.default_endpoint().to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout: Duration::from_secs(1),
        };
        let err = provider.complete("hi").unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_provider_type_default() {
        let provider_type: ProviderType = Default::default();
        assert_eq!(provider_type, ProviderType::Gemini);
        assert_eq!(ProviderType::Offline.api_key_env(), None);
        assert_eq!(ProviderType::Openai.default_model(), "gpt-4o-mini");
    }
}
