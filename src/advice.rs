//! Tone advice — a short tip about the current knob settings from a
//! generative-language endpoint.
//!
//! Advice is best-effort. With no API key, or when anything about the
//! request fails, callers get `AdviceTip::fallback()` and the failure is
//! only logged.
//!
//! Request building and response parsing are plain functions so they work
//! in every build; the HTTP client lives behind the `advice` feature.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::StudioError;
use crate::settings::ToneSettings;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on tip length requested from the model.
pub const MAX_TIP_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceTip {
    pub title: String,
    pub content: String,
}

impl AdviceTip {
    /// Shown whenever real advice is unavailable.
    pub fn fallback() -> Self {
        AdviceTip {
            title: "Keep Rocking!".to_string(),
            content: "Your setup sounds solid. Try pushing the gain for more sustain.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Language the tip should be written in.
    pub language: String,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        AdviceConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: "English".to_string(),
        }
    }
}

impl AdviceConfig {
    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| lookup(*name))
            .find(|key| !key.trim().is_empty());
        AdviceConfig {
            api_key,
            ..AdviceConfig::default()
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

pub fn build_prompt(settings: &ToneSettings, language: &str) -> String {
    let [gain, distortion, tone, reverb] = settings.percentages();
    format!(
        "The user has an electric guitar app with the following settings:\n\
         Gain: {gain}%\n\
         Distortion: {distortion}%\n\
         Tone: {tone}%\n\
         Reverb: {reverb}%\n\n\
         Give a short (max {MAX_TIP_CHARS} chars) pro-guitarist tip about this specific tone in {language}. \
         Be creative and cool."
    )
}

/// JSON body for a `generateContent` call asking for a `{title, content}` object.
pub fn build_request(settings: &ToneSettings, language: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": build_prompt(settings, language) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "content": { "type": "STRING" }
                },
                "required": ["title", "content"]
            }
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Extract the tip from a `generateContent` response body.
pub fn parse_response(body: &str) -> Result<AdviceTip, StudioError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| StudioError::Advice(format!("bad response: {e}")))?;
    let text = response
        .candidates
        .into_iter()
        .flat_map(|c| c.content.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| StudioError::Advice("response has no text".to_string()))?;
    serde_json::from_str(&text).map_err(|e| StudioError::Advice(format!("bad tip JSON: {e}")))
}

#[cfg(feature = "advice")]
async fn request_advice(
    client: &reqwest::Client,
    config: &AdviceConfig,
    api_key: &str,
    settings: &ToneSettings,
) -> Result<AdviceTip, StudioError> {
    let advice_err = |e: reqwest::Error| StudioError::Advice(e.to_string());
    let body = client
        .post(config.url())
        .header("x-goog-api-key", api_key)
        .json(&build_request(settings, &config.language))
        .send()
        .await
        .map_err(advice_err)?
        .error_for_status()
        .map_err(advice_err)?
        .text()
        .await
        .map_err(advice_err)?;
    parse_response(&body)
}

/// Ask for a tip. Never fails: errors are logged and answered with the fallback.
#[cfg(feature = "advice")]
pub async fn get_advice(
    client: &reqwest::Client,
    config: &AdviceConfig,
    settings: &ToneSettings,
) -> AdviceTip {
    let Some(api_key) = config.api_key.as_deref() else {
        return AdviceTip::fallback();
    };
    match request_advice(client, config, api_key, settings).await {
        Ok(tip) => tip,
        Err(e) => {
            log::error!("tone advice failed: {e}");
            AdviceTip::fallback()
        }
    }
}

/// `get_advice` on a private current-thread runtime, for non-async callers.
#[cfg(feature = "advice")]
pub fn get_advice_blocking(config: &AdviceConfig, settings: &ToneSettings) -> AdviceTip {
    if !config.has_key() {
        return AdviceTip::fallback();
    }
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("could not start advice runtime: {e}");
            return AdviceTip::fallback();
        }
    };
    let client = reqwest::Client::new();
    runtime.block_on(get_advice(&client, config, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_knobs_as_percentages() {
        let prompt = build_prompt(&ToneSettings::default(), "English");
        assert!(prompt.contains("Gain: 60%"));
        assert!(prompt.contains("Distortion: 30%"));
        assert!(prompt.contains("Tone: 50%"));
        assert!(prompt.contains("Reverb: 20%"));
        assert!(prompt.contains("max 150 chars"));
    }

    #[test]
    fn request_asks_for_structured_tip() {
        let req = build_request(&ToneSettings::default(), "Italian");
        assert_eq!(req["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            req["generationConfig"]["responseSchema"]["required"],
            json!(["title", "content"])
        );
        let text = req["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("in Italian"));
    }

    #[test]
    fn parses_candidate_text() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{ "text": "{\"title\":\"Crunch\",\"content\":\"Roll the tone back.\"}" }]
                }
            }]
        }"#;
        let tip = parse_response(body).unwrap();
        assert_eq!(tip.title, "Crunch");
        assert_eq!(tip.content, "Roll the tone back.");
    }

    #[test]
    fn malformed_responses_are_errors() {
        assert!(parse_response("not json").is_err());
        assert!(parse_response(r#"{"candidates": []}"#).is_err());
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"plain words"}]}}]}"#;
        assert!(matches!(parse_response(body), Err(StudioError::Advice(_))));
    }

    #[test]
    fn key_lookup_prefers_gemini_var() {
        let config = AdviceConfig::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("g-key".into()),
            "API_KEY" => Some("plain".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("g-key"));

        let config = AdviceConfig::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("  ".into()),
            "API_KEY" => Some("plain".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("plain"));

        assert!(!AdviceConfig::from_lookup(|_| None).has_key());
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let config = AdviceConfig {
            endpoint: "http://localhost:8080/".into(),
            ..AdviceConfig::default()
        };
        assert_eq!(
            config.url(),
            "http://localhost:8080/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[cfg(feature = "advice")]
    #[tokio::test]
    async fn missing_key_returns_fallback() {
        let client = reqwest::Client::new();
        let tip = get_advice(&client, &AdviceConfig::default(), &ToneSettings::default()).await;
        assert_eq!(tip, AdviceTip::fallback());
    }

    #[cfg(feature = "advice")]
    #[tokio::test]
    async fn unreachable_endpoint_returns_fallback() {
        let client = reqwest::Client::new();
        let config = AdviceConfig {
            api_key: Some("test".into()),
            endpoint: "http://127.0.0.1:9".into(),
            ..AdviceConfig::default()
        };
        let tip = get_advice(&client, &config, &ToneSettings::default()).await;
        assert_eq!(tip, AdviceTip::fallback());
    }
}
