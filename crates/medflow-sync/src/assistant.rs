//! # Assistant Client
//!
//! Calls a generative-content endpoint for two things: a pharmacology
//! summary of one medicine, and free-text answers to staff questions with
//! the current inventory summary as context.
//!
//! ```text
//! POST {endpoint}/models/{model}:generateContent?key={api_key}
//! {
//!   "systemInstruction": { "parts": [{ "text": "..." }] },
//!   "contents": [{ "role": "user", "parts": [{ "text": "..." }] }],
//!   "generationConfig": { "temperature": 0.2 }
//! }
//! → candidates[0].content.parts[*].text
//! ```
//!
//! Every failure (no key, transport, status, empty answer) returns a fixed
//! fallback sentence. There are no retries.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AssistantSettings;
use crate::error::{SyncError, SyncResult};
use crate::provider::check_status;

pub const INSIGHTS_FALLBACK: &str =
    "Unable to fetch insights at this time. Please check your connection.";

pub const ASSISTANT_FALLBACK: &str =
    "I'm having trouble thinking right now. Please try asking again.";

const INSIGHTS_INSTRUCTION: &str = "You are a professional medical pharmacology expert. \
Provide professional and accurate medical summaries. Remind the user that this is for \
informational purposes only and they should consult a doctor for official advice.";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Content {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
pub struct AssistantClient {
    settings: AssistantSettings,
    client: reqwest::Client,
}

impl AssistantClient {
    pub fn new(settings: AssistantSettings, client: reqwest::Client) -> Self {
        AssistantClient { settings, client }
    }

    pub fn is_configured(&self) -> bool {
        self.settings
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Pharmacology summary for one medicine.
    pub async fn medicine_insights(&self, medicine_name: &str) -> String {
        let prompt = format!(
            "Provide a concise pharmacological summary for {}. Include:\n\
             1. Clinical Uses\n\
             2. Common Side Effects\n\
             3. Key Contraindications\n\
             4. Standard Dosage Range\n\
             5. Important Interactions",
            medicine_name
        );

        match self
            .generate(INSIGHTS_INSTRUCTION, &prompt, self.settings.insight_temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(medicine = medicine_name, error = %e, "Medicine insights unavailable");
                INSIGHTS_FALLBACK.to_string()
            }
        }
    }

    /// Answer to a staff question, grounded in `inventory_context`.
    pub async fn ask(&self, question: &str, inventory_context: &str) -> String {
        let instruction = format!(
            "You are a professional Pharmacy Assistant AI. Your goal is to help staff with \
             drug information and stock status. Here is the current relevant inventory \
             context: {}. Be professional, accurate, and concise. Highlight any stock \
             warnings if mentioned.",
            inventory_context
        );

        match self
            .generate(&instruction, question, self.settings.assistant_temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Assistant reply unavailable");
                ASSISTANT_FALLBACK.to_string()
            }
        }
    }

    async fn generate(&self, instruction: &str, prompt: &str, temperature: f32) -> SyncResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SyncError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        );

        let request = GenerateRequest {
            system_instruction: Content::text(None, instruction),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig { temperature },
        };

        debug!(model = %self.settings.model, temperature, "Calling generateContent");

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;
        let body: GenerateResponse = check_status(response)?.json().await?;

        body.text().ok_or(SyncError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            system_instruction: Content::text(None, "be brief"),
            contents: vec![Content::text(Some("user"), "hi")],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_response_text_joins_parts_of_first_candidate() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"role":"model","parts":[{"text":"Hello, "},{"text":"staff."}]}},
                {"content":{"parts":[{"text":"ignored"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("Hello, staff."));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }

    #[tokio::test]
    async fn test_missing_key_falls_back() {
        let client = AssistantClient::new(AssistantSettings::default(), reqwest::Client::new());
        assert!(!client.is_configured());
        assert_eq!(client.medicine_insights("Ibuprofen").await, INSIGHTS_FALLBACK);
        assert_eq!(client.ask("What is low?", "Low stock items: .").await, ASSISTANT_FALLBACK);
    }
}
