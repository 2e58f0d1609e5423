use anyhow::Context as _;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Black-box text generator over an image plus instruction prompt.
/// The rest of the pipeline treats the reply as untrusted free text.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn describe_image(&self, prompt: &str, jpeg: Bytes) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// Gemini `generateContent` client. One plain request/response call,
/// no retry or backoff; failures surface to the caller immediately.
#[derive(Clone)]
pub struct GeminiVision {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl VisionClient for GeminiVision {
    async fn describe_image(&self, prompt: &str, jpeg: Bytes) -> anyhow::Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".into(),
                            data: general_purpose::STANDARD.encode(&jpeg),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                top_p: 0.95,
                top_k: 40,
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("vision model request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "vision model returned error status");
            anyhow::bail!("vision model returned {status}");
        }

        let decoded: GenerateResponse = response
            .json()
            .await
            .context("decode vision model envelope")?;

        let text = decoded
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .context("vision model returned no candidates")?;

        debug!(chars = text.len(), "vision model replied");
        Ok(text)
    }
}
