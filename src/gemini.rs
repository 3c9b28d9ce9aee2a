//! Gemini (Google) generation client for the try-on request.

use crate::error::{Result, TryOnError};
use crate::request::{RequestPart, TryOnRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image preview build.
    #[default]
    FlashImagePreview,
    /// Gemini 2.5 Flash Image stable build.
    FlashImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImagePreview => "gemini-2.5-flash-image-preview",
            Self::FlashImage => "gemini-2.5-flash-image",
        }
    }
}

/// The composited image returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnImage {
    data: String,
    mime_type: String,
}

impl TryOnImage {
    /// Creates an image from a bare base64 payload and its media type.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Returns the bare base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the media type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the image as a displayable data URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Trait for try-on generation backends.
///
/// The controller depends on this seam rather than on [`GeminiClient`]
/// directly, so the submission path can be exercised without a network.
#[async_trait]
pub trait TryOnProvider: Send + Sync {
    /// Sends one request and awaits one composited image.
    async fn try_on(&self, request: &TryOnRequest) -> Result<TryOnImage>;
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `GEMINI_API_KEY` or
    /// `GOOGLE_API_KEY` env vars.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                TryOnError::Auth(
                    "GEMINI_API_KEY / GOOGLE_API_KEY not set and no API key provided".into(),
                )
            })?;

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
        })
    }
}

/// Gemini generation client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    async fn try_on_impl(&self, request: &TryOnRequest) -> Result<TryOnImage> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model.as_str(),
        );

        let body = GeminiRequest::from_try_on_request(request);
        tracing::debug!(
            model = self.model.as_str(),
            parts = body.contents[0].parts.len(),
            "sending try-on request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %text, "generation request failed");
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        extract_image(gemini_response)
    }
}

#[async_trait]
impl TryOnProvider for GeminiClient {
    async fn try_on(&self, request: &TryOnRequest) -> Result<TryOnImage> {
        self.try_on_impl(request).await
    }
}

/// Finds the first inline image in the first candidate's parts.
fn extract_image(response: GeminiResponse) -> Result<TryOnImage> {
    // Prompt-level blocks come back as HTTP 200 with no usable candidate
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("prompt blocked: {reason}"));
            return Err(TryOnError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(TryOnError::NoImage)?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY" | "IMAGE_SAFETY" | "IMAGE_PROHIBITED_CONTENT" | "RECITATION"
            | "IMAGE_RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" => {
                return Err(TryOnError::ContentBlocked(format!(
                    "blocked by safety filter: {finish_reason}"
                )));
            }
            _ => {} // STOP, MAX_TOKENS, etc. are normal
        }
    }

    candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|p| p.inline_data)
        .map(|inline| TryOnImage::new(inline.data, inline.mime_type))
        .ok_or(TryOnError::NoImage)
}

/// Classifies a non-success HTTP response.
fn parse_error(status: u16, text: &str) -> TryOnError {
    let message = truncate(text, 300);
    if status == 401 || status == 403 {
        return TryOnError::Auth(message);
    }
    let lower = message.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return TryOnError::ContentBlocked(message);
    }
    TryOnError::Api { status, message }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

// Request/Response wire types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - either inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_try_on_request(request: &TryOnRequest) -> Self {
        let parts = request
            .parts()
            .into_iter()
            .map(|part| match part {
                RequestPart::Image(asset) => GeminiRequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: asset.mime_type().to_string(),
                        data: asset.data().to_string(),
                    },
                },
                RequestPart::Text(text) => GeminiRequestPart::Text { text },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}
