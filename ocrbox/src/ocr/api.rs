use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{OcrboxError, Result};

use super::engine::{BackendFactory, Recognition, RecognitionBackend};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Builds [`VisionApiBackend`] workers for an OpenAI-compatible chat endpoint.
#[derive(Clone, Debug)]
pub struct VisionApiFactory {
    model: String,
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
}

impl VisionApiFactory {
    pub fn new(model: impl Into<String>, config: &OcrConfig) -> Self {
        Self {
            model: model.into(),
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl BackendFactory for VisionApiFactory {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create(&self, language: &str) -> Result<Arc<dyn RecognitionBackend>> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrboxError::OcrInit("API key required for vision OCR".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| OcrboxError::OcrInit(format!("Failed to create HTTP client: {e}")))?;

        Ok(Arc::new(VisionApiBackend {
            client,
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            language: language.to_string(),
        }))
    }
}

/// Sends the image to a vision chat model as a data URL. The model gives no
/// confidence score, so recognitions carry `None`.
#[derive(Clone, Debug)]
pub struct VisionApiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    language: String,
}

impl VisionApiBackend {
    fn prompt(&self) -> String {
        format!(
            "Extract all text from this image. The expected language code is '{}'. \
             Return only the extracted text without any explanations or formatting.",
            self.language
        )
    }

    async fn make_request(&self, request: &ChatRequest) -> Result<String> {
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let chat_response: ChatResponse = resp
                        .json()
                        .await
                        .map_err(|e| OcrboxError::Ocr(format!("Failed to parse response: {e}")))?;

                    return chat_response
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or_else(|| OcrboxError::Ocr("No response from API".to_string()));
                }
                Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(OcrboxError::Ocr(format!(
                            "API request failed after {MAX_RETRIES} retries: {}",
                            resp.status()
                        )));
                    }
                    debug!(status = %resp.status(), retries, "Vision API busy, retrying");
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(OcrboxError::Ocr(format!(
                        "API request failed: {status} - {body}"
                    )));
                }
                Err(e) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(OcrboxError::Ocr(format!(
                            "API request failed after {MAX_RETRIES} retries: {e}"
                        )));
                    }
                }
            }

            let delay = Duration::from_millis(100 * 2_u64.pow(retries));
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RecognitionBackend for VisionApiBackend {
    async fn recognize(&self, image: &[u8]) -> Result<Recognition> {
        let mime_type = infer::get(image)
            .map(|kind| kind.mime_type())
            .unwrap_or("image/png");
        let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(image));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: self.prompt(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 4096,
        };

        let text = self.make_request(&request).await?;
        Ok(Recognition {
            text: text.trim().to_string(),
            confidence: None,
        })
    }
}
