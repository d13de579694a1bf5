use std::{fmt, time::Duration};

use log::{debug, info, warn};
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::{
    constants::{
        CHAT_COMPLETIONS_PATH, DEFAULT_MODEL, GENERATE_FROM_UPLOAD_PATH, MODELS_PATH,
        MSG_GENERATION_FAILED,
    },
    error::{Error, Result},
    image_file::ImageFile,
};

/// One submission's worth of input. Built fresh for every call.
#[derive(Clone)]
pub struct GenerationRequest {
    pub image: ImageFile,
    pub language: String,
    pub structured_prompt: String,
    pub api_key: String,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("image", &self.image.name())
            .field("mime", &self.image.mime())
            .field("bytes", &self.image.bytes().len())
            .field("language", &self.language)
            .field("structured_prompt", &self.structured_prompt)
            .finish_non_exhaustive()
    }
}

/// Generation from an image the backend fetches itself: an `http(s)` URL or
/// a `data:image/...;base64,` URI.
#[derive(Clone)]
pub struct UrlGenerationRequest {
    pub image_url: String,
    pub language: String,
    pub structured_prompt: String,
    pub api_key: String,
}

impl fmt::Debug for UrlGenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URIs can be megabytes long.
        let shown: String = self.image_url.chars().take(64).collect();
        f.debug_struct("UrlGenerationRequest")
            .field("image_url", &shown)
            .field("language", &self.language)
            .field("structured_prompt", &self.structured_prompt)
            .finish_non_exhaustive()
    }
}

/// What the backend answered, once the answer could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    /// Non-2xx status; carries the message to show.
    Failure(String),
}

#[allow(async_fn_in_trait)]
pub trait GenerationBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome>;

    async fn generate_from_url(&self, request: &UrlGenerationRequest) -> Result<GenerationOutcome>;

    async fn list_models(&self, api_key: &str) -> Result<Vec<String>>;
}

// --- HTTP implementation ---

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// `timeout` of `None` lets a slow backend take as long as it needs.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Keep any path prefix when joining endpoint paths.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl GenerationBackend for HttpBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let url = self.endpoint(GENERATE_FROM_UPLOAD_PATH)?;
        debug!("Submitting {:?} to {}", request, url);

        let image = Part::bytes(request.image.bytes().to_vec())
            .file_name(request.image.name().to_string())
            .mime_str(request.image.mime())?;
        let form = Form::new()
            .part("image", image)
            .text("language", request.language.clone())
            .text("structured_prompt", request.structured_prompt.clone());

        let response = self
            .client
            .post(url)
            .bearer_auth(&request.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        interpret_response(status, &body)
    }

    async fn generate_from_url(&self, request: &UrlGenerationRequest) -> Result<GenerationOutcome> {
        let url = self.endpoint(CHAT_COMPLETIONS_PATH)?;
        debug!("Submitting {:?} to {}", request, url);

        let payload = json!({
            "model": DEFAULT_MODEL,
            "messages": [{ "role": "user", "content": request.image_url }],
            "language": request.language,
            "structured_prompt": request.structured_prompt,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&request.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        interpret_chat_response(status, &body)
    }

    async fn list_models(&self, api_key: &str) -> Result<Vec<String>> {
        let url = self.endpoint(MODELS_PATH)?;
        let response = self.client.get(url).bearer_auth(api_key).send().await?;

        let status = response.status();
        let body = response.bytes().await?;
        let value = parse_json(&body)?;
        if !status.is_success() {
            let message = failure_message(&value);
            warn!("Model listing failed with {}: {}", status, message);
            return Err(Error::Backend(message));
        }

        let list: ModelList = serde_json::from_value(value)
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// Maps a generate response to an outcome.
///
/// A body that is not JSON is an error whatever the status. On a non-2xx
/// status the `detail` field becomes the failure message; on 2xx the body
/// must carry a `prompt` string.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<GenerationOutcome> {
    let value = parse_json(body)?;

    if !status.is_success() {
        let message = failure_message(&value);
        warn!("Generation failed with {}: {}", status, message);
        return Ok(GenerationOutcome::Failure(message));
    }

    match value.get("prompt") {
        Some(Value::String(prompt)) => {
            info!("Received prompt ({} chars)", prompt.chars().count());
            Ok(GenerationOutcome::Success(prompt.clone()))
        }
        _ => Err(Error::MalformedResponse(
            "response body has no prompt".to_string(),
        )),
    }
}

/// Same rules as [`interpret_response`], but the prompt of a 2xx body sits
/// in `choices[0].message.content`.
pub fn interpret_chat_response(status: StatusCode, body: &[u8]) -> Result<GenerationOutcome> {
    let value = parse_json(body)?;

    if !status.is_success() {
        let message = failure_message(&value);
        warn!("Chat generation failed with {}: {}", status, message);
        return Ok(GenerationOutcome::Failure(message));
    }

    match value.pointer("/choices/0/message/content") {
        Some(Value::String(prompt)) => {
            info!("Received prompt ({} chars)", prompt.chars().count());
            Ok(GenerationOutcome::Success(prompt.clone()))
        }
        _ => Err(Error::MalformedResponse(
            "response body has no choices[0].message.content".to_string(),
        )),
    }
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))
}

fn failure_message(body: &Value) -> String {
    match body.get("detail") {
        None | Some(Value::Null | Value::Bool(false)) => MSG_GENERATION_FAILED.to_string(),
        Some(Value::String(detail)) if detail.is_empty() => MSG_GENERATION_FAILED.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => MSG_GENERATION_FAILED.to_string(),
        Some(Value::String(detail)) => detail.clone(),
        // FastAPI validation errors put a list here.
        Some(other) => other.to_string(),
    }
}
