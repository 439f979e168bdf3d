//! Client for the Stable Diffusion WebUI (AUTOMATIC1111) HTTP API.
//!
//! Generation goes through `POST /sdapi/v1/txt2img`; the engine returns
//! PNGs as base64 strings, which are decoded and written to the output
//! directory before artifacts are built.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::prelude::*;
use mediagen_core::image::{ImageArtifact, ImageGenerationRequest};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::backend::{with_cancel, ImageBackend};
use crate::error::BackendError;

/// HTTP client for a single Stable Diffusion WebUI instance.
pub struct StableDiffusionClient {
    client: reqwest::Client,
    api_url: String,
    output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SdModel {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SdLora {
    name: String,
}

impl StableDiffusionClient {
    /// * `api_url` - Base HTTP URL, e.g. `http://127.0.0.1:7860`.
    /// * `output_dir` - Directory generated PNGs are written to.
    pub fn new(api_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, output_dir)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn txt2img(&self, request: &ImageGenerationRequest) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .post(format!("{}/sdapi/v1/txt2img", self.api_url))
            .json(&txt2img_payload(request))
            .send()
            .await?;

        let body: Txt2ImgResponse = parse_response(response).await?;
        Ok(body.images)
    }

    async fn write_images(
        &self,
        request: &ImageGenerationRequest,
        images: &[String],
    ) -> Result<Vec<ImageArtifact>, BackendError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut artifacts = Vec::with_capacity(images.len());
        for (i, encoded) in images.iter().enumerate() {
            let bytes = BASE64_STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| BackendError::Decode(e.to_string()))?;

            let batch_index = i as u32 + 1;
            let file_name = image_file_name(
                &request.char_name,
                request.batch_count,
                batch_index,
                chrono::Utc::now().timestamp_millis(),
            );
            let file_path = self.output_dir.join(&file_name);
            tokio::fs::write(&file_path, &bytes).await?;

            tracing::debug!(file = %file_path.display(), size = bytes.len(), "Image written");
            artifacts.push(ImageArtifact::from_request(
                request,
                file_name,
                file_path.to_string_lossy().into_owned(),
                batch_index,
            ));
        }
        Ok(artifacts)
    }
}

#[async_trait]
impl ImageBackend for StableDiffusionClient {
    async fn check_connection(&self) -> bool {
        match self
            .client
            .get(format!("{}/sdapi/v1/sd-models", self.api_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Stable Diffusion unreachable");
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(format!("{}/sdapi/v1/sd-models", self.api_url))
            .send()
            .await?;
        let models: Vec<SdModel> = parse_response(response).await?;
        let mut titles: Vec<String> = models.into_iter().map(|m| m.title).collect();
        titles.sort();
        Ok(titles)
    }

    async fn list_loras(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(format!("{}/sdapi/v1/loras", self.api_url))
            .send()
            .await?;
        let loras: Vec<SdLora> = parse_response(response).await?;
        let mut names: Vec<String> = loras.into_iter().map(|l| l.name).collect();
        names.sort();
        Ok(names)
    }

    async fn generate(
        &self,
        request: &ImageGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImageArtifact>, BackendError> {
        let images = with_cancel(cancel, self.txt2img(request)).await?;
        if images.is_empty() {
            return Err(BackendError::NoOutput);
        }
        with_cancel(cancel, self.write_images(request, &images)).await
    }
}

/// Build the txt2img JSON body.
///
/// A LoRA other than `"None"` is injected into the prompt as
/// `<lora:{stem}:{weight}>, `.
fn txt2img_payload(request: &ImageGenerationRequest) -> serde_json::Value {
    serde_json::json!({
        "prompt": prompt_with_lora(request),
        "negative_prompt": request.negative_prompt,
        "steps": request.steps,
        "width": request.width,
        "height": request.height,
        "sampler_name": request.sampler,
        "cfg_scale": request.cfg_scale,
        "seed": -1,
        "batch_size": 1,
        "n_iter": 1,
        "save_images": false,
        "override_settings": { "sd_model_checkpoint": request.model },
    })
}

fn prompt_with_lora(request: &ImageGenerationRequest) -> String {
    match request.lora.as_deref() {
        Some(lora) if !lora.is_empty() && lora != "None" => {
            let stem = Path::new(lora)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| lora.to_string());
            format!("<lora:{stem}:{}>, {}", request.lora_weight, request.prompt)
        }
        _ => request.prompt.clone(),
    }
}

/// `{char}_{millis}.png`, or `{char}_batch{NN}_{millis}.png` when the
/// request asks for more than one image.
pub fn image_file_name(char_name: &str, batch_count: u32, batch_index: u32, millis: i64) -> String {
    if batch_count > 1 {
        format!("{char_name}_batch{batch_index:02}_{millis}.png")
    } else {
        format!("{char_name}_{millis}.png")
    }
}

// ---- response helpers ----

/// Ensure the response has a success status code, otherwise capture the
/// status and body in [`BackendError::Api`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(BackendError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use mediagen_core::defaults::GenerationDefaults;
    use mediagen_core::image::ImageGenerateRequest;

    use super::*;

    fn request(lora: Option<&str>) -> ImageGenerationRequest {
        let req: ImageGenerateRequest = serde_json::from_value(serde_json::json!({
            "prompt": "a castle",
            "lora": lora,
            "lora_weight": 0.5,
        }))
        .unwrap();
        req.resolve(&GenerationDefaults::default())
    }

    #[test]
    fn lora_is_prefixed_by_file_stem() {
        let req = request(Some("styles/watercolor.safetensors"));
        assert_eq!(prompt_with_lora(&req), "<lora:watercolor:0.5>, a castle");
    }

    #[test]
    fn none_lora_leaves_prompt_alone() {
        assert_eq!(prompt_with_lora(&request(Some("None"))), "a castle");
        assert_eq!(prompt_with_lora(&request(None)), "a castle");
    }

    #[test]
    fn payload_pins_single_image_per_call() {
        let payload = txt2img_payload(&request(None));
        assert_eq!(payload["batch_size"], 1);
        assert_eq!(payload["n_iter"], 1);
        assert_eq!(payload["seed"], -1);
        assert_eq!(
            payload["override_settings"]["sd_model_checkpoint"],
            GenerationDefaults::default().model
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(image_file_name("alice", 1, 1, 42), "alice_42.png");
        assert_eq!(image_file_name("alice", 3, 2, 42), "alice_batch02_42.png");
    }
}
