// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Client for the `generateContent` API of Google's generative models.

use super::image_source::{resolve_inline_image, InlineImage};
use super::transport::HttpTransport;
use super::{CaptionSuggester, Category, ImageEditor, ServiceError, SuggestedCaption};
use crate::config::ApiSettings;
use crate::models::background::BackgroundImage;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const SUGGESTION_PROMPT: &str = "You write captions for memes. Look at this image and write 5 short, \
punchy meme captions for it, one for each category: Funny, Sarcastic, Dark, Wholesome, Relatable. \
Keep each caption under 12 words.";

/// Talks to the model endpoint configured in [`ApiSettings`].
pub struct GeminiClient {
    transport: Arc<dyn HttpTransport>,
    settings: ApiSettings,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client reading its key from `settings.api_key_env`.
    pub fn new(transport: Arc<dyn HttpTransport>, settings: ApiSettings) -> Self {
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!("{} is not set; AI features will fail until it is", settings.api_key_env);
        }
        Self {
            transport,
            settings,
            api_key,
        }
    }

    fn generate(&self, model: &str, body: &Value) -> Result<GenerateContentResponse, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::MissingApiKey(self.settings.api_key_env.clone()))?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            model
        );
        log::debug!("POST {}", url);

        let response = self
            .transport
            .post_json(&url, &[("x-goog-api-key", api_key)], body)?
            .error_for_status()?;
        serde_json::from_slice(&response.body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

fn inline_part(image: &InlineImage) -> Value {
    json!({ "inlineData": { "mimeType": image.mime_type, "data": image.data } })
}

fn suggestion_request(image: &InlineImage) -> Value {
    let categories: Vec<&str> = Category::all().iter().map(Category::name).collect();
    json!({
        "contents": [{
            "parts": [inline_part(image), { "text": SUGGESTION_PROMPT }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": { "type": "STRING" },
                        "category": { "type": "STRING", "enum": categories }
                    },
                    "required": ["text", "category"]
                }
            }
        }
    })
}

fn edit_request(image: &InlineImage, instruction: &str) -> Value {
    json!({
        "contents": [{
            "parts": [inline_part(image), { "text": instruction }]
        }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
    })
}

impl CaptionSuggester for GeminiClient {
    fn suggest_captions(&self, image: &BackgroundImage) -> Result<Vec<SuggestedCaption>, ServiceError> {
        let inline = resolve_inline_image(image, self.transport.as_ref())?;
        let response = self.generate(&self.settings.suggestion_model, &suggestion_request(&inline))?;
        let captions = parse_suggestions(&response.text())?;
        log::info!("Received {} caption suggestions", captions.len());
        Ok(captions)
    }
}

impl ImageEditor for GeminiClient {
    fn edit_image(&self, image: &BackgroundImage, instruction: &str) -> Result<String, ServiceError> {
        let inline = resolve_inline_image(image, self.transport.as_ref())?;
        let response = self.generate(&self.settings.edit_model, &edit_request(&inline, instruction))?;
        let data = response.first_image().ok_or(ServiceError::NoImageReturned)?;
        log::info!("Received edited image ({})", data.mime_type);
        Ok(format!("data:{};base64,{}", data.mime_type, data.data))
    }
}

/// Parse the JSON caption list, tolerating a markdown code fence around it.
fn parse_suggestions(text: &str) -> Result<Vec<SuggestedCaption>, ServiceError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|inner| inner.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).map_err(|e| ServiceError::Malformed(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .take(1)
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::background::{ImageSource, PixelAccess};
    use crate::services::image_source::tests::{ok, StubTransport};
    use image::RgbaImage;

    fn image() -> BackgroundImage {
        BackgroundImage::new(
            ImageSource::DataUrl("data:image/png;base64,AAAA".into()),
            RgbaImage::new(1, 1),
            PixelAccess::Readable,
        )
    }

    fn client(transport: Arc<StubTransport>) -> GeminiClient {
        GeminiClient {
            transport,
            settings: ApiSettings::default(),
            api_key: Some("test-key".into()),
        }
    }

    #[test]
    fn test_suggestions_parsed_from_first_candidate() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[{\"text\":\"me at 3am\",\"category\":\"Relatable\"},{\"text\":\"fine.\",\"category\":\"Sarcastic\"}]" }] }
            }]
        });
        let transport = Arc::new(StubTransport::replying(vec![ok(reply.to_string().as_bytes())]));
        let captions = client(transport.clone()).suggest_captions(&image()).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "me at 3am");
        assert_eq!(captions[1].category, Category::Sarcastic);

        let requests = transport.requests.lock().unwrap();
        let (url, body) = &requests[0];
        assert!(url.ends_with("/models/gemini-2.5-flash:generateContent"));
        let body = body.as_ref().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "AAAA");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn test_fenced_suggestions_accepted() {
        let captions = parse_suggestions("```json\n[{\"text\":\"a\",\"category\":\"Dark\"}]\n```").unwrap();
        assert_eq!(captions[0].category, Category::Dark);
    }

    #[test]
    fn test_malformed_suggestions_rejected() {
        let reply = json!({ "candidates": [{ "content": { "parts": [{ "text": "sorry, I can't" }] } }] });
        let transport = Arc::new(StubTransport::replying(vec![ok(reply.to_string().as_bytes())]));
        let result = client(transport).suggest_captions(&image());
        assert!(matches!(result, Err(ServiceError::Malformed(_))));
    }

    #[test]
    fn test_edit_returns_data_url() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                ] }
            }]
        });
        let transport = Arc::new(StubTransport::replying(vec![ok(reply.to_string().as_bytes())]));
        let url = client(transport.clone()).edit_image(&image(), "add a hat").unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");

        let requests = transport.requests.lock().unwrap();
        let body = requests[0].1.as_ref().unwrap();
        assert_eq!(body["contents"][0]["parts"][1]["text"], "add a hat");
        assert!(requests[0].0.contains("gemini-2.5-flash-image"));
    }

    #[test]
    fn test_edit_without_image_part_fails() {
        let reply = json!({ "candidates": [{ "content": { "parts": [{ "text": "no" }] } }] });
        let transport = Arc::new(StubTransport::replying(vec![ok(reply.to_string().as_bytes())]));
        let result = client(transport).edit_image(&image(), "x");
        assert!(matches!(result, Err(ServiceError::NoImageReturned)));
    }

    #[test]
    fn test_missing_key_fails_before_request() {
        let transport = Arc::new(StubTransport::default());
        let mut client = client(transport.clone());
        client.api_key = None;
        let result = client.edit_image(&image(), "x");
        assert!(matches!(result, Err(ServiceError::MissingApiKey(_))));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_http_error_surfaces_status() {
        let transport = Arc::new(StubTransport::replying(vec![Ok(crate::services::transport::HttpResponse {
            status: 429,
            headers: vec![],
            body: b"quota".to_vec(),
        })]));
        let result = client(transport).suggest_captions(&image());
        assert!(matches!(result, Err(ServiceError::Status { status: 429, .. })));
    }
}
