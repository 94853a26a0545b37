// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Normalization of the background into an inline upload payload.
//!
//! Embedded images only need their data URL prefix stripped. Remote images
//! are fetched directly first; if that fails, the pixels already decoded for
//! display are re-encoded as PNG. The second path refuses tainted pixels and
//! its failure is final.

use super::transport::HttpTransport;
use super::ServiceError;
use crate::io::data_url::{self, DataUrl};
use crate::models::background::{BackgroundImage, ImageSource};
use crate::render::compositor::encode_png;

/// Base64 image data ready to embed in a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Produce an uploadable encoding of `image`.
pub fn resolve_inline_image(
    image: &BackgroundImage,
    transport: &dyn HttpTransport,
) -> Result<InlineImage, ServiceError> {
    match &image.source {
        ImageSource::DataUrl(url) => {
            let parsed = DataUrl::parse(url).map_err(|e| ServiceError::BlockedResource(e.to_string()))?;
            Ok(InlineImage {
                mime_type: parsed.mime_type.to_string(),
                data: parsed.payload.to_string(),
            })
        }
        ImageSource::Remote(url) => match fetch_direct(url, transport) {
            Ok(inline) => Ok(inline),
            Err(e) => {
                log::warn!("Direct fetch of {} failed ({}), re-encoding displayed pixels", url, e);
                reencode(image)
            }
        },
    }
}

fn fetch_direct(url: &str, transport: &dyn HttpTransport) -> Result<InlineImage, ServiceError> {
    let response = transport.get(url)?.error_for_status()?;
    let mime_type = image::guess_format(&response.body)
        .map(|format| format.to_mime_type().to_string())
        .map_err(|_| ServiceError::BlockedResource(format!("{url} did not return an image")))?;
    Ok(InlineImage {
        mime_type,
        data: data_url::encode_payload(&response.body),
    })
}

fn reencode(image: &BackgroundImage) -> Result<InlineImage, ServiceError> {
    if !image.is_readable() {
        return Err(ServiceError::BlockedResource(
            "the image's origin does not allow reading its pixels".to_string(),
        ));
    }
    let png = encode_png(&image.pixels).map_err(|e| ServiceError::BlockedResource(e.to_string()))?;
    Ok(InlineImage {
        mime_type: "image/png".to_string(),
        data: data_url::encode_payload(&png),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::background::PixelAccess;
    use crate::services::transport::HttpResponse;
    use image::RgbaImage;
    use std::sync::Mutex;

    /// Transport that replays canned responses and records requests.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        pub responses: Mutex<Vec<Result<HttpResponse, ServiceError>>>,
        pub requests: Mutex<Vec<(String, Option<serde_json::Value>)>>,
    }

    impl StubTransport {
        pub fn replying(responses: Vec<Result<HttpResponse, ServiceError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::default(),
            }
        }

        fn next(&self) -> Result<HttpResponse, ServiceError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(ServiceError::Transport("no canned response".into()));
            }
            responses.remove(0)
        }
    }

    impl HttpTransport for StubTransport {
        fn get(&self, url: &str) -> Result<HttpResponse, ServiceError> {
            self.requests.lock().unwrap().push((url.to_string(), None));
            self.next()
        }

        fn post_json(
            &self,
            url: &str,
            _headers: &[(&str, &str)],
            body: &serde_json::Value,
        ) -> Result<HttpResponse, ServiceError> {
            self.requests.lock().unwrap().push((url.to_string(), Some(body.clone())));
            self.next()
        }
    }

    pub(crate) fn ok(body: &[u8]) -> Result<HttpResponse, ServiceError> {
        Ok(HttpResponse {
            status: 200,
            headers: vec![],
            body: body.to_vec(),
        })
    }

    fn remote(access: PixelAccess) -> BackgroundImage {
        BackgroundImage::new(
            ImageSource::Remote("https://example.com/cat.png".into()),
            RgbaImage::new(3, 2),
            access,
        )
    }

    #[test]
    fn test_data_url_is_stripped() {
        let image = BackgroundImage::new(
            ImageSource::DataUrl("data:image/jpeg;base64,/9j/".into()),
            RgbaImage::new(1, 1),
            PixelAccess::Readable,
        );
        let transport = StubTransport::default();
        let inline = resolve_inline_image(&image, &transport).unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, "/9j/");
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_fetched_directly() {
        let png = encode_png(&RgbaImage::new(2, 2)).unwrap();
        let transport = StubTransport::replying(vec![ok(&png)]);
        let inline = resolve_inline_image(&remote(PixelAccess::Tainted), &transport).unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, data_url::encode_payload(&png));
    }

    #[test]
    fn test_falls_back_to_reencoding() {
        let transport = StubTransport::replying(vec![Err(ServiceError::Transport("refused".into()))]);
        let inline = resolve_inline_image(&remote(PixelAccess::Readable), &transport).unwrap();
        assert_eq!(inline.mime_type, "image/png");

        let url = data_url::encode(&inline.mime_type, b"");
        let url = format!("{url}{}", inline.data);
        let bytes = DataUrl::parse(&url).unwrap().decode().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_tainted_fallback_is_terminal() {
        let transport = StubTransport::replying(vec![ok(b"<html>blocked</html>")]);
        let result = resolve_inline_image(&remote(PixelAccess::Tainted), &transport);
        assert!(matches!(result, Err(ServiceError::BlockedResource(_))));
    }
}
