// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Base64 data URLs used to move images around in memory.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors from parsing a data URL.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    NotDataUrl,

    #[error("data URL is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// The parts of `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub mime_type: &'a str,
    /// Base64 text with the `data:` prefix stripped.
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a data URL into MIME type and base64 payload.
    pub fn parse(url: &'a str) -> Result<Self, DataUrlError> {
        let rest = url.trim().strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::NotDataUrl)?;
        let mime_type = header.strip_suffix(";base64").ok_or(DataUrlError::NotBase64)?;
        let mime_type = if mime_type.is_empty() {
            "application/octet-stream"
        } else {
            mime_type
        };
        Ok(Self { mime_type, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        STANDARD
            .decode(self.payload)
            .map_err(|e| DataUrlError::Payload(e.to_string()))
    }
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Plain base64 of `bytes`, as sent in API request bodies.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
