// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Minimal blocking HTTP client.
//!
//! Requests are delegated to the system `curl` binary. Response headers are
//! dumped ahead of the body and split off again here. Request headers go
//! through a private temporary file so credentials never appear on the
//! command line.

use super::ServiceError;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Longest error body kept in [`ServiceError::Status`].
const ERROR_BODY_LIMIT: usize = 300;

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Headers of the final response, names lowercased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Turn a non-2xx response into an error.
    pub fn error_for_status(self) -> Result<Self, ServiceError> {
        if self.is_success() {
            return Ok(self);
        }
        let body = String::from_utf8_lossy(&self.body)
            .chars()
            .take(ERROR_BODY_LIMIT)
            .collect();
        Err(ServiceError::Status {
            status: self.status,
            body,
        })
    }
}

/// Blocking HTTP operations used by the services and remote image loading.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, ServiceError>;

    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ServiceError>;
}

/// [`HttpTransport`] backed by the `curl` command line tool.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    timeout: Duration,
}

impl CurlTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(&self, url: &str) -> Result<Command, ServiceError> {
        check_url(url)?;
        let mut command = Command::new("curl");
        command
            .arg("-sS")
            .arg("-L")
            .arg("--proto")
            .arg("=http,https")
            .arg("--proto-redir")
            .arg("=http,https")
            .arg("--max-time")
            .arg(self.timeout.as_secs().max(1).to_string())
            .arg("-D")
            .arg("-")
            .arg("--url")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(command)
    }

    /// Build a JSON POST. The returned file holds the extra headers and must
    /// outlive the request.
    fn post_command(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<(Command, Option<NamedTempFile>), ServiceError> {
        let mut command = self.command(url)?;
        command
            .arg("-X")
            .arg("POST")
            .arg("-H")
            .arg("Content-Type: application/json")
            .arg("--data-binary")
            .arg("@-");
        if headers.is_empty() {
            return Ok((command, None));
        }
        let file = write_header_file(headers)?;
        command.arg("-H").arg(format!("@{}", file.path().display()));
        Ok((command, Some(file)))
    }

    fn run(mut command: Command, stdin: Option<&[u8]>) -> Result<HttpResponse, ServiceError> {
        if stdin.is_some() {
            command.stdin(Stdio::piped());
        }
        let mut child = command.spawn().map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                ServiceError::Transport("curl was not found on PATH".to_string())
            } else {
                ServiceError::Transport(format!("failed to spawn curl: {error}"))
            }
        })?;

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(data)
                .map_err(|e| ServiceError::Transport(format!("failed to send request body: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ServiceError::Transport(format!("curl did not finish: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::Transport(stderr.trim().to_string()));
        }
        parse_response(&output.stdout)
    }
}

impl HttpTransport for CurlTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, ServiceError> {
        let mut command = self.command(url)?;
        // Anonymous request, the way a cross-origin image is fetched.
        command.arg("-H").arg("Origin: null");
        Self::run(command, None)
    }

    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ServiceError> {
        let payload = serde_json::to_vec(body).map_err(|e| ServiceError::Transport(e.to_string()))?;
        let (command, _header_file) = self.post_command(url, headers)?;
        Self::run(command, Some(&payload))
    }
}

/// Only plain web URLs are handed to curl.
fn check_url(url: &str) -> Result<(), ServiceError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(ServiceError::Transport(format!("unsupported URL {url:?}, expected http(s)")))
    }
}

/// Write `name: value` lines to an owner-only temporary file for `curl -H @file`.
fn write_header_file(headers: &[(&str, &str)]) -> Result<NamedTempFile, ServiceError> {
    let io_error = |e: std::io::Error| ServiceError::Transport(format!("failed to stage request headers: {e}"));
    let mut file = tempfile::Builder::new()
        .prefix("memecraft-headers-")
        .tempfile()
        .map_err(io_error)?;
    for (name, value) in headers {
        if name.contains(['\r', '\n', ':']) || value.contains(['\r', '\n']) {
            return Err(ServiceError::Transport(format!("invalid request header {name:?}")));
        }
        writeln!(file, "{name}: {value}").map_err(io_error)?;
    }
    file.flush().map_err(io_error)?;
    Ok(file)
}

/// Split `curl -D -` output into the final header block and the body.
///
/// Redirects and `100 Continue` produce several header blocks; only the last
/// one describes the body.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, ServiceError> {
    let mut rest = raw;
    let mut last: Option<(u16, Vec<(String, String)>)> = None;

    while rest.starts_with(b"HTTP/") {
        let end = find(rest, b"\r\n\r\n")
            .ok_or_else(|| ServiceError::Transport("truncated response headers".to_string()))?;
        let block = String::from_utf8_lossy(&rest[..end]);
        let mut lines = block.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| ServiceError::Transport("malformed status line".to_string()))?;
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        last = Some((status, headers));
        rest = &rest[end + 4..];
    }

    let (status, headers) = last.ok_or_else(|| ServiceError::Transport("response had no headers".to_string()))?;
    Ok(HttpResponse {
        status,
        headers,
        body: rest.to_vec(),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
