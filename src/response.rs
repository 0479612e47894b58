use crate::error::AppError;
use log::{debug, error};
use std::io::prelude::*;
use std::net::TcpStream;

/// HTTP response builder with proper headers and error handling.
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        Self {
            status_code,
            status_text: status_text.to_string(),
            headers: vec![
                ("Server".to_string(), "mediashare/0.2.0".to_string()),
                ("Connection".to_string(), "close".to_string()),
                ("Cache-Control".to_string(), "no-cache".to_string()),
            ],
            body: Vec::new(),
        }
    }

    pub fn with_html_body(mut self, body: String) -> Self {
        self.headers.push((
            "Content-Type".to_string(),
            "text/html; charset=utf-8".to_string(),
        ));
        self.body = body.into_bytes();
        self
    }

    pub fn with_json_body(mut self, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self.body = body.into_bytes();
        self
    }

    pub fn with_plain_body(mut self, body: String) -> Self {
        self.headers.push((
            "Content-Type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        ));
        self.body = body.into_bytes();
        self
    }

    pub fn add_header(mut self, name: String, value: String) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn send(self, stream: &mut TcpStream, log_prefix: &str) -> Result<(), AppError> {
        debug!(
            "{} Sending response - Status: {}, Body Length: {}",
            log_prefix,
            self.status_code,
            self.body.len()
        );

        let mut response = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status_text);
        response.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        for (name, value) in &self.headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");

        stream.write_all(response.as_bytes()).map_err(|e| {
            error!("{log_prefix} Failed to write response headers: {e}");
            AppError::Io(e)
        })?;

        if !self.body.is_empty() {
            stream.write_all(&self.body).map_err(|e| {
                error!("{log_prefix} Failed to write response body: {e}");
                AppError::Io(e)
            })?;
        }

        stream.flush().map_err(|e| {
            error!("{log_prefix} Failed to flush response: {e}");
            AppError::Io(e)
        })?;

        Ok(())
    }
}

/// Builds the error response for a failed request. The 416 case carries
/// the mandatory `Content-Range: bytes */<total>` header and no body.
pub fn error_response(err: &AppError) -> HttpResponse {
    let (status_code, status_text) = err.status();
    if let AppError::UnsatisfiableRange(total) = err {
        return HttpResponse::new(status_code, status_text)
            .add_header("Content-Range".to_string(), format!("bytes */{total}"));
    }
    let body = format!("{} {}: {}\n", status_code, status_text, error_description(status_code));
    HttpResponse::new(status_code, status_text).with_plain_body(body)
}

/// Best-effort error transmission. The connection may already be broken,
/// so a failure here is logged and swallowed; the serving loop must not be
/// taken down by a client we can no longer reach.
pub fn send_error_response(stream: &mut TcpStream, err: &AppError, log_prefix: &str) {
    if let Err(send_err) = error_response(err).send(stream, log_prefix) {
        debug!("{log_prefix} Could not deliver error response: {send_err}");
    }
}

fn error_description(status_code: u16) -> &'static str {
    match status_code {
        400 => "The request could not be understood.",
        403 => "Access to this resource is forbidden.",
        404 => "The requested file or directory could not be found.",
        405 => "Only GET requests are supported.",
        416 => "The requested range is outside the file bounds.",
        500 => "An internal error occurred while processing the request.",
        _ => "The request could not be processed.",
    }
}
