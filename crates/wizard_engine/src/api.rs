use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use crate::{ApiError, FailureKind, GradeQuery, SubmitRequest, SubmitResponse};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_response_bytes: 256 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait GradeClient: Send + Sync {
    /// Returns the live grade in percent.
    async fn grade(&self, query: &GradeQuery) -> Result<u32, ApiError>;
}

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, ApiError>;
}

/// HTTP client for the job-board REST API.
#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.auth_token.as_deref() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Reads the whole body, refusing anything above `max_response_bytes`.
    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_response_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl GradeClient for ReqwestApi {
    async fn grade(&self, query: &GradeQuery) -> Result<u32, ApiError> {
        let mut url = self.endpoint(query.endpoint.path())?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &query.params {
                pairs.append_pair(name, value);
            }
        }

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = self.read_body(response).await?;
        parse_grade(&body)
    }
}

#[async_trait::async_trait]
impl Submitter for ReqwestApi {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, ApiError> {
        let url = self.endpoint(&request.path)?;

        let mut form = Form::new();
        for (name, value) in request.fields {
            form = form.text(name, value);
        }
        for file in request.files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
            form = form.part(file.name, part);
        }

        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = self.read_body(response).await?;
        if !status.is_success() {
            let message = error_detail(&body).unwrap_or_else(|| status.to_string());
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        Ok(parse_submit_response(status.as_u16(), &body))
    }
}

fn parse_grade(body: &[u8]) -> Result<u32, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))?;
    let grade = value
        .get("grade")
        .and_then(Value::as_f64)
        .filter(|grade| grade.is_finite())
        .ok_or_else(|| ApiError::new(FailureKind::InvalidResponse, "missing numeric grade"))?;
    Ok(grade.round().clamp(0.0, 100.0) as u32)
}

/// Accepts an empty body or a JSON object carrying `id` and `redirect`.
fn parse_submit_response(status: u16, body: &[u8]) -> SubmitResponse {
    let value: Option<Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        value.as_ref().and_then(|value| match value.get(name)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    };
    SubmitResponse {
        status,
        id: field("id"),
        redirect: field("redirect"),
    }
}

/// Pulls a human-readable message out of an error body (`{"detail": ...}`).
fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_is_rounded_and_clamped() {
        assert_eq!(parse_grade(br#"{"grade": 71.6}"#), Ok(72));
        assert_eq!(parse_grade(br#"{"grade": 140}"#), Ok(100));
        assert_eq!(parse_grade(br#"{"grade": -3}"#), Ok(0));
    }

    #[test]
    fn grade_must_be_numeric() {
        let err = parse_grade(br#"{"grade": "high"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
        let err = parse_grade(b"<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn submit_response_accepts_empty_and_numeric_ids() {
        assert_eq!(
            parse_submit_response(201, b""),
            SubmitResponse {
                status: 201,
                id: None,
                redirect: None,
            }
        );
        let parsed = parse_submit_response(201, br#"{"id": 17, "redirect": "/jobs/17"}"#);
        assert_eq!(parsed.id.as_deref(), Some("17"));
        assert_eq!(parsed.redirect.as_deref(), Some("/jobs/17"));
    }
}
