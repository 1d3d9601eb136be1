use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

use crate::config::{Credentials, TranslateConfig};
use crate::error::{Result, OrganizerError};
use super::Translator;

const SERVICE: &str = "tmt";
const ACTION: &str = "TextTranslate";
const API_VERSION: &str = "2018-03-21";
const ALGORITHM: &str = "TC3-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextTranslateRequest {
    pub source_text: String,
    pub source: String,
    pub target: String,
    pub project_id: i64,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(rename = "Response")]
    response: TextTranslateResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextTranslateResponse {
    target_text: Option<String>,
    error: Option<ApiError>,
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    code: String,
    message: String,
}

type HmacSha256 = Hmac<Sha256>;

pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| OrganizerError::Translation(format!("invalid signing key: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Build the TC3-HMAC-SHA256 `Authorization` header for one request
pub fn authorization_header(
    credentials: &Credentials,
    host: &str,
    payload: &str,
    timestamp: i64,
) -> Result<String> {
    let date = chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| OrganizerError::Translation(format!("invalid timestamp {}", timestamp)))?
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\nx-tc-action:{}\n\n{}\n{}",
        CONTENT_TYPE,
        host,
        ACTION.to_lowercase(),
        SIGNED_HEADERS,
        sha256_hex(payload.as_bytes())
    );

    let credential_scope = format!("{}/{}/tc3_request", date, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{}", credentials.secret_key).as_bytes(), date.as_bytes())?;
    let secret_service = hmac_sha256(&secret_date, SERVICE.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.secret_id, credential_scope, SIGNED_HEADERS, signature
    ))
}

/// Extract the translated text from a TextTranslate response body
fn parse_response(body: &str) -> Result<String> {
    let envelope: ResponseEnvelope = serde_json::from_str(body)?;
    let response = envelope.response;

    if let Some(error) = response.error {
        return Err(OrganizerError::Translation(format!(
            "{}: {} (request {})",
            error.code,
            error.message,
            response.request_id.unwrap_or_default()
        )));
    }

    match response.target_text.map(|t| t.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(OrganizerError::Translation("Empty translation received".to_string())),
    }
}

/// Tencent Cloud machine translation (TMT) client
pub struct TencentTranslator {
    client: Client,
    config: TranslateConfig,
    credentials: Credentials,
}

impl TencentTranslator {
    pub fn new(config: TranslateConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn build_request(&self, text: &str) -> TextTranslateRequest {
        TextTranslateRequest {
            source_text: text.to_string(),
            source: self.config.source_language.clone(),
            target: self.config.target_language.clone(),
            project_id: self.config.project_id,
        }
    }
}

#[async_trait]
impl Translator for TencentTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let payload = serde_json::to_string(&self.build_request(text))?;
        let host = self.config.endpoint.as_str();
        let timestamp = chrono::Utc::now().timestamp();
        let authorization = authorization_header(&self.credentials, host, &payload, timestamp)?;

        let url = format!("https://{}/", host);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", host)
            .header("X-TC-Action", ACTION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Region", self.config.region.as_str())
            .body(payload)
            .send()
            .await
            .map_err(|e| OrganizerError::Translation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Raw translation response: {}", body);

        if !status.is_success() {
            return Err(OrganizerError::Translation(format!(
                "Translation API error {}: {}",
                status, body
            )));
        }

        parse_response(&body)
    }
}
