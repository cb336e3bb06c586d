//! Payment gateway client.
//!
//! Bound to the PhonePe sandbox API contract: the pay payload travels as a
//! base64 blob under `{"request": ...}`, and every call carries an X-VERIFY
//! header of `sha256(blob-or-path + salt) + "###" + keyIndex`.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::GatewayConfig;

pub const PAY_PATH: &str = "/pg/v1/pay";
pub const STATUS_PATH: &str = "/pg/v1/status";

/// Status code the gateway returns for a settled payment.
pub const PAYMENT_SUCCESS: &str = "PAYMENT_SUCCESS";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not encode gateway payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Pay-page session request, serialized exactly as the gateway expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub name: String,
    /// Minor currency units.
    pub amount: i64,
    pub redirect_url: String,
    pub redirect_mode: String,
    pub callback_url: String,
    pub payment_instrument: PaymentInstrument,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub kind: String,
}

impl PaymentInstrument {
    pub fn pay_page() -> Self {
        Self { kind: "PAY_PAGE".to_string() }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayResponse {
    pub data: Option<PayData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayData {
    pub instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentResponse {
    pub redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectInfo {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub code: String,
    pub data: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    /// Gateway-assigned transaction id; stored as the order's `uid`.
    pub transaction_id: Option<String>,
}

/// X-VERIFY value for a signable string (base64 payload + path for pay,
/// bare path for status checks). The salt and key index must match what the
/// gateway was configured with.
pub fn sign(signable: &str, salt_key: &str, key_index: u8) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signable.as_bytes());
    hasher.update(salt_key.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}###{key_index}")
}

/// Base64 blob of the pay payload, as the gateway expects it.
pub fn encode_payload(req: &PayRequest) -> Result<String, GatewayError> {
    Ok(BASE64.encode(serde_json::to_vec(req)?))
}

/// Redirect URL buried in a pay response, if the gateway granted a session.
pub fn redirect_url(resp: &PayResponse) -> Option<&str> {
    resp.data
        .as_ref()?
        .instrument_response
        .as_ref()?
        .redirect_info
        .as_ref()
        .map(|info| info.url.as_str())
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: GatewayConfig,
    http: Client,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, http })
    }

    /// POST the signed pay request; the caller extracts the redirect URL.
    pub async fn initiate_pay(&self, req: &PayRequest) -> Result<PayResponse, GatewayError> {
        let blob = encode_payload(req)?;
        let verify = sign(&format!("{blob}{PAY_PATH}"), &self.config.salt_key, self.config.key_index);
        let url = format!("{}{}", self.config.base_url, PAY_PATH);

        let response = self
            .http
            .post(&url)
            .header("accept", "application/json")
            .header("X-VERIFY", verify)
            .json(&serde_json::json!({ "request": blob }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse(format!("pay request returned {status}: {text}")));
        }

        Ok(response.json().await?)
    }

    /// GET the signed status check for a merchant transaction id.
    pub async fn check_status(&self, merchant_transaction_id: &str) -> Result<StatusResponse, GatewayError> {
        let path = format!("{STATUS_PATH}/{}/{}", self.config.merchant_id, merchant_transaction_id);
        let verify = sign(&path, &self.config.salt_key, self.config.key_index);
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .header("X-VERIFY", verify)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse(format!("status check returned {status}: {text}")));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pay_request() -> PayRequest {
        PayRequest {
            merchant_id: "M1".into(),
            merchant_transaction_id: "Tr-abc123".into(),
            name: "Ana".into(),
            amount: 20_000,
            redirect_url: "http://localhost:3000/status/Tr-abc123".into(),
            redirect_mode: "REDIRECT".into(),
            callback_url: "http://localhost:3000/status/Tr-abc123".into(),
            payment_instrument: PaymentInstrument::pay_page(),
        }
    }

    #[test]
    fn sign_matches_known_pay_vector() {
        // sha256("eyJtZXJjaGFudElkIjoiTTEifQ==" + "/pg/v1/pay" + "salt")
        let signable = format!("eyJtZXJjaGFudElkIjoiTTEifQ=={PAY_PATH}");
        assert_eq!(
            sign(&signable, "salt", 1),
            "38feefb8259b10ef63870efeff451d72003c5a8cfbe1c8a809fd11e70b8a3a74###1"
        );
    }

    #[test]
    fn sign_matches_known_status_vector() {
        let path = format!("{STATUS_PATH}/PGTESTPAYUAT86/Tr-abc123");
        assert_eq!(
            sign(&path, "salt", 1),
            "d8c529ef39f854eadcd4de4824c44fd5b463c91eaa34a2f3ff40a27698c1aa76###1"
        );
    }

    #[test]
    fn sign_appends_key_index() {
        let value = sign("payload", "salt", 2);
        let (hex, index) = value.split_once("###").unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(index, "2");
    }

    #[test]
    fn payload_serializes_with_gateway_field_names() {
        let value = serde_json::to_value(pay_request()).unwrap();
        assert_eq!(value["merchantId"], "M1");
        assert_eq!(value["merchantTransactionId"], "Tr-abc123");
        assert_eq!(value["amount"], 20_000);
        assert_eq!(value["paymentInstrument"]["type"], "PAY_PAGE");
        assert_eq!(value["redirectMode"], "REDIRECT");
    }

    #[test]
    fn encoded_payload_is_base64_of_the_json() {
        let blob = encode_payload(&pay_request()).unwrap();
        let decoded = BASE64.decode(blob).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["merchantTransactionId"], "Tr-abc123");
    }

    #[test]
    fn redirect_url_digs_through_the_response() {
        let resp: PayResponse = serde_json::from_value(serde_json::json!({
            "data": { "instrumentResponse": { "redirectInfo": { "url": "https://pay.example/x" } } }
        }))
        .unwrap();
        assert_eq!(redirect_url(&resp), Some("https://pay.example/x"));

        let empty: PayResponse = serde_json::from_value(serde_json::json!({ "data": null })).unwrap();
        assert_eq!(redirect_url(&empty), None);
    }

    #[test]
    fn status_response_parses_success_shape() {
        let resp: StatusResponse = serde_json::from_value(serde_json::json!({
            "code": "PAYMENT_SUCCESS",
            "data": { "transactionId": "T2408261140" }
        }))
        .unwrap();
        assert_eq!(resp.code, PAYMENT_SUCCESS);
        assert_eq!(resp.data.unwrap().transaction_id.as_deref(), Some("T2408261140"));
    }
}
