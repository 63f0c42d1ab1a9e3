use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::models::{
    BinBody, BinCheckRequest, CreatePaymentRequest, Envelope, PaymentBody, PaymentDetailRequest,
    ThreeDsAuthRequest, ThreeDsInitBody,
};
use super::signing::{random_key, RequestSigner};
use crate::config::GatewayConfig;
use crate::domain::errors::DomainError;
use crate::domain::gateway::{BinInfo, PaymentRequest, PaymentResult, ThreeDsCompletion};
use crate::domain::ports::PaymentGateway;

const INITIALIZE_3DS: &str = "/payment/3dsecure/initialize";
const AUTH_3DS: &str = "/payment/3dsecure/auth";
const AUTH_DIRECT: &str = "/payment/auth";
const BIN_CHECK: &str = "/payment/bin/check";
const PAYMENT_DETAIL: &str = "/payment/detail";

const CLIENT_VERSION: &str = concat!("storefront-checkout-", env!("CARGO_PKG_VERSION"));

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DomainError::GatewayUnavailable("request timed out".into())
        } else if e.is_connect() {
            DomainError::GatewayUnavailable("connection failed".into())
        } else {
            DomainError::GatewayUnavailable(e.to_string())
        }
    }
}

/// Signed HTTP client for the card payment provider.
#[derive(Debug, Clone)]
pub struct IyzicoClient {
    http: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
    locale: String,
}

impl IyzicoClient {
    pub fn new(config: &GatewayConfig, locale: &str) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer: RequestSigner::new(&config.api_key, &config.secret_key),
            locale: locale.to_string(),
        })
    }

    /// Serializes `body` once, signs those bytes and sends the same bytes.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, DomainError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_string(body)
            .map_err(|e| DomainError::Internal(format!("cannot encode gateway request: {e}")))?;
        let rnd = random_key();
        let authorization = self.signer.authorization(&rnd, path, &payload);

        log::debug!("POST {}{}", self.base_url, path);
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .header("x-iyzi-rnd", rnd)
            .header("x-iyzi-client-version", CLIENT_VERSION)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            log::warn!("Unreadable gateway response on {} (HTTP {}): {}", path, status, e);
            DomainError::GatewayUnavailable(format!("unexpected response (HTTP {status})"))
        })?;

        if envelope.status != "success" {
            let code = envelope.error_code.unwrap_or_else(|| "UNKNOWN".into());
            let message = envelope
                .error_message
                .unwrap_or_else(|| "payment was not approved".into());
            log::info!("Gateway declined {}: {} {}", path, code, message);
            return Err(DomainError::Gateway { code, message });
        }
        Ok(envelope.body)
    }
}

fn payment_result(body: PaymentBody) -> Result<PaymentResult, DomainError> {
    let payment_id = body.payment_id.ok_or_else(|| DomainError::Gateway {
        code: "MISSING_PAYMENT_ID".into(),
        message: "gateway reported success without a payment id".into(),
    })?;
    let paid_price = body
        .paid_price
        .map(|value| {
            let raw = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            BigDecimal::from_str(&raw).map_err(|_| DomainError::Gateway {
                code: "BAD_AMOUNT".into(),
                message: format!("unreadable paid price {raw}"),
            })
        })
        .transpose()?;

    Ok(PaymentResult {
        payment_id,
        basket_id: body.basket_id,
        paid_price,
        currency: body.currency,
        fraud_status: body.fraud_status,
    })
}

#[async_trait]
impl PaymentGateway for IyzicoClient {
    async fn initialize_three_ds(&self, request: &PaymentRequest) -> Result<String, DomainError> {
        let wire = CreatePaymentRequest::from(request);
        let body: ThreeDsInitBody = self.post(INITIALIZE_3DS, &wire).await?;

        let encoded = body.three_ds_html_content.ok_or_else(|| DomainError::Gateway {
            code: "MISSING_3DS_CONTENT".into(),
            message: "gateway returned no challenge page".into(),
        })?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DomainError::GatewayUnavailable(format!("undecodable challenge page: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|_| DomainError::GatewayUnavailable("challenge page is not UTF-8".into()))
    }

    async fn complete_three_ds(
        &self,
        completion: &ThreeDsCompletion,
    ) -> Result<PaymentResult, DomainError> {
        let wire = ThreeDsAuthRequest {
            locale: self.locale.clone(),
            conversation_id: completion.conversation_id.clone(),
            payment_id: completion.payment_id.clone(),
            conversation_data: completion.conversation_data.clone(),
        };
        payment_result(self.post(AUTH_3DS, &wire).await?)
    }

    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentResult, DomainError> {
        let wire = CreatePaymentRequest::from(request);
        payment_result(self.post(AUTH_DIRECT, &wire).await?)
    }

    async fn check_bin(&self, bin_number: &str) -> Result<BinInfo, DomainError> {
        let wire = BinCheckRequest {
            locale: self.locale.clone(),
            conversation_id: format!("bin-{}", random_key()),
            bin_number: bin_number.to_string(),
        };
        let body: BinBody = self.post(BIN_CHECK, &wire).await?;
        Ok(BinInfo {
            bin_number: body.bin_number.unwrap_or_else(|| bin_number.to_string()),
            card_type: body.card_type,
            card_association: body.card_association,
            card_family: body.card_family,
            bank_name: body.bank_name,
            commercial: body.commercial.map(|c| c == 1),
        })
    }

    async fn payment_detail(&self, payment_id: &str) -> Result<PaymentResult, DomainError> {
        let wire = PaymentDetailRequest {
            locale: self.locale.clone(),
            conversation_id: format!("detail-{payment_id}"),
            payment_id: payment_id.to_string(),
        };
        payment_result(self.post(PAYMENT_DETAIL, &wire).await?)
    }
}
