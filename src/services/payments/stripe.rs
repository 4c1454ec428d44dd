use anyhow::Context;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use super::{CustomerParams, PaymentGateway, PaymentIntentHandle, PaymentIntentParams};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            client: reqwest::Client::new(),
        }
    }

    async fn parse_response(resp: reqwest::Response, what: &str) -> anyhow::Result<Value> {
        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse Stripe {what} response"))?;

        if !status.is_success() {
            let message = data["error"]["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!("Stripe API error ({status}): {message}");
        }
        Ok(data)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn find_customer_by_email(&self, email: &str) -> anyhow::Result<Option<String>> {
        let resp = self
            .client
            .get(format!("{STRIPE_API_BASE}/customers"))
            .bearer_auth(&self.secret_key)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .context("failed to list Stripe customers")?;

        let data = Self::parse_response(resp, "customer list").await?;
        Ok(data["data"][0]["id"].as_str().map(|s| s.to_string()))
    }

    async fn create_customer(&self, params: CustomerParams) -> anyhow::Result<String> {
        let mut form: Vec<(String, String)> = vec![
            ("email".to_string(), params.email),
            ("name".to_string(), params.name),
            ("phone".to_string(), params.phone),
        ];
        for (key, value) in params.metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let resp = self
            .client
            .post(format!("{STRIPE_API_BASE}/customers"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .context("failed to create Stripe customer")?;

        let data = Self::parse_response(resp, "customer").await?;
        data["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing id in Stripe customer response"))
    }

    async fn create_payment_intent(
        &self,
        params: PaymentIntentParams,
    ) -> anyhow::Result<PaymentIntentHandle> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), params.amount_minor.to_string()),
            ("currency".to_string(), params.currency),
            ("customer".to_string(), params.customer_id),
            ("description".to_string(), params.description),
        ];
        if params.save_payment_method {
            form.push(("setup_future_usage".to_string(), "off_session".to_string()));
        }
        for (key, value) in params.metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let resp = self
            .client
            .post(format!("{STRIPE_API_BASE}/payment_intents"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .context("failed to create Stripe payment intent")?;

        let data = Self::parse_response(resp, "payment intent").await?;
        let id = data["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("missing id in Stripe payment intent response"))?
            .to_string();
        let client_secret = data["client_secret"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("missing client_secret in Stripe payment intent response"))?
            .to_string();

        Ok(PaymentIntentHandle { id, client_secret })
    }
}

/// Verify a `Stripe-Signature` header (`t=<ts>,v1=<hex>`) against the
/// shared endpoint secret: HMAC-SHA256 over `"{t}.{body}"`, hex encoded,
/// compared in constant time. Rejects events whose timestamp is outside
/// the tolerance window.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now_ts: i64,
) -> bool {
    let mut timestamp = "";
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value,
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    if timestamp.is_empty() || signatures.is_empty() {
        return false;
    }

    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now_ts - ts).abs() > tolerance_secs {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    signatures.iter().any(|sig| constant_time_eq(&expected, sig))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Build a valid `Stripe-Signature` header for a payload. Test helper;
/// also useful for local webhook replay.
pub fn sign_payload(payload: &[u8], secret: &str, ts: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(ts.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_770_000_000;

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = sign_payload(body, SECRET, NOW);
        assert!(verify_signature(body, &header, SECRET, 300, NOW));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let header = sign_payload(body, "whsec_other", NOW);
        assert!(!verify_signature(body, &header, SECRET, 300, NOW));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign_payload(b"{\"amount\":100}", SECRET, NOW);
        assert!(!verify_signature(b"{\"amount\":999}", &header, SECRET, 300, NOW));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = b"{}";
        let header = sign_payload(body, SECRET, NOW - 301);
        assert!(!verify_signature(body, &header, SECRET, 300, NOW));
        // Inside the window it still verifies.
        let header = sign_payload(body, SECRET, NOW - 299);
        assert!(verify_signature(body, &header, SECRET, 300, NOW));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(!verify_signature(b"{}", "", SECRET, 300, NOW));
        assert!(!verify_signature(b"{}", "garbage", SECRET, 300, NOW));
        assert!(!verify_signature(b"{}", "t=notanumber,v1=abcd", SECRET, 300, NOW));
        assert!(!verify_signature(b"{}", "t=1770000000", SECRET, 300, NOW));
    }

    #[test]
    fn test_any_of_multiple_v1_signatures_accepted() {
        let body = b"{}";
        let good = sign_payload(body, SECRET, NOW);
        let v1 = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v1={v1}");
        assert!(verify_signature(body, &header, SECRET, 300, NOW));
    }
}
