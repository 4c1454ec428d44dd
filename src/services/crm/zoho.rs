use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{CreatedRecord, Crm, CrmModule};

/// Zoho CRM v3 client. Access tokens come from a refresh-token exchange
/// and are cached in memory; a 401 triggers one re-fetch and retry.
pub struct ZohoCrm {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    accounts_url: String,
    client: reqwest::Client,
    access_token: RwLock<Option<String>>,
    api_domain: RwLock<String>,
}

impl ZohoCrm {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
        accounts_url: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            accounts_url,
            client: reqwest::Client::new(),
            access_token: RwLock::new(None),
            // Default to the EU data center; the token exchange reports
            // the actual domain and overrides this.
            api_domain: RwLock::new("https://www.zohoapis.eu".to_string()),
        }
    }

    async fn refresh_access_token(&self) -> anyhow::Result<String> {
        anyhow::ensure!(
            !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.refresh_token.is_empty(),
            "missing Zoho API credentials"
        );

        let url = format!(
            "{}/oauth/v2/token?refresh_token={}&client_id={}&client_secret={}&grant_type=refresh_token",
            self.accounts_url, self.refresh_token, self.client_id, self.client_secret
        );

        let data: Value = self
            .client
            .post(&url)
            .send()
            .await
            .context("Zoho token exchange failed")?
            .json()
            .await
            .context("failed to parse Zoho token response")?;

        let token = data["access_token"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("failed to refresh Zoho access token: {data}"))?
            .to_string();

        if let Some(domain) = data["api_domain"].as_str() {
            *self.api_domain.write().await = domain.to_string();
        }
        *self.access_token.write().await = Some(token.clone());

        Ok(token)
    }

    async fn cached_token(&self) -> anyhow::Result<String> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_access_token().await
    }

    /// Run a request, re-authenticating once on 401. `build` receives the
    /// current api domain and access token and must construct the full
    /// request each attempt.
    async fn execute<F>(&self, build: F) -> anyhow::Result<Value>
    where
        F: Fn(&str, &str) -> reqwest::RequestBuilder,
    {
        let mut token = self.cached_token().await?;
        let domain = self.api_domain.read().await.clone();
        let mut resp = build(&domain, &token)
            .send()
            .await
            .context("Zoho CRM request failed")?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            token = self.refresh_access_token().await?;
            let domain = self.api_domain.read().await.clone();
            resp = build(&domain, &token)
                .send()
                .await
                .context("Zoho CRM request failed")?;
        }

        let status = resp.status();
        // Searches with no matches come back as 204 No Content.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Zoho API error ({status}): {body}");
        }

        resp.json().await.context("failed to parse Zoho response")
    }
}

fn auth_header(token: &str) -> String {
    format!("Zoho-oauthtoken {token}")
}

#[async_trait]
impl Crm for ZohoCrm {
    async fn create_record(&self, module: CrmModule, data: Value) -> anyhow::Result<CreatedRecord> {
        let body = json!({ "data": [data] });
        let result = self
            .execute(|domain, token| {
                self.client
                    .post(format!("{domain}/crm/v3/{}", module.as_str()))
                    .header("Authorization", auth_header(token))
                    .json(&body)
            })
            .await?;

        let details = &result["data"][0]["details"];
        let id = details["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("failed to create {} record; no ID returned", module.as_str()))?
            .to_string();
        let name = details["name"].as_str().map(|s| s.to_string());

        Ok(CreatedRecord { id, name })
    }

    async fn update_record(&self, module: CrmModule, id: &str, data: Value) -> anyhow::Result<()> {
        let body = json!({ "data": [data] });
        self.execute(|domain, token| {
            self.client
                .put(format!("{domain}/crm/v3/{}/{id}", module.as_str()))
                .header("Authorization", auth_header(token))
                .json(&body)
        })
        .await?;
        Ok(())
    }

    async fn search_records(&self, module: CrmModule, criteria: &str) -> anyhow::Result<Vec<Value>> {
        let result = self
            .execute(|domain, token| {
                self.client
                    .get(format!("{domain}/crm/v3/{}/search", module.as_str()))
                    .query(&[("criteria", criteria)])
                    .header("Authorization", auth_header(token))
            })
            .await?;

        Ok(result["data"].as_array().cloned().unwrap_or_default())
    }
}
