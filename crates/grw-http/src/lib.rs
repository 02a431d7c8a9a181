//! HTTP adapter for the record-of-truth backend.
//!
//! Two endpoints only: store a gift-received record, and notify a failed
//! transfer so the backend can reverse its optimistic inventory change.
//! Non-2xx responses surface as errors for the caller to log; nothing is
//! retried here.

use async_trait::async_trait;

use grw_core::{
    config::Config,
    domain::{CompensationNotice, GiftEvent},
    errors::Error,
    ports::BackendPort,
    Result,
};

#[derive(Clone, Debug)]
pub struct HttpBackend {
    gift_received_url: String,
    transfer_failed_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            gift_received_url: cfg.gift_received_url.clone(),
            transfer_failed_url: cfg.transfer_failed_url.clone(),
            auth_token: cfg.backend_auth_token.clone(),
            http,
        }
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        let mut req = self.http.post(url).json(body);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("backend request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "backend returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl BackendPort for HttpBackend {
    async fn store_gift(&self, event: &GiftEvent) -> Result<()> {
        self.post_json(&self.gift_received_url, event).await
    }

    async fn notify_transfer_failed(&self, notice: &CompensationNotice) -> Result<()> {
        self.post_json(&self.transfer_failed_url, notice).await
    }
}
