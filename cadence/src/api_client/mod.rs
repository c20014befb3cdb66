//! HTTP client for the reminder daemon's API.

pub mod types;

use anyhow::{Result, bail};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use types::{AlertPreferences, ArmRequest, ErrorBody, ReconcileResponse, ReminderState};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7786";

pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn get_reminder(&self) -> Result<ReminderState> {
        self.send(self.http.get(self.url("reminder"))).await
    }

    pub async fn arm(&self, request: &ArmRequest) -> Result<ReminderState> {
        self.send(self.http.post(self.url("reminder/arm")).json(request))
            .await
    }

    pub async fn disarm(&self) -> Result<ReminderState> {
        self.send(self.http.post(self.url("reminder/disarm"))).await
    }

    pub async fn acknowledge(&self) -> Result<ReminderState> {
        self.send(self.http.post(self.url("reminder/acknowledge")))
            .await
    }

    pub async fn reconcile(&self) -> Result<ReconcileResponse> {
        self.send(self.http.post(self.url("reminder/reconcile")))
            .await
    }

    pub async fn test_alert(&self) -> Result<ReminderState> {
        self.send(self.http.post(self.url("reminder/test-alert")))
            .await
    }

    pub async fn get_preferences(&self) -> Result<AlertPreferences> {
        self.send(self.http.get(self.url("preferences"))).await
    }

    pub async fn put_preferences(&self, preferences: &AlertPreferences) -> Result<AlertPreferences> {
        self.send(self.http.put(self.url("preferences")).json(preferences))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v0/{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
            };
            bail!("{message} ({status})");
        }
        Ok(response.json().await?)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
