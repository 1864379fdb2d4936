//! HTTP client for the suggestion service
//!
//! `POST /suggest`, `POST /log_choice` and `GET /health` against a configured
//! base URL. Any non-2xx status is an error; response bodies of `/log_choice`
//! are ignored.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::ServiceError;

use super::{LogChoice, ServiceFuture, Suggestion, SuggestionRequest, SuggestionResponse, SuggestionService};

pub struct HttpSuggestionClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSuggestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    #[instrument(skip_all, fields(mode = ?request.mode, chars = request.last_text.len()))]
    async fn post_suggest(&self, request: SuggestionRequest) -> Result<Vec<Suggestion>, ServiceError> {
        let response = self
            .client
            .post(self.url("suggest"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }

        let body: SuggestionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        debug!(count = body.suggestions.len(), "suggestions received");
        Ok(body.suggestions)
    }

    async fn post_log_choice(&self, choice: LogChoice) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("log_choice"))
            .json(&choice)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn get_health(&self) -> Result<(), ServiceError> {
        let response = self.client.get(self.url("health")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl SuggestionService for HttpSuggestionClient {
    fn suggest(&self, request: SuggestionRequest) -> ServiceFuture<'_, Vec<Suggestion>> {
        Box::pin(self.post_suggest(request))
    }

    fn log_choice(&self, choice: LogChoice) -> ServiceFuture<'_, ()> {
        Box::pin(self.post_log_choice(choice))
    }

    fn health(&self) -> ServiceFuture<'_, ()> {
        Box::pin(self.get_health())
    }
}
