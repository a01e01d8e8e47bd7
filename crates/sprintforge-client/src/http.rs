//! `reqwest` implementation of [`BaselineApi`]

use crate::api::BaselineApi;
use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sprintforge_model::{
    ActivateResponse, Baseline, BaselineComparison, BaselineDetail, BaselineId, BaselineList,
    CreateBaselineRequest, ForgeError, ProjectId, MAX_SNAPSHOT_BYTES,
};
use std::sync::Arc;

/// HTTP client for the baseline endpoints
#[derive(Clone)]
pub struct HttpBaselineApi {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpBaselineApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBaselineApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpBaselineApi {
    /// Build a client from validated configuration
    ///
    /// # Errors
    /// `ForgeError::Config` if the configuration is invalid or the TLS
    /// backend cannot be initialized.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ForgeError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ForgeError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// API root requests are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn baselines_path(project: ProjectId) -> String {
        format!("/projects/{project}/baselines")
    }

    fn baseline_path(project: ProjectId, baseline: BaselineId) -> String {
        format!("/projects/{project}/baselines/{baseline}")
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ForgeError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .ok_or_else(|| ForgeError::Unauthorized("sign in required".into()))?;
        Ok(request.bearer_auth(token))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ForgeError> {
        let response = self
            .authorize(request)
            .await?
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = translate_status(status, &body);
        tracing::debug!(status = status.as_u16(), error = %err, "request failed");
        Err(err)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| ForgeError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BaselineApi for HttpBaselineApi {
    async fn list_baselines(
        &self,
        project: ProjectId,
        page: u32,
        limit: u32,
    ) -> Result<BaselineList, ForgeError> {
        tracing::debug!(%project, page, limit, "listing baselines");
        let request = self
            .client
            .get(self.url(&Self::baselines_path(project)))
            .query(&[("page", page), ("limit", limit)]);
        self.fetch_json(request).await
    }

    async fn get_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<BaselineDetail, ForgeError> {
        tracing::debug!(%project, %baseline, "fetching baseline detail");
        let request = self
            .client
            .get(self.url(&Self::baseline_path(project, baseline)));
        self.fetch_json(request).await
    }

    async fn create_baseline(
        &self,
        project: ProjectId,
        request: CreateBaselineRequest,
    ) -> Result<Baseline, ForgeError> {
        tracing::debug!(%project, name = %request.name, "creating baseline");
        let request = self
            .client
            .post(self.url(&Self::baselines_path(project)))
            .json(&request);
        self.fetch_json(request).await
    }

    async fn delete_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<(), ForgeError> {
        tracing::debug!(%project, %baseline, "deleting baseline");
        let request = self
            .client
            .delete(self.url(&Self::baseline_path(project, baseline)));
        self.execute(request).await.map(|_| ())
    }

    async fn activate_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<ActivateResponse, ForgeError> {
        tracing::debug!(%project, %baseline, "activating baseline");
        let path = format!("{}/activate", Self::baseline_path(project, baseline));
        let request = self.client.patch(self.url(&path));
        self.fetch_json(request).await
    }

    async fn compare_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
        include_unchanged: bool,
    ) -> Result<BaselineComparison, ForgeError> {
        tracing::debug!(%project, %baseline, include_unchanged, "fetching comparison");
        let path = format!("{}/compare", Self::baseline_path(project, baseline));
        let request = self
            .client
            .get(self.url(&path))
            .query(&[("include_unchanged", include_unchanged)]);
        self.fetch_json(request).await
    }
}

fn transport_error(err: reqwest::Error) -> ForgeError {
    if err.is_decode() {
        ForgeError::Decode(err.to_string())
    } else if err.is_timeout() {
        ForgeError::Network(format!("request timed out: {err}"))
    } else {
        ForgeError::Network(err.to_string())
    }
}

/// Map a non-success response onto the error taxonomy
///
/// The message comes from the body's `detail` (string, or list of
/// `{ "msg": .. }` entries) or `message` field, falling back to the raw body
/// and then to the status reason. A 413 always carries the size-ceiling
/// message.
#[must_use]
pub fn translate_status(status: StatusCode, body: &str) -> ForgeError {
    let message = server_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    let code = status.as_u16();
    match code {
        400 | 422 => ForgeError::validation("request", message),
        401 | 403 => ForgeError::Unauthorized(message),
        404 => ForgeError::NotFound(message),
        413 => ForgeError::PayloadTooLarge(format!(
            "Baseline snapshot exceeds the {}MB size limit",
            MAX_SNAPSHOT_BYTES / (1024 * 1024)
        )),
        500..=599 => ForgeError::Server { status: code, message },
        _ => ForgeError::Client { status: code, message },
    }
}

fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    match value.get("detail").or_else(|| value.get("message")) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn translate_uses_detail_field() {
        let err = translate_status(StatusCode::NOT_FOUND, r#"{"detail": "Baseline not found"}"#);
        assert_eq!(err, ForgeError::NotFound("Baseline not found".into()));
    }

    #[test]
    fn translate_joins_validation_messages() {
        let body = r#"{"detail": [{"msg": "name too long"}, {"msg": "bad description"}]}"#;
        let err = translate_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err,
            ForgeError::validation("request", "name too long; bad description")
        );
    }

    #[test]
    fn translate_413_carries_size_ceiling() {
        let err = translate_status(StatusCode::PAYLOAD_TOO_LARGE, "");
        match err {
            ForgeError::PayloadTooLarge(msg) => assert!(msg.contains("10MB")),
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn translate_falls_back_to_reason_and_raw_body() {
        assert_eq!(
            translate_status(StatusCode::BAD_GATEWAY, ""),
            ForgeError::Server {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
        assert_eq!(
            translate_status(StatusCode::CONFLICT, "conflict: already active"),
            ForgeError::Client {
                status: 409,
                message: "conflict: already active".into()
            }
        );
        assert!(matches!(
            translate_status(StatusCode::FORBIDDEN, "{}"),
            ForgeError::Unauthorized(m) if m == "Forbidden"
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("https://api.example.test/v1/");
        let api = HttpBaselineApi::new(&config, Arc::new(StaticToken::anonymous())).unwrap();
        assert_eq!(api.base_url(), "https://api.example.test/v1");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig::new("nope");
        let result = HttpBaselineApi::new(&config, Arc::new(StaticToken::anonymous()));
        assert!(matches!(result, Err(ForgeError::Config(_))));
    }
}
