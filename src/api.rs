//! REST client for the Imersiva backend.
//!
//! DESIGN
//! ======
//! Thin request/response wrapper: fetch, decode, hand back typed models.
//! Every authenticated request carries the stored bearer token; a 401
//! response clears that token (client-side session invalidation) and
//! surfaces [`ApiError::Unauthorized`] so the caller can route back to
//! login. No retry policy lives here.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::model::{Experience, ExperienceStatus, SchoolWithClasses, TeacherProfile};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not logged in; run `login` or set IMERSIVA_TOKEN")]
    MissingToken,
    #[error("session expired or invalid; log in again")]
    Unauthorized,
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Backend client. Holds the base URL and the current session token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: TeacherProfile,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http: reqwest::Client::new(), base_url, token: RwLock::new(token) }
    }

    /// The currently stored session token, if any.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// Authenticate and store the returned session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<TeacherProfile, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: LoginResponse = self
            .request(Method::POST, "/auth/login", Some(body), false)
            .await?;

        *self.token.write().await = Some(response.token);
        Ok(response.user)
    }

    /// Drop the stored session token.
    pub async fn logout(&self) {
        *self.token.write().await = None;
    }

    // =========================================================================
    // SCHOOL
    // =========================================================================

    /// The teacher's school with its class list.
    pub async fn school_with_classes(&self) -> Result<SchoolWithClasses, ApiError> {
        self.request(Method::GET, "/school/withClasses", None, true).await
    }

    // =========================================================================
    // EXPERIENCE
    // =========================================================================

    /// Create an experience for a class; the backend assigns the PIN.
    pub async fn create_experience(&self, name: &str, class_id: Uuid) -> Result<Experience, ApiError> {
        let body = serde_json::json!({ "name": name, "classId": class_id });
        self.request(Method::POST, "/experience", Some(body), true).await
    }

    /// Fetch one experience by PIN, including its expected students.
    pub async fn get_experience(&self, pin: &str) -> Result<Experience, ApiError> {
        let path = format!("/experience/getOne?pin={pin}");
        self.request(Method::GET, &path, None, true).await
    }

    /// Move an experience's status forward. Callers apply the returned
    /// status optimistically to their cached copy.
    pub async fn update_experience_status(
        &self,
        pin: &str,
        status: ExperienceStatus,
    ) -> Result<Experience, ApiError> {
        let body = serde_json::json!({ "pin": pin, "status": status });
        self.request(Method::PATCH, "/experience/status", Some(body), true).await
    }

    // =========================================================================
    // PLUMBING
    // =========================================================================

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method, &url);

        if authenticated {
            let Some(token) = self.token().await else {
                return Err(ApiError::MissingToken);
            };
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(&json);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Session invalidation: the stored token is no longer good.
            warn!(%url, "backend rejected session token");
            *self.token.write().await = None;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
