// HTTP client for the Spontime API

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, trace};

use super::error::ApiError;
use super::types::{
    AuthResponse, CreatePlanRequest, LoginRequest, LogoutResponse, Message, PagedList, Plan,
    RegisterRequest, User,
};
use crate::config::Config;
use crate::session::Session;

/// Typed facade over the Spontime REST endpoints
///
/// Every call reads the current token from the shared `Session` and sends it
/// as `Authorization: Token <token>`; anonymous sessions send no header.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.api_base_url)?;

        let client = Client::builder()
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::Transport)?;

        debug!(base_url = %base_url, timeout_secs = config.timeout_seconds, "Created API client");

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    // Authentication

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;
        let builder = self.request(Method::POST, "auth/register/")?.json(request);
        self.send(builder).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;
        let builder = self.request(Method::POST, "auth/login/")?.json(request);
        self.send(builder).await
    }

    pub async fn logout(&self) -> Result<LogoutResponse, ApiError> {
        let builder = self.request(Method::POST, "auth/logout/")?;
        self.send(builder).await
    }

    pub async fn get_profile(&self) -> Result<User, ApiError> {
        let builder = self.request(Method::GET, "auth/profile/")?;
        self.send(builder).await
    }

    // Plans

    pub async fn get_plans(&self, page: u32) -> Result<PagedList<Plan>, ApiError> {
        let builder = self
            .request(Method::GET, "plans/")?
            .query(&[("page", page)]);
        self.send(builder).await
    }

    pub async fn get_plan(&self, id: &str) -> Result<Plan, ApiError> {
        let path = resource_path("plans", id)?;
        let builder = self.request(Method::GET, &path)?;
        self.send(builder).await
    }

    pub async fn create_plan(&self, request: &CreatePlanRequest) -> Result<Plan, ApiError> {
        request.validate()?;
        let builder = self.request(Method::POST, "plans/")?.json(request);
        self.send(builder).await
    }

    // Users

    pub async fn get_users(&self, page: u32) -> Result<PagedList<User>, ApiError> {
        let builder = self
            .request(Method::GET, "users/")?
            .query(&[("page", page)]);
        self.send(builder).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let path = resource_path("users", id)?;
        let builder = self.request(Method::GET, &path)?;
        self.send(builder).await
    }

    // Messages

    pub async fn get_messages(
        &self,
        plan_id: Option<&str>,
        page: u32,
    ) -> Result<PagedList<Message>, ApiError> {
        let mut builder = self.request(Method::GET, "messages/")?;
        if let Some(plan_id) = plan_id {
            builder = builder.query(&[("plan_id", plan_id)]);
        }
        let builder = builder.query(&[("page", page)]);
        self.send(builder).await
    }

    /// Build a request for `path` (relative to the base URL) with auth injected
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))?;

        let mut builder = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", token));
        }
        Ok(builder)
    }

    /// Send a request and map the response into `T`
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        // Nothing has been sent yet; a bad header or URL is a local problem
        let request = builder
            .build()
            .map_err(|e| ApiError::Validation(format!("could not build request: {}", e)))?;
        let method = request.method().clone();
        let url = request.url().clone();

        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            trace!(%method, %url, body = %redact_body(body), "Request body");
        }

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                error!(%method, %url, "Request timed out: {}", e);
            } else if e.is_connect() {
                error!(%method, %url, "Connection failed: {}", e);
            } else {
                error!(%method, %url, "Request failed: {}", e);
            }
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Transport)?;

        debug!(%method, %url, status = status.as_u16(), "Received response");
        trace!(%method, %url, body = %redact_body(body.as_bytes()), "Response body");

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        decode(status.as_u16(), body)
    }
}

fn decode<T: DeserializeOwned>(status: u16, body: String) -> Result<T, ApiError> {
    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        status,
        body,
        source,
    })
}

/// Parse the base URL, forcing a trailing slash so relative paths join beneath it
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash)
        .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!(
            "{}: not usable as a base URL",
            trimmed
        )));
    }

    Ok(url)
}

/// `{collection}/{id}/`, rejecting ids that would escape the collection
fn resource_path(collection: &str, id: &str) -> Result<String, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::Validation("id must not be empty".to_string()));
    }
    if id.contains(['/', '?', '#']) || id == "." || id == ".." {
        return Err(ApiError::Validation(format!("invalid id '{}'", id)));
    }
    Ok(format!("{}/{}/", collection, id))
}

/// Keys whose values never reach the log
const SECRET_KEYS: &[&str] = &["password", "token"];

/// Hide credentials from logged request and response bodies
fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) {
                    *field = serde_json::Value::String("***".to_string());
                } else {
                    redact_value(field);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish()
    }
}
