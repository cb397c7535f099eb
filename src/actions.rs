// User actions
//
// The flows behind the login and dashboard screens: validate input, make one
// API call, update the session, and report the outcome through the
// notification sink. Failures are returned to the caller as well, never fatal.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{
    ApiClient, ApiError, AuthResponse, CreatePlanRequest, LoginRequest, Message, PagedList, Plan,
    RegisterRequest, User,
};
use crate::errors::describe;
use crate::notify::{NotificationSink, Severity};
use crate::session::Session;

const FILL_ALL_FIELDS: &str = "Please fill all fields";

#[derive(Clone)]
pub struct Actions {
    client: ApiClient,
    notifier: Arc<dyn NotificationSink>,
}

impl Actions {
    pub fn new(client: ApiClient, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { client, notifier }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    /// Notify about a failure and hand it back to the caller
    fn fail<T>(&self, headline: Option<&str>, error: ApiError) -> Result<T, ApiError> {
        let message = match (&error, headline) {
            (ApiError::Transport(_), _) | (_, None) => describe(&error),
            (_, Some(headline)) => headline.to_string(),
        };
        warn!(error = %error, "Action failed");
        self.notify(&message, Severity::Error);
        Err(error)
    }

    fn reject<T>(&self, message: &str) -> Result<T, ApiError> {
        self.notify(message, Severity::Warning);
        Err(ApiError::Validation(message.to_string()))
    }

    fn adopt_token(&self, auth: &AuthResponse) {
        if let Err(e) = self.session().sign_in(&auth.token) {
            warn!(error = %e, "Signed in but could not persist session");
            self.notify(
                &format!("Signed in, but the session could not be saved: {}", e),
                Severity::Warning,
            );
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return self.reject(FILL_ALL_FIELDS);
        }

        let auth = match self.client.login(&LoginRequest::new(email, password)).await {
            Ok(auth) => auth,
            Err(e) => return self.fail(Some("Invalid credentials"), e),
        };

        self.adopt_token(&auth);
        info!(handle = %auth.user.handle, "Logged in");
        self.notify("Login successful!", Severity::Success);
        Ok(auth)
    }

    pub async fn register(
        &self,
        email: &str,
        handle: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthResponse, ApiError> {
        let email = email.trim();
        let handle = handle.trim();
        if email.is_empty() || handle.is_empty() || password.is_empty() {
            return self.reject(FILL_ALL_FIELDS);
        }

        let mut request = RegisterRequest::new(email, handle, password);
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            request = request.with_display_name(name);
        }

        let auth = match self.client.register(&request).await {
            Ok(auth) => auth,
            Err(e) => {
                let headline = registration_failure(&e);
                return self.fail(Some(&headline), e);
            }
        };

        self.adopt_token(&auth);
        info!(handle = %auth.user.handle, "Registered");
        self.notify("Registration successful!", Severity::Success);
        Ok(auth)
    }

    /// Sign out locally no matter what the server says
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "Ignoring logout failure");
        }

        if let Err(e) = self.session().sign_out() {
            warn!(error = %e, "Could not clear persisted session");
            self.notify(
                &format!("Signed out, but the saved session could not be removed: {}", e),
                Severity::Warning,
            );
            return;
        }

        self.notify("Signed out", Severity::Info);
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        match self.client.get_profile().await {
            Ok(user) => Ok(user),
            Err(e) => self.fail(Some("Failed to load profile"), e),
        }
    }

    pub async fn load_plans(&self, page: u32) -> Result<PagedList<Plan>, ApiError> {
        match self.client.get_plans(page).await {
            Ok(plans) => Ok(plans),
            Err(e) => self.fail(Some("Failed to load plans"), e),
        }
    }

    pub async fn plan(&self, id: &str) -> Result<Plan, ApiError> {
        match self.client.get_plan(id).await {
            Ok(plan) => Ok(plan),
            Err(e @ ApiError::Validation(_)) => self.fail(None, e),
            Err(e) => self.fail(Some("Failed to load plan"), e),
        }
    }

    /// Create a plan from a title and optional description
    ///
    /// An empty title is rejected without contacting the server; an empty
    /// description is sent as absent.
    pub async fn create_plan(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Plan, ApiError> {
        let title = title.trim();
        if title.is_empty() {
            return self.reject("Plan title is required");
        }

        let mut request = CreatePlanRequest::new(title);
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            request = request.with_description(description);
        }

        self.submit_plan(&request).await
    }

    /// Create a plan from a fully specified request
    pub async fn submit_plan(&self, request: &CreatePlanRequest) -> Result<Plan, ApiError> {
        match self.client.create_plan(request).await {
            Ok(plan) => {
                info!(plan_id = %plan.id, "Plan created");
                self.notify("Plan created!", Severity::Success);
                Ok(plan)
            }
            Err(e @ ApiError::Validation(_)) => self.fail(None, e),
            Err(e) => self.fail(Some("Failed to create plan"), e),
        }
    }

    pub async fn users(&self, page: u32) -> Result<PagedList<User>, ApiError> {
        match self.client.get_users(page).await {
            Ok(users) => Ok(users),
            Err(e) => self.fail(Some("Failed to load users"), e),
        }
    }

    pub async fn user(&self, id: &str) -> Result<User, ApiError> {
        match self.client.get_user(id).await {
            Ok(user) => Ok(user),
            Err(e @ ApiError::Validation(_)) => self.fail(None, e),
            Err(e) => self.fail(Some("Failed to load user"), e),
        }
    }

    pub async fn messages(
        &self,
        plan_id: Option<&str>,
        page: u32,
    ) -> Result<PagedList<Message>, ApiError> {
        match self.client.get_messages(plan_id, page).await {
            Ok(messages) => Ok(messages),
            Err(e) => self.fail(Some("Failed to load messages"), e),
        }
    }
}

/// Server explanation for a rejected registration, or a generic headline
fn registration_failure(error: &ApiError) -> String {
    if let Some(message) = error.server_message() {
        return message;
    }
    match error.raw_body() {
        Some(body) if !body.trim().is_empty() && error.status().is_some() => body.to_string(),
        _ => "Registration failed".to_string(),
    }
}
