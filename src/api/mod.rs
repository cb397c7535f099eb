// Spontime API client module
// Typed access to the auth, plans, users and messages endpoints

mod client;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    AuthResponse, CreatePlanRequest, ErrorResponse, LoginRequest, LogoutResponse, Message,
    PagedList, Plan, RegisterRequest, User, Visibility,
};
