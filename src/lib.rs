// Spontime - client for the Spontime plans API
// Library exports

pub mod actions; // Login, dashboard and plan flows
pub mod api; // Typed REST client
pub mod config;
pub mod errors;
pub mod notify;
pub mod session; // Auth token state and persistence
pub mod task; // Cancellable action handles
