//! HTTP transport for the shortener.
//!
//! `POST /create` takes a raw URL as the request body and answers with the
//! token, `GET /{token}` redirects to the stored URL.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
