//! The shortening protocol.
//!
//! [`ShortenerService`] implements [`shrinkray_core::Shortener`] on top of any
//! [`shrinkray_core::Storage`] and [`shrinkray_generator::Generator`]: it
//! validates input, reuses the token of an already shortened URL, retries
//! on token collisions and bounds every operation with a deadline.

pub mod config;
pub mod service;
pub mod shutdown;
pub mod url;

pub use config::ShortenerConfig;
pub use service::ShortenerService;
pub use shutdown::shutdown_signal;
