mod health;
mod url;

pub use health::health_handler;
pub use url::{create_handler, method_not_allowed_handler, not_found_handler, redirect_handler};
