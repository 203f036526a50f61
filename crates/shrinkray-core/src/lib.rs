//! Core types and traits for the shrinkray URL shortener.
//!
//! This crate provides the vocabulary shared by the shortening protocol,
//! the storage backends and both transports: the [`Token`] type, the
//! [`Storage`] contract and the [`Shortener`] operations.

pub mod error;
pub mod shortener;
pub mod storage;
pub mod token;

pub use error::{ShortenerError, StorageError};
pub use shortener::{Shortened, Shortener};
pub use storage::{Storage, UrlRecord};
pub use token::Token;
