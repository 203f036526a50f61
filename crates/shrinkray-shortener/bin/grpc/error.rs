use shrinkray_core::{ShortenerError, StorageError};
use thiserror::Error;
use tonic::{Code, Status};

/// A shortener failure on its way out of the gRPC transport.
#[derive(Debug, Error)]
#[error(transparent)]
pub(crate) struct RpcError(#[from] pub(crate) ShortenerError);

impl RpcError {
    pub(crate) fn code(&self) -> Code {
        match &self.0 {
            ShortenerError::InvalidInput(_) => Code::InvalidArgument,
            ShortenerError::NotFound(_) => Code::NotFound,
            ShortenerError::Timeout(_) => Code::DeadlineExceeded,
            ShortenerError::Storage(StorageError::Unavailable(_) | StorageError::Timeout(_)) => {
                Code::Unavailable
            }
            ShortenerError::Storage(_)
            | ShortenerError::TooManyCollisions(_)
            | ShortenerError::Entropy(_) => Code::Internal,
        }
    }
}

impl From<RpcError> for Status {
    fn from(error: RpcError) -> Self {
        Status::new(error.code(), error.to_string())
    }
}
