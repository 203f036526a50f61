use crate::error::RpcError;
use shrinkray_core::Shortener;
use shrinkray_proto_schema::v1 as proto;
use shrinkray_proto_schema::v1::shortener_service_server::ShortenerService;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, error, instrument};

/// Exposes a [`Shortener`] as the `shortener.v1.ShortenerService` gRPC API.
#[derive(Clone)]
pub struct ShortenerGrpcServer {
    shortener: Arc<dyn Shortener>,
}

impl ShortenerGrpcServer {
    pub fn new(shortener: impl Shortener) -> Self {
        Self {
            shortener: Arc::new(shortener),
        }
    }
}

fn reject(operation: &'static str, error: RpcError) -> Status {
    let status = Status::from(error);
    if status.code() == tonic::Code::Internal || status.code() == tonic::Code::Unavailable {
        error!(operation, error = %status.message(), "request failed");
    } else {
        debug!(operation, code = ?status.code(), error = %status.message(), "request rejected");
    }
    status
}

#[tonic::async_trait]
impl ShortenerService for ShortenerGrpcServer {
    #[instrument(skip_all, fields(full_url = %request.get_ref().full_url))]
    async fn create_short_url(
        &self,
        request: Request<proto::CreateShortUrlRequest>,
    ) -> Result<Response<proto::CreateShortUrlResponse>, Status> {
        let request = request.into_inner();

        let shortened = self
            .shortener
            .shorten(&request.full_url)
            .await
            .map_err(|e| reject("create_short_url", e.into()))?;

        debug!(token = %shortened.token, created = shortened.created, "short url issued");
        Ok(Response::new(shortened.into()))
    }

    #[instrument(skip_all, fields(token = %request.get_ref().token))]
    async fn get_full_url(
        &self,
        request: Request<proto::GetFullUrlRequest>,
    ) -> Result<Response<proto::GetFullUrlResponse>, Status> {
        let request = request.into_inner();

        let record = self
            .shortener
            .resolve(&request.token)
            .await
            .map_err(|e| reject("get_full_url", e.into()))?;

        debug!(full_url = %record.full_url, "token resolved");
        Ok(Response::new(record.into()))
    }
}
