pub mod shortener {
    pub mod v1 {
        tonic::include_proto!("shortener.v1");
    }
}

pub mod v1 {
    pub use crate::shortener::v1::*;

    use shrinkray_core::{Shortened, UrlRecord};

    impl From<Shortened> for CreateShortUrlResponse {
        fn from(value: Shortened) -> Self {
            Self {
                token: value.token.into_string(),
                created: value.created,
            }
        }
    }

    impl From<UrlRecord> for GetFullUrlResponse {
        fn from(value: UrlRecord) -> Self {
            Self {
                full_url: value.full_url,
                created_at: Some(prost_types::Timestamp {
                    seconds: value.created_at.as_second(),
                    nanos: value.created_at.subsec_nanosecond(),
                }),
            }
        }
    }
}
