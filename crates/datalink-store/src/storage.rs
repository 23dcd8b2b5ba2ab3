// Storage operator construction from runtime configuration.
//
// One operator per process, built at startup and passed to the source and
// sink explicitly.

use opendal::{services, Operator};
use tracing::debug;

use datalink_config::{StorageBackend, StorageConfig};

use crate::error::{Result, StoreError};

/// Build an OpenDAL operator for the configured backend.
pub fn build_operator(config: &StorageConfig) -> Result<Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                StoreError::InvalidConfig("fs config required for filesystem backend".to_string())
            })?;

            let builder = services::Fs::default().root(&fs.path);
            Operator::new(builder)?.finish()
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StoreError::InvalidConfig("s3 config required for S3 backend".to_string())
            })?;

            let mut builder = services::S3::default().bucket(&s3.bucket).region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                builder = builder.endpoint(endpoint);
            }

            Operator::new(builder)?.finish()
        }
    };

    debug!(backend = %config.backend, "storage operator initialized");
    Ok(operator)
}
