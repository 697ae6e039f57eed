use super::{S3Config, Storage};
use crate::error::{BackupError, Result};
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::primitives::ByteStream;
use tracing::{debug, info};

/// S3-compatible object storage. Locations are `s3://<bucket>/<key>` URIs.
pub struct S3Storage {
    client: s3::Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(s3::config::Credentials::new(
                key_id, secret, None, None, "Static",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

fn bucket_uri(bucket: &str, prefix: &str) -> String {
    let prefix = prefix.trim().trim_matches('/');
    if prefix.is_empty() {
        format!("s3://{}", bucket)
    } else {
        format!("s3://{}/{}", bucket, prefix)
    }
}

fn object_key(bucket: &str, full_path: &str) -> Result<String> {
    let bucket_root = format!("s3://{}/", bucket);
    full_path
        .strip_prefix(&bucket_root)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            BackupError::Storage(format!(
                "{} is not an object location in bucket {}",
                full_path, bucket
            ))
        })
}

#[async_trait]
impl Storage for S3Storage {
    fn backup_path(&self, path: &str) -> Result<String> {
        Ok(bucket_uri(&self.bucket, path))
    }

    async fn write_backup(&self, data: &[u8], full_path: &str) -> Result<()> {
        let key = object_key(&self.bucket, full_path)?;
        debug!("Uploading {} bytes to bucket {} with key {}", data.len(), self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| {
                BackupError::Storage(format!(
                    "failed to upload to bucket {} with key {}: {}",
                    self.bucket, key, e
                ))
            })?;

        info!("Uploaded {} to bucket {}", key, self.bucket);
        Ok(())
    }

    async fn remove_backup(&self, full_path: &str) -> Result<()> {
        let key = object_key(&self.bucket, full_path)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                BackupError::Storage(format!(
                    "failed to delete key {} from bucket {}: {}",
                    key, self.bucket, e
                ))
            })?;
        debug!("Deleted {} from bucket {}", key, self.bucket);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_uri() {
        assert_eq!(bucket_uri("backups", ""), "s3://backups");
        assert_eq!(bucket_uri("backups", "/nightly/pg/"), "s3://backups/nightly/pg");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key("backups", "s3://backups/nightly/app.sql").unwrap(),
            "nightly/app.sql"
        );
        assert!(object_key("backups", "s3://other/app.sql").is_err());
        assert!(object_key("backups", "/var/backups/app.sql").is_err());
        assert!(object_key("backups", "s3://backups/").is_err());
    }
}
