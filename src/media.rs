use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;

/// Handle to a stored media object. The core persists these identifiers and
/// treats them as opaque.
#[derive(Debug, Clone)]
pub struct MediaObject {
    pub public_id: String,
    pub secure_url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str)
        -> anyhow::Result<MediaObject>;
    async fn delete(&self, public_id: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl S3MediaStore {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<MediaObject> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;

        Ok(MediaObject {
            public_id: key.to_string(),
            secure_url: format!("{}/{}/{}", self.endpoint, self.bucket, key),
        })
    }

    async fn delete(&self, public_id: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}
