/// Object storage configuration
use crate::error::S3Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL objects are publicly served from (CDN or bucket website)
    pub public_base_url: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2)
    pub endpoint: Option<String>,
    /// Whether to use path-style addressing
    pub path_style: bool,
}

impl S3Config {
    /// Load from `S3_BUCKET`, `S3_REGION` (or `AWS_REGION`), `S3_PUBLIC_BASE_URL`,
    /// `S3_ENDPOINT` and `S3_PATH_STYLE`
    pub fn from_env() -> Result<Self, S3Error> {
        let bucket = non_empty("S3_BUCKET").ok_or(S3Error::MissingConfig("S3_BUCKET"))?;
        let region = non_empty("S3_REGION")
            .or_else(|| non_empty("AWS_REGION"))
            .unwrap_or_else(|| "us-east-1".to_string());
        let endpoint = non_empty("S3_ENDPOINT");
        let path_style = non_empty("S3_PATH_STYLE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(endpoint.is_some());
        let public_base_url = non_empty("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("https://{}.s3.{}.amazonaws.com", bucket, region));

        Ok(Self {
            bucket,
            region,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            endpoint,
            path_style,
        })
    }

    /// Public URL for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
