//! Typed backend configuration with fail-fast validation.
//!
//! Each backend gets an explicit struct with named fields and a validating
//! constructor. Validation collects *all* missing fields before failing, so
//! an operator fixes the configuration in one round trip instead of
//! discovering gaps one at a time.

use crate::error::ConfigError;

/// Credentials and location for an S3-compatible backend.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Bucket name (any `s3://` scheme and trailing path are stripped).
    pub bucket: String,
    /// Region name.
    pub region: String,
}

impl S3Config {
    /// Validates the given fields, collecting every missing one.
    ///
    /// Bucket values are normalized: a full `s3://bucket/path` URI is
    /// reduced to the bare bucket name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] listing every absent field.
    pub fn new(
        access_key: Option<String>,
        secret_key: Option<String>,
        bucket: Option<String>,
        region: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        require(&access_key, "access_key", &mut missing);
        require(&secret_key, "secret_key", &mut missing);
        require(&bucket, "bucket", &mut missing);
        require(&region, "region", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingFields { fields: missing });
        }

        Ok(Self {
            access_key: access_key.unwrap_or_default(),
            secret_key: secret_key.unwrap_or_default(),
            bucket: normalize_bucket(&bucket.unwrap_or_default()),
            region: region.unwrap_or_default(),
        })
    }

    /// Reads the configuration from `LAKESYNC_S3_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] listing every unset variable's
    /// field.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            env_var("LAKESYNC_S3_ACCESS_KEY"),
            env_var("LAKESYNC_S3_SECRET_KEY"),
            env_var("LAKESYNC_S3_BUCKET"),
            env_var("LAKESYNC_S3_REGION"),
        )
    }
}

/// Credentials and location for an Azure Blob Storage backend.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// Storage account name.
    pub account_name: String,
    /// Shared account key.
    pub account_key: String,
    /// Container name.
    pub container: String,
}

impl AzureConfig {
    /// Validates the given fields, collecting every missing one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] listing every absent field.
    pub fn new(
        account_name: Option<String>,
        account_key: Option<String>,
        container: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        require(&account_name, "account_name", &mut missing);
        require(&account_key, "account_key", &mut missing);
        require(&container, "container", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingFields { fields: missing });
        }

        Ok(Self {
            account_name: account_name.unwrap_or_default(),
            account_key: account_key.unwrap_or_default(),
            container: container.unwrap_or_default(),
        })
    }

    /// Reads the configuration from `LAKESYNC_AZURE_*` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] listing every unset variable's
    /// field.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            env_var("LAKESYNC_AZURE_ACCOUNT"),
            env_var("LAKESYNC_AZURE_KEY"),
            env_var("LAKESYNC_AZURE_CONTAINER"),
        )
    }
}

/// Records `name` as missing when the value is absent or blank.
fn require(value: &Option<String>, name: &'static str, missing: &mut Vec<&'static str>) {
    if value.as_ref().is_none_or(|v| v.trim().is_empty()) {
        missing.push(name);
    }
}

/// Reads an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Strips an `s3://` scheme and any trailing path from a bucket value.
fn normalize_bucket(bucket: &str) -> String {
    let without_scheme = bucket.strip_prefix("s3://").unwrap_or(bucket);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn s3_config_accepts_complete_fields() {
        let config = S3Config::new(some("ak"), some("sk"), some("data"), some("us-east-1")).unwrap();
        assert_eq!(config.bucket, "data");
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn s3_config_enumerates_all_missing_fields() {
        let err = S3Config::new(None, some("sk"), None, some("us-east-1")).unwrap_err();
        let ConfigError::MissingFields { fields } = err;
        assert_eq!(fields, vec!["access_key", "bucket"]);
    }

    #[test]
    fn s3_config_treats_blank_as_missing() {
        let err = S3Config::new(some("  "), some("sk"), some("data"), some("r")).unwrap_err();
        let ConfigError::MissingFields { fields } = err;
        assert_eq!(fields, vec!["access_key"]);
    }

    #[test]
    fn bucket_uri_is_normalized() {
        let config =
            S3Config::new(some("ak"), some("sk"), some("s3://data/portal/x"), some("r")).unwrap();
        assert_eq!(config.bucket, "data");
    }

    #[test]
    fn azure_config_enumerates_all_missing_fields() {
        let err = AzureConfig::new(None, None, some("container")).unwrap_err();
        let ConfigError::MissingFields { fields } = err;
        assert_eq!(fields, vec!["account_name", "account_key"]);
    }
}
