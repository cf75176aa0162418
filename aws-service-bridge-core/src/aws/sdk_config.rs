//! Loading the shared AWS SDK configuration

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use log::debug;

use crate::aws::{AwsError, AwsResult};
use crate::config::AwsSettings;

/// Build the SDK configuration shared by every client.
///
/// The region and static keys are applied when configured; otherwise the
/// standard provider chain (environment, profile, IMDS, ...) is used.
pub async fn load_sdk_config(settings: &AwsSettings) -> AwsResult<SdkConfig> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &settings.region {
        debug!("Using configured AWS region: {}", region);
        loader = loader.region(Region::new(region.clone()));
    }

    match (&settings.access_key_id, &settings.secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            debug!("Using static AWS credentials from configuration");
            loader = loader.credentials_provider(Credentials::from_keys(
                access_key_id,
                secret_access_key,
                None,
            ));
        }
        (None, None) => {}
        _ => {
            return Err(AwsError::ConfigError(
                "Both the access key id and the secret access key must be set".to_string(),
            ))
        }
    }

    Ok(loader.load().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_static_credentials_are_rejected() {
        let settings = AwsSettings {
            region: Some("us-east-1".to_string()),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: None,
        };

        let result = load_sdk_config(&settings).await;
        assert!(matches!(result, Err(AwsError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_region_override_is_applied() {
        let settings = AwsSettings {
            region: Some("eu-west-1".to_string()),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
        };

        let config = load_sdk_config(&settings).await.unwrap();
        assert_eq!(
            config.region().map(ToString::to_string),
            Some("eu-west-1".to_string())
        );
        assert!(config.credentials_provider().is_some());
    }
}
