//! Configuration for the AWS clients, the Athena backend, IoT messaging and the waiter.
//!
//! Values are supplied by the front ends (command-line flags with environment
//! fallbacks); this module only holds and validates them.

use std::path::PathBuf;
use std::time::Duration;

use aws_service_bridge_waiter::WaiterConfig;

use crate::aws::{AwsError, AwsResult};

/// Default MQTT/TLS port of AWS IoT Core
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// AWS IoT Core requires this ALPN protocol for MQTT over port 443
pub(crate) const IOT_MQTT_ALPN: &str = "x-amzn-mqtt-ca";

/// Region and optional static credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Where Athena queries run and where their results are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthenaSettings {
    pub database: String,
    /// S3 URI for query results, e.g. `s3://bucket/prefix/`
    pub output_location: String,
    pub workgroup: Option<String>,
}

impl AthenaSettings {
    pub fn new(
        database: impl Into<String>,
        output_location: impl Into<String>,
        workgroup: Option<String>,
    ) -> AwsResult<Self> {
        let settings = Self {
            database: database.into(),
            output_location: output_location.into(),
            workgroup: workgroup.filter(|w| !w.trim().is_empty()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> AwsResult<()> {
        if self.database.trim().is_empty() {
            return Err(AwsError::ConfigError(
                "Athena database must not be empty".to_string(),
            ));
        }
        if !self.output_location.starts_with("s3://") {
            return Err(AwsError::ConfigError(format!(
                "Athena output location must be an s3:// URI, got '{}'",
                self.output_location
            )));
        }
        Ok(())
    }
}

/// IoT Core endpoint and MQTT client identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IotSettings {
    /// Account-specific data endpoint, e.g. `xxxx-ats.iot.us-east-1.amazonaws.com`
    pub endpoint: Option<String>,
    pub client_id: String,
    pub port: u16,
    pub ca_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub keep_alive: Duration,
    /// Pause before the listener polls again after a connection error
    pub reconnect_delay: Duration,
}

impl Default for IotSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            client_id: "aws-service-bridge".to_string(),
            port: DEFAULT_MQTT_PORT,
            ca_path: None,
            cert_path: None,
            key_path: None,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl IotSettings {
    /// MQTT broker host: the endpoint without scheme, path or port
    pub fn mqtt_host(&self) -> AwsResult<String> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            AwsError::ConfigError("IoT endpoint is required for MQTT subscriptions".to_string())
        })?;
        let trimmed = endpoint.trim();
        let host = trimmed
            .split_once("://")
            .map_or(trimmed, |(_, rest)| rest)
            .split(['/', ':'])
            .next()
            .unwrap_or_default();
        if host.is_empty() {
            return Err(AwsError::ConfigError(format!(
                "Invalid IoT endpoint '{}'",
                endpoint
            )));
        }
        Ok(host.to_string())
    }

    /// Paths of the CA bundle, device certificate and private key
    pub fn tls_paths(&self) -> AwsResult<(PathBuf, PathBuf, PathBuf)> {
        match (&self.ca_path, &self.cert_path, &self.key_path) {
            (Some(ca), Some(cert), Some(key)) => Ok((ca.clone(), cert.clone(), key.clone())),
            _ => Err(AwsError::ConfigError(
                "IoT MQTT connections need a CA path, a certificate path and a key path"
                    .to_string(),
            )),
        }
    }
}

/// Everything the services need, assembled by a front end
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub aws: AwsSettings,
    /// `None` disables query execution
    pub athena: Option<AthenaSettings>,
    pub iot: IotSettings,
    pub waiter: WaiterConfig,
}

/// Build the waiter settings from front-end values
pub fn waiter_config(
    poll_interval_ms: u64,
    max_polls: Option<u32>,
    timeout_secs: Option<u64>,
) -> WaiterConfig {
    let mut config =
        WaiterConfig::default().with_poll_interval(Duration::from_millis(poll_interval_ms));
    if let Some(max_polls) = max_polls {
        config = config.with_max_polls(max_polls);
    }
    if let Some(timeout_secs) = timeout_secs {
        config = config.with_timeout(Duration::from_secs(timeout_secs));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_athena_settings_validation() {
        assert!(AthenaSettings::new("analytics", "s3://results/athena/", None).is_ok());
        assert!(matches!(
            AthenaSettings::new("", "s3://results/", None),
            Err(AwsError::ConfigError(_))
        ));
        assert!(matches!(
            AthenaSettings::new("analytics", "/tmp/results", None),
            Err(AwsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_blank_workgroup_is_dropped() {
        let settings =
            AthenaSettings::new("analytics", "s3://results/", Some("  ".to_string())).unwrap();
        assert_eq!(settings.workgroup, None);
    }

    #[rstest]
    #[case(
        "a1-ats.iot.us-east-1.amazonaws.com",
        "a1-ats.iot.us-east-1.amazonaws.com"
    )]
    #[case(
        "https://a1-ats.iot.us-east-1.amazonaws.com/",
        "a1-ats.iot.us-east-1.amazonaws.com"
    )]
    #[case("mqtts://broker.local:8883", "broker.local")]
    #[case("http://localhost:4566", "localhost")]
    #[case("mqtt://broker.local", "broker.local")]
    #[case("broker.local:1883", "broker.local")]
    fn test_mqtt_host(#[case] endpoint: &str, #[case] expected: &str) {
        let settings = IotSettings {
            endpoint: Some(endpoint.to_string()),
            ..IotSettings::default()
        };
        assert_eq!(settings.mqtt_host().unwrap(), expected);
    }

    #[test]
    fn test_mqtt_host_requires_endpoint() {
        assert!(IotSettings::default().mqtt_host().is_err());
    }

    #[test]
    fn test_tls_paths_require_all_three() {
        let settings = IotSettings {
            ca_path: Some("ca.pem".into()),
            cert_path: Some("cert.pem".into()),
            ..IotSettings::default()
        };
        assert!(settings.tls_paths().is_err());
    }

    #[test]
    fn test_waiter_config_from_front_end_values() {
        let config = waiter_config(250, Some(10), Some(60));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_polls, Some(10));
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));

        let unbounded = waiter_config(1000, None, None);
        assert_eq!(unbounded.max_polls, None);
        assert_eq!(unbounded.timeout, None);
    }
}
