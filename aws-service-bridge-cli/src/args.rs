//! Command line arguments and their mapping onto the bridge configuration

use std::path::PathBuf;
use std::time::Duration;

use aws_service_bridge_core::config::{waiter_config, DEFAULT_MQTT_PORT};
use aws_service_bridge_core::{
    AthenaSettings, AwsSettings, BridgeConfig, IotSettings, WaiterConfig,
};
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "aws-service-bridge",
    version,
    about = "Run Athena queries and exchange IoT Core messages",
    propagate_version = true
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub aws: AwsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a SQL query on Athena and print the result set as JSON
    Query {
        /// SQL text; read from stdin when omitted
        sql: Option<String>,

        #[command(flatten)]
        athena: AthenaArgs,

        #[command(flatten)]
        waiter: WaiterArgs,
    },

    /// Publish a message to an IoT Core topic
    Publish {
        /// Topic to publish to; wildcards are not allowed
        #[arg(long)]
        topic: String,

        /// MQTT QoS level
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
        qos: u8,

        /// Message payload
        payload: String,

        #[command(flatten)]
        iot: IotArgs,
    },

    /// Subscribe to IoT Core topics and log received messages until interrupted
    Listen {
        /// Topic filter to subscribe to, repeatable; defaults to the vehicle state route
        #[arg(long = "filter")]
        filters: Vec<String>,

        #[command(flatten)]
        iot: IotArgs,

        #[command(flatten)]
        mqtt: MqttArgs,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        #[command(flatten)]
        athena: AthenaArgs,

        #[command(flatten)]
        waiter: WaiterArgs,

        #[command(flatten)]
        iot: IotArgs,
    },
}

#[derive(Debug, Args)]
pub struct AwsArgs {
    /// AWS region; the default provider chain decides when unset
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, global = true)]
    pub access_key_id: Option<String>,

    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        global = true
    )]
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct AthenaArgs {
    /// Athena database queries run against
    #[arg(long, env = "ATHENA_DATABASE")]
    pub database: Option<String>,

    /// S3 URI for query results
    #[arg(long, env = "ATHENA_OUTPUT_LOCATION")]
    pub output_location: Option<String>,

    #[arg(long, env = "ATHENA_WORKGROUP")]
    pub workgroup: Option<String>,
}

#[derive(Debug, Args)]
pub struct WaiterArgs {
    /// Pause before each status check, in milliseconds
    #[arg(long, env = "BRIDGE_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Give up after this many status checks
    #[arg(long, env = "BRIDGE_MAX_POLLS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_polls: Option<u32>,

    /// Give up after this many seconds
    #[arg(long, env = "BRIDGE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct IotArgs {
    /// Account-specific IoT Core data endpoint
    #[arg(long = "iot-endpoint", env = "IOT_ENDPOINT")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Args)]
pub struct MqttArgs {
    #[arg(long, env = "IOT_CLIENT_ID", default_value = "aws-service-bridge")]
    pub client_id: String,

    #[arg(long = "mqtt-port", default_value_t = DEFAULT_MQTT_PORT)]
    pub port: u16,

    /// Root CA bundle
    #[arg(long, env = "IOT_CA_PATH")]
    pub ca_path: Option<PathBuf>,

    /// Device certificate
    #[arg(long, env = "IOT_CERT_PATH")]
    pub cert_path: Option<PathBuf>,

    /// Device private key
    #[arg(long, env = "IOT_KEY_PATH")]
    pub key_path: Option<PathBuf>,

    /// Seconds to wait before retrying after a connection error
    #[arg(long, default_value_t = 5)]
    pub reconnect_delay_secs: u64,
}

impl AwsArgs {
    pub fn settings(&self) -> AwsSettings {
        AwsSettings {
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
        }
    }
}

impl AthenaArgs {
    /// `None` when neither the database nor the output location is given
    pub fn settings(&self) -> anyhow::Result<Option<AthenaSettings>> {
        match (&self.database, &self.output_location) {
            (None, None) => Ok(None),
            (Some(database), Some(output_location)) => Ok(Some(AthenaSettings::new(
                database.clone(),
                output_location.clone(),
                self.workgroup.clone(),
            )?)),
            _ => anyhow::bail!(
                "Both --database (ATHENA_DATABASE) and --output-location (ATHENA_OUTPUT_LOCATION) are required"
            ),
        }
    }
}

impl WaiterArgs {
    pub fn config(&self) -> WaiterConfig {
        waiter_config(self.poll_interval_ms, self.max_polls, self.timeout_secs)
    }
}

impl IotArgs {
    pub fn settings(&self) -> IotSettings {
        IotSettings {
            endpoint: self.endpoint.clone(),
            ..IotSettings::default()
        }
    }
}

impl MqttArgs {
    pub fn apply(&self, settings: IotSettings) -> IotSettings {
        IotSettings {
            client_id: self.client_id.clone(),
            port: self.port,
            ca_path: self.ca_path.clone(),
            cert_path: self.cert_path.clone(),
            key_path: self.key_path.clone(),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            ..settings
        }
    }
}

/// Assemble the bridge configuration from the parts a subcommand accepts
pub fn bridge_config(
    aws: &AwsArgs,
    athena: Option<&AthenaArgs>,
    waiter: Option<&WaiterArgs>,
    iot: IotSettings,
) -> anyhow::Result<BridgeConfig> {
    Ok(BridgeConfig {
        aws: aws.settings(),
        athena: athena.map(AthenaArgs::settings).transpose()?.flatten(),
        iot,
        waiter: waiter.map(WaiterArgs::config).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["aws-service-bridge", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_zero_max_polls_is_rejected() {
        let err = Cli::try_parse_from([
            "aws-service-bridge",
            "query",
            "--max-polls",
            "0",
            "SELECT 1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_partial_athena_settings_are_rejected() {
        let args = AthenaArgs {
            database: Some("analytics".to_string()),
            output_location: None,
            workgroup: None,
        };
        assert!(args.settings().is_err());
    }

    #[test]
    fn test_mqtt_args_override_iot_settings() {
        let mqtt = MqttArgs {
            client_id: "truck-7".to_string(),
            port: 443,
            ca_path: Some("ca.pem".into()),
            cert_path: None,
            key_path: None,
            reconnect_delay_secs: 1,
        };
        let iot = IotArgs {
            endpoint: Some("example-ats.iot.eu-west-1.amazonaws.com".into()),
        };
        let settings = mqtt.apply(iot.settings());
        assert_eq!(settings.client_id, "truck-7");
        assert_eq!(settings.port, 443);
        assert_eq!(settings.reconnect_delay, Duration::from_secs(1));
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("example-ats.iot.eu-west-1.amazonaws.com")
        );
    }
}
