//! aws-service-bridge: run Athena queries, publish to and listen on IoT Core
//! topics, or serve the HTTP API over the same services.

mod args;

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_service_bridge_core::messaging::vehicle_state::default_router;
use aws_service_bridge_core::messaging::{log_received, validate_publish_topic, TopicError};
use aws_service_bridge_core::{
    load_sdk_config, AthenaQueryService, BridgeError, CancellationToken, ErrorKind,
    IotMessagingService, MqttListener, PublishOutcome, Qos, TopicRouter,
};
use aws_service_bridge_server::{shutdown_signal, start_server, AppState};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};

use crate::args::{bridge_config, Cli, Commands};

/// Exit code for a rejected input or an operation that did not succeed
const EXIT_INVALID: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 2 for invalid input and for queries that failed, were cancelled or timed out; 1 otherwise
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BridgeError>().map(BridgeError::kind) {
        Some(
            ErrorKind::InvalidInput
            | ErrorKind::OperationFailed
            | ErrorKind::Cancelled
            | ErrorKind::TimedOut,
        ) => EXIT_INVALID,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Query {
            sql,
            athena,
            waiter,
        } => {
            let sql = read_sql(sql)?;
            let config = bridge_config(&cli.aws, Some(&athena), Some(&waiter), Default::default())?;
            let service = AthenaQueryService::from_config(&config).await?;

            let cancellation = cancel_on_signal();
            let result = service
                .execute_query_with_cancel(&sql, cancellation)
                .await?;
            info!("Query returned {} row(s)", result.row_count());
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(0)
        }

        Commands::Publish {
            topic,
            qos,
            payload,
            iot,
        } => {
            validate_publish_topic(&topic).map_err(BridgeError::from)?;
            let qos = Qos::try_from(qos).map_err(BridgeError::invalid_input)?;

            let config = bridge_config(&cli.aws, None, None, iot.settings())?;
            let service = IotMessagingService::from_config(&config).await?;

            let outcome = service.publish(&topic, payload, Some(qos)).await?;
            println!("{}", serde_json::to_string(&outcome)?);
            Ok(if matches!(outcome, PublishOutcome::Ack) {
                0
            } else {
                1
            })
        }

        Commands::Listen { filters, iot, mqtt } => {
            let router = if filters.is_empty() {
                default_router()
            } else {
                filters
                    .iter()
                    .try_fold(TopicRouter::new(), |mut router, filter| {
                        router.register(filter, Qos::AtMostOnce, log_received)?;
                        Ok::<_, TopicError>(router)
                    })
            }
            .map_err(BridgeError::from)?;

            let settings = mqtt.apply(iot.settings());
            let listener = MqttListener::new(settings, router);
            listener.run(cancel_on_signal()).await?;
            Ok(0)
        }

        Commands::Serve {
            host,
            port,
            athena,
            waiter,
            iot,
        } => {
            let config = bridge_config(&cli.aws, Some(&athena), Some(&waiter), iot.settings())?;
            let sdk_config = load_sdk_config(&config.aws).await?;

            let mut state = AppState::new().with_messaging(Arc::new(
                IotMessagingService::from_sdk_config(&sdk_config, &config),
            ));
            if config.athena.is_some() {
                state = state.with_query_runner(Arc::new(AthenaQueryService::from_sdk_config(
                    &sdk_config,
                    &config,
                )?));
            } else {
                info!("Athena is not configured; POST /query will answer 503");
            }

            start_server(&host, port, state, cancel_on_signal())
                .await
                .context("Failed to run the HTTP API")?;
            Ok(0)
        }
    }
}

/// SQL from the argument, or from stdin when none was given
fn read_sql(sql: Option<String>) -> Result<String> {
    let sql = match sql {
        Some(sql) => sql,
        None if atty::is(atty::Stream::Stdin) => {
            return Err(BridgeError::invalid_input("No SQL given as argument or on stdin").into())
        }
        None => {
            debug!("Reading SQL from stdin");
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(BridgeError::from)?;
            buffer
        }
    };

    if sql.trim().is_empty() {
        return Err(BridgeError::invalid_input("Query must not be empty").into());
    }
    Ok(sql)
}

/// Token cancelled by Ctrl-C or SIGTERM
fn cancel_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, cancelling");
        cancel.cancel();
    });
    token
}
