//! Binary entry point for the scw-converge CLI.

mod cli;

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use scw_converge::config::ConfigError;
use scw_converge::pool::{self, PoolError};
use scw_converge::reverse_dns::{self, ReverseDnsError, SystemResolver};
use scw_converge::{
    LocalityError, Poller, RegionalId, ScalewayApiError, ScalewayClient, ScalewayConfig, ZonedId,
};

use cli::{Cli, DnsCheckCommand, PoolCommand, ReverseDnsCommand};

const TIMEOUT_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid identifier: {0}")]
    Locality(#[from] LocalityError),
    #[error(transparent)]
    ReverseDns(#[from] ReverseDnsError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("cannot initialise the scaleway client: {0}")]
    Client(#[from] ScalewayApiError),
    #[error("ip {0} not found")]
    IpNotFound(ZonedId),
    #[error("pool {0} not found")]
    PoolNotFound(RegionalId),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        let timed_out = match self {
            Self::ReverseDns(err) => err.is_timeout(),
            Self::Pool(err) => err.is_timeout(),
            _ => false,
        };
        if timed_out { TIMEOUT_EXIT_CODE } else { 1 }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = scw_converge::logging::init() {
        writeln!(io::stderr(), "logging disabled: {err}").ok();
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let exit_code = match dispatch(cli, cancel).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        debug!("interrupt received, cancelling wait");
        cancel.cancel();
    }
}

async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), CliError> {
    let config = ScalewayConfig::load_without_cli_args()?;
    config.validate()?;
    match cli {
        Cli::DnsCheck(command) => dns_check(&config, command, cancel).await,
        Cli::ReverseDns(command) => {
            config.validate_credentials()?;
            reverse_dns_command(&config, command, cancel).await
        }
        Cli::Pool(command) => {
            config.validate_credentials()?;
            pool_command(&config, command, cancel).await
        }
    }
}

fn bounded(poller: Poller, timeout: Option<u64>, cancel: CancellationToken) -> Poller {
    let limited = match timeout {
        Some(secs) => poller.with_max_wait(Duration::from_secs(secs)),
        None => poller,
    };
    limited.with_cancellation(cancel)
}

async fn dns_check(
    config: &ScalewayConfig,
    command: DnsCheckCommand,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let poller = bounded(config.reverse_dns_poller(), command.timeout, cancel);
    let resolved =
        reverse_dns::check_reverse(&SystemResolver, &poller, &command.name, command.address)
            .await?;
    writeln!(io::stdout(), "{resolved}")?;
    Ok(())
}

async fn reverse_dns_command(
    config: &ScalewayConfig,
    command: ReverseDnsCommand,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let client = ScalewayClient::from_config(config)?;
    let default_zone = config.zone();
    match command {
        ReverseDnsCommand::Set {
            ip,
            reverse,
            timeout,
        } => {
            let id = ZonedId::parse(&ip, &default_zone)?;
            let poller = bounded(config.reverse_dns_poller(), timeout, cancel);
            let record = reverse_dns::create(
                &client,
                &SystemResolver,
                &poller,
                &id.zone,
                &id.id,
                Some(&reverse),
            )
            .await?;
            writeln!(io::stdout(), "{record}")?;
        }
        ReverseDnsCommand::Show { ip } => {
            let id = ZonedId::parse(&ip, &default_zone)?;
            let record = reverse_dns::read(&client, &id)
                .await?
                .ok_or(CliError::IpNotFound(id))?;
            writeln!(io::stdout(), "{record}")?;
        }
        ReverseDnsCommand::Unset { ip } => {
            let id = ZonedId::parse(&ip, &default_zone)?;
            reverse_dns::delete(&client, &id).await?;
            writeln!(io::stdout(), "{id} reverse cleared")?;
        }
    }
    Ok(())
}

async fn pool_command(
    config: &ScalewayConfig,
    command: PoolCommand,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let client = ScalewayClient::from_config(config)?;
    let default_region = config.region();
    match command {
        PoolCommand::Wait { pool: raw, timeout } => {
            let id = RegionalId::parse(&raw, &default_region)?;
            if pool::read_pool(&client, &id).await?.is_none() {
                return Err(CliError::PoolNotFound(id));
            }
            let poller = bounded(config.pool_poller(), timeout, cancel);
            let snapshot = pool::wait_for_pool_ready(&client, &id, &poller).await?;
            writeln!(io::stdout(), "{snapshot}")?;
        }
        PoolCommand::Resize {
            pool: raw,
            size,
            no_wait,
            timeout,
        } => {
            let id = RegionalId::parse(&raw, &default_region)?;
            let poller = bounded(config.pool_poller(), timeout, cancel);
            let wait = (!no_wait).then_some(&poller);
            let snapshot = pool::resize_pool(&client, &id, size, wait).await?;
            writeln!(io::stdout(), "{snapshot}")?;
        }
        PoolCommand::Delete {
            pool: raw,
            no_wait,
            timeout,
        } => {
            let id = RegionalId::parse(&raw, &default_region)?;
            let poller = bounded(config.pool_poller(), timeout, cancel);
            pool::delete_pool(&client, &id, (!no_wait).then_some(&poller)).await?;
            let outcome = if no_wait { "deletion requested" } else { "deleted" };
            writeln!(io::stdout(), "pool {id} {outcome}")?;
        }
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use scw_converge::ConvergeError;

    fn timeout() -> ConvergeError {
        ConvergeError::Timeout {
            condition: String::from("pool fr-par/p1 and its nodes ready"),
            waited: Duration::from_secs(30),
            attempts: 6,
            last_observed: String::from("pool fr-par/p1 scaling"),
        }
    }

    #[test]
    fn timeouts_exit_with_two() {
        let err = CliError::Pool(PoolError::Wait(timeout()));
        assert_eq!(err.exit_code(), TIMEOUT_EXIT_CODE);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let api = CliError::Pool(PoolError::Api(ScalewayApiError::Http {
            status: 400,
            message: String::from("bad request"),
        }));
        let cancelled = CliError::Pool(PoolError::Wait(ConvergeError::Cancelled {
            condition: String::from("pool fr-par/p1 deleted"),
        }));
        assert_eq!(api.exit_code(), 1);
        assert_eq!(cancelled.exit_code(), 1);
    }

    #[test]
    fn timeout_override_keeps_interval() {
        let poller = bounded(
            Poller::new(Duration::from_secs(600), Duration::from_secs(5)),
            Some(12),
            CancellationToken::new(),
        );
        assert_eq!(poller.max_wait(), Duration::from_secs(12));
        assert_eq!(
            poller.interval(),
            scw_converge::Interval::Fixed(Duration::from_secs(5))
        );
    }

    #[test]
    fn write_error_renders_message() {
        let mut buf = Vec::new();
        write_error(&mut buf, &CliError::Pool(PoolError::Wait(timeout())));
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("did not converge within 30s (6 attempts)"),
            "rendered: {rendered}"
        );
    }
}
