//! Command-line interface definitions for the `scw-converge` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use std::net::IpAddr;

use clap::{Parser, Subcommand};

/// Top-level CLI for the `scw-converge` binary.
#[derive(Debug, Parser)]
#[command(
    name = "scw-converge",
    about = "Wait for Scaleway reverse DNS and Kapsule pools to converge",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Wait until a DNS name resolves to an address.
    #[command(name = "dns-check")]
    DnsCheck(DnsCheckCommand),
    /// Manage the reverse DNS of a flexible IP.
    #[command(name = "reverse-dns", subcommand)]
    ReverseDns(ReverseDnsCommand),
    /// Wait on, resize, or delete a Kapsule pool.
    #[command(name = "pool", subcommand)]
    Pool(PoolCommand),
}

/// Arguments for `scw-converge dns-check`.
#[derive(Debug, Parser)]
pub(crate) struct DnsCheckCommand {
    /// DNS name that must resolve.
    #[arg(value_name = "NAME")]
    pub(crate) name: String,
    /// Address the name must resolve to.
    #[arg(value_name = "ADDRESS")]
    pub(crate) address: IpAddr,
    /// Seconds to wait before giving up (defaults to `reverse_dns_timeout_secs`).
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout: Option<u64>,
}

/// `scw-converge reverse-dns` subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum ReverseDnsCommand {
    /// Set the reverse of an IP once the name resolves to it.
    Set {
        /// IP identifier, `zone/identifier`, or public address.
        #[arg(value_name = "IP")]
        ip: String,
        /// Reverse DNS name to configure.
        #[arg(value_name = "REVERSE")]
        reverse: String,
        /// Seconds to wait for the name to resolve.
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
    /// Show the reverse currently configured on an IP.
    Show {
        /// IP identifier, `zone/identifier`, or public address.
        #[arg(value_name = "IP")]
        ip: String,
    },
    /// Clear the reverse of an IP.
    Unset {
        /// IP identifier, `zone/identifier`, or public address.
        #[arg(value_name = "IP")]
        ip: String,
    },
}

/// `scw-converge pool` subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum PoolCommand {
    /// Wait until a pool and all of its nodes are ready.
    Wait {
        /// Pool identifier or `region/identifier`.
        #[arg(value_name = "POOL")]
        pool: String,
        /// Seconds to wait (defaults to `pool_timeout_secs`).
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
    /// Change the size of a pool.
    Resize {
        /// Pool identifier or `region/identifier`.
        #[arg(value_name = "POOL")]
        pool: String,
        /// New number of nodes.
        #[arg(value_name = "SIZE")]
        size: u32,
        /// Return as soon as the API accepts the change.
        #[arg(long)]
        no_wait: bool,
        /// Seconds to wait (defaults to `pool_timeout_secs`).
        #[arg(long, value_name = "SECONDS", conflicts_with = "no_wait")]
        timeout: Option<u64>,
    },
    /// Delete a pool.
    Delete {
        /// Pool identifier or `region/identifier`.
        #[arg(value_name = "POOL")]
        pool: String,
        /// Return as soon as the API accepts the deletion.
        #[arg(long)]
        no_wait: bool,
        /// Seconds to wait (defaults to `pool_timeout_secs`).
        #[arg(long, value_name = "SECONDS", conflicts_with = "no_wait")]
        timeout: Option<u64>,
    },
}
