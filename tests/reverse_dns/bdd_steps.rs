//! BDD step definitions for reverse DNS behaviour.

use std::net::IpAddr;

use rstest_bdd_macros::{given, then, when};
use scw_converge::reverse_dns::{self, ReverseDnsRecord};
use scw_converge::{Zone, ZonedId};

use super::test_helpers::{ReverseDnsContext, ReverseOutcome, paused_runtime, poller};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn parse_address(raw: &str) -> IpAddr {
    raw.trim()
        .parse()
        .unwrap_or_else(|err| panic!("invalid address {raw}: {err}"))
}

fn zoned(ip: &str) -> ZonedId {
    ZonedId::new(Zone::new("fr-par-1"), ip.trim())
}

fn record_outcome(
    context: &ReverseDnsContext,
    result: Result<ReverseDnsRecord, reverse_dns::ReverseDnsError>,
) {
    let outcome = match result {
        Ok(_) => ReverseOutcome::Success,
        Err(err) => ReverseOutcome::Failure(err.to_string()),
    };
    context.outcome.replace(Some(outcome));
}

#[given("a flexible IP \"{ip}\" with address \"{address}\"")]
fn flexible_ip(
    reverse_dns_context: ReverseDnsContext,
    ip: String,
    address: String,
) -> ReverseDnsContext {
    reverse_dns_context
        .api
        .insert_ip(ip.trim(), parse_address(&address));
    reverse_dns_context
}

#[given("\"{name}\" resolves to \"{address}\" on lookup {lookup:u32}")]
fn name_resolves(
    reverse_dns_context: ReverseDnsContext,
    name: String,
    address: String,
    lookup: u32,
) -> ReverseDnsContext {
    for _ in 1..lookup {
        reverse_dns_context
            .resolver
            .push_failure(name.trim(), "nxdomain");
    }
    reverse_dns_context
        .resolver
        .push_addresses(name.trim(), &[parse_address(&address)]);
    reverse_dns_context
}

#[when("I set the reverse of \"{ip}\" to \"{reverse}\"")]
fn set_reverse(
    reverse_dns_context: ReverseDnsContext,
    ip: String,
    reverse: String,
) -> ReverseDnsContext {
    let result = paused_runtime().block_on(reverse_dns::create(
        reverse_dns_context.api.as_ref(),
        reverse_dns_context.resolver.as_ref(),
        &poller(),
        &Zone::new("fr-par-1"),
        ip.trim(),
        Some(reverse.trim()),
    ));
    record_outcome(&reverse_dns_context, result);
    reverse_dns_context
}

#[when("I clear the reverse of \"{ip}\"")]
fn clear_reverse(reverse_dns_context: ReverseDnsContext, ip: String) -> ReverseDnsContext {
    let result = paused_runtime().block_on(reverse_dns::update(
        reverse_dns_context.api.as_ref(),
        reverse_dns_context.resolver.as_ref(),
        &poller(),
        &zoned(&ip),
        None,
    ));
    record_outcome(&reverse_dns_context, result);
    reverse_dns_context
}

#[then("the reverse of \"{ip}\" is \"{reverse}\"")]
fn reverse_is(
    reverse_dns_context: &ReverseDnsContext,
    ip: String,
    reverse: String,
) -> Result<(), StepError> {
    let actual = reverse_dns_context.api.reverse_of(ip.trim());
    if actual.as_deref() == Some(reverse.trim()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected reverse {reverse}, got {actual:?} (outcome {:?})",
            reverse_dns_context.outcome.borrow()
        )))
    }
}

#[then("the IP \"{ip}\" has no reverse")]
fn has_no_reverse(reverse_dns_context: &ReverseDnsContext, ip: String) -> Result<(), StepError> {
    match reverse_dns_context.api.reverse_of(ip.trim()) {
        None => Ok(()),
        Some(reverse) => Err(StepError::Assertion(format!(
            "expected no reverse, got {reverse}"
        ))),
    }
}

#[then("the resolver was queried {count:u32} times")]
fn resolver_queried(reverse_dns_context: &ReverseDnsContext, count: u32) -> Result<(), StepError> {
    let lookups = reverse_dns_context.resolver.lookups();
    if lookups == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} lookups, got {lookups}"
        )))
    }
}

#[then("the operation fails mentioning \"{needle}\"")]
fn fails_mentioning(reverse_dns_context: &ReverseDnsContext, needle: String) -> Result<(), StepError> {
    match reverse_dns_context.outcome.borrow().as_ref() {
        Some(ReverseOutcome::Failure(message)) if message.contains(needle.trim()) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure mentioning {needle}, got {other:?}"
        ))),
    }
}

#[then("no reverse update was sent")]
fn no_update_sent(reverse_dns_context: &ReverseDnsContext) -> Result<(), StepError> {
    let updates = reverse_dns_context.api.reverse_updates();
    if updates.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no updates, got {updates:?}"
        )))
    }
}
