//! BDD scenarios for reverse DNS on flexible IPs.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ReverseDnsContext, reverse_dns_context};

#[scenario(
    path = "tests/features/reverse_dns.feature",
    name = "Reverse is set once the name propagates"
)]
fn scenario_reverse_set_after_propagation(reverse_dns_context: ReverseDnsContext) {
    let _ = reverse_dns_context;
}

#[scenario(
    path = "tests/features/reverse_dns.feature",
    name = "Reverse that never resolves to the IP is rejected"
)]
fn scenario_reverse_rejected(reverse_dns_context: ReverseDnsContext) {
    let _ = reverse_dns_context;
}

#[scenario(path = "tests/features/reverse_dns.feature", name = "Clearing a reverse")]
fn scenario_reverse_cleared(reverse_dns_context: ReverseDnsContext) {
    let _ = reverse_dns_context;
}
