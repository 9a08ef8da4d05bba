//! Shared setup for integration tests.

use std::sync::Arc;

use rollcall_core::FixedClock;
use rollcall_gateway::MutationGateway;
use rollcall_test::{init_test_logging, test_clock};

/// A gateway with a pinned clock.
#[allow(dead_code)]
pub struct GatewayHarness {
    /// The gateway under test.
    pub gateway: MutationGateway,
    /// The clock the gateway evaluates against.
    pub clock: Arc<FixedClock>,
}

#[allow(dead_code)]
impl GatewayHarness {
    /// Standard rules, capture enabled, clock at 2026-10-19.
    pub fn new() -> Self {
        Self::with_clock(test_clock())
    }

    /// Standard rules and capture enabled, evaluating against `clock`.
    pub fn with_clock(clock: Arc<FixedClock>) -> Self {
        init_test_logging("rollcall=debug");
        let gateway = MutationGateway::builder()
            .clock(Arc::clone(&clock) as Arc<dyn rollcall_core::Clock>)
            .build();
        Self { gateway, clock }
    }
}
