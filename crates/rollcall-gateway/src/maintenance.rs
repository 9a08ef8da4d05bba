//! Scoped suspension of audit capture.

use std::future::Future;
use tracing::info;

use crate::gateway::MutationGateway;

/// Ends one capture suspension when dropped.
struct CaptureSuspension {
    gateway: MutationGateway,
    held: bool,
}

impl CaptureSuspension {
    fn begin(gateway: &MutationGateway) -> Self {
        let held = gateway.capture().suspend();
        info!(
            open = gateway.capture().suspensions(),
            "bulk maintenance started, audit capture suspended"
        );
        Self {
            gateway: gateway.clone(),
            held,
        }
    }
}

impl Drop for CaptureSuspension {
    fn drop(&mut self) {
        if self.held {
            self.gateway.capture().resume();
        }
        info!(
            capturing = self.gateway.audit_capture_enabled(),
            "bulk maintenance finished"
        );
    }
}

impl MutationGateway {
    /// Run `action` with audit capture suspended.
    ///
    /// Mutations started while the action runs are not recorded. The
    /// suspension ends when the action completes, returns an error, panics,
    /// or is cancelled. Windows are counted rather than saved and restored,
    /// so nested and overlapping calls all work: capture resumes once the
    /// last open window ends, provided it is switched on. Suspension is
    /// global to the gateway: mutations by other callers during the window
    /// are not recorded either.
    ///
    /// ```rust,ignore
    /// let removed = gateway
    ///     .bulk_maintenance(|gw| async move { gw.clear().await })
    ///     .await?;
    /// ```
    pub async fn bulk_maintenance<F, Fut, T>(&self, action: F) -> T
    where
        F: FnOnce(MutationGateway) -> Fut,
        Fut: Future<Output = T>,
    {
        let _suspension = CaptureSuspension::begin(self);
        action(self.clone()).await
    }
}
