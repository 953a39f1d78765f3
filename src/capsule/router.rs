/*!
 * Tenant Router
 * Picks the capsule that governs a session from its virtual-host claim
 */

use super::layout::Capsule;
use super::store::CapsuleStore;
use tracing::{debug, warn};

/// Routes host claims to capsules, falling back to the default capsule
#[derive(Debug, Clone)]
pub struct TenantRouter {
    default: Capsule,
    extra: Vec<Capsule>,
}

impl TenantRouter {
    pub fn new(default: Capsule, extra: Vec<Capsule>) -> Self {
        Self { default, extra }
    }

    pub fn default_capsule(&self) -> &Capsule {
        &self.default
    }

    /// Select the capsule for `claim`
    ///
    /// No claim, or a claim nobody declares, routes to the default capsule.
    /// The caller is never told that virtual hosting fell back.
    pub fn route<S: CapsuleStore + ?Sized>(&self, store: &S, claim: Option<&str>) -> &Capsule {
        let host = match claim {
            Some(h) if !h.is_empty() => h,
            _ => return &self.default,
        };

        if declares_host(store, &self.default, host) {
            return &self.default;
        }

        if let Some(capsule) = self.extra.iter().find(|c| declares_host(store, c, host)) {
            debug!(host, capsule = %capsule.root().display(), "Routed virtual host");
            return capsule;
        }

        debug!(host, "No capsule declares host, using default");
        &self.default
    }
}

/// Check whether a capsule's host file lists `host`
pub fn declares_host<S: CapsuleStore + ?Sized>(store: &S, capsule: &Capsule, host: &str) -> bool {
    match store.read_lines(&capsule.host_file()) {
        Ok(lines) => lines.iter().any(|line| line.trim() == host),
        Err(e) => {
            warn!(capsule = %capsule.root().display(), error = %e, "Host file unavailable");
            false
        }
    }
}
