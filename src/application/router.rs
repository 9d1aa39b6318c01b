//! Backend router with priority-ordered fallback selection

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::capture::{OsVersion, Platform};

use super::ports::{BackendCapabilities, CaptureBackend, CaptureError};

/// Builds a backend instance on demand
pub type BackendFactory =
    Box<dyn Fn() -> Result<Arc<dyn CaptureBackend>, CaptureError> + Send + Sync>;

/// Priority of the universal fallback; registered backends always rank above it
pub const FALLBACK_PRIORITY: i32 = i32::MIN;

/// Where a backend may run and what it offers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendConstraints {
    pub priority: i32,
    /// Empty means any platform
    pub platforms: Vec<Platform>,
    pub min_version: Option<OsVersion>,
    pub capabilities: BackendCapabilities,
}

impl BackendConstraints {
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    pub fn on(mut self, platform: Platform) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn min_version(mut self, version: OsVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn with_capabilities(mut self, capabilities: BackendCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Why `host` is not eligible, or None when it is
    pub fn rejection(&self, host: &HostEnvironment) -> Option<String> {
        if !self.platforms.is_empty() && !self.platforms.contains(&host.platform) {
            return Some(format!("not available on {}", host.platform));
        }
        match (self.min_version, host.os_version) {
            (Some(min), Some(actual)) if actual < min => {
                Some(format!("requires OS {} or newer (found {})", min, actual))
            }
            (Some(min), None) => Some(format!("requires OS {} or newer (version unknown)", min)),
            _ => None,
        }
    }
}

/// The machine a backend is selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostEnvironment {
    pub platform: Platform,
    pub os_version: Option<OsVersion>,
}

impl HostEnvironment {
    pub fn new(platform: Platform, os_version: Option<OsVersion>) -> Self {
        Self {
            platform,
            os_version,
        }
    }
}

struct Registration {
    name: String,
    factory: BackendFactory,
    constraints: BackendConstraints,
}

/// One row of `screenrec backends`
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub priority: i32,
    pub platforms: Vec<Platform>,
    pub min_version: Option<OsVersion>,
    pub capabilities: BackendCapabilities,
    pub eligible: bool,
    pub reason: Option<String>,
    pub fallback: bool,
}

/// Chooses among interchangeable capture backends.
///
/// The fallback backend given to [`BackendRouter::new`] has no platform
/// constraints and the lowest priority, so selection only ends without
/// a backend when every candidate failed to initialize.
pub struct BackendRouter {
    registrations: Vec<Registration>,
}

impl BackendRouter {
    /// Create a router with its universal fallback backend
    pub fn new(fallback_name: impl Into<String>, fallback: BackendFactory) -> Self {
        Self {
            registrations: vec![Registration {
                name: fallback_name.into(),
                factory: fallback,
                constraints: BackendConstraints::new(FALLBACK_PRIORITY),
            }],
        }
    }

    /// Declare what the fallback backend offers
    pub fn with_fallback_capabilities(mut self, capabilities: BackendCapabilities) -> Self {
        if let Some(fallback) = self
            .registrations
            .iter_mut()
            .find(|r| r.constraints.priority == FALLBACK_PRIORITY)
        {
            fallback.constraints.capabilities = capabilities;
        }
        self
    }

    /// Register a backend. Priorities at or below [`FALLBACK_PRIORITY`] are
    /// raised just above it.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: BackendFactory,
        mut constraints: BackendConstraints,
    ) -> &mut Self {
        constraints.priority = constraints.priority.max(FALLBACK_PRIORITY + 1);
        self.registrations.push(Registration {
            name: name.into(),
            factory,
            constraints,
        });
        self
    }

    /// Registrations ordered by descending priority; registration order
    /// breaks ties
    fn ordered(&self) -> Vec<&Registration> {
        let mut ordered: Vec<&Registration> = self.registrations.iter().collect();
        ordered.sort_by(|a, b| b.constraints.priority.cmp(&a.constraints.priority));
        ordered
    }

    /// Pick the highest-priority eligible backend that initializes
    pub async fn select_backend(
        &self,
        host: &HostEnvironment,
    ) -> Result<Arc<dyn CaptureBackend>, CaptureError> {
        self.select_backend_with(host, BackendCapabilities::default())
            .await
    }

    /// Like [`select_backend`](Self::select_backend), skipping backends
    /// that do not declare every capability in `required`
    pub async fn select_backend_with(
        &self,
        host: &HostEnvironment,
        required: BackendCapabilities,
    ) -> Result<Arc<dyn CaptureBackend>, CaptureError> {
        let mut last_failure = String::from("no backend satisfies the host constraints");

        for registration in self.ordered() {
            let name = registration.name.as_str();

            if let Some(reason) = registration.constraints.rejection(host) {
                debug!(backend = name, %reason, "Skipping backend");
                continue;
            }
            if !registration.constraints.capabilities.covers(&required) {
                debug!(backend = name, "Skipping backend without required capabilities");
                continue;
            }

            let backend = match (registration.factory)() {
                Ok(backend) => backend,
                Err(e) => {
                    warn!(backend = name, error = %e, "Failed to construct backend, trying next");
                    last_failure = format!("{}: {}", name, e);
                    continue;
                }
            };

            match backend.initialize().await {
                Ok(()) => {
                    info!(
                        backend = name,
                        priority = registration.constraints.priority,
                        "Selected capture backend"
                    );
                    return Ok(backend);
                }
                Err(e) => {
                    warn!(backend = name, error = %e, "Backend failed to initialize, trying next");
                    last_failure = format!("{}: {}", name, e);
                }
            }
        }

        Err(CaptureError::NoBackendAvailable {
            platform: host.platform,
            reason: last_failure,
        })
    }

    /// Describe every registration as seen from `host`, in selection order
    pub fn describe(&self, host: &HostEnvironment) -> Vec<BackendInfo> {
        self.ordered()
            .into_iter()
            .map(|r| {
                let reason = r.constraints.rejection(host);
                BackendInfo {
                    name: r.name.clone(),
                    priority: r.constraints.priority,
                    platforms: r.constraints.platforms.clone(),
                    min_version: r.constraints.min_version,
                    capabilities: r.constraints.capabilities,
                    eligible: reason.is_none(),
                    reason,
                    fallback: r.constraints.priority == FALLBACK_PRIORITY,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
