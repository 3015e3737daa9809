//! Bootstrap Gate
//!
//! One-time initialization that must run before the host rewrites its
//! class-resolution chain. Once plugin class loaders are installed, resolving
//! `findClass` reflectively can route back through the very loader being
//! resolved; pre-resolving the handles here keeps later calls on the cache.
//!
//! `Uninitialized → Initialized`, no way back. During `init`:
//!
//! 1. at/above the configured release, ask the runtime to exempt the
//!    configured signature prefixes from hidden-API gating (non-fatal);
//! 2. resolve `addAssetPath` and `findClass` into the handle cache (fatal).
//!
//! Relaxation runs at most once per gate, whatever the outcome.

use std::cell::Cell;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use xplugin_host::{HostValue, ToHost};

use crate::descriptor::MemberDescriptor;
use crate::error::{BootstrapError, ProbeError, ReflectResult};
use crate::invoke::invoke;
use crate::locator::{locate, ResolvedHandle};
use crate::reflector::Reflector;
use crate::targets;

thread_local! {
    static IN_INIT: Cell<bool> = Cell::new(false);
}

/// Gate lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// `init` has not completed
    Uninitialized,
    /// Mandatory handles are resolved
    Initialized,
}

/// Outcome of the hidden-API relaxation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    /// Release below the configured threshold
    NotApplicable,
    /// Exemptions installed
    Applied,
    /// Attempted and failed; lookups rely on per-member forcing
    Failed,
}

/// Handles every plugin operation depends on
#[derive(Debug, Clone)]
pub struct BootstrapHandles {
    /// `AssetManager.addAssetPath(String)`
    pub add_search_path: ResolvedHandle,
    /// `ClassLoader.findClass(String)`
    pub find_class: ResolvedHandle,
}

/// Clears the reentrancy flag when `init` unwinds or returns
struct InitGuard;

impl InitGuard {
    fn enter() -> Option<Self> {
        IN_INIT.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(InitGuard)
            }
        })
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        IN_INIT.with(|flag| flag.set(false));
    }
}

/// One-shot initializer for the reflective layer
#[derive(Debug, Default)]
pub struct BootstrapGate {
    handles: OnceCell<BootstrapHandles>,
    relaxation: OnceCell<Relaxation>,
}

impl BootstrapGate {
    /// Create an uninitialized gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Run initialization; later calls return the stored handles.
    ///
    /// Must be called before the host's class-resolution chain is modified.
    pub fn init(&self, reflector: &Reflector) -> Result<&BootstrapHandles, BootstrapError> {
        if let Some(handles) = self.handles.get() {
            return Ok(handles);
        }
        let _guard = InitGuard::enter().ok_or(BootstrapError::Reentrant)?;

        self.relaxation.get_or_init(|| relax_hidden_api(reflector));

        self.handles.get_or_try_init(|| {
            let handles = BootstrapHandles {
                add_search_path: require(reflector, targets::add_asset_path())?,
                find_class: require(reflector, targets::find_class())?,
            };
            debug!(release = reflector.release(), "bootstrap complete");
            Ok(handles)
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> GateState {
        if self.handles.get().is_some() {
            GateState::Initialized
        } else {
            GateState::Uninitialized
        }
    }

    /// Whether `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.state() == GateState::Initialized
    }

    /// Resolved handles, once initialized
    pub fn handles(&self) -> Option<&BootstrapHandles> {
        self.handles.get()
    }

    /// Outcome of the relaxation step, once attempted
    pub fn relaxation(&self) -> Option<Relaxation> {
        self.relaxation.get().copied()
    }
}

fn require(
    reflector: &Reflector,
    descriptor: MemberDescriptor,
) -> Result<ResolvedHandle, BootstrapError> {
    reflector
        .resolve(&descriptor)
        .map_err(|source| BootstrapError::MissingHandle {
            member: descriptor.to_string(),
            source,
        })
}

fn relax_hidden_api(reflector: &Reflector) -> Relaxation {
    let release = reflector.release();
    if release < reflector.config().hidden_api_release {
        return Relaxation::NotApplicable;
    }
    match exempt_prefixes(reflector) {
        Ok(()) => {
            debug!(
                release,
                prefixes = ?reflector.config().exemption_prefixes,
                "hidden API exemptions installed"
            );
            Relaxation::Applied
        }
        Err(err) => {
            warn!(release, error = %err, "reflect VMRuntime failed");
            Relaxation::Failed
        }
    }
}

// Closed-form path: located directly, bypassing the cache
fn exempt_prefixes(reflector: &Reflector) -> ReflectResult<()> {
    let host = reflector.host();

    let get_runtime = locate(host, &targets::vm_runtime_get_runtime())?;
    let runtime = invoke(host, &get_runtime, None, &[])?;
    if runtime.is_null() {
        return Err(ProbeError::Absent("VMRuntime.getRuntime() returned null".to_string()));
    }

    let set_exemptions = locate(host, &targets::set_hidden_api_exemptions())?;
    let prefixes: HostValue = reflector.config().exemption_prefixes.clone().to_host();
    invoke(host, &set_exemptions, Some(&runtime), &[prefixes])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupReason;
    use std::sync::Arc;
    use xplugin_host::sim::{SimMember, SimRuntime, SimType};
    use xplugin_host::HostRuntime;

    fn full_runtime(release: u32) -> Arc<SimRuntime> {
        let rt = SimRuntime::new(release);
        rt.install_vm_runtime();
        rt.add_type(
            SimType::new(targets::classes::ASSET_MANAGER).member(
                SimMember::method("addAssetPath", &["java.lang.String"])
                    .hidden()
                    .returns(HostValue::Int(1)),
            ),
        );
        rt.add_type(
            SimType::new(targets::classes::CLASS_LOADER)
                .member(SimMember::method("findClass", &["java.lang.String"])),
        );
        Arc::new(rt)
    }

    fn reflector(rt: &Arc<SimRuntime>) -> Reflector {
        let host: Arc<dyn HostRuntime> = rt.clone();
        Reflector::new(host)
    }

    #[test]
    fn test_init_below_threshold_skips_relaxation() {
        let rt = full_runtime(27);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        assert_eq!(gate.state(), GateState::Uninitialized);
        gate.init(&r).unwrap();
        assert_eq!(gate.state(), GateState::Initialized);
        assert_eq!(gate.relaxation(), Some(Relaxation::NotApplicable));
        assert!(rt.exemptions().is_empty());
    }

    #[test]
    fn test_init_installs_exemptions() {
        let rt = full_runtime(28);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        gate.init(&r).unwrap();
        assert_eq!(gate.relaxation(), Some(Relaxation::Applied));
        assert_eq!(rt.exemptions(), vec!["L".to_string()]);
    }

    #[test]
    fn test_relaxation_failure_is_not_fatal() {
        let rt = full_runtime(30);
        // VMRuntime stays gated; AssetManager is pre-exempted
        rt.harden_declaration_lookup();
        rt.set_exemptions(vec!["Landroid/content/res/".to_string()]);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        gate.init(&r).unwrap();
        assert_eq!(gate.relaxation(), Some(Relaxation::Failed));
    }

    #[test]
    fn test_missing_handle_is_fatal() {
        let rt = SimRuntime::new(27);
        rt.add_type(
            SimType::new(targets::classes::ASSET_MANAGER)
                .member(SimMember::method("addAssetPath", &["java.lang.String"])),
        );
        let rt = Arc::new(rt);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        let err = gate.init(&r).unwrap_err();
        match err {
            BootstrapError::MissingHandle { member, source } => {
                assert!(member.contains("findClass"));
                assert_eq!(source.reason, LookupReason::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gate.state(), GateState::Uninitialized);
    }

    #[test]
    fn test_init_twice_keeps_handles_and_relaxation() {
        let rt = full_runtime(29);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        let first = gate.init(&r).unwrap().clone();
        let relax_calls = rt.invocation_count(targets::classes::VM_RUNTIME, "setHiddenApiExemptions");
        let second = gate.init(&r).unwrap();

        assert!(first.add_search_path.same_as(&second.add_search_path));
        assert!(first.find_class.same_as(&second.find_class));
        assert_eq!(
            rt.invocation_count(targets::classes::VM_RUNTIME, "setHiddenApiExemptions"),
            relax_calls
        );
        assert_eq!(relax_calls, 1);
    }

    #[test]
    fn test_reentrant_init_rejected() {
        let rt = full_runtime(27);
        let r = reflector(&rt);
        let gate = BootstrapGate::new();

        let _outer = InitGuard::enter().unwrap();
        assert_eq!(gate.init(&r).unwrap_err(), BootstrapError::Reentrant);
    }
}
