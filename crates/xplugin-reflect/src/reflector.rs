//! Reflector - resolution context
//!
//! Ties the host runtime, the handle cache and the configuration together.
//! Callers go through `call` / `probe`, which run the usual pipeline:
//! probe runner → invocation adapter → handle cache → member locator.

use std::sync::Arc;

use xplugin_host::{FromHost, HostRuntime, HostValue};

use crate::cache::HandleCache;
use crate::config::ReflectConfig;
use crate::descriptor::MemberDescriptor;
use crate::error::{LookupError, ReflectResult};
use crate::invoke::{invoke, invoke_as};
use crate::locator::{locate, ResolvedHandle};
use crate::probe::{ProbeOutcome, ProbeRunner, ProbeStrategy, ReleaseRange};

/// Resolution context bound to one host runtime
pub struct Reflector {
    host: Arc<dyn HostRuntime>,
    cache: HandleCache,
    config: ReflectConfig,
}

impl Reflector {
    /// Create a reflector with default configuration
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self::with_config(host, ReflectConfig::default())
    }

    /// Create a reflector with explicit configuration
    pub fn with_config(host: Arc<dyn HostRuntime>, config: ReflectConfig) -> Self {
        Self {
            host,
            cache: HandleCache::new(),
            config,
        }
    }

    /// The host runtime
    pub fn host(&self) -> &dyn HostRuntime {
        self.host.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &ReflectConfig {
        &self.config
    }

    /// The handle cache
    pub fn cache(&self) -> &HandleCache {
        &self.cache
    }

    /// Release of the running platform
    pub fn release(&self) -> u32 {
        self.host.release()
    }

    /// Resolve a descriptor, at most once per process
    pub fn resolve(&self, descriptor: &MemberDescriptor) -> Result<ResolvedHandle, LookupError> {
        self.cache
            .get_or_resolve(descriptor, |d| locate(self.host.as_ref(), d))
    }

    /// Resolve and invoke
    pub fn call(
        &self,
        descriptor: &MemberDescriptor,
        receiver: Option<&HostValue>,
        args: &[HostValue],
    ) -> ReflectResult<HostValue> {
        let handle = self.resolve(descriptor)?;
        Ok(invoke(self.host.as_ref(), &handle, receiver, args)?)
    }

    /// Resolve, invoke and convert the result
    pub fn call_as<T: FromHost>(
        &self,
        descriptor: &MemberDescriptor,
        receiver: Option<&HostValue>,
        args: &[HostValue],
    ) -> ReflectResult<T> {
        let handle = self.resolve(descriptor)?;
        Ok(invoke_as(self.host.as_ref(), &handle, receiver, args)?)
    }

    /// Run strategies against the running release
    pub fn probe<T>(&self, strategies: Vec<ProbeStrategy<'_, T>>) -> ProbeOutcome<T> {
        ProbeRunner::new(self.release()).run(strategies)
    }

    /// Resolve an internal singleton through strategies (null counts as failure)
    pub fn resolve_singleton(&self, strategies: Vec<ProbeStrategy<'_>>) -> Option<HostValue> {
        ProbeRunner::new(self.release()).resolve_singleton(strategies)
    }

    /// Strategy reading a static field or calling a static no-arg method
    pub fn static_strategy(
        &self,
        range: ReleaseRange,
        descriptor: MemberDescriptor,
    ) -> ProbeStrategy<'_> {
        ProbeStrategy::new(descriptor.to_string(), range, move || {
            self.call(&descriptor, None, &[])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use xplugin_host::sim::{SimMember, SimRuntime, SimType};

    fn reflector(rt: SimRuntime) -> (Arc<SimRuntime>, Reflector) {
        let rt = Arc::new(rt);
        let host: Arc<dyn HostRuntime> = rt.clone();
        (rt, Reflector::new(host))
    }

    #[test]
    fn test_call_resolves_once() {
        let sim = SimRuntime::new(27);
        sim.add_type(
            SimType::new("android.app.ActivityThread").member(
                SimMember::method("currentPackageName", &[])
                    .static_member()
                    .returns(HostValue::str("com.host")),
            ),
        );
        let (rt, r) = reflector(sim);
        let desc = MemberDescriptor::method("android.app.ActivityThread", "currentPackageName", &[]);

        let a: String = r.call_as(&desc, None, &[]).unwrap();
        let lookups = rt.lookup_count();
        let b: String = r.call_as(&desc, None, &[]).unwrap();

        assert_eq!(a, "com.host");
        assert_eq!(a, b);
        assert_eq!(rt.lookup_count(), lookups);
        assert_eq!(rt.invocation_count("android.app.ActivityThread", "currentPackageName"), 2);
    }

    #[test]
    fn test_call_reports_lookup_failure() {
        let (_rt, r) = reflector(SimRuntime::new(27));
        let desc = MemberDescriptor::method("android.app.Missing", "x", &[]);
        assert!(matches!(r.call(&desc, None, &[]), Err(ProbeError::Lookup(_))));
    }

    #[test]
    fn test_static_strategy_through_probe() {
        let sim = SimRuntime::new(26);
        sim.add_type(
            SimType::new("android.app.ActivityManager").member(
                SimMember::field("IActivityManagerSingleton", HostValue::Int(26)).static_member(),
            ),
        );
        let (_rt, r) = reflector(sim);
        let strategies = vec![
            r.static_strategy(
                ReleaseRange::at_least(29),
                MemberDescriptor::field("android.app.ActivityTaskManager", "IActivityTaskManagerSingleton"),
            ),
            r.static_strategy(
                ReleaseRange::between(26, 28),
                MemberDescriptor::field("android.app.ActivityManager", "IActivityManagerSingleton"),
            ),
        ];
        assert_eq!(r.resolve_singleton(strategies), Some(HostValue::Int(26)));
    }
}
