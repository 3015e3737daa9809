//! Process-wide instance publication
//!
//! Lives in its own test binary: the instance is per process.

use std::sync::Arc;

use xplugin_reflect::host::sim::SimRuntime;
use xplugin_reflect::host::HostRuntime;
use xplugin_reflect::{install, instance, ReflectConfig};

#[test]
fn test_first_install_wins() {
    assert!(instance().is_none());

    let first: Arc<dyn HostRuntime> = Arc::new(SimRuntime::new(29));
    let installed = install(first, ReflectConfig::default());
    assert_eq!(installed.reflector().release(), 29);

    let second: Arc<dyn HostRuntime> = Arc::new(SimRuntime::new(21));
    let again = install(second, ReflectConfig::default());
    assert!(std::ptr::eq(installed, again));
    assert_eq!(again.reflector().release(), 29);

    let current = instance().unwrap();
    assert!(std::ptr::eq(installed, current));
}
