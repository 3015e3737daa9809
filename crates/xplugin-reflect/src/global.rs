//! Process-wide instance
//!
//! The plugin loader reaches the reflective layer from arbitrary call sites;
//! one [`PluginReflect`] is published per process and lives until exit.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;
use xplugin_host::HostRuntime;

use crate::config::ReflectConfig;
use crate::plugin::PluginReflect;

static INSTANCE: OnceCell<PluginReflect> = OnceCell::new();

/// Publish the process-wide instance. The first install wins; later calls
/// return the existing instance and drop their arguments.
pub fn install(host: Arc<dyn HostRuntime>, config: ReflectConfig) -> &'static PluginReflect {
    let mut created = false;
    let instance = INSTANCE.get_or_init(|| {
        created = true;
        PluginReflect::with_config(host, config)
    });
    if created {
        debug!(release = instance.reflector().release(), "plugin reflection installed");
    }
    instance
}

/// The process-wide instance, if installed
pub fn instance() -> Option<&'static PluginReflect> {
    INSTANCE.get()
}
