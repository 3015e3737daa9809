//! xplugin reflective access
//!
//! Resolves and invokes private runtime members whose location, signature or
//! existence varies between platform releases, for use by a plugin loader.
//!
//! # Architecture
//!
//! ```text
//! PluginReflect (facade)
//!   ├── BootstrapGate      one-time relaxation + mandatory handles
//!   └── Reflector
//!         ├── ProbeRunner  ordered (release range, action) strategies
//!         ├── invoke       receiver/argument checks, error wrapping
//!         ├── HandleCache  one resolution per descriptor per process
//!         └── locate       lookup + force-accessible
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use xplugin_reflect::{install, ReflectConfig};
//!
//! let plugin = install(Arc::new(runtime), ReflectConfig::default());
//! plugin.init()?;
//! let cookie = plugin.add_search_path(&asset_manager, "/data/plugin.apk");
//! let service_manager = plugin.service_manager_singleton(true);
//! ```

#![warn(missing_docs)]

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod global;
pub mod invoke;
pub mod locator;
pub mod plugin;
pub mod probe;
pub mod reflector;
pub mod targets;

pub use bootstrap::{BootstrapGate, BootstrapHandles, GateState, Relaxation};
pub use cache::{CacheStats, HandleCache};
pub use config::{ConfigError, ReflectConfig};
pub use descriptor::MemberDescriptor;
pub use error::{
    BootstrapError, InvocationError, InvocationReason, LookupError, LookupReason, ProbeError,
    ReflectResult,
};
pub use global::{install, instance};
pub use invoke::{invoke, invoke_as};
pub use locator::{locate, ResolvedHandle};
pub use plugin::PluginReflect;
pub use probe::{ProbeFailure, ProbeOutcome, ProbeRunner, ProbeStrategy, ReleaseRange};
pub use reflector::Reflector;

pub use xplugin_host as host;
