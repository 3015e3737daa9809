//! Plugin-facing facade
//!
//! The operations the dynamic-loading subsystem calls. Apart from
//! [`PluginReflect::init`], nothing here returns an error: a facility that
//! is missing or hardened on this release degrades to a sentinel.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use xplugin_host::{HostRuntime, HostValue, TypeRef};

use crate::bootstrap::{BootstrapGate, BootstrapHandles};
use crate::config::ReflectConfig;
use crate::error::{BootstrapError, ProbeError};
use crate::invoke::invoke_as;
use crate::probe::{ProbeStrategy, ReleaseRange};
use crate::reflector::Reflector;
use crate::targets::{self, release};

/// Reflective operations used by the plugin loader
pub struct PluginReflect {
    reflector: Reflector,
    gate: BootstrapGate,
    /// Indexed by `prefer_newer_api as usize`
    service_manager: [OnceCell<Option<HostValue>>; 2],
    resource_dir: OnceCell<PathBuf>,
}

impl PluginReflect {
    /// Create a facade with default configuration
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self::with_config(host, ReflectConfig::default())
    }

    /// Create a facade with explicit configuration
    pub fn with_config(host: Arc<dyn HostRuntime>, config: ReflectConfig) -> Self {
        Self {
            reflector: Reflector::with_config(host, config),
            gate: BootstrapGate::new(),
            service_manager: [OnceCell::new(), OnceCell::new()],
            resource_dir: OnceCell::new(),
        }
    }

    /// Underlying resolution context
    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    /// Bootstrap state
    pub fn gate(&self) -> &BootstrapGate {
        &self.gate
    }

    /// Pre-resolve the mandatory handles.
    ///
    /// Call once, before the host's class-loader chain is rewritten.
    pub fn init(&self) -> Result<&BootstrapHandles, BootstrapError> {
        self.gate.init(&self.reflector)
    }

    fn handles(&self, operation: &'static str) -> Option<&BootstrapHandles> {
        let handles = self.gate.handles();
        if handles.is_none() {
            warn!(operation, "called before init");
        }
        handles
    }

    /// Add a resource search path; returns the new cookie, 0 on failure
    pub fn add_search_path(&self, resource_manager: &HostValue, path: &str) -> i32 {
        let Some(handles) = self.handles("add_search_path") else {
            return 0;
        };
        match invoke_as::<i32>(
            self.reflector.host(),
            &handles.add_search_path,
            Some(resource_manager),
            &[HostValue::str(path)],
        ) {
            Ok(cookie) => cookie,
            Err(err) => {
                debug!(path, error = %err, "addAssetPath failed");
                0
            }
        }
    }

    /// Find a class through `class_loader`; absent on failure
    pub fn find_class(&self, class_loader: &HostValue, name: &str) -> Option<TypeRef> {
        let handles = self.handles("find_class")?;
        match invoke_as::<Option<TypeRef>>(
            self.reflector.host(),
            &handles.find_class,
            Some(class_loader),
            &[HostValue::str(name)],
        ) {
            Ok(ty) => ty,
            Err(err) => {
                debug!(class = name, error = %err, "findClass failed");
                None
            }
        }
    }

    /// The platform's internal service-manager singleton.
    ///
    /// With `prefer_newer_api` false the newest holder is not consulted.
    /// The outcome, absence included, is computed once per flag value.
    pub fn service_manager_singleton(&self, prefer_newer_api: bool) -> Option<HostValue> {
        self.service_manager[prefer_newer_api as usize]
            .get_or_init(|| {
                let skip = usize::from(!prefer_newer_api);
                let strategies = targets::service_manager_fields()
                    .into_iter()
                    .skip(skip)
                    .map(|(range, field)| self.reflector.static_strategy(range, field))
                    .collect();
                let singleton = self.reflector.resolve_singleton(strategies);
                if singleton.is_none() {
                    debug!(
                        release = self.reflector.release(),
                        prefer_newer_api, "service manager singleton unavailable"
                    );
                }
                singleton
            })
            .clone()
    }

    /// Source directory of the web-rendering package.
    ///
    /// Memoized once a non-empty path is found; failures and empty paths are
    /// retried on the next call.
    pub fn auxiliary_resource_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = self.resource_dir.get() {
            return Some(dir.clone());
        }
        let release = self.reflector.release();
        if release < release::LOLLIPOP {
            return None;
        }

        let package = self.webview_package();
        match self.reflector.host().package_source_dir(&package) {
            Ok(dir) if dir.as_os_str().is_empty() => {
                warn!(package = %package, release, "web-rendering package has no source dir");
                None
            }
            Ok(dir) => Some(self.resource_dir.get_or_init(|| dir).clone()),
            Err(err) => {
                warn!(package = %package, release, error = %err, "web-rendering package lookup failed");
                None
            }
        }
    }

    fn webview_package(&self) -> String {
        let strategies = vec![
            ProbeStrategy::new(
                "getWebViewContextAndSetProvider",
                ReleaseRange::at_least(release::NOUGAT),
                || {
                    let context =
                        self.reflector
                            .call(&targets::webview_context_and_set_provider(), None, &[])?;
                    if context.is_null() {
                        return Err(ProbeError::Absent("web-rendering context is null".to_string()));
                    }
                    let package = self.reflector.host().application_package(&context)?;
                    non_empty(package)
                },
            ),
            ProbeStrategy::new(
                "getWebViewPackageName",
                ReleaseRange::between(release::LOLLIPOP, release::NOUGAT - 1),
                || {
                    let package: Option<String> =
                        self.reflector
                            .call_as(&targets::webview_package_name(), None, &[])?;
                    non_empty(package.unwrap_or_default())
                },
            ),
        ];

        self.reflector.probe(strategies).into_value().unwrap_or_else(|| {
            let fallback = &self.reflector.config().webview_fallback_package;
            debug!(package = %fallback, "using fallback web-rendering package");
            fallback.clone()
        })
    }
}

fn non_empty(package: String) -> Result<String, ProbeError> {
    if package.is_empty() {
        Err(ProbeError::Absent("empty package name".to_string()))
    } else {
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::classes;
    use xplugin_host::sim::{SimMember, SimRuntime, SimType};

    fn facade(rt: &Arc<SimRuntime>) -> PluginReflect {
        let host: Arc<dyn HostRuntime> = rt.clone();
        PluginReflect::new(host)
    }

    fn with_loader_types(rt: SimRuntime) -> Arc<SimRuntime> {
        rt.add_type(
            SimType::new(classes::ASSET_MANAGER).member(
                SimMember::method("addAssetPath", &["java.lang.String"]).body(|call| {
                    match call.args[0].as_str() {
                        Some(p) if p.ends_with(".apk") => Ok(HostValue::Int(3)),
                        _ => Ok(HostValue::Int(0)),
                    }
                }),
            ),
        );
        rt.add_type(
            SimType::new(classes::CLASS_LOADER).member(
                SimMember::method("findClass", &["java.lang.String"]).body(|call| {
                    match call.args[0].as_str() {
                        Some("com.plugin.Entry") => Ok(HostValue::Type(TypeRef::named("com.plugin.Entry"))),
                        _ => Err(xplugin_host::HostError::TargetFault(
                            "ClassNotFoundException".to_string(),
                        )),
                    }
                }),
            ),
        );
        Arc::new(rt)
    }

    #[test]
    fn test_sentinels_before_init() {
        let rt = with_loader_types(SimRuntime::new(27));
        let plugin = facade(&rt);
        let am = rt.new_object(classes::ASSET_MANAGER);
        let loader = rt.new_object(classes::CLASS_LOADER);

        assert_eq!(plugin.add_search_path(&am, "/data/p.apk"), 0);
        assert_eq!(plugin.find_class(&loader, "com.plugin.Entry"), None);
    }

    #[test]
    fn test_add_search_path_and_find_class() {
        let rt = with_loader_types(SimRuntime::new(27));
        let plugin = facade(&rt);
        plugin.init().unwrap();
        let am = rt.new_object(classes::ASSET_MANAGER);
        let loader = rt.new_object(classes::CLASS_LOADER);

        assert_eq!(plugin.add_search_path(&am, "/data/p.apk"), 3);
        assert_eq!(
            plugin.find_class(&loader, "com.plugin.Entry"),
            Some(TypeRef::named("com.plugin.Entry"))
        );
    }

    #[test]
    fn test_failures_become_sentinels() {
        let rt = with_loader_types(SimRuntime::new(27));
        let plugin = facade(&rt);
        plugin.init().unwrap();
        let loader = rt.new_object(classes::CLASS_LOADER);

        // Wrong receiver type
        assert_eq!(plugin.add_search_path(&loader, "/data/p.apk"), 0);
        assert_eq!(plugin.add_search_path(&HostValue::Null, "/data/p.apk"), 0);
        // Target throws
        assert_eq!(plugin.find_class(&loader, "com.plugin.Missing"), None);
    }

    #[test]
    fn test_service_manager_memoized_per_flag() {
        let rt = SimRuntime::new(29);
        rt.add_type(SimType::new(classes::ACTIVITY_TASK_MANAGER).member(
            SimMember::field("IActivityTaskManagerSingleton", HostValue::str("atm")).static_member(),
        ));
        let rt = Arc::new(rt);
        let plugin = facade(&rt);

        assert_eq!(plugin.service_manager_singleton(true), Some(HostValue::str("atm")));
        // [26, 28] holder is out of range on 29
        assert_eq!(plugin.service_manager_singleton(false), None);

        plugin.service_manager_singleton(true);
        plugin.service_manager_singleton(false);
        assert_eq!(
            rt.invocation_count(classes::ACTIVITY_TASK_MANAGER, "IActivityTaskManagerSingleton"),
            1
        );
    }

    #[test]
    fn test_resource_dir_below_lollipop() {
        let rt = Arc::new(SimRuntime::new(release::KITKAT));
        let plugin = facade(&rt);
        assert_eq!(plugin.auxiliary_resource_dir(), None);
        assert_eq!(rt.package_query_count(), 0);
    }

    #[test]
    fn test_resource_dir_fallback_package() {
        let rt = SimRuntime::new(26);
        rt.install_package("com.google.android.webview", "/data/app/webview/base.apk");
        let rt = Arc::new(rt);
        let plugin = facade(&rt);

        assert_eq!(
            plugin.auxiliary_resource_dir(),
            Some(PathBuf::from("/data/app/webview/base.apk"))
        );
    }

    #[test]
    fn test_resource_dir_package_name_method() {
        let rt = SimRuntime::new(22);
        rt.add_type(SimType::new(classes::WEBVIEW_FACTORY).member(
            SimMember::method("getWebViewPackageName", &[])
                .static_member()
                .returns(HostValue::str("com.android.webview")),
        ));
        rt.install_package("com.android.webview", "/system/app/webview.apk");
        let rt = Arc::new(rt);
        let plugin = facade(&rt);

        assert_eq!(
            plugin.auxiliary_resource_dir(),
            Some(PathBuf::from("/system/app/webview.apk"))
        );
    }

    #[test]
    fn test_resource_dir_failure_not_memoized() {
        let rt = Arc::new(SimRuntime::new(26));
        let plugin = facade(&rt);

        assert_eq!(plugin.auxiliary_resource_dir(), None);
        rt.install_package("com.google.android.webview", "/data/app/webview.apk");
        assert_eq!(
            plugin.auxiliary_resource_dir(),
            Some(PathBuf::from("/data/app/webview.apk"))
        );
        assert_eq!(rt.package_query_count(), 2);
    }

    #[test]
    fn test_resource_dir_empty_path_not_memoized() {
        let rt = Arc::new(SimRuntime::new(26));
        rt.install_package("com.google.android.webview", "");
        let plugin = facade(&rt);

        assert_eq!(plugin.auxiliary_resource_dir(), None);
        rt.install_package("com.google.android.webview", "/data/app/w.apk");
        assert_eq!(
            plugin.auxiliary_resource_dir(),
            Some(PathBuf::from("/data/app/w.apk"))
        );
        assert_eq!(rt.package_query_count(), 2);
    }
}
