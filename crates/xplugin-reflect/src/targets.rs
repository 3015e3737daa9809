//! Well-known internal members
//!
//! Names and shapes of the private runtime members the plugin loader relies
//! on, plus the release levels at which their location changes.

use crate::descriptor::MemberDescriptor;
use crate::probe::ReleaseRange;

/// Platform release levels
pub mod release {
    /// KitKat (4.4)
    pub const KITKAT: u32 = 19;
    /// Lollipop (5.0), first release with a separately updatable WebView
    pub const LOLLIPOP: u32 = 21;
    /// Nougat (7.0)
    pub const NOUGAT: u32 = 24;
    /// Oreo (8.0)
    pub const OREO: u32 = 26;
    /// Pie (9), first release with hidden-API gating
    pub const PIE: u32 = 28;
    /// Q (10)
    pub const Q: u32 = 29;
}

/// Internal class names
pub mod classes {
    /// Resource bundle facility
    pub const ASSET_MANAGER: &str = "android.content.res.AssetManager";
    /// Class-loading facility
    pub const CLASS_LOADER: &str = "java.lang.ClassLoader";
    /// Runtime policy object
    pub const VM_RUNTIME: &str = "dalvik.system.VMRuntime";
    /// Service manager holder, [29, ~]
    pub const ACTIVITY_TASK_MANAGER: &str = "android.app.ActivityTaskManager";
    /// Service manager holder, [26, 28]
    pub const ACTIVITY_MANAGER: &str = "android.app.ActivityManager";
    /// Service manager holder, [19, 25]
    pub const ACTIVITY_MANAGER_NATIVE: &str = "android.app.ActivityManagerNative";
    /// Web-rendering subsystem factory
    pub const WEBVIEW_FACTORY: &str = "android.webkit.WebViewFactory";
}

/// `AssetManager.addAssetPath(String) -> int`
pub fn add_asset_path() -> MemberDescriptor {
    MemberDescriptor::method(classes::ASSET_MANAGER, "addAssetPath", &["java.lang.String"])
}

/// `ClassLoader.findClass(String) -> Class`
pub fn find_class() -> MemberDescriptor {
    MemberDescriptor::method(classes::CLASS_LOADER, "findClass", &["java.lang.String"])
}

/// `static VMRuntime.getRuntime() -> VMRuntime`
pub fn vm_runtime_get_runtime() -> MemberDescriptor {
    MemberDescriptor::method(classes::VM_RUNTIME, "getRuntime", &[])
}

/// `VMRuntime.setHiddenApiExemptions(String[])`
pub fn set_hidden_api_exemptions() -> MemberDescriptor {
    MemberDescriptor::method(
        classes::VM_RUNTIME,
        "setHiddenApiExemptions",
        &["java.lang.String[]"],
    )
}

/// Static fields holding the service manager singleton, newest first
pub fn service_manager_fields() -> [(ReleaseRange, MemberDescriptor); 3] {
    [
        (
            ReleaseRange::at_least(release::Q),
            MemberDescriptor::field(classes::ACTIVITY_TASK_MANAGER, "IActivityTaskManagerSingleton"),
        ),
        (
            ReleaseRange::between(release::OREO, release::PIE),
            MemberDescriptor::field(classes::ACTIVITY_MANAGER, "IActivityManagerSingleton"),
        ),
        (
            ReleaseRange::between(release::KITKAT, release::OREO - 1),
            MemberDescriptor::field(classes::ACTIVITY_MANAGER_NATIVE, "gDefault"),
        ),
    ]
}

/// `static WebViewFactory.getWebViewPackageName() -> String`, [21, 23]
pub fn webview_package_name() -> MemberDescriptor {
    MemberDescriptor::method(classes::WEBVIEW_FACTORY, "getWebViewPackageName", &[])
}

/// `static WebViewFactory.getWebViewContextAndSetProvider() -> Context`, [24, ~]
pub fn webview_context_and_set_provider() -> MemberDescriptor {
    MemberDescriptor::method(classes::WEBVIEW_FACTORY, "getWebViewContextAndSetProvider", &[])
}
