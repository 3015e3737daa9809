//! HostRuntime trait - abstract runtime reflection facilities
//!
//! Defines the interface a managed runtime binding implements. The
//! reflective-access core programs against this trait only; it never
//! depends on a particular runtime binding.

use std::path::PathBuf;

use crate::error::{HostError, HostResult};
use crate::types::{MemberKind, MemberRef, TypeRef};
use crate::value::HostValue;

/// Abstract view of the running managed runtime.
///
/// Every method is a direct, blocking call into the runtime. Implementations
/// must be safe to call from any thread the host application uses.
pub trait HostRuntime: Send + Sync {
    // ========================================================================
    // Platform
    // ========================================================================

    /// Release identifier of the running platform (API level)
    fn release(&self) -> u32;

    // ========================================================================
    // Type Introspection
    // ========================================================================

    /// Resolve a type by fully qualified name through the privileged
    /// resolution path (accepts internal names the public path rejects)
    fn find_type_privileged(&self, name: &str) -> HostResult<TypeRef>;

    /// Look up a declared member through the ordinary declaration facility.
    /// Subject to the release's hidden-member gating.
    fn declared_member(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
        kind: MemberKind,
    ) -> HostResult<MemberRef>;

    /// Look up a declared member as the runtime's own system code would.
    ///
    /// Releases that still trust system callers skip hidden-member gating on
    /// this path. Hosts without such a path report `Unsupported`.
    fn declared_member_unrestricted(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
        kind: MemberKind,
    ) -> HostResult<MemberRef> {
        let _ = (params, kind);
        Err(HostError::Unsupported(format!(
            "unrestricted declaration lookup for {}.{}",
            owner, name
        )))
    }

    /// Force a member into an invocable state, bypassing visibility
    fn force_accessible(&self, member: &MemberRef) -> HostResult<()>;

    /// Whether `value` may be passed where `ty` is expected
    fn is_assignable(&self, ty: &TypeRef, value: &HostValue) -> bool;

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Call a method or read a field.
    ///
    /// `receiver` is `None` for static members.
    fn invoke(
        &self,
        member: &MemberRef,
        receiver: Option<&HostValue>,
        args: &[HostValue],
    ) -> HostResult<HostValue>;

    // ========================================================================
    // Packages
    // ========================================================================

    /// Package name of the application a context object belongs to
    fn application_package(&self, context: &HostValue) -> HostResult<String>;

    /// On-disk resource bundle of an installed package
    fn package_source_dir(&self, package: &str) -> HostResult<PathBuf>;
}
