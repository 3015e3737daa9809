//! Member Locator
//!
//! Resolves a [`MemberDescriptor`] to an invocable [`ResolvedHandle`]:
//!
//! 1. resolve the owner type (names go through the privileged path);
//! 2. look the member up through the unrestricted declaration facility,
//!    falling back to the ordinary one when the host has none;
//! 3. force the member accessible.
//!
//! Every failure comes back as a [`LookupError`]; nothing here panics or
//! logs above `debug`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};
use xplugin_host::{HostError, HostRuntime, MemberKind, MemberRef, TypeRef, TypeSpec};

use crate::descriptor::MemberDescriptor;
use crate::error::LookupError;

struct HandleInner {
    descriptor: MemberDescriptor,
    member: MemberRef,
}

/// An accessible member, ready to invoke without re-resolving.
///
/// Cloning is cheap and clones share identity (see [`ResolvedHandle::same_as`]).
#[derive(Clone)]
pub struct ResolvedHandle {
    inner: Arc<HandleInner>,
}

impl ResolvedHandle {
    /// Descriptor this handle was resolved from
    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.inner.descriptor
    }

    /// Host-side member handle
    pub fn member(&self) -> &MemberRef {
        &self.inner.member
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        self.inner.member.is_static
    }

    /// Method or field
    pub fn kind(&self) -> MemberKind {
        self.inner.member.kind
    }

    /// Parameter shape declared by the runtime
    pub fn params(&self) -> &[TypeRef] {
        &self.inner.member.params
    }

    /// Whether both handles came from the same resolution
    pub fn same_as(&self, other: &ResolvedHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ResolvedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHandle")
            .field("member", &self.inner.member.to_string())
            .field("static", &self.inner.member.is_static)
            .finish()
    }
}

/// Resolve the owner of a descriptor to a live type
pub fn resolve_owner(host: &dyn HostRuntime, owner: &TypeSpec) -> Result<TypeRef, HostError> {
    match owner {
        TypeSpec::Ref(ty) => Ok(ty.clone()),
        TypeSpec::Name(name) => host.find_type_privileged(name),
    }
}

/// Locate a member and force it accessible
pub fn locate(
    host: &dyn HostRuntime,
    descriptor: &MemberDescriptor,
) -> Result<ResolvedHandle, LookupError> {
    let label = descriptor.to_string();
    let fail = |cause: HostError| {
        let err = LookupError::from_host(label.clone(), cause);
        debug!(member = %label, reason = %err.reason, "member lookup failed");
        err
    };

    let owner = resolve_owner(host, descriptor.owner()).map_err(fail)?;

    let name = descriptor.name();
    let params = descriptor.params();
    let kind = descriptor.kind();
    let member = match host.declared_member_unrestricted(&owner, name, params, kind) {
        Ok(member) => member,
        Err(HostError::Unsupported(_)) => {
            trace!(member = %label, "no unrestricted lookup, using declaration facility");
            host.declared_member(&owner, name, params, kind)
                .map_err(fail)?
        }
        Err(err) => return Err(fail(err)),
    };

    host.force_accessible(&member).map_err(fail)?;

    trace!(member = %label, "member located");
    Ok(ResolvedHandle {
        inner: Arc::new(HandleInner {
            descriptor: descriptor.clone(),
            member,
        }),
    })
}
