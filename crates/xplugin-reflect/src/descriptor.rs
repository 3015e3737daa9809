//! Member descriptors
//!
//! A descriptor names a member by owner type, member name, parameter shape
//! and kind. It is the key of the handle cache: two descriptors address the
//! same slot exactly when all four parts are equal (owner compared by
//! qualified name, whether given as a live reference or a string).

use std::fmt;
use std::sync::Arc;

use xplugin_host::{MemberKind, TypeRef, TypeSpec};

/// Immutable description of a member to resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    owner: TypeSpec,
    name: Arc<str>,
    params: Arc<[TypeRef]>,
    kind: MemberKind,
}

impl MemberDescriptor {
    /// Describe a method by owner, name and parameter type names
    pub fn method(owner: impl Into<TypeSpec>, name: &str, params: &[&str]) -> Self {
        Self {
            owner: owner.into(),
            name: Arc::from(name),
            params: params.iter().map(|p| TypeRef::named(p)).collect(),
            kind: MemberKind::Method,
        }
    }

    /// Describe a field by owner and name
    pub fn field(owner: impl Into<TypeSpec>, name: &str) -> Self {
        Self {
            owner: owner.into(),
            name: Arc::from(name),
            params: Arc::from(Vec::new()),
            kind: MemberKind::Field,
        }
    }

    /// Owner type
    pub fn owner(&self) -> &TypeSpec {
        &self.owner
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter shape
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Method or field
    pub fn kind(&self) -> MemberKind {
        self.kind
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.name)?;
        if self.kind == MemberKind::Method {
            let params: Vec<&str> = self.params.iter().map(|p| p.name()).collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}
