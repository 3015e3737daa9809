//! Type and member identities
//!
//! Runtime types are identified by their fully qualified name. Array types
//! are written with a `[]` suffix (`java.lang.String[]`). The runtime's own
//! descriptor form (`Ljava/lang/String;`) is available through
//! [`TypeRef::signature`] and is what hidden-API exemption prefixes match.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name-based identity of a runtime type
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    name: Arc<str>,
}

impl TypeRef {
    /// Create a type reference from a fully qualified name
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this names a primitive type
    pub fn is_primitive(&self) -> bool {
        primitive_code(&self.name).is_some()
    }

    /// Whether this names an array type
    pub fn is_array(&self) -> bool {
        self.name.ends_with("[]")
    }

    /// Element type of an array type
    pub fn element(&self) -> Option<TypeRef> {
        self.name.strip_suffix("[]").map(TypeRef::named)
    }

    /// Runtime descriptor signature, e.g. `[Ljava/lang/String;`
    pub fn signature(&self) -> String {
        let mut base = self.name();
        let mut out = String::new();
        while let Some(inner) = base.strip_suffix("[]") {
            out.push('[');
            base = inner;
        }
        match primitive_code(base) {
            Some(code) => out.push(code),
            None => {
                out.push('L');
                out.push_str(&base.replace('.', "/"));
                out.push(';');
            }
        }
        out
    }
}

fn primitive_code(name: &str) -> Option<char> {
    Some(match name {
        "boolean" => 'Z',
        "byte" => 'B',
        "char" => 'C',
        "short" => 'S',
        "int" => 'I',
        "long" => 'J',
        "float" => 'F',
        "double" => 'D',
        "void" => 'V',
        _ => return None,
    })
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::named(name)
    }
}

/// A type given either as a live reference or by name.
///
/// Names still need to be resolved through the runtime's privileged
/// type-resolution path before members can be looked up. Equality and
/// hashing only consider the qualified name, so both forms address the
/// same cache slot.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Already resolved by the runtime
    Ref(TypeRef),
    /// Fully qualified name, not yet resolved
    Name(String),
}

impl TypeSpec {
    /// Fully qualified name
    pub fn name(&self) -> &str {
        match self {
            TypeSpec::Ref(ty) => ty.name(),
            TypeSpec::Name(name) => name,
        }
    }
}

impl PartialEq for TypeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for TypeSpec {}

impl Hash for TypeSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<TypeRef> for TypeSpec {
    fn from(ty: TypeRef) -> Self {
        TypeSpec::Ref(ty)
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Name(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Name(name)
    }
}

/// Kind of member being addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Method (static or instance)
    Method,
    /// Field (static or instance), read-only access
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => f.write_str("method"),
            MemberKind::Field => f.write_str("field"),
        }
    }
}

/// Host-issued handle to a declared member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Host-side identifier, unique per declared member
    pub id: u64,
    /// Declaring type
    pub owner: TypeRef,
    /// Member name
    pub name: Arc<str>,
    /// Parameter shape (empty for fields)
    pub params: Arc<[TypeRef]>,
    /// Method or field
    pub kind: MemberKind,
    /// Whether the member is static
    pub is_static: bool,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)?;
        if self.kind == MemberKind::Method {
            f.write_str("(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", p)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_signature_forms() {
        assert_eq!(TypeRef::named("java.lang.String").signature(), "Ljava/lang/String;");
        assert_eq!(TypeRef::named("java.lang.String[]").signature(), "[Ljava/lang/String;");
        assert_eq!(TypeRef::named("int").signature(), "I");
        assert_eq!(TypeRef::named("long[][]").signature(), "[[J");
    }

    #[test]
    fn test_array_element() {
        let ty = TypeRef::named("java.lang.String[]");
        assert!(ty.is_array());
        assert_eq!(ty.element(), Some(TypeRef::named("java.lang.String")));
        assert!(!TypeRef::named("int").is_array());
        assert!(TypeRef::named("int").is_primitive());
    }

    #[test]
    fn test_type_spec_identity_by_name() {
        let by_ref = TypeSpec::from(TypeRef::named("android.app.ActivityManager"));
        let by_name = TypeSpec::from("android.app.ActivityManager");
        assert_eq!(by_ref, by_name);

        let mut set = HashSet::new();
        set.insert(by_ref);
        assert!(set.contains(&by_name));
    }
}
