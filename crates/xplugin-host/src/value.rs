//! Runtime values passed across the host boundary

use std::fmt;
use std::sync::Arc;

use crate::types::TypeRef;

/// Reference to an object living in the host runtime.
///
/// Only the host can dereference it; the core forwards it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    id: u64,
    class: TypeRef,
}

impl ObjectRef {
    /// Create an object reference (used by host implementations)
    pub fn new(id: u64, class: TypeRef) -> Self {
        Self { id, class }
    }

    /// Host-side object identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runtime class of the object
    pub fn class(&self) -> &TypeRef {
        &self.class
    }
}

/// A value produced or consumed by the host runtime
#[derive(Clone, PartialEq)]
pub enum HostValue {
    /// Null reference
    Null,
    /// boolean
    Bool(bool),
    /// int
    Int(i32),
    /// long
    Long(i64),
    /// java.lang.String
    Str(Arc<str>),
    /// java.lang.String[]
    StrArray(Arc<[String]>),
    /// java.lang.Class
    Type(TypeRef),
    /// Any other object
    Object(ObjectRef),
}

impl HostValue {
    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        HostValue::Str(Arc::from(s.as_ref()))
    }

    /// Create a string array value
    pub fn str_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        HostValue::StrArray(Arc::from(items))
    }

    /// Check if this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Get as boolean if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an int
    pub fn as_int(&self) -> Option<i32> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 if this is a long
    pub fn as_long(&self) -> Option<i64> {
        match self {
            HostValue::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as type reference if this is a class object
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            HostValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// Get as object reference if this is a plain object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Name of the runtime type of this value
    pub fn type_name(&self) -> &str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Int(_) => "int",
            HostValue::Long(_) => "long",
            HostValue::Str(_) => "java.lang.String",
            HostValue::StrArray(_) => "java.lang.String[]",
            HostValue::Type(_) => "java.lang.Class",
            HostValue::Object(obj) => obj.class().name(),
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::Null
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "HostValue::Null"),
            HostValue::Bool(b) => write!(f, "HostValue::Bool({})", b),
            HostValue::Int(i) => write!(f, "HostValue::Int({})", i),
            HostValue::Long(i) => write!(f, "HostValue::Long({})", i),
            HostValue::Str(s) => write!(f, "HostValue::Str({:?})", s),
            HostValue::StrArray(items) => write!(f, "HostValue::StrArray({:?})", items),
            HostValue::Type(ty) => write!(f, "HostValue::Type({})", ty),
            HostValue::Object(obj) => write!(f, "HostValue::Object({}@{:#x})", obj.class(), obj.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_value_accessors() {
        assert!(HostValue::Null.is_null());
        assert_eq!(HostValue::Int(7).as_int(), Some(7));
        assert_eq!(HostValue::Int(7).as_long(), None);
        assert_eq!(HostValue::str("abc").as_str(), Some("abc"));

        let obj = HostValue::Object(ObjectRef::new(3, TypeRef::named("android.content.Context")));
        assert_eq!(obj.type_name(), "android.content.Context");
        assert_eq!(obj.as_object().map(|o| o.id()), Some(3));
    }

    #[test]
    fn test_str_array_type_name() {
        let v = HostValue::str_array(["L"]);
        assert_eq!(v.type_name(), "java.lang.String[]");
    }
}
