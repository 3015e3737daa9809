//! Conversions between host values and Rust types.
//!
//! Implement [`FromHost`] to extract a Rust value from an invocation
//! result, and [`ToHost`] to pass a Rust value as an argument.

use std::path::PathBuf;

use crate::error::{HostError, HostResult};
use crate::types::TypeRef;
use crate::value::{HostValue, ObjectRef};

/// Convert from a host value to a Rust type.
pub trait FromHost: Sized {
    /// Convert, returning `TypeMismatch` if the runtime type doesn't match
    fn from_host(value: HostValue) -> HostResult<Self>;
}

/// Convert from a Rust type to a host value.
pub trait ToHost {
    /// Convert to a host value
    fn to_host(self) -> HostValue;
}

fn mismatch(expected: &str, value: &HostValue) -> HostError {
    HostError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

impl FromHost for HostValue {
    fn from_host(value: HostValue) -> HostResult<Self> {
        Ok(value)
    }
}

impl FromHost for i32 {
    fn from_host(value: HostValue) -> HostResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", &value))
    }
}

impl FromHost for i64 {
    fn from_host(value: HostValue) -> HostResult<Self> {
        match value {
            HostValue::Long(i) => Ok(i),
            HostValue::Int(i) => Ok(i as i64),
            other => Err(mismatch("long", &other)),
        }
    }
}

impl FromHost for bool {
    fn from_host(value: HostValue) -> HostResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("boolean", &value))
    }
}

impl FromHost for String {
    fn from_host(value: HostValue) -> HostResult<Self> {
        match value {
            HostValue::Str(s) => Ok(s.to_string()),
            other => Err(mismatch("java.lang.String", &other)),
        }
    }
}

impl FromHost for PathBuf {
    fn from_host(value: HostValue) -> HostResult<Self> {
        String::from_host(value).map(PathBuf::from)
    }
}

impl FromHost for TypeRef {
    fn from_host(value: HostValue) -> HostResult<Self> {
        match value {
            HostValue::Type(ty) => Ok(ty),
            other => Err(mismatch("java.lang.Class", &other)),
        }
    }
}

impl FromHost for ObjectRef {
    fn from_host(value: HostValue) -> HostResult<Self> {
        match value {
            HostValue::Object(obj) => Ok(obj),
            other => Err(mismatch("java.lang.Object", &other)),
        }
    }
}

// Null maps to None, anything else must convert
impl<T: FromHost> FromHost for Option<T> {
    fn from_host(value: HostValue) -> HostResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_host(value).map(Some)
        }
    }
}

impl ToHost for HostValue {
    fn to_host(self) -> HostValue {
        self
    }
}

impl ToHost for i32 {
    fn to_host(self) -> HostValue {
        HostValue::Int(self)
    }
}

impl ToHost for bool {
    fn to_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl ToHost for &str {
    fn to_host(self) -> HostValue {
        HostValue::str(self)
    }
}

impl ToHost for String {
    fn to_host(self) -> HostValue {
        HostValue::str(self)
    }
}

impl ToHost for Vec<String> {
    fn to_host(self) -> HostValue {
        HostValue::str_array(self)
    }
}

impl ToHost for TypeRef {
    fn to_host(self) -> HostValue {
        HostValue::Type(self)
    }
}

// Void methods
impl ToHost for () {
    fn to_host(self) -> HostValue {
        HostValue::Null
    }
}
