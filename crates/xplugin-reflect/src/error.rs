//! Error taxonomy of the reflective-access layer
//!
//! Lookup and invocation failures are ordinary values: the probe runner and
//! the plugin facade turn them into absence. Only [`BootstrapError`] is meant
//! to reach the caller.

use std::fmt;

use thiserror::Error;
use xplugin_host::HostError;

/// Why a member could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupReason {
    /// The type or member does not exist on this release
    NotFound,
    /// The member exists but visibility or hidden gating could not be bypassed
    AccessDenied,
    /// A member with this name exists with a different parameter shape
    ShapeMismatch,
}

impl fmt::Display for LookupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupReason::NotFound => f.write_str("not found"),
            LookupReason::AccessDenied => f.write_str("access denied"),
            LookupReason::ShapeMismatch => f.write_str("shape mismatch"),
        }
    }
}

/// Member resolution failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot resolve {member}: {reason}")]
pub struct LookupError {
    /// Failure class
    pub reason: LookupReason,
    /// Member being resolved, as `owner#name(params)`
    pub member: String,
    /// Underlying host failure
    #[source]
    pub cause: Option<HostError>,
}

impl LookupError {
    /// Create a lookup error without a host cause
    pub fn new(reason: LookupReason, member: impl Into<String>) -> Self {
        Self {
            reason,
            member: member.into(),
            cause: None,
        }
    }

    /// Classify a host failure raised while resolving `member`
    pub fn from_host(member: impl Into<String>, cause: HostError) -> Self {
        let reason = match &cause {
            HostError::Hidden(_) | HostError::AccessDenied(_) => LookupReason::AccessDenied,
            HostError::SignatureMismatch { .. } => LookupReason::ShapeMismatch,
            _ => LookupReason::NotFound,
        };
        Self {
            reason,
            member: member.into(),
            cause: Some(cause),
        }
    }
}

/// Why an invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationReason {
    /// Receiver or arguments don't match the handle's shape
    ArgMismatch,
    /// The invoked member itself faulted
    TargetFailure,
    /// The member returned a value of an unexpected type
    ResultMismatch,
}

impl fmt::Display for InvocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationReason::ArgMismatch => f.write_str("argument mismatch"),
            InvocationReason::TargetFailure => f.write_str("target failure"),
            InvocationReason::ResultMismatch => f.write_str("result mismatch"),
        }
    }
}

/// Invocation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invocation of {member} failed: {reason}: {detail}")]
pub struct InvocationError {
    /// Failure class
    pub reason: InvocationReason,
    /// Member being invoked
    pub member: String,
    /// Human readable detail
    pub detail: String,
    /// Underlying host failure
    #[source]
    pub cause: Option<HostError>,
}

impl InvocationError {
    /// Receiver/argument mismatch detected before reaching the runtime
    pub fn arg_mismatch(member: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            reason: InvocationReason::ArgMismatch,
            member: member.into(),
            detail: detail.into(),
            cause: None,
        }
    }

    /// Classify a host failure raised by the invoke path
    pub fn from_host(member: impl Into<String>, cause: HostError) -> Self {
        let reason = match &cause {
            HostError::IllegalArgument(_) => InvocationReason::ArgMismatch,
            HostError::TypeMismatch { .. } => InvocationReason::ResultMismatch,
            _ => InvocationReason::TargetFailure,
        };
        Self {
            reason,
            member: member.into(),
            detail: cause.to_string(),
            cause: Some(cause),
        }
    }
}

/// Failure of a single probe strategy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Member could not be resolved
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Member could not be invoked
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A direct host query failed
    #[error(transparent)]
    Host(#[from] HostError),

    /// The strategy ran but produced nothing usable (e.g. a null field)
    #[error("Strategy produced no value: {0}")]
    Absent(String),
}

/// Fatal initialization failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// `init()` was re-entered from within its own resolution
    #[error("Plugin init re-entered while resolving its own handles")]
    Reentrant,

    /// A handle every later operation depends on could not be resolved
    #[error("Plugin init failed: required member {member} unavailable")]
    MissingHandle {
        /// Descriptor of the missing member
        member: String,
        /// Resolution failure
        #[source]
        source: LookupError,
    },
}

/// Result type for reflective calls that may fail in either phase
pub type ReflectResult<T> = Result<T, ProbeError>;
