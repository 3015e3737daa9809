//! Error types reported by the host runtime

/// Result type for host runtime calls
pub type HostResult<T> = Result<T, HostError>;

/// Failures raised by the host's reflective facilities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The type name could not be resolved
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// The owner type declares no member with this name and kind
    #[error("No such member: {owner}.{name}")]
    NoSuchMember {
        /// Owner type name
        owner: String,
        /// Member name
        name: String,
    },

    /// A member with this name exists but its parameter shape differs
    #[error("Signature mismatch for {owner}.{name}: expected ({expected})")]
    SignatureMismatch {
        /// Owner type name
        owner: String,
        /// Member name
        name: String,
        /// Parameter shape the lookup asked for
        expected: String,
    },

    /// The member is gated by the hidden-API policy of this release
    #[error("Hidden member: {0}")]
    Hidden(String),

    /// Visibility could not be bypassed
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Receiver or arguments rejected by the runtime
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// The invoked member itself faulted
    #[error("Target faulted: {0}")]
    TargetFault(String),

    /// A value had an unexpected runtime type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// The package manager has no such package
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// The host does not offer this facility
    #[error("Unsupported: {0}")]
    Unsupported(String),
}
