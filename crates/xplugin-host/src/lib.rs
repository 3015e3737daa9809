//! xplugin host SDK - abstract view of the managed runtime
//!
//! This crate provides the types and traits the reflective-access core
//! needs from the running platform, without depending on any particular
//! runtime binding:
//!
//! - [`TypeRef`], [`TypeSpec`], [`MemberRef`]: type and member identities
//! - [`HostValue`]: values crossing the runtime boundary
//! - [`HostRuntime`]: type introspection, forced access, invocation and
//!   package queries
//! - [`FromHost`] / [`ToHost`]: conversions to and from Rust types
//! - [`sim::SimRuntime`]: an in-memory runtime for tests and embedding
//!
//! # Example
//!
//! ```ignore
//! use xplugin_host::sim::{SimMember, SimRuntime, SimType};
//! use xplugin_host::HostValue;
//!
//! let rt = SimRuntime::new(29);
//! rt.add_type(
//!     SimType::new("android.app.ActivityTaskManager").member(
//!         SimMember::field("IActivityTaskManagerSingleton", HostValue::Int(1)).static_member(),
//!     ),
//! );
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod convert;
pub mod error;
pub mod sim;
pub mod types;
pub mod value;

pub use context::HostRuntime;
pub use convert::{FromHost, ToHost};
pub use error::{HostError, HostResult};
pub use types::{MemberKind, MemberRef, TypeRef, TypeSpec};
pub use value::{HostValue, ObjectRef};
