//! Invocation Adapter
//!
//! Uniform call contract over a [`ResolvedHandle`], whatever member shape the
//! locator found. Receiver and arguments are checked against the handle
//! before the runtime is entered; target-side failures are wrapped, never
//! swallowed.

use xplugin_host::{FromHost, HostRuntime, HostValue, MemberKind};

use crate::error::{InvocationError, InvocationReason};
use crate::locator::ResolvedHandle;

/// Invoke a method or read a field.
///
/// `receiver` must be absent or null for static members and a non-null
/// value otherwise. Fields take no arguments.
pub fn invoke(
    host: &dyn HostRuntime,
    handle: &ResolvedHandle,
    receiver: Option<&HostValue>,
    args: &[HostValue],
) -> Result<HostValue, InvocationError> {
    let label = handle.descriptor().to_string();

    match (handle.is_static(), receiver) {
        (true, Some(r)) if !r.is_null() => {
            return Err(InvocationError::arg_mismatch(
                label,
                "static member invoked with a receiver",
            ));
        }
        (false, None) | (false, Some(HostValue::Null)) => {
            return Err(InvocationError::arg_mismatch(
                label,
                "instance member invoked without a receiver",
            ));
        }
        _ => {}
    }

    if handle.kind() == MemberKind::Field && !args.is_empty() {
        return Err(InvocationError::arg_mismatch(label, "field read takes no arguments"));
    }

    let params = handle.params();
    if args.len() != params.len() {
        return Err(InvocationError::arg_mismatch(
            label,
            format!("expected {} arguments, got {}", params.len(), args.len()),
        ));
    }
    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        if !host.is_assignable(param, arg) {
            return Err(InvocationError::arg_mismatch(
                label,
                format!("argument {} ({}) is not assignable to {}", i, arg.type_name(), param),
            ));
        }
    }

    host.invoke(handle.member(), receiver, args)
        .map_err(|cause| InvocationError::from_host(label, cause))
}

/// Invoke and convert the result
pub fn invoke_as<T: FromHost>(
    host: &dyn HostRuntime,
    handle: &ResolvedHandle,
    receiver: Option<&HostValue>,
    args: &[HostValue],
) -> Result<T, InvocationError> {
    let value = invoke(host, handle, receiver, args)?;
    T::from_host(value).map_err(|cause| InvocationError {
        reason: InvocationReason::ResultMismatch,
        member: handle.descriptor().to_string(),
        detail: cause.to_string(),
        cause: Some(cause),
    })
}
