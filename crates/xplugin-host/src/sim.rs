//! In-memory simulated runtime
//!
//! `SimRuntime` implements [`HostRuntime`] without a device. Types and
//! members are registered up front; member bodies are plain closures. The
//! simulation reproduces the behaviours the reflective core has to cope
//! with on real releases:
//!
//! - members are non-public unless marked otherwise and must be forced
//!   accessible before they can be invoked;
//! - at/above [`HIDDEN_API_GATE`], hidden members are rejected by the
//!   ordinary declaration lookup unless the owner's signature matches an
//!   exemption prefix;
//! - the unrestricted lookup skips hidden gating until the runtime is
//!   hardened with [`SimRuntime::harden_declaration_lookup`];
//! - sealed members refuse to be forced accessible.
//!
//! Lookups, invocations and package queries are counted so callers can
//! verify how often the runtime was actually consulted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::HostRuntime;
use crate::error::{HostError, HostResult};
use crate::types::{MemberKind, MemberRef, TypeRef};
use crate::value::{HostValue, ObjectRef};

/// First release that gates hidden members
pub const HIDDEN_API_GATE: u32 = 28;

/// Class used for context objects created by [`SimRuntime::new_context`]
pub const CONTEXT_CLASS: &str = "android.content.Context";

/// Member body signature
pub type SimBody = Arc<dyn Fn(&SimCall<'_>) -> HostResult<HostValue> + Send + Sync>;

/// Arguments handed to a member body
pub struct SimCall<'a> {
    /// The runtime executing the call
    pub runtime: &'a SimRuntime,
    /// Receiver (`None` for static members)
    pub receiver: Option<&'a HostValue>,
    /// Arguments, already checked against the parameter shape
    pub args: &'a [HostValue],
}

/// A member declared on a simulated type
#[derive(Clone)]
pub struct SimMember {
    name: String,
    params: Vec<TypeRef>,
    kind: MemberKind,
    is_static: bool,
    hidden: bool,
    public: bool,
    sealed: bool,
    body: SimBody,
}

impl SimMember {
    /// Declare a method with the given parameter type names
    pub fn method(name: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| TypeRef::named(p)).collect(),
            kind: MemberKind::Method,
            is_static: false,
            hidden: false,
            public: false,
            sealed: false,
            body: Arc::new(|_| Ok(HostValue::Null)),
        }
    }

    /// Declare a field holding `value`
    pub fn field(name: &str, value: HostValue) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            kind: MemberKind::Field,
            is_static: false,
            hidden: false,
            public: false,
            sealed: false,
            body: Arc::new(move |_| Ok(value.clone())),
        }
    }

    /// Mark as static
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as hidden (gated at/above [`HIDDEN_API_GATE`])
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark as public (invocable without forcing access)
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Refuse `force_accessible`
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Set the member body
    pub fn body(
        mut self,
        f: impl Fn(&SimCall<'_>) -> HostResult<HostValue> + Send + Sync + 'static,
    ) -> Self {
        self.body = Arc::new(f);
        self
    }

    /// Body that always returns `value`
    pub fn returns(self, value: HostValue) -> Self {
        self.body(move |_| Ok(value.clone()))
    }

    /// Body that always faults with `message`
    pub fn faults(self, message: &str) -> Self {
        let message = message.to_string();
        self.body(move |_| Err(HostError::TargetFault(message.clone())))
    }
}

/// A simulated type definition
pub struct SimType {
    name: String,
    superclass: Option<String>,
    members: Vec<SimMember>,
}

impl SimType {
    /// Start a type definition
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: None,
            members: Vec::new(),
        }
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    /// Declare a member
    pub fn member(mut self, member: SimMember) -> Self {
        self.members.push(member);
        self
    }
}

struct TypeEntry {
    superclass: Option<String>,
    member_ids: Vec<u64>,
}

struct Declared {
    owner: TypeRef,
    member: SimMember,
}

/// Simulated managed runtime
pub struct SimRuntime {
    release: u32,
    types: RwLock<FxHashMap<String, TypeEntry>>,
    members: RwLock<FxHashMap<u64, Declared>>,
    accessible: RwLock<FxHashSet<u64>>,
    exemptions: RwLock<Vec<String>>,
    contexts: RwLock<FxHashMap<u64, String>>,
    packages: RwLock<FxHashMap<String, PathBuf>>,
    invocations: Mutex<FxHashMap<String, usize>>,
    hardened: AtomicBool,
    next_id: AtomicU64,
    lookups: AtomicUsize,
    package_queries: AtomicUsize,
}

impl SimRuntime {
    /// Create a runtime reporting `release`, with the core language types
    pub fn new(release: u32) -> Self {
        let rt = Self {
            release,
            types: RwLock::new(FxHashMap::default()),
            members: RwLock::new(FxHashMap::default()),
            accessible: RwLock::new(FxHashSet::default()),
            exemptions: RwLock::new(Vec::new()),
            contexts: RwLock::new(FxHashMap::default()),
            packages: RwLock::new(FxHashMap::default()),
            invocations: Mutex::new(FxHashMap::default()),
            hardened: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            lookups: AtomicUsize::new(0),
            package_queries: AtomicUsize::new(0),
        };
        rt.add_type(SimType::new("java.lang.Object"));
        rt.add_type(SimType::new("java.lang.String"));
        rt.add_type(SimType::new("java.lang.Class"));
        rt
    }

    // ===== Setup =====

    /// Register a type and its members, replacing any previous definition
    pub fn add_type(&self, ty: SimType) -> TypeRef {
        let owner = TypeRef::named(&ty.name);
        let mut ids = Vec::with_capacity(ty.members.len());
        let mut types = self.types.write();
        {
            let mut members = self.members.write();
            if let Some(previous) = types.get(&ty.name) {
                let mut accessible = self.accessible.write();
                for id in &previous.member_ids {
                    members.remove(id);
                    accessible.remove(id);
                }
            }
            for member in ty.members {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                members.insert(
                    id,
                    Declared {
                        owner: owner.clone(),
                        member,
                    },
                );
                ids.push(id);
            }
        }
        types.insert(
            ty.name,
            TypeEntry {
                superclass: ty.superclass,
                member_ids: ids,
            },
        );
        owner
    }

    /// Allocate an object of `class`
    pub fn new_object(&self, class: &str) -> HostValue {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        HostValue::Object(ObjectRef::new(id, TypeRef::named(class)))
    }

    /// Allocate a context object belonging to `package`
    pub fn new_context(&self, package: &str) -> HostValue {
        let ctx = self.new_object(CONTEXT_CLASS);
        if let HostValue::Object(obj) = &ctx {
            self.contexts.write().insert(obj.id(), package.to_string());
        }
        ctx
    }

    /// Make `package` known to the package manager
    pub fn install_package(&self, package: &str, source_dir: impl AsRef<Path>) {
        self.packages
            .write()
            .insert(package.to_string(), source_dir.as_ref().to_path_buf());
    }

    /// Install `dalvik.system.VMRuntime` with `getRuntime()` and the hidden
    /// `setHiddenApiExemptions(String[])`
    pub fn install_vm_runtime(&self) -> TypeRef {
        let owner = "dalvik.system.VMRuntime";
        let instance = self.new_object(owner);
        self.add_type(
            SimType::new(owner)
                .member(
                    SimMember::method("getRuntime", &[])
                        .static_member()
                        .returns(instance),
                )
                .member(
                    SimMember::method("setHiddenApiExemptions", &["java.lang.String[]"])
                        .hidden()
                        .body(|call| match call.args.first() {
                            Some(HostValue::StrArray(prefixes)) => {
                                call.runtime.set_exemptions(prefixes.to_vec());
                                Ok(HostValue::Null)
                            }
                            _ => Err(HostError::IllegalArgument(
                                "expected String[] of signature prefixes".to_string(),
                            )),
                        }),
                ),
        )
    }

    /// Make the unrestricted lookup subject to hidden gating
    pub fn harden_declaration_lookup(&self) {
        self.hardened.store(true, Ordering::Relaxed);
    }

    /// Replace the hidden-API exemption prefixes
    pub fn set_exemptions(&self, prefixes: Vec<String>) {
        *self.exemptions.write() = prefixes;
    }

    // ===== Instrumentation =====

    /// Current hidden-API exemption prefixes
    pub fn exemptions(&self) -> Vec<String> {
        self.exemptions.read().clone()
    }

    /// Number of declaration lookups served
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of times `owner.name` reached the runtime's invoke path
    pub fn invocation_count(&self, owner: &str, name: &str) -> usize {
        self.invocations
            .lock()
            .get(&format!("{}.{}", owner, name))
            .copied()
            .unwrap_or(0)
    }

    /// Number of package-manager queries served
    pub fn package_query_count(&self) -> usize {
        self.package_queries.load(Ordering::Relaxed)
    }

    // ===== Internals =====

    fn is_exempt(&self, owner: &TypeRef) -> bool {
        let sig = owner.signature();
        self.exemptions
            .read()
            .iter()
            .any(|prefix| sig.starts_with(prefix.as_str()))
    }

    fn is_subtype(&self, ty: &TypeRef, target: &TypeRef) -> bool {
        if target.name() == "java.lang.Object" {
            return true;
        }
        let types = self.types.read();
        let mut current = Some(ty.name().to_string());
        while let Some(name) = current {
            if name == target.name() {
                return true;
            }
            current = types.get(&name).and_then(|t| t.superclass.clone());
        }
        false
    }

    fn lookup(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
        kind: MemberKind,
        gated: bool,
    ) -> HostResult<MemberRef> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let types = self.types.read();
        let entry = types
            .get(owner.name())
            .ok_or_else(|| HostError::TypeNotFound(owner.name().to_string()))?;
        let members = self.members.read();

        let mut saw_name = false;
        for id in &entry.member_ids {
            let Some(declared) = members.get(id) else {
                continue;
            };
            let member = &declared.member;
            if member.name != name || member.kind != kind {
                continue;
            }
            saw_name = true;
            if member.params.as_slice() != params {
                continue;
            }
            if gated && member.hidden && self.release >= HIDDEN_API_GATE && !self.is_exempt(owner)
            {
                return Err(HostError::Hidden(format!("{}.{}", owner, name)));
            }
            return Ok(MemberRef {
                id: *id,
                owner: owner.clone(),
                name: Arc::from(name),
                params: Arc::from(member.params.clone()),
                kind,
                is_static: member.is_static,
            });
        }

        if saw_name {
            Err(HostError::SignatureMismatch {
                owner: owner.name().to_string(),
                name: name.to_string(),
                expected: params
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        } else {
            Err(HostError::NoSuchMember {
                owner: owner.name().to_string(),
                name: name.to_string(),
            })
        }
    }
}

impl HostRuntime for SimRuntime {
    fn release(&self) -> u32 {
        self.release
    }

    fn find_type_privileged(&self, name: &str) -> HostResult<TypeRef> {
        if self.types.read().contains_key(name) {
            Ok(TypeRef::named(name))
        } else {
            Err(HostError::TypeNotFound(name.to_string()))
        }
    }

    fn declared_member(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
        kind: MemberKind,
    ) -> HostResult<MemberRef> {
        self.lookup(owner, name, params, kind, true)
    }

    fn declared_member_unrestricted(
        &self,
        owner: &TypeRef,
        name: &str,
        params: &[TypeRef],
        kind: MemberKind,
    ) -> HostResult<MemberRef> {
        let gated = self.hardened.load(Ordering::Relaxed);
        self.lookup(owner, name, params, kind, gated)
    }

    fn force_accessible(&self, member: &MemberRef) -> HostResult<()> {
        let sealed = {
            let members = self.members.read();
            let declared = members.get(&member.id).ok_or_else(|| HostError::NoSuchMember {
                owner: member.owner.name().to_string(),
                name: member.name.to_string(),
            })?;
            declared.member.sealed
        };
        if sealed {
            return Err(HostError::AccessDenied(member.to_string()));
        }
        self.accessible.write().insert(member.id);
        Ok(())
    }

    fn is_assignable(&self, ty: &TypeRef, value: &HostValue) -> bool {
        let name = ty.name();
        match value {
            HostValue::Null => !ty.is_primitive(),
            HostValue::Bool(_) => name == "boolean",
            HostValue::Int(_) => name == "int",
            HostValue::Long(_) => name == "long",
            HostValue::Str(_) => matches!(
                name,
                "java.lang.String" | "java.lang.CharSequence" | "java.lang.Object"
            ),
            HostValue::StrArray(_) => matches!(name, "java.lang.String[]" | "java.lang.Object"),
            HostValue::Type(_) => matches!(name, "java.lang.Class" | "java.lang.Object"),
            HostValue::Object(obj) => self.is_subtype(obj.class(), ty),
        }
    }

    fn invoke(
        &self,
        member: &MemberRef,
        receiver: Option<&HostValue>,
        args: &[HostValue],
    ) -> HostResult<HostValue> {
        *self
            .invocations
            .lock()
            .entry(format!("{}.{}", member.owner, member.name))
            .or_insert(0) += 1;

        // Clone out of the lock: bodies may call back into the runtime
        let (owner, declared) = {
            let members = self.members.read();
            let declared = members.get(&member.id).ok_or_else(|| HostError::NoSuchMember {
                owner: member.owner.name().to_string(),
                name: member.name.to_string(),
            })?;
            (declared.owner.clone(), declared.member.clone())
        };

        if !declared.public && !self.accessible.read().contains(&member.id) {
            return Err(HostError::AccessDenied(member.to_string()));
        }

        if !declared.is_static {
            match receiver {
                None | Some(HostValue::Null) => {
                    return Err(HostError::IllegalArgument(format!(
                        "null receiver for {}",
                        member
                    )));
                }
                Some(r) if !self.is_assignable(&owner, r) => {
                    return Err(HostError::IllegalArgument(format!(
                        "receiver {} is not a {}",
                        r.type_name(),
                        owner
                    )));
                }
                Some(_) => {}
            }
        }

        if args.len() != declared.params.len() {
            return Err(HostError::IllegalArgument(format!(
                "{} expects {} arguments, got {}",
                member,
                declared.params.len(),
                args.len()
            )));
        }
        for (param, arg) in declared.params.iter().zip(args) {
            if !self.is_assignable(param, arg) {
                return Err(HostError::IllegalArgument(format!(
                    "argument {} is not a {}",
                    arg.type_name(),
                    param
                )));
            }
        }

        (declared.body)(&SimCall {
            runtime: self,
            receiver,
            args,
        })
    }

    fn application_package(&self, context: &HostValue) -> HostResult<String> {
        let obj = context.as_object().ok_or_else(|| {
            HostError::IllegalArgument(format!("not a context: {}", context.type_name()))
        })?;
        self.contexts
            .read()
            .get(&obj.id())
            .cloned()
            .ok_or_else(|| HostError::IllegalArgument(format!("not a context: {}", obj.class())))
    }

    fn package_source_dir(&self, package: &str) -> HostResult<PathBuf> {
        self.package_queries.fetch_add(1, Ordering::Relaxed);
        self.packages
            .read()
            .get(package)
            .cloned()
            .ok_or_else(|| HostError::PackageNotFound(package.to_string()))
    }
}
