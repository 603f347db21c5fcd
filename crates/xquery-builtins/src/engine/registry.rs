use crate::engine::call::{
    BoundFunction, DynamicContext, EagerContextFn, Implementation, PreEvaluatedFn,
};
use crate::engine::diagnostics::{DiagnosticSink, Payload, Phase};
use crate::engine::runtime::{Error, ErrorCode};
use crate::engine::types::SequenceType;
use crate::xdm::{ExpandedName, XdmSequence};
use core::fmt;
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

pub type Arity = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: SequenceType,
}

/// Immutable description of a function: what it is called, what it accepts and what
/// it returns. Built once while the registry is assembled and shared by every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: ExpandedName,
    pub description: String,
    pub params: SmallVec<[Param; 4]>,
    pub return_type: SequenceType,
    /// The last parameter may be repeated; calls need at least `params.len()` arguments.
    pub variadic: bool,
    /// Points callers to the replacement when this name is kept for compatibility.
    pub deprecated: Option<String>,
}

impl FunctionSignature {
    pub fn new(name: ExpandedName, return_type: SequenceType) -> Self {
        Self {
            name,
            description: String::new(),
            params: SmallVec::new(),
            return_type,
            variadic: false,
            deprecated: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: SequenceType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn min_arity(&self) -> Arity {
        self.params.len()
    }

    pub fn max_arity(&self) -> Option<Arity> {
        (!self.variadic).then_some(self.params.len())
    }

    pub fn accepts_arity(&self, argc: Arity) -> bool {
        argc >= self.min_arity() && self.max_arity().is_none_or(|m| argc <= m)
    }

    /// Declared type of argument `idx`; arguments past the last parameter of a variadic
    /// signature share the last parameter's type.
    pub fn param_type(&self, idx: usize) -> Option<&SequenceType> {
        match self.params.get(idx) {
            Some(p) => Some(&p.ty),
            None if self.variadic => self.params.last().map(|p| &p.ty),
            None => None,
        }
    }

    /// The same contract published under a legacy name.
    pub fn deprecated_as(&self, name: ExpandedName, note: impl Into<String>) -> Self {
        Self {
            name,
            deprecated: Some(note.into()),
            ..self.clone()
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("${} as {}", p.name, p.ty))
            .join(", ");
        let ellipsis = if self.variadic { ", ..." } else { "" };
        write!(
            f,
            "{}({params}{ellipsis}) as {}",
            self.name, self.return_type
        )
    }
}

/// A signature together with the code that runs it.
pub struct FunctionDef<N> {
    pub signature: Arc<FunctionSignature>,
    pub implementation: Implementation<N>,
}

impl<N> FunctionDef<N> {
    pub fn pre_evaluated<F>(signature: FunctionSignature, f: F) -> Self
    where
        F: 'static
            + Send
            + Sync
            + Fn(&DynamicContext<'_, N>, &[XdmSequence<N>]) -> Result<XdmSequence<N>, Error>,
    {
        let f: PreEvaluatedFn<N> = Arc::new(f);
        Self {
            signature: Arc::new(signature),
            implementation: Implementation::PreEvaluated(f),
        }
    }

    pub fn eager_context<F>(signature: FunctionSignature, f: F) -> Self
    where
        F: 'static + Send + Sync + Fn(&DynamicContext<'_, N>) -> Result<XdmSequence<N>, Error>,
    {
        let f: EagerContextFn<N> = Arc::new(f);
        Self {
            signature: Arc::new(signature),
            implementation: Implementation::EagerContext(f),
        }
    }
}

/// Error type returned by function resolution.
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// No function with this name exists.
    Unknown { name: ExpandedName, arity: Arity },
    /// Function exists, but does not accept the requested arity.
    WrongArity {
        name: ExpandedName,
        arity: Arity,
        signature: String,
    },
}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Unknown { name, arity } => Error::from_code(
                ErrorCode::XPST0017,
                format!("unknown function: {name}#{arity}"),
            ),
            ResolveError::WrongArity {
                name,
                arity,
                signature,
            } => Error::from_code(
                ErrorCode::XPST0017,
                format!("{name} called with {arity} argument(s); expected {signature}"),
            ),
        }
    }
}

pub enum RegistryEntry<N> {
    Current(Arc<FunctionDef<N>>),
    /// A legacy name forwarding to a current definition. The signature carries the
    /// legacy name and the deprecation note; behaviour is the current definition's.
    Deprecated {
        signature: Arc<FunctionSignature>,
        current: Arc<FunctionDef<N>>,
    },
}

impl<N> RegistryEntry<N> {
    pub fn signature(&self) -> &Arc<FunctionSignature> {
        match self {
            RegistryEntry::Current(def) => &def.signature,
            RegistryEntry::Deprecated { signature, .. } => signature,
        }
    }

    pub fn definition(&self) -> &Arc<FunctionDef<N>> {
        match self {
            RegistryEntry::Current(def) | RegistryEntry::Deprecated { current: def, .. } => def,
        }
    }
}

struct DeprecatedAlias {
    name: ExpandedName,
    target: ExpandedName,
    note: String,
}

/// Collects definitions and legacy aliases; [`build`](Self::build) freezes them.
pub struct FunctionRegistryBuilder<N> {
    defs: HashMap<ExpandedName, Arc<FunctionDef<N>>>,
    aliases: Vec<DeprecatedAlias>,
}

impl<N> Default for FunctionRegistryBuilder<N> {
    fn default() -> Self {
        Self {
            defs: HashMap::new(),
            aliases: Vec::new(),
        }
    }
}

fn duplicate(name: &ExpandedName, existing: &FunctionSignature, arity_hint: &str) -> Error {
    Error::from_code(
        ErrorCode::XQST0034,
        format!("{name} is already registered as {existing}{arity_hint}"),
    )
}

impl<N> FunctionRegistryBuilder<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. A name can be registered once; a second registration fails
    /// whether or not its arity differs.
    pub fn register(&mut self, def: FunctionDef<N>) -> Result<(), Error> {
        let name = def.signature.name.clone();
        if self.aliases.iter().any(|a| a.name == name) {
            return Err(Error::from_code(
                ErrorCode::XQST0034,
                format!("{name} is already registered as a deprecated alias"),
            ));
        }
        match self.defs.entry(name) {
            Entry::Vacant(e) => {
                e.insert(Arc::new(def));
                Ok(())
            }
            Entry::Occupied(e) => {
                let existing = &e.get().signature;
                let hint = if existing.min_arity() == def.signature.min_arity()
                    && existing.variadic == def.signature.variadic
                {
                    ""
                } else {
                    " with a different arity"
                };
                Err(duplicate(e.key(), existing, hint))
            }
        }
    }

    pub fn register_pre_evaluated<F>(
        &mut self,
        signature: FunctionSignature,
        f: F,
    ) -> Result<(), Error>
    where
        F: 'static
            + Send
            + Sync
            + Fn(&DynamicContext<'_, N>, &[XdmSequence<N>]) -> Result<XdmSequence<N>, Error>,
    {
        self.register(FunctionDef::pre_evaluated(signature, f))
    }

    pub fn register_eager_context<F>(
        &mut self,
        signature: FunctionSignature,
        f: F,
    ) -> Result<(), Error>
    where
        F: 'static + Send + Sync + Fn(&DynamicContext<'_, N>) -> Result<XdmSequence<N>, Error>,
    {
        self.register(FunctionDef::eager_context(signature, f))
    }

    /// Publish `target` under the legacy name `name`. The target may be registered
    /// later; aliases resolve in [`build`](Self::build).
    pub fn deprecate(
        &mut self,
        name: ExpandedName,
        target: ExpandedName,
        note: impl Into<String>,
    ) -> Result<(), Error> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(Error::from_code(
                ErrorCode::FOER0000,
                format!("deprecated alias {name} needs a note naming its replacement"),
            ));
        }
        if let Some(existing) = self.defs.get(&name) {
            return Err(duplicate(&name, &existing.signature, ""));
        }
        if self.aliases.iter().any(|a| a.name == name) {
            return Err(Error::from_code(
                ErrorCode::XQST0034,
                format!("{name} is already registered as a deprecated alias"),
            ));
        }
        self.aliases.push(DeprecatedAlias { name, target, note });
        Ok(())
    }

    pub fn build(self) -> Result<FunctionRegistry<N>, Error> {
        let mut entries: HashMap<ExpandedName, RegistryEntry<N>> = self
            .defs
            .iter()
            .map(|(name, def)| (name.clone(), RegistryEntry::Current(Arc::clone(def))))
            .collect();
        let alias_count = self.aliases.len();
        for alias in self.aliases {
            let current = self.defs.get(&alias.target).ok_or_else(|| {
                Error::from_code(
                    ErrorCode::XPST0017,
                    format!(
                        "deprecated alias {} targets unknown function {}",
                        alias.name, alias.target
                    ),
                )
            })?;
            let signature = Arc::new(
                current
                    .signature
                    .deprecated_as(alias.name.clone(), alias.note),
            );
            entries.insert(
                alias.name,
                RegistryEntry::Deprecated {
                    signature,
                    current: Arc::clone(current),
                },
            );
        }
        tracing::debug!(
            functions = self.defs.len(),
            aliases = alias_count,
            "function registry built"
        );
        Ok(FunctionRegistry { entries })
    }
}

/// Frozen name → function map. Read-only after construction, so a single instance can
/// be shared by concurrent queries.
pub struct FunctionRegistry<N> {
    entries: HashMap<ExpandedName, RegistryEntry<N>>,
}

impl<N> FunctionRegistry<N> {
    pub fn builder() -> FunctionRegistryBuilder<N> {
        FunctionRegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Signatures of every registered name, sorted by their display form.
    pub fn signatures(&self) -> Vec<&FunctionSignature> {
        self.entries
            .values()
            .map(|e| e.signature().as_ref())
            .sorted_by_cached_key(|s| s.to_string())
            .collect()
    }

    pub fn lookup(
        &self,
        name: &ExpandedName,
        arity: Arity,
    ) -> Result<&RegistryEntry<N>, ResolveError> {
        let Some(entry) = self.entries.get(name) else {
            return Err(ResolveError::Unknown {
                name: name.clone(),
                arity,
            });
        };
        let signature = entry.signature();
        if signature.accepts_arity(arity) {
            Ok(entry)
        } else {
            Err(ResolveError::WrongArity {
                name: name.clone(),
                arity,
                signature: signature.to_string(),
            })
        }
    }

    /// Resolve a call site. A deprecated name reports its note here (once per binding),
    /// not on every evaluation of the bound function.
    pub fn bind(
        &self,
        name: &ExpandedName,
        arity: Arity,
        sink: &dyn DiagnosticSink<N>,
    ) -> Result<BoundFunction<N>, Error> {
        let entry = self.lookup(name, arity)?;
        let signature = Arc::clone(entry.signature());
        if let Some(note) = signature.deprecated.as_deref() {
            tracing::warn!(function = %name, note, "call to deprecated function");
            sink.event(name, Phase::Bind, Payload::Deprecated(note));
        }
        Ok(BoundFunction {
            signature,
            definition: Arc::clone(entry.definition()),
            arity,
        })
    }
}
