//! Turning typed captures into values.
//!
//! The tree stores a type by name only. A [`TypeProvider`] resolves the name
//! when a value is requested, and the resolved [`ParserType`] compiles the
//! entry into a [`serde_json::Value`].

use crate::diagnostic::{CompilationContext, Diagnostic};
use crate::error::{ResultError, ResultResult};
use crate::tree::TreeRef;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name the built-in error sentinel is registered under
pub const ERROR_TYPE_NAME: &str = "$Error";

pub trait ParserType: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Compile entry `index` of `tree` into a value
    fn compile(
        &self,
        tree: TreeRef<'_>,
        index: usize,
        parameter: Option<&str>,
        context: &mut dyn CompilationContext,
        types: &dyn TypeProvider,
    ) -> ResultResult<Value>;

    /// Entries of an error type are reported by the error scan
    fn is_error(&self) -> bool {
        false
    }
}

pub trait TypeProvider {
    fn type_named(&self, name: &str) -> Option<Arc<dyn ParserType>>;
}

/// Sentinel type marking an entry as a match-level error.
///
/// Compiling it reports an error diagnostic carrying the entry's parameter,
/// or its text when there is no parameter, and yields `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorType;

impl ParserType for ErrorType {
    fn name(&self) -> &str {
        ERROR_TYPE_NAME
    }

    fn compile(
        &self,
        tree: TreeRef<'_>,
        index: usize,
        parameter: Option<&str>,
        context: &mut dyn CompilationContext,
        _types: &dyn TypeProvider,
    ) -> ResultResult<Value> {
        let text = tree.text_of(index).unwrap_or_default();
        let position = tree.start_position_of(index).unwrap_or_default();
        let message = parameter.unwrap_or(text);
        context.report(Diagnostic::error(ERROR_TYPE_NAME, message, position).with_text(text));
        Ok(Value::Null)
    }

    fn is_error(&self) -> bool {
        true
    }
}

/// A [`TypeProvider`] backed by a name map
#[derive(Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn ParserType>>,
}

impl TypeRegistry {
    /// A registry holding only [`ErrorType`]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ErrorType));
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register `ty` under its own name, returning the type it replaces
    pub fn register(&mut self, ty: Arc<dyn ParserType>) -> Option<Arc<dyn ParserType>> {
        self.types.insert(ty.name().to_string(), ty)
    }

    pub fn with_type(mut self, ty: Arc<dyn ParserType>) -> Self {
        self.register(ty);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.types.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl TypeProvider for TypeRegistry {
    fn type_named(&self, name: &str) -> Option<Arc<dyn ParserType>> {
        self.types.get(name).cloned()
    }
}

impl<'a> TreeRef<'a> {
    /// Resolved type of entry `index`; `None` when the entry is untyped or
    /// out of range
    pub fn type_of(
        &self,
        index: usize,
        types: &dyn TypeProvider,
    ) -> ResultResult<Option<Arc<dyn ParserType>>> {
        let Some(name) = self.type_name_of(index) else {
            return Ok(None);
        };
        match types.type_named(name) {
            Some(ty) => Ok(Some(ty)),
            None => Err(ResultError::unknown_type(
                name,
                self.start_position_of(index).unwrap_or_default(),
            )),
        }
    }

    /// Value of entry `index`: its type's compiled value, or its text when
    /// untyped
    pub fn value_of(
        &self,
        index: usize,
        types: &dyn TypeProvider,
        context: &mut dyn CompilationContext,
    ) -> ResultResult<Option<Value>> {
        let Some(entry) = self.entry_at(index) else {
            return Ok(None);
        };
        match self.type_of(index, types)? {
            Some(ty) => ty
                .compile(*self, index, entry.parameter(), context, types)
                .map(Some),
            None => Ok(self.text_of(index).map(|text| Value::String(text.to_string()))),
        }
    }

    /// Value of the last entry named `name`, here or in an enclosing tree
    pub fn value_of_name(
        &self,
        name: &str,
        types: &dyn TypeProvider,
        context: &mut dyn CompilationContext,
    ) -> ResultResult<Option<Value>> {
        match self.resolve_name(name) {
            Some((tree, index)) => tree.value_of(index, types, context),
            None => Ok(None),
        }
    }

    /// Values of every entry named `name`, in order
    pub fn values_of(
        &self,
        name: &str,
        types: &dyn TypeProvider,
        context: &mut dyn CompilationContext,
    ) -> ResultResult<Vec<Value>> {
        let mut values = Vec::new();
        for index in self.indexes_of(name) {
            if let Some(value) = self.value_of(index, types, context)? {
                values.push(value);
            }
        }
        Ok(values)
    }
}
