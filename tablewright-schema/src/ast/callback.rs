//! Callable members: hooks, computed fields, row methods and table methods.

use std::sync::{Arc, Weak};

use thiserror::Error;

use super::{Phase, Row, Value};
use crate::layer::TableHandle;

/// Error raised by user-supplied callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    /// Error message.
    pub message: String,
}

impl CallbackError {
    /// Create a new callback error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for user-supplied callbacks.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Whether an operation should continue after a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFlow {
    /// Let the operation proceed.
    #[default]
    Continue,
    /// Cancel the operation. Only honoured for `before_*` phases.
    Abort,
}

impl HookFlow {
    /// Check whether this flow aborts the operation.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort)
    }
}

/// Arguments passed to a hook.
///
/// Inserts carry the new `fields` (and the new id once inserted); updates carry
/// the affected `ids` plus the values being set; deletes carry only `ids`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookArgs {
    /// Values being written, if any.
    pub fields: Option<Row>,
    /// Ids of the affected records.
    pub ids: Vec<u64>,
}

impl HookArgs {
    /// Arguments for `before_insert`.
    pub fn insert(fields: Row) -> Self {
        Self {
            fields: Some(fields),
            ids: vec![],
        }
    }

    /// Arguments for `after_insert`.
    pub fn inserted(fields: Row, id: u64) -> Self {
        Self {
            fields: Some(fields),
            ids: vec![id],
        }
    }

    /// Arguments for the update phases.
    pub fn update(ids: Vec<u64>, fields: Row) -> Self {
        Self {
            fields: Some(fields),
            ids,
        }
    }

    /// Arguments for the delete phases.
    pub fn delete(ids: Vec<u64>) -> Self {
        Self { fields: None, ids }
    }
}

type HookFn = dyn Fn(&HookArgs) -> CallbackResult<HookFlow> + Send + Sync;

/// A lifecycle hook.
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    /// Create a hook from a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HookArgs) -> CallbackResult<HookFlow> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Create a hook that always lets the operation continue.
    pub fn observe<F>(f: F) -> Self
    where
        F: Fn(&HookArgs) + Send + Sync + 'static,
    {
        Self::new(move |args| {
            f(args);
            Ok(HookFlow::Continue)
        })
    }

    /// Invoke the hook.
    pub fn call(&self, args: &HookArgs) -> CallbackResult<HookFlow> {
        (self.0)(args)
    }

    /// Check whether two hooks share the same callback.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

type CommonHookFn =
    dyn Fn(&dyn TableHandle, Phase, &HookArgs) -> CallbackResult<HookFlow> + Send + Sync;

/// A hook invoked for every lifecycle phase of every table in a group.
///
/// The callback receives the table it fired on, the phase, and the
/// phase arguments.
#[derive(Clone)]
pub struct CommonHook(Arc<CommonHookFn>);

impl CommonHook {
    /// Create a common hook from a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn TableHandle, Phase, &HookArgs) -> CallbackResult<HookFlow>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the common hook.
    pub fn call(
        &self,
        table: &dyn TableHandle,
        phase: Phase,
        args: &HookArgs,
    ) -> CallbackResult<HookFlow> {
        (self.0)(table, phase, args)
    }

    /// Bind this common hook to one table and phase.
    ///
    /// The table is held weakly. Calling the hook after the table is dropped
    /// fails.
    pub fn bind(&self, table: Weak<dyn TableHandle>, phase: Phase) -> Hook {
        let common = self.clone();
        Hook::new(move |args| {
            let table = table.upgrade().ok_or_else(|| {
                CallbackError::new(format!("`{phase}` hook fired on a dropped table"))
            })?;
            common.call(table.as_ref(), phase, args)
        })
    }
}

impl std::fmt::Debug for CommonHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonHook").finish_non_exhaustive()
    }
}

/// Getter of a computed (virtual) field.
#[derive(Clone)]
pub struct VirtualGetter(Arc<dyn Fn(&Row) -> Value + Send + Sync>);

impl VirtualGetter {
    /// Create a getter.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Compute the value for a row.
    pub fn get(&self, row: &Row) -> Value {
        (self.0)(row)
    }
}

impl std::fmt::Debug for VirtualGetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualGetter").finish_non_exhaustive()
    }
}

type RowMethodFn = dyn Fn(&Row, &[Value]) -> CallbackResult<Value> + Send + Sync;

/// A method bound to a row and invoked explicitly.
#[derive(Clone)]
pub struct RowMethod(Arc<RowMethodFn>);

impl RowMethod {
    /// Create a row method.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Row, &[Value]) -> CallbackResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the method on a row.
    pub fn call(&self, row: &Row, args: &[Value]) -> CallbackResult<Value> {
        (self.0)(row, args)
    }
}

impl std::fmt::Debug for RowMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowMethod").finish_non_exhaustive()
    }
}

type TableMethodFn = dyn Fn(&dyn TableHandle, &[Value]) -> CallbackResult<Value> + Send + Sync;

/// A method exposed at the table level.
#[derive(Clone)]
pub struct TableMethod(Arc<TableMethodFn>);

impl TableMethod {
    /// Create a table method.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn TableHandle, &[Value]) -> CallbackResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the method against a table.
    pub fn call(&self, table: &dyn TableHandle, args: &[Value]) -> CallbackResult<Value> {
        (self.0)(table, args)
    }
}

impl std::fmt::Debug for TableMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableMethod").finish_non_exhaustive()
    }
}
