//! Membership predicate and call-history accessor.

use crate::errors::StandInError;
use crate::recorder::Outcome;
use crate::value::Value;
use serde::Serialize;

/// Snapshot of a recorder's logs at the moment it was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallInfo {
    pub name: String,
    pub call_count: usize,
    pub calls: Vec<Vec<Value>>,
    pub results: Vec<Outcome>,
    /// Empty when the recorder was never called.
    pub last_call: Vec<Value>,
    /// `{Return, Undefined}` when the recorder was never called.
    pub last_result: Outcome,
}

/// True for values that are invocable and carry recorder bookkeeping:
/// stand-in nodes and bare recorders. Never fails.
pub fn is_stand_in_recorder(value: &Value) -> bool {
    value.as_recorder().is_some()
}

pub fn inspect(value: &Value) -> Result<CallInfo, StandInError> {
    value.as_recorder().map(|recorder| recorder.call_info()).ok_or_else(|| {
        StandInError::TypeMismatch(format!("{value} is not a stand-in recorder"))
    })
}
