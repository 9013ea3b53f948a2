//! The dynamic value type that flows through stand-ins.
//!
//! Behaviors receive and produce `Value`s, member slots hold them, and the
//! call/outcome logs store them. Plain data is carried as `serde_json::Value`
//! so tests can pin records with `json!`.

use crate::errors::StandInError;
use crate::recorder::Recorder;
use crate::stand_in::StandIn;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::future::{ready, IntoFuture, Ready};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No result, or the inert placeholder produced past the depth guard.
    #[default]
    Undefined,
    Data(serde_json::Value),
    StandIn(StandIn),
    Recorder(Recorder),
    Async(Settled),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_stand_in(&self) -> Option<&StandIn> {
        match self {
            Self::StandIn(node) => Some(node),
            _ => None,
        }
    }

    /// The recorder behind this value, for both bare recorders and stand-in nodes.
    pub fn as_recorder(&self) -> Option<&Recorder> {
        match self {
            Self::StandIn(node) => Some(node.recorder()),
            Self::Recorder(recorder) => Some(recorder),
            _ => None,
        }
    }

    pub fn as_settled(&self) -> Option<&Settled> {
        match self {
            Self::Async(settled) => Some(settled),
            _ => None,
        }
    }

    /// Invokes the value if it is callable.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, StandInError> {
        match self.as_recorder() {
            Some(recorder) => recorder.call(args),
            None => Err(StandInError::TypeMismatch(format!(
                "{} value {self} is not invocable",
                self.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Data(_) => "data",
            Self::StandIn(_) => "stand-in",
            Self::Recorder(_) => "recorder",
            Self::Async(_) => "async",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::StandIn(a), Self::StandIn(b)) => a.same_node(b),
            (Self::Recorder(a), Self::Recorder(b)) => a.same_recorder(b),
            (Self::Async(a), Self::Async(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Data(data) => write!(f, "{data}"),
            Self::StandIn(node) => write!(f, "[stand-in {}]", node.path()),
            Self::Recorder(recorder) => write!(f, "[recorder {}]", recorder.name()),
            Self::Async(settled) => match settled.outcome() {
                Ok(value) => write!(f, "[resolved {value}]"),
                Err(error) => write!(f, "[rejected {error}]"),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined => serializer.serialize_unit(),
            Self::Data(data) => data.serialize(serializer),
            Self::Async(settled) => {
                let mut map = serializer.serialize_map(Some(1))?;
                match settled.outcome() {
                    Ok(value) => map.serialize_entry("resolved", value)?,
                    Err(error) => map.serialize_entry("rejected", error)?,
                }
                map.end()
            }
            other => serializer.collect_str(other),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Self::Data(data)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Data(serde_json::Value::String(text.to_string()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Data(serde_json::Value::String(text))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Data(serde_json::Value::from(number))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Data(serde_json::Value::Bool(flag))
    }
}

impl From<StandIn> for Value {
    fn from(node: StandIn) -> Self {
        Self::StandIn(node)
    }
}

impl From<Recorder> for Value {
    fn from(recorder: Recorder) -> Self {
        Self::Recorder(recorder)
    }
}

impl From<Settled> for Value {
    fn from(settled: Settled) -> Self {
        Self::Async(settled)
    }
}

/// An asynchronous outcome that has already resolved or rejected.
///
/// Awaiting it never suspends. A rejection surfaces as
/// [`StandInError::Raised`] carrying the rejected value.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    outcome: Arc<Result<Value, Value>>,
}

impl Settled {
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self {
            outcome: Arc::new(Ok(value.into())),
        }
    }

    pub fn rejected(error: impl Into<Value>) -> Self {
        Self {
            outcome: Arc::new(Err(error.into())),
        }
    }

    pub fn outcome(&self) -> Result<&Value, &Value> {
        (*self.outcome).as_ref()
    }

    pub fn is_rejected(&self) -> bool {
        self.outcome.is_err()
    }
}

impl IntoFuture for Settled {
    type Output = Result<Value, StandInError>;
    type IntoFuture = Ready<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        ready(match self.outcome() {
            Ok(value) => Ok(value.clone()),
            Err(error) => Err(StandInError::Raised(error.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Settled, Value};
    use serde_json::json;

    #[test]
    fn data_values_compare_structurally() {
        assert_eq!(Value::from(json!({"id": "1"})), Value::from(json!({"id": "1"})));
        assert_ne!(Value::from("1"), Value::from(1_i64));
        assert_ne!(Value::Undefined, Value::from(json!(null)));
    }

    #[test]
    fn non_callable_values_report_type_mismatch() {
        let err = Value::from("plain").call(vec![]).expect_err("data is not callable");
        assert!(err.to_string().contains("data value \"plain\" is not invocable"));
        assert!(Value::Undefined.call(vec![]).is_err());
    }

    #[test]
    fn settled_values_serialize_with_their_state() {
        let resolved = serde_json::to_value(Value::from(Settled::resolved(json!(3))))
            .expect("serialize resolved");
        assert_eq!(resolved, json!({"resolved": 3}));
        let rejected = serde_json::to_value(Value::from(Settled::rejected("boom")))
            .expect("serialize rejected");
        assert_eq!(rejected, json!({"rejected": "boom"}));
        assert_eq!(
            serde_json::to_value(Value::Undefined).expect("serialize undefined"),
            json!(null)
        );
    }
}
