//! Callable recorder: one invocable unit with a call log, an outcome log,
//! a persistent behavior and a queue of one-shot behaviors.

use crate::errors::StandInError;
use crate::inspect::CallInfo;
use crate::logging::{emit_event, LogEvent};
use crate::registry;
use crate::value::{Settled, Value};
use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A function run when a recorder is invoked. `Err(v)` means the behavior raised `v`.
pub type Behavior = Arc<dyn Fn(&[Value]) -> Result<Value, Value> + Send + Sync>;

pub const DEFAULT_RECORDER_NAME: &str = "recorder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Return,
    Throw,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Throw => "throw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub value: Value,
}

impl Outcome {
    pub fn returned(value: impl Into<Value>) -> Self {
        Self {
            kind: OutcomeKind::Return,
            value: value.into(),
        }
    }

    pub fn thrown(value: impl Into<Value>) -> Self {
        Self {
            kind: OutcomeKind::Throw,
            value: value.into(),
        }
    }
}

/// Reported as the last outcome of a recorder that was never invoked.
impl Default for Outcome {
    fn default() -> Self {
        Self::returned(Value::Undefined)
    }
}

#[derive(Default)]
struct RecorderState {
    calls: Vec<Vec<Value>>,
    results: Vec<Outcome>,
    persistent: Option<Behavior>,
    once: VecDeque<Behavior>,
}

pub(crate) struct RecorderInner {
    name: String,
    initial: Option<Behavior>,
    state: Mutex<RecorderState>,
}

/// Cloning a `Recorder` yields another handle to the same logs and behaviors.
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<RecorderInner>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::build(DEFAULT_RECORDER_NAME, None, true)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::build(name, None, true)
    }

    /// A recorder whose construction-time default is `behavior`; `reset` restores it.
    pub fn with_behavior<F>(behavior: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        Self::build(DEFAULT_RECORDER_NAME, Some(Arc::new(behavior)), true)
    }

    pub(crate) fn build(name: impl Into<String>, initial: Option<Behavior>, track: bool) -> Self {
        let recorder = Self {
            inner: Arc::new(RecorderInner {
                name: name.into(),
                initial: initial.clone(),
                state: Mutex::new(RecorderState {
                    persistent: initial,
                    ..RecorderState::default()
                }),
            }),
        };
        if track {
            registry::track(&recorder.inner);
        }
        recorder
    }

    pub(crate) fn from_inner(inner: Arc<RecorderInner>) -> Self {
        Self { inner }
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn same_recorder(&self, other: &Recorder) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs the front one-shot behavior, else the persistent one, else yields
    /// `Undefined`. The call and its outcome are logged together once the
    /// behavior finishes, so a reentrant call from inside the behavior sees
    /// logs that exclude the outer invocation.
    ///
    /// Logs are therefore in completion order, not invocation order: a call
    /// made from inside a behavior is logged before the call that contains
    /// it, so `calls()` reads `[inner, outer]`.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, StandInError> {
        let behavior = {
            let mut state = self.state();
            state.once.pop_front().or_else(|| state.persistent.clone())
        };
        let produced = match behavior {
            Some(behavior) => behavior(&args),
            None => Ok(Value::Undefined),
        };

        let arg_count = args.len();
        let outcome = match &produced {
            Ok(value) => Outcome::returned(value.clone()),
            Err(error) => Outcome::thrown(error.clone()),
        };
        emit_event(LogEvent {
            level: "debug",
            event_type: "invoke",
            payload: json!({
                "recorder": self.name(),
                "args": arg_count,
                "outcome": outcome.kind.as_str(),
            }),
        });
        {
            let mut state = self.state();
            state.calls.push(args);
            state.results.push(outcome);
        }
        produced.map_err(StandInError::Raised)
    }

    pub fn set_behavior<F>(&self, behavior: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        self.state().persistent = Some(Arc::new(behavior));
        self
    }

    pub fn queue_once_behavior<F>(&self, behavior: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        self.state().once.push_back(Arc::new(behavior));
        self
    }

    pub(crate) fn install_behavior(&self, behavior: Behavior) -> &Self {
        self.state().persistent = Some(behavior);
        self
    }

    pub fn set_return_value(&self, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.set_behavior(move |_| Ok(value.clone()))
    }

    pub fn set_return_value_once(&self, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.queue_once_behavior(move |_| Ok(value.clone()))
    }

    pub fn set_resolved_value(&self, value: impl Into<Value>) -> &Self {
        self.set_return_value(Settled::resolved(value))
    }

    pub fn set_resolved_value_once(&self, value: impl Into<Value>) -> &Self {
        self.set_return_value_once(Settled::resolved(value))
    }

    pub fn set_rejected_value(&self, error: impl Into<Value>) -> &Self {
        self.set_return_value(Settled::rejected(error))
    }

    pub fn set_rejected_value_once(&self, error: impl Into<Value>) -> &Self {
        self.set_return_value_once(Settled::rejected(error))
    }

    /// Empties both logs. Behaviors are left untouched.
    pub fn clear(&self) -> &Self {
        {
            let mut state = self.state();
            state.calls.clear();
            state.results.clear();
        }
        emit_event(LogEvent {
            level: "debug",
            event_type: "clear",
            payload: json!({ "recorder": self.name() }),
        });
        self
    }

    /// Empties both logs and the once-queue and restores the construction-time default.
    pub fn reset(&self) -> &Self {
        {
            let mut state = self.state();
            state.calls.clear();
            state.results.clear();
            state.once.clear();
            state.persistent = self.inner.initial.clone();
        }
        emit_event(LogEvent {
            level: "debug",
            event_type: "reset",
            payload: json!({ "recorder": self.name() }),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.state().calls.clone()
    }

    pub fn results(&self) -> Vec<Outcome> {
        self.state().results.clone()
    }

    pub fn pending_once_behaviors(&self) -> usize {
        self.state().once.len()
    }

    pub fn call_info(&self) -> CallInfo {
        let state = self.state();
        CallInfo {
            name: self.name().to_string(),
            call_count: state.calls.len(),
            calls: state.calls.clone(),
            results: state.results.clone(),
            last_call: state.calls.last().cloned().unwrap_or_default(),
            last_result: state.results.last().cloned().unwrap_or_default(),
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("name", &self.inner.name)
            .field("call_count", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, OutcomeKind, Recorder};
    use crate::errors::StandInError;
    use crate::value::{Settled, Value};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn unconfigured_recorder_returns_undefined_and_logs_the_call() {
        let recorder = Recorder::new();
        let result = recorder.call(vec![Value::from("a"), Value::from(2_i64)]);
        assert_eq!(result, Ok(Value::Undefined));
        assert_eq!(recorder.call_count(), 1);
        assert_eq!(
            recorder.calls(),
            vec![vec![Value::from("a"), Value::from(2_i64)]]
        );
        assert_eq!(recorder.results(), vec![Outcome::returned(Value::Undefined)]);
    }

    #[test]
    fn once_behaviors_are_consumed_in_fifo_order_before_the_persistent_one() {
        let recorder = Recorder::new();
        recorder
            .set_return_value("persistent")
            .queue_once_behavior(|_| Ok(Value::from("f1")))
            .queue_once_behavior(|_| Ok(Value::from("f2")));

        let results = (0..3)
            .map(|_| recorder.call(vec![]).expect("call"))
            .collect::<Vec<_>>();
        assert_eq!(
            results,
            vec![Value::from("f1"), Value::from("f2"), Value::from("persistent")]
        );
        assert_eq!(recorder.pending_once_behaviors(), 0);
    }

    #[test]
    fn raised_values_are_logged_and_propagated_unchanged() {
        let recorder = Recorder::new();
        recorder.set_behavior(|_| Err(Value::from(json!({"code": 7}))));

        let err = recorder.call(vec![]).expect_err("behavior raises");
        assert_eq!(err, StandInError::Raised(Value::from(json!({"code": 7}))));
        let results = recorder.results();
        assert_eq!(results.len(), recorder.calls().len());
        assert_eq!(results[0].kind, OutcomeKind::Throw);
    }

    #[test]
    fn behaviors_receive_the_call_arguments() {
        let recorder = Recorder::new();
        recorder.set_behavior(|args| Ok(Value::from(args.len() as i64)));
        assert_eq!(
            recorder.call(vec![Value::from(true), Value::from(false)]),
            Ok(Value::from(2_i64))
        );
    }

    #[test]
    fn reentrant_calls_do_not_see_the_pending_outer_entry() {
        let recorder = Recorder::new();
        let handle = recorder.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_behavior = Arc::clone(&seen);
        recorder.queue_once_behavior(move |_| {
            seen_in_behavior
                .lock()
                .expect("seen lock")
                .push(handle.call_count());
            handle.call(vec![Value::from("inner")]).map_err(|_| Value::Undefined)?;
            seen_in_behavior
                .lock()
                .expect("seen lock")
                .push(handle.call_count());
            Ok(Value::from("outer"))
        });

        assert_eq!(recorder.call(vec![Value::from("outer")]), Ok(Value::from("outer")));
        assert_eq!(*seen.lock().expect("seen lock"), vec![0, 1]);
        assert_eq!(
            recorder.calls(),
            vec![vec![Value::from("inner")], vec![Value::from("outer")]]
        );
        assert_eq!(recorder.results().len(), 2);
        assert_eq!(recorder.results()[1], Outcome::returned("outer"));
    }

    #[test]
    fn clear_keeps_behaviors_and_reset_restores_the_construction_default() {
        let recorder = Recorder::with_behavior(|_| Ok(Value::from("initial")));
        recorder
            .set_return_value("override")
            .set_return_value_once("once");
        recorder.call(vec![]).expect("call");

        recorder.clear();
        assert_eq!(recorder.call_count(), 0);
        assert!(recorder.results().is_empty());
        assert_eq!(recorder.call(vec![]), Ok(Value::from("override")));

        recorder.set_return_value_once("dropped");
        recorder.reset();
        assert_eq!(recorder.call_count(), 0);
        assert_eq!(recorder.pending_once_behaviors(), 0);
        assert_eq!(recorder.call(vec![]), Ok(Value::from("initial")));
    }

    #[test]
    fn reset_without_a_construction_default_returns_undefined() {
        let recorder = Recorder::new();
        recorder.set_return_value(1_i64).reset();
        assert_eq!(recorder.call(vec![]), Ok(Value::Undefined));
    }

    #[test]
    fn async_sugar_records_the_settled_value_as_a_return() {
        let recorder = Recorder::new();
        recorder
            .set_rejected_value_once("nope")
            .set_resolved_value(json!({"ok": true}));

        let first = recorder.call(vec![]).expect("rejection is returned, not raised");
        assert_eq!(first, Value::from(Settled::rejected("nope")));
        let second = recorder.call(vec![]).expect("call");
        assert_eq!(second, Value::from(Settled::resolved(json!({"ok": true}))));
        assert!(recorder
            .results()
            .iter()
            .all(|outcome| outcome.kind == OutcomeKind::Return));
    }

    #[test]
    fn call_info_reports_sentinels_before_any_call() {
        let recorder = Recorder::named("fresh");
        let info = recorder.call_info();
        assert_eq!(info.name, "fresh");
        assert_eq!(info.call_count, 0);
        assert!(info.last_call.is_empty());
        assert_eq!(info.last_result, Outcome::returned(Value::Undefined));
    }

    #[test]
    fn clones_share_state() {
        let recorder = Recorder::new();
        let other = recorder.clone();
        other.call(vec![]).expect("call");
        assert_eq!(recorder.call_count(), 1);
        assert!(recorder.same_recorder(&other));
        assert!(!recorder.same_recorder(&Recorder::new()));
    }
}
