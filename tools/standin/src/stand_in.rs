//! Recursive stand-ins.
//!
//! A [`StandIn`] is invocable (it derefs to its [`Recorder`]) and exposes an
//! open-ended set of members. Reading a member that was never written
//! synthesizes a child stand-in one level deeper and caches it, so repeated
//! reads return the same node. Writing a member pins a value in that slot.
//! Calling an unconfigured stand-in produces a fresh child stand-in as well.
//!
//! Recorder configuration and inspection live in the recorder's own method
//! namespace, so they reach the node's recorder at any depth and never
//! collide with contract member names.
//!
//! Past `generator.max_depth` the generator yields [`Value::Undefined`]
//! instead of a node. That bounds growth on self-referential shapes; shapes
//! beyond that depth are not usable.

use crate::config::{validate_config, StandInConfig};
use crate::errors::StandInError;
use crate::logging::{emit_event, LogEvent};
use crate::recorder::{Behavior, Recorder};
use crate::value::Value;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Builds root stand-ins under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: Arc<StandInConfig>,
}

impl Generator {
    pub fn new(config: StandInConfig) -> Result<Self, StandInError> {
        validate_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &StandInConfig {
        &self.config
    }

    pub fn generate(&self) -> StandIn {
        StandIn::node(
            0,
            self.config.generator.root_name.clone(),
            Arc::clone(&self.config),
        )
    }
}

struct Node {
    recorder: Recorder,
    depth: usize,
    path: String,
    config: Arc<StandInConfig>,
    children: Mutex<BTreeMap<String, Value>>,
}

/// Cloning a `StandIn` yields another handle to the same node.
#[derive(Clone)]
pub struct StandIn {
    node: Arc<Node>,
}

fn spawn(depth: usize, path: String, config: Arc<StandInConfig>) -> Value {
    if depth > config.generator.max_depth {
        emit_event(LogEvent {
            level: "warn",
            event_type: "depth_guard",
            payload: json!({ "path": path, "depth": depth }),
        });
        return Value::Undefined;
    }
    Value::StandIn(StandIn::node(depth, path, config))
}

impl StandIn {
    fn node(depth: usize, path: String, config: Arc<StandInConfig>) -> Self {
        let result_path = format!("{path}()");
        let result_config = Arc::clone(&config);
        let produce_child: Behavior = Arc::new(move |_: &[Value]| -> Result<Value, Value> {
            Ok(spawn(
                depth + 1,
                result_path.clone(),
                Arc::clone(&result_config),
            ))
        });
        let recorder = Recorder::build(
            path.clone(),
            Some(produce_child),
            config.registry.track_recorders,
        );
        emit_event(LogEvent {
            level: "debug",
            event_type: "generate",
            payload: json!({ "path": path, "depth": depth }),
        });
        Self {
            node: Arc::new(Node {
                recorder,
                depth,
                path,
                config,
                children: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    fn children(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.node
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn recorder(&self) -> &Recorder {
        &self.node.recorder
    }

    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// Dotted access path from the root, e.g. `mock.users.get()`.
    pub fn path(&self) -> &str {
        &self.node.path
    }

    pub fn same_node(&self, other: &StandIn) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Reads a member, synthesizing and caching a child on first access.
    pub fn member(&self, name: &str) -> Value {
        let mut children = self.children();
        if let Some(existing) = children.get(name) {
            return existing.clone();
        }
        let child = spawn(
            self.node.depth + 1,
            format!("{}.{name}", self.node.path),
            Arc::clone(&self.node.config),
        );
        children.insert(name.to_string(), child.clone());
        child
    }

    /// Pins `value` in the member slot, replacing any cached or generated child.
    pub fn set_member(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.children().insert(name.into(), value.into());
        self
    }

    /// Names of members materialized so far, by read or by write.
    pub fn members(&self) -> Vec<String> {
        self.children().keys().cloned().collect()
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.children().contains_key(name)
    }

    /// Reads a member that must be a stand-in node.
    pub fn child(&self, name: &str) -> Result<StandIn, StandInError> {
        match self.member(name) {
            Value::StandIn(node) => Ok(node),
            other => Err(StandInError::TypeMismatch(format!(
                "member `{name}` of {} is {other}, not a stand-in",
                self.node.path
            ))),
        }
    }

    pub fn call_member(&self, name: &str, args: Vec<Value>) -> Result<Value, StandInError> {
        self.member(name).call(args)
    }
}

impl Deref for StandIn {
    type Target = Recorder;

    fn deref(&self) -> &Recorder {
        &self.node.recorder
    }
}

impl fmt::Debug for StandIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandIn")
            .field("path", &self.node.path)
            .field("depth", &self.node.depth)
            .field("members", &self.members())
            .finish()
    }
}
