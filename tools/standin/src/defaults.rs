use crate::errors::StandInError;
use crate::inspect::is_stand_in_recorder;
use crate::recorder::{Behavior, Recorder};
use crate::stand_in::{Generator, StandIn};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An initial setting for one member of a stand-in.
#[derive(Clone)]
pub enum DefaultEntry {
    /// Installed as the persistent behavior of the member's generated recorder.
    Behavior(Behavior),
    /// Pinned in the member slot as a plain value.
    Value(Value),
}

impl DefaultEntry {
    pub fn behavior<F>(behavior: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + Send + Sync + 'static,
    {
        Self::Behavior(Arc::new(behavior))
    }
}

impl fmt::Debug for DefaultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Behavior(_) => f.write_str("Behavior(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Value> for DefaultEntry {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for DefaultEntry {
    fn from(data: serde_json::Value) -> Self {
        Self::Value(Value::Data(data))
    }
}

impl From<&str> for DefaultEntry {
    fn from(text: &str) -> Self {
        Self::Value(Value::from(text))
    }
}

impl From<String> for DefaultEntry {
    fn from(text: String) -> Self {
        Self::Value(Value::from(text))
    }
}

impl From<i64> for DefaultEntry {
    fn from(number: i64) -> Self {
        Self::Value(Value::from(number))
    }
}

impl From<bool> for DefaultEntry {
    fn from(flag: bool) -> Self {
        Self::Value(Value::from(flag))
    }
}

impl From<StandIn> for DefaultEntry {
    fn from(node: StandIn) -> Self {
        Self::Value(Value::from(node))
    }
}

impl From<Recorder> for DefaultEntry {
    fn from(recorder: Recorder) -> Self {
        Self::Value(Value::from(recorder))
    }
}

impl Generator {
    /// Generates a root stand-in and applies each entry to its member.
    /// When a name repeats, the last entry for it wins; the others are dropped
    /// before anything is applied, so entries never observe one another.
    pub fn with_defaults<I, K, E>(&self, defaults: I) -> Result<StandIn, StandInError>
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<DefaultEntry>,
    {
        let mut entries: BTreeMap<String, DefaultEntry> = BTreeMap::new();
        for (name, entry) in defaults {
            entries.insert(name.into(), entry.into());
        }
        let root = self.generate();
        for (name, entry) in entries {
            match entry {
                DefaultEntry::Behavior(behavior) => {
                    let member = root.member(&name);
                    match member.as_recorder() {
                        Some(recorder) if is_stand_in_recorder(&member) => {
                            recorder.install_behavior(behavior);
                        }
                        _ => {
                            return Err(StandInError::TypeMismatch(format!(
                                "member `{name}` of {} is {member}, not a stand-in recorder",
                                root.path()
                            )));
                        }
                    }
                }
                DefaultEntry::Value(value) => {
                    root.set_member(name, value);
                }
            }
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::DefaultEntry;
    use crate::config::StandInConfig;
    use crate::errors::StandInError;
    use crate::inspect::{inspect, is_stand_in_recorder};
    use crate::recorder::{OutcomeKind, Recorder};
    use crate::stand_in::Generator;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn behavior_entries_configure_generated_recorders() {
        let stand_in = Generator::default()
            .with_defaults([(
                "getUser",
                DefaultEntry::behavior(|_| Ok(Value::from(json!({"id": "1"})))),
            )])
            .expect("with defaults");

        assert_eq!(
            stand_in.call_member("getUser", vec![]),
            Ok(Value::from(json!({"id": "1"})))
        );
        let info = inspect(&stand_in.member("getUser")).expect("inspect");
        assert_eq!(info.call_count, 1);
        assert_eq!(info.last_result.kind, OutcomeKind::Return);
    }

    #[test]
    fn value_entries_are_pinned_without_recorders() {
        let stand_in = Generator::default()
            .with_defaults([("version", json!(3)), ("name", json!("svc"))])
            .expect("with defaults");
        assert_eq!(stand_in.member("version"), Value::from(json!(3)));
        assert!(!is_stand_in_recorder(&stand_in.member("name")));
        assert_eq!(stand_in.members(), vec!["name".to_string(), "version".to_string()]);
    }

    #[test]
    fn installed_behavior_survives_clear_but_not_reset() {
        let stand_in = Generator::default()
            .with_defaults([("ping", DefaultEntry::behavior(|_| Ok(Value::from("pong"))))])
            .expect("with defaults");
        let ping = stand_in.child("ping").expect("child");
        ping.call(vec![]).expect("call");
        ping.clear();
        assert_eq!(ping.call(vec![]), Ok(Value::from("pong")));

        ping.reset();
        let after_reset = ping.call(vec![]).expect("call");
        assert!(after_reset.as_stand_in().is_some());
    }

    #[test]
    fn repeated_names_keep_the_last_entry_in_either_order() {
        let pinned_last = Generator::default()
            .with_defaults([
                ("x", DefaultEntry::behavior(|_| Ok(Value::from("called")))),
                ("x", DefaultEntry::from("plain")),
            ])
            .expect("behavior then value");
        assert_eq!(pinned_last.member("x"), Value::from("plain"));

        let behavior_last = Generator::default()
            .with_defaults([
                ("x", DefaultEntry::from("plain")),
                ("x", DefaultEntry::behavior(|_| Ok(Value::from("called")))),
            ])
            .expect("value then behavior");
        assert!(is_stand_in_recorder(&behavior_last.member("x")));
        assert_eq!(behavior_last.call_member("x", vec![]), Ok(Value::from("called")));
    }

    #[test]
    fn scalar_and_handle_entries_are_pinned() {
        let recorder = Recorder::named("hook");
        let stand_in = Generator::default()
            .with_defaults([
                ("port", DefaultEntry::from(8080_i64)),
                ("enabled", DefaultEntry::from(true)),
                ("host", DefaultEntry::from("localhost".to_string())),
                ("hook", DefaultEntry::from(recorder.clone())),
            ])
            .expect("with defaults");
        assert_eq!(stand_in.member("port"), Value::from(8080_i64));
        assert_eq!(stand_in.member("enabled"), Value::from(true));
        assert_eq!(stand_in.member("host"), Value::from("localhost"));
        assert_eq!(stand_in.member("hook"), Value::from(recorder));
    }

    #[test]
    fn behavior_entries_past_the_depth_guard_are_type_mismatches() {
        let mut config = StandInConfig::default();
        config.generator.max_depth = 0;
        let generator = Generator::new(config).expect("generator");
        let err = generator
            .with_defaults([("run", DefaultEntry::behavior(|_| Ok(Value::Undefined)))])
            .expect_err("no recorder past the depth guard");
        assert!(matches!(err, StandInError::TypeMismatch(_)));
    }
}
