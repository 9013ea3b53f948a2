//! Lazily generated, recursively nested test stand-ins.
//!
//! ```
//! use standin::{generate, inspect, Value};
//!
//! let service = generate();
//! let user = service
//!     .call_member("getUser", vec![Value::from("1")])
//!     .expect("unconfigured members return stand-ins");
//! assert!(user.as_stand_in().is_some());
//!
//! let info = inspect(&service.member("getUser")).expect("generated members are recorders");
//! assert_eq!(info.call_count, 1);
//! assert_eq!(info.last_call, vec![Value::from("1")]);
//! ```

pub mod config;
pub mod defaults;
pub mod errors;
pub mod inspect;
pub mod logging;
pub mod recorder;
pub mod registry;
pub mod stand_in;
pub mod value;

pub use config::{load_config_str, StandInConfig, MAX_DEPTH};
pub use defaults::DefaultEntry;
pub use errors::StandInError;
pub use inspect::{inspect, is_stand_in_recorder, CallInfo};
pub use recorder::{Behavior, Outcome, OutcomeKind, Recorder};
pub use registry::{clear_all_recorders, live_recorder_count, reset_all_recorders};
pub use stand_in::{Generator, StandIn};
pub use value::{Settled, Value};

/// A root stand-in under the default configuration.
pub fn generate() -> StandIn {
    Generator::default().generate()
}

/// A root stand-in with `defaults` applied to its members.
pub fn with_defaults<I, K, E>(defaults: I) -> Result<StandIn, StandInError>
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<DefaultEntry>,
{
    Generator::default().with_defaults(defaults)
}
