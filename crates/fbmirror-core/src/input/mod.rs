//! Synthetic input injection.
//!
//! - **`event`** – the `{type, code, value}` record and the [`InputSink`]
//!   port the server's device handles implement.
//! - **`keyboard`** – repeat debounce.
//! - **`touch`** – single-pointer touch session and jitter filter.
//! - **`gesture`** – button gestures as data plus their emitter.
//! - **`injector`** – the facade the session handler calls.
//! - **`mock`** – an always-compiled recording sink for tests.

pub mod event;
pub mod gesture;
pub mod injector;
pub mod keyboard;
pub mod mock;
pub mod touch;

pub use event::{InputEvent, InputSink, SinkError};
pub use gesture::Gesture;
pub use injector::{DeviceVariant, DropReason, InjectorConfig, InputInjector, KeyOutcome, PointerOutcome};
pub use keyboard::{DebounceConfig, KeyDecision, KeyRepeatState};
pub use mock::MockInputSink;
pub use touch::{PointerAction, TouchBounds, TouchSession, TouchState, TrackingIds};
