//! Input and timing as the frame loop sees them.
//!
//! # Invariants
//! - `InputSource::now` is monotonic.
//! - Key toggles fire once per press, on the frame the key goes down.
//! - Toggles are not polled while a UI surface has focus; their held state
//!   is left as it was.

pub mod action;
mod key;
mod scripted;
mod source;
mod watcher;

pub use action::Action;
pub use key::KeyCode;
pub use scripted::ScriptedInput;
pub use source::InputSource;
pub use watcher::{KeyPressWatcher, KeyToggles};
