use serde::{Deserialize, Serialize};

/// A discrete command produced by a key toggle.
///
/// The frame driver consumes actions, never raw key state, so the same
/// dispatch works for any input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Flip the active camera between perspective and orthographic.
    ToggleOrtho,
    /// Select the next controllable entity, wrapping to the first.
    CycleNext,
    /// Select the previous controllable entity, wrapping to the last.
    CyclePrevious,
    /// Flip the selected controllable between local and world axes.
    ToggleRelative,
}
