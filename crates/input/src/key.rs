use serde::{Deserialize, Serialize};

/// Keys the built-in behaviors and toggles listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyCode {
    W,
    A,
    S,
    D,
    Q,
    E,
    I,
    J,
    K,
    L,
    U,
    O,
    T,
    Y,
    Space,
    LeftControl,
    Left,
    Right,
    Up,
    Down,
    KeypadAdd,
    KeypadSubtract,
    Escape,
}
