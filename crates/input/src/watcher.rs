use crate::action::Action;
use crate::key::KeyCode;
use crate::source::InputSource;

/// Fires its action on the frame `key` goes from up to down.
#[derive(Debug, Clone)]
pub struct KeyPressWatcher {
    key: KeyCode,
    action: Action,
    was_down: bool,
}

impl KeyPressWatcher {
    pub fn new(key: KeyCode, action: Action) -> Self {
        Self {
            key,
            action,
            was_down: false,
        }
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    pub fn poll(&mut self, input: &dyn InputSource) -> Option<Action> {
        let down = input.is_key_down(self.key);
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed.then_some(self.action)
    }
}

/// The set of watchers polled by the frame driver.
#[derive(Debug, Clone, Default)]
pub struct KeyToggles {
    watchers: Vec<KeyPressWatcher>,
}

impl KeyToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// `T` ortho, keypad `+`/`-` cycle controllables, `Y` relative movement.
    pub fn defaults() -> Self {
        let mut toggles = Self::new();
        toggles.add(KeyCode::T, Action::ToggleOrtho);
        toggles.add(KeyCode::KeypadAdd, Action::CycleNext);
        toggles.add(KeyCode::KeypadSubtract, Action::CyclePrevious);
        toggles.add(KeyCode::Y, Action::ToggleRelative);
        toggles
    }

    pub fn add(&mut self, key: KeyCode, action: Action) {
        self.watchers.push(KeyPressWatcher::new(key, action));
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Poll every watcher in registration order.
    pub fn poll(&mut self, input: &dyn InputSource) -> Vec<Action> {
        let actions: Vec<Action> = self
            .watchers
            .iter_mut()
            .filter_map(|w| w.poll(input))
            .collect();
        if !actions.is_empty() {
            tracing::debug!(?actions, "key toggles fired");
        }
        actions
    }
}
