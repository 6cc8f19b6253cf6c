use crate::key::KeyCode;

/// Window-system input and clock, polled once per frame.
pub trait InputSource {
    /// Pump pending window events. Called first thing each frame.
    fn poll_events(&mut self);

    /// Monotonic time in seconds.
    fn now(&self) -> f64;

    /// True while any UI surface holds keyboard focus.
    fn is_ui_focused(&self) -> bool;

    fn is_key_down(&self, key: KeyCode) -> bool;

    /// Checked between frames; ends the loop.
    fn close_requested(&self) -> bool;
}
