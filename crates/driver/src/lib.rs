//! The frame loop.
//!
//! [`FrameDriver`] owns the scene, the behavior registry, the post-effect
//! chain and the backend, and runs one frame as a fixed sequence of steps:
//!
//! 1. poll input and clamp the frame delta
//! 2. scripted transform updates
//! 3. record the frame rate
//! 4. key toggles, unless the UI has focus
//! 5. behavior pass
//! 6. clear every post-effect buffer
//! 7. clear the default framebuffer
//! 8. world-matrix pass
//! 9. view and projection, once
//! 10. sort the batch
//! 11. draw into the capture buffer
//! 12. apply and draw the active effect
//! 13. UI overlay
//! 14. present and advance the clock
//!
//! # Invariants
//! - Behaviors run before the world-matrix pass, which runs before the draw.
//! - Only the active post effect is applied and drawn; all are cleared.
//! - Any error ends the loop. Nothing is retried.

mod clock;
mod config;
mod controllables;
mod driver;
mod error;
mod script;
mod ui;

pub use clock::FrameClock;
pub use config::DriverConfig;
pub use controllables::Controllables;
pub use driver::{FrameDriver, FrameReport, SceneSetup};
pub use error::{ConfigError, FrameError};
pub use script::{SceneScript, SpinAnimation, SpinTarget};
pub use ui::{NoOverlay, TextureToggle, UiOverlay, UiState};
