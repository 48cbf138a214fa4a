//! Rainbow Playground: a camera kiosk with three children's mini-games.
//!
//! The core (detection, particles, compositing, game state machines) works on
//! [`types::FrameBuffer`]s and never fails per frame. Camera, window, fonts and
//! config are the shell's business and are the only places errors come from.

pub mod camera;
pub mod clock;
pub mod color;
pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod fx;
pub mod games;
pub mod menu;
pub mod motion;
pub mod text;
pub mod types;
pub mod vision;
pub mod window;

pub use error::{Error, Result};
