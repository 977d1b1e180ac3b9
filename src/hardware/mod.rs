//! Collaborator interfaces for the crawler.
//!
//! The navigation core never talks to devices directly. Everything with side
//! effects sits behind one of the traits below:
//! - `DistanceSensor` samples the sonar
//! - `Actuator` executes gait commands
//! - `AlertSink` plays the obstacle alert
//! - `ImageCapture` grabs a camera frame
//! - `MapRenderer` persists the occupancy map
//! - `InputSource` polls for key presses without blocking
//!
//! The submodules hold the stand-ins the binary wires up.

mod actuator;
mod alert;
mod camera;
mod keyboard;
mod renderer;
mod sonar;

pub use actuator::LogActuator;
pub use alert::TerminalBell;
pub use camera::{DisabledCamera, FrameFileCamera};
pub use keyboard::KeyboardInput;
pub use renderer::{PngMapRenderer, read_annotations, read_occupancy};
pub use sonar::ScriptedSonar;

#[cfg(test)]
use mockall::automock;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::CrawlerError;
use crate::core::{Cell, Grid, ImageRef, MotionKind};

/// A discrete key symbol read from the operator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// A printable key
    Char(char),
    /// Ctrl-C pressed while the terminal is in raw mode
    Interrupt,
}

/// Distance sensor. `None` signals an invalid or out-of-range read.
#[cfg_attr(test, automock)]
pub trait DistanceSensor {
    /// Takes one distance sample
    fn sample(&mut self) -> Option<f64>;
}

/// Gait actuator; commands are fire-and-forget
#[cfg_attr(test, automock)]
pub trait Actuator {
    /// Executes `steps` repetitions of `kind` at `speed` percent
    fn execute(&mut self, kind: MotionKind, steps: u32, speed: u16);

    /// Bring the robot to rest
    fn stop(&mut self);
}

/// Audible/visual obstacle alert
#[cfg_attr(test, automock)]
pub trait AlertSink: Send {
    /// Raises the alert
    fn notify(&mut self);
}

/// Camera. `None` means the capture failed.
#[cfg_attr(test, automock)]
pub trait ImageCapture: Send {
    /// Captures one image
    fn capture(&mut self) -> Option<ImageRef>;
}

/// Persists the occupancy grid and its annotations, returning the artifact path
#[cfg_attr(test, automock)]
pub trait MapRenderer: Send {
    /// Writes the map and returns where it went
    fn render(
        &mut self,
        grid: &Grid,
        annotations: &HashMap<Cell, ImageRef>,
    ) -> Result<PathBuf, CrawlerError>;
}

/// Non-blocking source of key symbols, at most one per poll
#[cfg_attr(test, automock)]
pub trait InputSource {
    /// Returns the next pending key, if any, without waiting
    fn poll(&mut self) -> Option<Key>;
}
