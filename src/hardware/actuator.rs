// hardware/actuator.rs
// Stand-in gait actuator that logs each command instead of driving servos.

use log::info;

use super::Actuator;
use crate::core::MotionKind;

/// Actuator that only logs commands; useful off-robot and in dry runs
#[derive(Debug, Default)]
pub struct LogActuator {
    commands: u64,
}

impl LogActuator {
    /// Actuator with no commands executed yet
    pub fn new() -> Self {
        LogActuator::default()
    }
}

impl Actuator for LogActuator {
    fn execute(&mut self, kind: MotionKind, steps: u32, speed: u16) {
        self.commands += 1;
        info!("Executing {:?} x{} at {}% speed", kind, steps, speed);
    }

    fn stop(&mut self) {
        info!("Actuator stopped after {} commands", self.commands);
    }
}
