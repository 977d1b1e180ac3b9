// src/navigation/controller.rs
// Executes motion intents: forwards them to the actuator and applies the same
// motion to the dead-reckoned pose, so the tracker only ever reflects commands
// that were actually sent.

use log::debug;

use crate::core::{MotionIntent, PoseTracker};
use crate::hardware::Actuator;

/// Sends motion intents to the actuator and keeps the pose tracker in step
#[derive(Debug, Default)]
pub struct MotionController {
    executed: u64,
}

impl MotionController {
    /// Controller with no intents executed yet
    pub fn new() -> Self {
        MotionController::default()
    }

    /// Executes `intent` at `speed` percent.
    /// - The actuator call is fire-and-forget; nothing is read back from it.
    /// - The tracker is updated with the intent as sent.
    pub fn execute(
        &mut self,
        intent: MotionIntent,
        speed: u16,
        tracker: &mut PoseTracker,
        actuator: &mut dyn Actuator,
    ) {
        debug!("Executing command: {} at {}%", intent, speed);
        actuator.execute(intent.kind, intent.steps, speed);
        tracker.apply_motion(intent.kind, intent.steps);
        self.executed += 1;
    }

    /// Number of intents executed so far
    pub fn executed(&self) -> u64 {
        self.executed
    }
}
