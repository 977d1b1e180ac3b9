// core/state.rs

// Operating mode and manual control. The crawler runs either Automatic (the
// navigation policy drives) or Manual (keys drive). Only an explicit toggle key
// flips the mode. Manual speed adjustments saturate inside the configured range
// instead of failing at the edges.

// Dependencies
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::localization::MotionIntent;
use crate::hardware::Key;

/// Slowest speed (percent) the gait accepts
pub const SPEED_FLOOR: u16 = 70;
/// Fastest speed (percent) the gait accepts
pub const SPEED_CEILING: u16 = 200;

/// Robot operating modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Navigation policy decides each tick
    Automatic,
    /// Key presses decide
    Manual,
}

/// Allowed speed range (percent) and adjustment increment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedLimits {
    /// Speed at startup
    pub initial: u16,
    /// Lowest speed reachable with `k`
    pub min: u16,
    /// Highest speed reachable with `i`
    pub max: u16,
    /// Change per key press
    pub step: u16,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        SpeedLimits {
            initial: 80,
            min: 70,
            max: 200,
            step: 10,
        }
    }
}

/// Commands accepted while in Manual mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManualCommand {
    /// Execute a motion
    Move(MotionIntent),
    /// Raise speed by one step
    SpeedUp,
    /// Lower speed by one step
    SpeedDown,
}

/// Result of feeding one key to the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeEvent {
    /// Mode flipped; carries the new mode
    Toggled(Mode),
    /// A manual motion to execute
    Motion(MotionIntent),
    /// Speed adjusted; carries the new speed
    SpeedChanged(u16),
    /// Operator asked to stop
    Quit,
    /// Key had no effect
    Ignored,
}

/// Tracks mode and speed, and maps keys to manual commands
#[derive(Clone, Debug)]
pub struct ModeController {
    mode: Mode,
    speed: u16,
    limits: SpeedLimits,
}

impl ModeController {
    /// Starts in Automatic mode at the configured initial speed
    pub fn new(limits: SpeedLimits) -> Self {
        let speed = limits.initial.clamp(limits.min, limits.max);
        ModeController {
            mode: Mode::Automatic,
            speed,
            limits,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current speed in percent
    pub fn speed(&self) -> u16 {
        self.speed
    }

    /// Flips between Automatic and Manual and returns the new mode
    pub fn toggle(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Automatic => Mode::Manual,
            Mode::Manual => Mode::Automatic,
        };
        info!(
            "Automatic mode {}",
            if self.mode == Mode::Automatic { "enabled" } else { "disabled" }
        );
        self.mode
    }

    /// Maps a key symbol to a manual command
    pub fn command_for(key: Key) -> Option<ManualCommand> {
        match key {
            Key::Char('w') => Some(ManualCommand::Move(MotionIntent::forward(1))),
            Key::Char('s') => Some(ManualCommand::Move(MotionIntent::backward(1))),
            Key::Char('a') => Some(ManualCommand::Move(MotionIntent::turn_left(1))),
            Key::Char('d') => Some(ManualCommand::Move(MotionIntent::turn_right(1))),
            Key::Char('i') => Some(ManualCommand::SpeedUp),
            Key::Char('k') => Some(ManualCommand::SpeedDown),
            _ => None,
        }
    }

    /// Handles one key symbol.
    ///
    /// Toggle and quit work in both modes; everything else only in Manual.
    pub fn handle_key(&mut self, key: Key) -> ModeEvent {
        match key {
            Key::Char('m') => return ModeEvent::Toggled(self.toggle()),
            Key::Char('q') | Key::Interrupt => return ModeEvent::Quit,
            _ => (),
        }

        match Self::command_for(key) {
            Some(command) => self.dispatch_manual(command),
            None => {
                debug!("Unmapped key {:?} ignored", key);
                ModeEvent::Ignored
            }
        }
    }

    /// Executes a manual command. Ignored unless in Manual mode.
    pub fn dispatch_manual(&mut self, command: ManualCommand) -> ModeEvent {
        if self.mode != Mode::Manual {
            debug!("Manual command {:?} ignored in automatic mode", command);
            return ModeEvent::Ignored;
        }

        match command {
            ManualCommand::Move(intent) => ModeEvent::Motion(intent),
            ManualCommand::SpeedUp => {
                self.speed = self
                    .speed
                    .saturating_add(self.limits.step)
                    .min(self.limits.max);
                info!("Speed increased to {}%", self.speed);
                ModeEvent::SpeedChanged(self.speed)
            }
            ManualCommand::SpeedDown => {
                self.speed = self
                    .speed
                    .saturating_sub(self.limits.step)
                    .max(self.limits.min);
                info!("Speed decreased to {}%", self.speed);
                ModeEvent::SpeedChanged(self.speed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn manual() -> ModeController {
        let mut controller = ModeController::new(SpeedLimits::default());
        controller.toggle();
        controller
    }

    #[test]
    fn test_starts_automatic_at_initial_speed() {
        let controller = ModeController::new(SpeedLimits::default());
        assert_eq!(controller.mode(), Mode::Automatic);
        assert_eq!(controller.speed(), 80);
    }

    #[test]
    fn test_toggle_flips_both_ways() {
        let mut controller = ModeController::new(SpeedLimits::default());
        assert_eq!(controller.handle_key(Key::Char('m')), ModeEvent::Toggled(Mode::Manual));
        assert_eq!(controller.handle_key(Key::Char('m')), ModeEvent::Toggled(Mode::Automatic));
    }

    #[rstest]
    #[case('w', MotionIntent::forward(1))]
    #[case('s', MotionIntent::backward(1))]
    #[case('a', MotionIntent::turn_left(1))]
    #[case('d', MotionIntent::turn_right(1))]
    fn test_manual_keys_map_to_motions(#[case] key: char, #[case] intent: MotionIntent) {
        let mut controller = manual();
        assert_eq!(controller.handle_key(Key::Char(key)), ModeEvent::Motion(intent));
    }

    #[rstest]
    #[case('w')]
    #[case('i')]
    #[case('k')]
    fn test_manual_keys_ignored_in_automatic(#[case] key: char) {
        let mut controller = ModeController::new(SpeedLimits::default());
        assert_eq!(controller.handle_key(Key::Char(key)), ModeEvent::Ignored);
        assert_eq!(controller.speed(), 80);
    }

    #[test]
    fn test_speed_saturates_at_max() {
        let mut controller = ModeController::new(SpeedLimits {
            initial: 200,
            ..SpeedLimits::default()
        });
        controller.toggle();
        assert_eq!(controller.handle_key(Key::Char('i')), ModeEvent::SpeedChanged(200));
    }

    #[test]
    fn test_speed_saturates_at_min() {
        let mut controller = ModeController::new(SpeedLimits {
            initial: 70,
            ..SpeedLimits::default()
        });
        controller.toggle();
        assert_eq!(controller.handle_key(Key::Char('k')), ModeEvent::SpeedChanged(70));
    }

    #[test]
    fn test_quit_accepted_in_any_mode() {
        let mut controller = ModeController::new(SpeedLimits::default());
        assert_eq!(controller.handle_key(Key::Char('q')), ModeEvent::Quit);
        controller.toggle();
        assert_eq!(controller.handle_key(Key::Interrupt), ModeEvent::Quit);
    }

    #[test]
    fn test_unmapped_key_ignored() {
        let mut controller = manual();
        assert_eq!(controller.handle_key(Key::Char('x')), ModeEvent::Ignored);
    }
}
