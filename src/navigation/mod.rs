//! Navigation system for the crawler
//!
//! This module holds the obstacle-avoidance state machine that drives the robot
//! in Automatic mode, the fixed motion plans it chooses from, and the motion
//! controller that sends those plans to the actuator.

mod controller;
/// Fixed motion plans
pub mod planner;

pub use controller::MotionController;

use log::{debug, info};

use crate::CrawlerState;
use crate::core::{Cell, MotionIntent, MotionKind, SensorReading};
use crate::hardware::Actuator;

/// Navigation policy states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Exploring: advance into unvisited cells, turn when revisiting
    Scanning,
    /// Running the avoidance maneuver; lasts a single tick
    Avoiding,
}

/// Outcome of one policy tick
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// State the tick ran in
    pub state: NavState,
    /// Intents executed during the tick, in order
    pub intents: Vec<MotionIntent>,
    /// Cell marked occupied by this tick, if any
    pub observed: Option<Cell>,
    /// Whether an alert (sound + image capture) should be raised
    pub alert: bool,
}

/// Obstacle detection and avoidance decision loop
#[derive(Debug)]
pub struct NavigationPolicy {
    /// Readings at or below this distance trigger avoidance
    alert_distance: f64,
    state: NavState,
    controller: MotionController,
}

impl NavigationPolicy {
    /// Create a new policy in the Scanning state
    pub fn new(alert_distance: f64) -> Self {
        NavigationPolicy {
            alert_distance,
            state: NavState::Scanning,
            controller: MotionController::new(),
        }
    }

    /// Current state. Between ticks this is always Scanning.
    pub fn state(&self) -> NavState {
        self.state
    }

    /// Distance at or below which a reading is near
    pub fn alert_distance(&self) -> f64 {
        self.alert_distance
    }

    /// Shared motion controller, also used for manual commands
    pub fn controller(&mut self) -> &mut MotionController {
        &mut self.controller
    }

    /// True when the reading has a distance at or below the alert distance.
    /// An absent reading is never near.
    pub fn is_near(&self, reading: &SensorReading) -> bool {
        matches!(reading.distance, Some(d) if d <= self.alert_distance)
    }

    /// Run one automatic-mode tick with the latest sensor reading
    pub fn tick(
        &mut self,
        state: &mut CrawlerState,
        reading: SensorReading,
        actuator: &mut dyn Actuator,
    ) -> Decision {
        if self.is_near(&reading) {
            self.avoid(state, reading, actuator)
        } else {
            self.explore(state, reading, actuator)
        }
    }

    /// Obstacle near: map it and mark the current cell visited from the
    /// pre-maneuver pose, then run the maneuver.
    fn avoid(
        &mut self,
        state: &mut CrawlerState,
        reading: SensorReading,
        actuator: &mut dyn Actuator,
    ) -> Decision {
        self.state = NavState::Avoiding;
        info!("Obstacle detected at {:?}! Avoiding...", reading.distance);

        let pose = state.tracker.current_pose();
        let heading = state.tracker.heading();
        let observed = state
            .mapper
            .observe(&mut state.grid, pose, heading, reading, None);
        state.grid.mark_visited(pose.x, pose.y);

        let speed = state.mode.speed();
        let intents = planner::avoidance_maneuver().to_vec();
        for intent in &intents {
            self.controller
                .execute(*intent, speed, &mut state.tracker, actuator);
        }

        self.state = NavState::Scanning;
        Decision {
            state: NavState::Avoiding,
            intents,
            observed,
            alert: true,
        }
    }

    /// Nothing near: step into unvisited ground, or turn left on a revisit.
    /// A forward step marks the cell reached, after the move.
    fn explore(
        &mut self,
        state: &mut CrawlerState,
        reading: SensorReading,
        actuator: &mut dyn Actuator,
    ) -> Decision {
        if let Err(e) = reading.try_distance() {
            debug!("{}, treating as clear", e);
        }

        let pose = state.tracker.current_pose();
        let intent = planner::exploration_step(state.grid.is_visited(pose.x, pose.y));
        self.controller
            .execute(intent, state.mode.speed(), &mut state.tracker, actuator);

        if intent.kind == MotionKind::Forward {
            let reached = state.tracker.current_pose();
            state.grid.mark_visited(reached.x, reached.y);
        }

        Decision {
            state: NavState::Scanning,
            intents: vec![intent],
            observed: None,
            alert: false,
        }
    }
}
