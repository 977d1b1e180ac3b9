// core/localization.rs

// Dead-reckoning localization. The crawler has no position feedback, so the pose
// is whatever the executed motion commands add up to: forward/backward steps move
// along the current heading one grid unit per step, turns rotate the heading by a
// fixed 90 degree increment and leave the position alone.

// Dependencies
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::grid::Cell;

/// Robot position in grid coordinates (origin at the grid centre at start-up)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pose {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Pose {
    /// Pose at column `x`, row `y`
    pub fn new(x: i32, y: i32) -> Self {
        Pose { x, y }
    }

    /// The grid cell this pose occupies
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Cardinal heading. Turning left goes East -> North -> West -> South.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    /// Towards +x
    East,
    /// Towards -y
    North,
    /// Towards -x
    West,
    /// Towards +y
    South,
}

impl Heading {
    /// Heading angle in radians, East = 0, counter-clockwise positive
    pub fn radians(self) -> f64 {
        match self {
            Heading::East => 0.0,
            Heading::North => std::f64::consts::FRAC_PI_2,
            Heading::West => std::f64::consts::PI,
            Heading::South => 3.0 * std::f64::consts::FRAC_PI_2,
        }
    }

    /// One grid step along this heading. Rows grow downwards, so North is -y.
    pub fn step(self) -> Vector2<i32> {
        match self {
            Heading::East => Vector2::new(1, 0),
            Heading::North => Vector2::new(0, -1),
            Heading::West => Vector2::new(-1, 0),
            Heading::South => Vector2::new(0, 1),
        }
    }

    /// Unit direction in grid space, matching [`Heading::step`]
    pub fn direction(self) -> Vector2<f64> {
        let theta = self.radians();
        Vector2::new(theta.cos(), -theta.sin())
    }

    /// Heading after a 90 degree turn counter-clockwise
    pub fn turned_left(self) -> Self {
        match self {
            Heading::East => Heading::North,
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
        }
    }

    /// Heading after a 90 degree turn clockwise
    pub fn turned_right(self) -> Self {
        match self {
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
            Heading::North => Heading::East,
        }
    }
}

/// Gait commands understood by the actuator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionKind {
    /// Step along the heading
    Forward,
    /// Step against the heading
    Backward,
    /// Rotate counter-clockwise in place
    TurnLeft,
    /// Rotate clockwise in place
    TurnRight,
}

/// A motion kind repeated `steps` times
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionIntent {
    /// What to do
    pub kind: MotionKind,
    /// How many times
    pub steps: u32,
}

impl MotionIntent {
    /// Intent for `steps` repetitions of `kind`
    pub fn new(kind: MotionKind, steps: u32) -> Self {
        MotionIntent { kind, steps }
    }

    /// Forward by `steps` cells
    pub fn forward(steps: u32) -> Self {
        Self::new(MotionKind::Forward, steps)
    }

    /// Backward by `steps` cells
    pub fn backward(steps: u32) -> Self {
        Self::new(MotionKind::Backward, steps)
    }

    /// `steps` quarter turns to the left
    pub fn turn_left(steps: u32) -> Self {
        Self::new(MotionKind::TurnLeft, steps)
    }

    /// `steps` quarter turns to the right
    pub fn turn_right(steps: u32) -> Self {
        Self::new(MotionKind::TurnRight, steps)
    }
}

impl std::fmt::Display for MotionIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}({})", self.kind, self.steps)
    }
}

/// Tracks position and heading from executed motions
#[derive(Clone, Debug)]
pub struct PoseTracker {
    pose: Pose,
    heading: Heading,
}

impl PoseTracker {
    /// Starts tracking from `origin` facing `heading`
    pub fn new(origin: Pose, heading: Heading) -> Self {
        PoseTracker {
            pose: origin,
            heading,
        }
    }

    /// Dead-reckoned position
    pub fn current_pose(&self) -> Pose {
        self.pose
    }

    /// Dead-reckoned heading
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Applies an executed motion to the tracked pose
    pub fn apply_motion(&mut self, kind: MotionKind, steps: u32) {
        let steps = steps as i32;
        match kind {
            MotionKind::Forward => self.advance(steps),
            MotionKind::Backward => self.advance(-steps),
            MotionKind::TurnLeft => {
                for _ in 0..steps.rem_euclid(4) {
                    self.heading = self.heading.turned_left();
                }
            }
            MotionKind::TurnRight => {
                for _ in 0..steps.rem_euclid(4) {
                    self.heading = self.heading.turned_right();
                }
            }
        }
        debug!(
            "Pose after {:?}({}): x={}, y={}, heading={:?}",
            kind, steps, self.pose.x, self.pose.y, self.heading
        );
    }

    fn advance(&mut self, steps: i32) {
        let delta = self.heading.step() * steps;
        self.pose.x = self.pose.x.saturating_add(delta.x);
        self.pose.y = self.pose.y.saturating_add(delta.y);
    }
}
