// src/navigation/planner.rs
// Fixed motion plans used by the navigation policy. There is no path planning:
// the crawler either goes forward, turns, or runs the avoidance maneuver.

use crate::core::MotionIntent;

/// Maneuver run when an obstacle is near: back off, turn away, move on.
pub fn avoidance_maneuver() -> [MotionIntent; 3] {
    [
        MotionIntent::backward(1),
        MotionIntent::turn_left(1),
        MotionIntent::forward(2),
    ]
}

/// Exploration step when the way is clear.
/// - Unvisited cell: advance one step.
/// - Visited cell: turn left in place to look for new ground.
pub fn exploration_step(current_visited: bool) -> MotionIntent {
    if current_visited {
        MotionIntent::turn_left(1)
    } else {
        MotionIntent::forward(1)
    }
}
