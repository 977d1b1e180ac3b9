// core/mod.rs

// Declares the crawler's owned state: grids, dead-reckoned pose, obstacle mapper
// and mode controller. `CrawlerState` bundles them into the single context the
// control loop mutates; nothing here is global.

/// Occupancy and visited grids
pub mod grid;
/// Pose, heading and dead reckoning
pub mod localization;
/// Sensor readings and obstacle mapping
pub mod perception;
/// Operating mode and manual control
pub mod state;

pub use grid::{Cell, Grid, GridStore, MAX_GRID_SIZE};
pub use localization::{Heading, MotionIntent, MotionKind, Pose, PoseTracker};
pub use perception::{ImageRef, MapSnapshot, ObstacleMapper, SensorReading};
pub use state::{
    ManualCommand, Mode, ModeController, ModeEvent, SPEED_CEILING, SPEED_FLOOR, SpeedLimits,
};

use crate::CrawlerConfig;

/// Everything the control loop owns and mutates, one writer at a time
#[derive(Clone, Debug)]
pub struct CrawlerState {
    /// Occupancy and visited grids
    pub grid: GridStore,
    /// Dead-reckoned pose
    pub tracker: PoseTracker,
    /// Obstacle projection and image annotations
    pub mapper: ObstacleMapper,
    /// Mode and speed
    pub mode: ModeController,
}

impl CrawlerState {
    /// Fresh state: empty grids, robot at the grid centre facing East
    pub fn new(config: &CrawlerConfig) -> Self {
        let centre = (config.grid.size / 2) as i32;
        CrawlerState {
            grid: GridStore::new(config.grid.size),
            tracker: PoseTracker::new(Pose::new(centre, centre), Heading::East),
            mapper: ObstacleMapper::new(config.grid.map_scale),
            mode: ModeController::new(config.speed),
        }
    }

    /// Copy of the occupancy grid and annotations for the renderer
    pub fn snapshot(&self) -> MapSnapshot {
        self.mapper.snapshot(&self.grid)
    }
}
