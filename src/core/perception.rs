// core/perception.rs

// Turns distance readings into occupancy. A reading taken at a pose is projected
// along the current heading, scaled from sensor distance units to grid cells, and
// the resulting cell is marked occupied. This is a coarse dead-reckoning projection,
// not a calibrated sensor model. Captured images can be associated with the cell
// they were taken at; the image files themselves belong to the camera side.

// Dependencies
use log::{debug, info};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::grid::{Cell, Grid, GridStore};
use super::localization::{Heading, Pose};
use crate::CrawlerError;

/// One distance sample. `None` means the sensor gave nothing usable.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    /// Distance in sensor units, if the read was valid
    pub distance: Option<f64>,
}

impl SensorReading {
    /// Reading with the given distance, taken as is
    pub fn new(distance: Option<f64>) -> Self {
        SensorReading { distance }
    }

    /// Reading with no usable distance
    pub fn absent() -> Self {
        SensorReading { distance: None }
    }

    /// Converts a raw sonar value; negative or NaN values are treated as absent
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() || raw < 0.0 {
            Self::absent()
        } else {
            SensorReading {
                distance: Some(raw),
            }
        }
    }

    /// The distance, or `SensorUnavailable` when there is none
    pub fn try_distance(&self) -> Result<f64, CrawlerError> {
        self.distance.ok_or(CrawlerError::SensorUnavailable)
    }
}

impl From<Option<f64>> for SensorReading {
    fn from(sample: Option<f64>) -> Self {
        match sample {
            Some(raw) => Self::from_raw(raw),
            None => Self::absent(),
        }
    }
}

/// Reference to an image stored by the camera collaborator
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(pub PathBuf);

impl ImageRef {
    /// Reference to the image at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ImageRef(path.into())
    }

    /// Where the image is stored
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Copy of the map handed to the renderer
#[derive(Clone, Debug, PartialEq)]
pub struct MapSnapshot {
    /// Occupancy grid at snapshot time
    pub occupancy: Grid,
    /// Images attached to occupied cells
    pub annotations: HashMap<Cell, ImageRef>,
}

/// Projects readings into the occupancy grid and keeps cell annotations
#[derive(Clone, Debug)]
pub struct ObstacleMapper {
    map_scale: f64,
    annotations: HashMap<Cell, ImageRef>,
}

impl ObstacleMapper {
    /// Creates a mapper converting one distance unit into `map_scale` grid cells
    pub fn new(map_scale: f64) -> Self {
        ObstacleMapper {
            map_scale,
            annotations: HashMap::new(),
        }
    }

    /// Projects `distance` from `pose` along `heading` into a grid cell
    pub fn project(&self, pose: Pose, heading: Heading, distance: f64) -> Cell {
        let offset: Vector2<f64> = heading.direction() * (distance * self.map_scale);
        Cell::new(
            (pose.x as f64 + offset.x).round() as i32,
            (pose.y as f64 + offset.y).round() as i32,
        )
    }

    /// Records an obstacle observation.
    ///
    /// Returns the occupied cell, or `None` when the reading is absent or the
    /// projection falls outside the grid. An absent reading touches nothing.
    pub fn observe(
        &mut self,
        grid: &mut GridStore,
        pose: Pose,
        heading: Heading,
        reading: SensorReading,
        attachment: Option<ImageRef>,
    ) -> Option<Cell> {
        let distance = match reading.try_distance() {
            Ok(d) => d,
            Err(e) => {
                debug!("Observation skipped: {}", e);
                return None;
            }
        };

        let cell = self.project(pose, heading, distance);
        if let Err(e) = grid.try_mark_obstacle(cell.x, cell.y) {
            debug!("Projected obstacle dropped: {}", e);
            return None;
        }
        info!(
            "Obstacle at {:.1} units mapped to cell {}",
            distance, cell
        );

        if let Some(image) = attachment {
            self.annotate(cell, image);
        }
        Some(cell)
    }

    /// Associates an image with an occupied cell, replacing any earlier one
    pub fn annotate(&mut self, cell: Cell, image: ImageRef) {
        debug!("Annotating cell {} with {:?}", cell, image.path());
        self.annotations.insert(cell, image);
    }

    /// Images recorded so far, by cell
    pub fn annotations(&self) -> &HashMap<Cell, ImageRef> {
        &self.annotations
    }

    /// Snapshot of the occupancy grid plus annotations for rendering
    pub fn snapshot(&self, grid: &GridStore) -> MapSnapshot {
        MapSnapshot {
            occupancy: grid.occupancy().clone(),
            annotations: self.annotations.clone(),
        }
    }
}
