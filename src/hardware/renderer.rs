// hardware/renderer.rs

// Writes the occupancy grid as an 8-bit grayscale PNG (occupied cells white,
// everything else black, pixel (x, y) = cell (x, y)) and the image annotations as
// a YAML list next to it. PNG is lossless, so `read_occupancy` gives back exactly
// the grid that was rendered.

// Dependencies
use image::{GrayImage, Luma};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::MapRenderer;
use crate::CrawlerError;
use crate::core::{Cell, Grid, ImageRef};

const OCCUPIED: u8 = 255;
const FREE: u8 = 0;

/// One cell -> image association as stored in the sidecar file
#[derive(Debug, Serialize, Deserialize)]
struct Annotation {
    cell: Cell,
    image: ImageRef,
}

/// Renders maps into `directory/file_name`, overwriting the previous render
#[derive(Clone, Debug)]
pub struct PngMapRenderer {
    directory: PathBuf,
    file_name: String,
}

impl PngMapRenderer {
    /// Renderer writing `file_name` inside `directory`
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        PngMapRenderer {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Path of the PNG written on each render
    pub fn map_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Path of the annotation sidecar (`<stem>.yaml`)
    pub fn annotations_path(&self) -> PathBuf {
        self.map_path().with_extension("yaml")
    }
}

impl MapRenderer for PngMapRenderer {
    fn render(
        &mut self,
        grid: &Grid,
        annotations: &HashMap<Cell, ImageRef>,
    ) -> Result<PathBuf, CrawlerError> {
        std::fs::create_dir_all(&self.directory)?;

        let size = grid.size() as u32;
        let image = GrayImage::from_fn(size, size, |x, y| {
            Luma([if grid.get(x as i32, y as i32) { OCCUPIED } else { FREE }])
        });
        let map_path = self.map_path();
        image
            .save(&map_path)
            .map_err(|e| CrawlerError::Render(e.to_string()))?;

        let mut entries: Vec<Annotation> = annotations
            .iter()
            .map(|(cell, image)| Annotation {
                cell: *cell,
                image: image.clone(),
            })
            .collect();
        entries.sort_by_key(|a| a.cell);
        let file = File::create(self.annotations_path())?;
        serde_yaml::to_writer(file, &entries).map_err(|e| CrawlerError::Render(e.to_string()))?;

        info!("Map saved as {:?}", map_path);
        Ok(map_path)
    }
}

/// Loads a rendered map PNG back into a grid
pub fn read_occupancy<P: AsRef<Path>>(path: P) -> Result<Grid, CrawlerError> {
    let image = image::open(path.as_ref())
        .map_err(|e| CrawlerError::Render(e.to_string()))?
        .to_luma8();
    if image.width() != image.height() {
        return Err(CrawlerError::Render(format!(
            "map image is {}x{}, expected a square",
            image.width(),
            image.height()
        )));
    }

    let mut grid = Grid::new(image.width() as usize);
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] > FREE {
            grid.set(x as i32, y as i32)?;
        }
    }
    Ok(grid)
}

/// Loads an annotation sidecar written by [`PngMapRenderer`]
pub fn read_annotations<P: AsRef<Path>>(path: P) -> Result<HashMap<Cell, ImageRef>, CrawlerError> {
    let file = File::open(path.as_ref())?;
    let entries: Vec<Annotation> =
        serde_yaml::from_reader(file).map_err(|e| CrawlerError::Render(e.to_string()))?;
    Ok(entries.into_iter().map(|a| (a.cell, a.image)).collect())
}
