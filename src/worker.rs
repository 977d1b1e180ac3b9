// src/worker.rs

// Background worker for the slow, side-effecting collaborators: the obstacle
// alert, the camera and the map renderer. The tick loop only queues jobs; it
// never waits on one. Captured images come back over a channel and are attached
// to their cell on a later tick.

// Dependencies
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::CrawlerError;
use crate::core::{Cell, ImageRef, MapSnapshot};
use crate::hardware::{AlertSink, ImageCapture, MapRenderer};

enum Job {
    /// Play the alert, then capture an image of the obstacle at `cell`
    Alert { cell: Option<Cell> },
    Render(MapSnapshot),
    Stop,
}

/// An image captured for an obstacle cell
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    /// Obstacle cell the image belongs to
    pub cell: Cell,
    /// The captured image
    pub image: ImageRef,
}

/// Handle to the worker thread
pub struct BackgroundWorker {
    jobs: Sender<Job>,
    captures: Receiver<Capture>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundWorker {
    /// Spawns the worker thread, which takes ownership of the collaborators
    pub fn spawn(
        alert: Box<dyn AlertSink>,
        camera: Box<dyn ImageCapture>,
        renderer: Box<dyn MapRenderer>,
    ) -> Result<Self, CrawlerError> {
        let (job_tx, job_rx) = mpsc::channel();
        let (capture_tx, capture_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("crawler-worker".into())
            .spawn(move || run(job_rx, capture_tx, alert, camera, renderer))?;

        Ok(BackgroundWorker {
            jobs: job_tx,
            captures: capture_rx,
            handle: Some(handle),
        })
    }

    /// Queues an alert plus image capture for an obstacle
    pub fn request_alert(&self, cell: Option<Cell>) {
        self.send(Job::Alert { cell });
    }

    /// Queues a map render
    pub fn request_render(&self, snapshot: MapSnapshot) {
        self.send(Job::Render(snapshot));
    }

    /// Captures completed since the last call
    pub fn drain_captures(&self) -> Vec<Capture> {
        self.captures.try_iter().collect()
    }

    /// Renders `snapshot` one last time, then stops the thread and waits for it.
    /// Jobs queued earlier are completed first.
    pub fn finish(mut self, snapshot: MapSnapshot) -> Vec<Capture> {
        self.send(Job::Render(snapshot));
        self.stop();
        self.drain_captures()
    }

    fn send(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            warn!("Background worker is gone, job dropped");
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.send(Job::Stop);
            if handle.join().is_err() {
                warn!("Background worker panicked");
            }
        }
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    jobs: Receiver<Job>,
    captures: Sender<Capture>,
    mut alert: Box<dyn AlertSink>,
    mut camera: Box<dyn ImageCapture>,
    mut renderer: Box<dyn MapRenderer>,
) {
    // Every capture this thread produced, so renders include images the
    // control loop has not collected yet
    let mut produced: HashMap<Cell, ImageRef> = HashMap::new();

    for job in jobs {
        match job {
            Job::Alert { cell } => {
                alert.notify();
                match (camera.capture(), cell) {
                    (Some(image), Some(cell)) => {
                        produced.insert(cell, image.clone());
                        if captures.send(Capture { cell, image }).is_err() {
                            debug!("Capture receiver closed");
                        }
                    }
                    (Some(image), None) => {
                        info!("Captured {:?} but the obstacle was off the map", image.path())
                    }
                    (None, _) => warn!("{}, annotation omitted", CrawlerError::CaptureFailed),
                }
            }
            Job::Render(mut snapshot) => {
                for (cell, image) in &produced {
                    snapshot.annotations.insert(*cell, image.clone());
                }
                info!("Saving map...");
                match renderer.render(&snapshot.occupancy, &snapshot.annotations) {
                    Ok(path) => debug!("Map render written to {:?}", path),
                    Err(e) => warn!("Map render failed: {}", e),
                }
            }
            Job::Stop => break,
        }
    }
    debug!("Background worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Grid;
    use crate::hardware::{MockAlertSink, MockImageCapture, MockMapRenderer};
    use std::path::PathBuf;

    #[test]
    fn test_alert_capture_comes_back_for_cell() {
        let mut alert = MockAlertSink::new();
        alert.expect_notify().times(1).return_const(());
        let mut camera = MockImageCapture::new();
        camera
            .expect_capture()
            .times(1)
            .returning(|| Some(ImageRef::new("camera_image_1.png")));
        let mut renderer = MockMapRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .withf(|_, annotations| annotations.len() == 1)
            .returning(|_, _| Ok(PathBuf::from("map.png")));

        let worker =
            BackgroundWorker::spawn(Box::new(alert), Box::new(camera), Box::new(renderer)).unwrap();
        worker.request_alert(Some(Cell::new(4, 2)));
        let captures = worker.finish(MapSnapshot {
            occupancy: Grid::new(8),
            annotations: HashMap::new(),
        });

        assert_eq!(
            captures,
            vec![Capture {
                cell: Cell::new(4, 2),
                image: ImageRef::new("camera_image_1.png"),
            }]
        );
    }

    #[test]
    fn test_failed_capture_and_render_are_absorbed() {
        let mut alert = MockAlertSink::new();
        alert.expect_notify().return_const(());
        let mut camera = MockImageCapture::new();
        camera.expect_capture().returning(|| None);
        let mut renderer = MockMapRenderer::new();
        renderer
            .expect_render()
            .times(2)
            .returning(|_, _| Err(CrawlerError::Render("disk full".into())));

        let worker =
            BackgroundWorker::spawn(Box::new(alert), Box::new(camera), Box::new(renderer)).unwrap();
        worker.request_alert(Some(Cell::new(1, 1)));
        worker.request_render(MapSnapshot {
            occupancy: Grid::new(4),
            annotations: HashMap::new(),
        });
        let captures = worker.finish(MapSnapshot {
            occupancy: Grid::new(4),
            annotations: HashMap::new(),
        });

        assert!(captures.is_empty());
    }
}
