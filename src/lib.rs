//! Crawler navigation - exploration and occupancy mapping for a small legged robot
//!
//! This library provides the navigation core of the crawler: dead-reckoning pose
//! tracking, occupancy and visited grids, the obstacle avoidance state machine and
//! the automatic/manual mode switch. Devices (sonar, gait servos, camera, keyboard,
//! speaker, map output) are reached only through the traits in [`hardware`].

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Owned crawler state: grids, pose, obstacle mapping and mode
pub mod core;
pub mod hardware;
pub mod navigation;
/// Interval trigger for periodic work
pub mod timer;
/// Background thread for alerts, captures and renders
pub mod worker;

// Re-export commonly used items for easier access
pub use self::core::{
    Cell, CrawlerState, GridStore, Heading, Mode, ModeController, MotionIntent, MotionKind,
    ObstacleMapper, Pose, PoseTracker, SensorReading, SpeedLimits,
};
pub use navigation::{Decision, NavState, NavigationPolicy};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use self::core::{MAX_GRID_SIZE, ModeEvent, SPEED_CEILING, SPEED_FLOOR};
use hardware::{Actuator, AlertSink, DistanceSensor, ImageCapture, InputSource, MapRenderer};
use timer::IntervalTimer;
use worker::BackgroundWorker;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Grid shape and distance scaling
    pub grid: GridConfig,
    /// Obstacle threshold and tick timing
    pub navigation: NavigationConfig,
    /// Manual speed range
    pub speed: SpeedLimits,
    /// Where and how often maps are written
    pub output: OutputConfig,
    /// Samples replayed by the scripted sonar
    pub sonar: SonarConfig,
    /// Optional frame source for obstacle images
    pub camera: CameraConfig,
}

/// Grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side
    pub size: usize,
    /// Grid cells per sensor distance unit
    pub map_scale: f64,
}

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Readings at or below this distance trigger avoidance
    pub alert_distance: f64,
    /// Control loop period
    pub tick_period_ms: u64,
}

/// Map output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory maps and captured images are written to
    pub directory: PathBuf,
    /// File name of the rendered map
    pub map_file: String,
    /// Seconds between periodic map renders
    pub render_interval_s: f64,
}

/// Scripted sonar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SonarConfig {
    /// Samples in replay order; `~` is a failed read
    pub readings: Vec<Option<f64>>,
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CameraConfig {
    /// PNG frame kept current by an external capture process. Without one,
    /// obstacle captures are skipped.
    pub frame_source: Option<PathBuf>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            size: 500,
            map_scale: 10.0,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            alert_distance: 15.0,
            tick_period_ms: 200,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("maps"),
            map_file: "top_down_map.png".to_string(),
            render_interval_s: 10.0,
        }
    }
}

impl CrawlerConfig {
    /// Loads and validates a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CrawlerError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: CrawlerConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Checks value ranges, so nothing built from a validated config can panic
    pub fn validate(&self) -> Result<(), CrawlerError> {
        let fail = |msg: String| Err(CrawlerError::Config(msg));

        if self.grid.size == 0 || self.grid.size > MAX_GRID_SIZE {
            return fail(format!("grid.size must be between 1 and {}", MAX_GRID_SIZE));
        }
        if !(self.grid.map_scale > 0.0) || !self.grid.map_scale.is_finite() {
            return fail("grid.map_scale must be positive".into());
        }
        if !(self.navigation.alert_distance >= 0.0) {
            return fail("navigation.alert_distance must not be negative".into());
        }
        if self.navigation.tick_period_ms == 0 {
            return fail("navigation.tick_period_ms must be positive".into());
        }

        let speed = &self.speed;
        if speed.min < SPEED_FLOOR || speed.max > SPEED_CEILING {
            return fail(format!(
                "speed range [{}, {}] must lie within [{}, {}]",
                speed.min, speed.max, SPEED_FLOOR, SPEED_CEILING
            ));
        }
        if speed.min > speed.max || speed.initial < speed.min || speed.initial > speed.max {
            return fail("speed must satisfy min <= initial <= max".into());
        }
        if speed.step == 0 {
            return fail("speed.step must be positive".into());
        }

        if !(self.output.render_interval_s > 0.0) {
            return fail("output.render_interval_s must be positive".into());
        }
        self.render_interval()?;
        Ok(())
    }

    /// Control loop period
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.navigation.tick_period_ms)
    }

    /// Periodic render interval; fails when the seconds value does not fit a `Duration`
    pub fn render_interval(&self) -> Result<Duration, CrawlerError> {
        Duration::try_from_secs_f64(self.output.render_interval_s).map_err(|e| {
            CrawlerError::Config(format!(
                "output.render_interval_s {} is out of range: {}",
                self.output.render_interval_s, e
            ))
        })
    }
}

/// Crawler error types
#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    /// Sensor gave no usable reading; treated as "no obstacle"
    #[error("Distance sensor gave no usable reading")]
    SensorUnavailable,
    /// Projected or dead-reckoned cell fell off the grid; the write is dropped
    #[error("Cell ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column
        x: i32,
        /// Row
        y: i32,
    },
    /// Camera returned nothing; the annotation is omitted
    #[error("Image capture failed")]
    CaptureFailed,
    /// Operator asked to stop; ends the control loop
    #[error("Shutdown requested")]
    ShutdownRequested,
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Map or image encoding failed
    #[error("Render error: {0}")]
    Render(String),
    /// Filesystem or terminal failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for CrawlerError {
    fn from(e: serde_yaml::Error) -> Self {
        CrawlerError::Config(e.to_string())
    }
}

/// The devices the crawler is wired to
pub struct Hardware {
    /// Sonar
    pub sensor: Box<dyn DistanceSensor>,
    /// Gait servos
    pub actuator: Box<dyn Actuator>,
    /// Operator keyboard
    pub input: Box<dyn InputSource>,
    /// Obstacle alert
    pub alert: Box<dyn AlertSink>,
    /// Obstacle camera
    pub camera: Box<dyn ImageCapture>,
    /// Map output
    pub renderer: Box<dyn MapRenderer>,
}

/// Combined crawler status
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerStatus {
    /// Current mode
    pub mode: Mode,
    /// Current speed in percent
    pub speed: u16,
    /// Dead-reckoned position
    pub pose: Pose,
    /// Dead-reckoned heading
    pub heading: Heading,
    /// Navigation policy state
    pub nav_state: NavState,
    /// Cells marked visited
    pub visited_cells: usize,
    /// Cells marked occupied
    pub obstacle_cells: usize,
    /// Cells with an attached image
    pub annotations: usize,
    /// Control cycles run
    pub cycles: u64,
}

/// Owns the crawler state and drives one control cycle at a time
pub struct Crawler {
    config: CrawlerConfig,
    state: CrawlerState,
    policy: NavigationPolicy,
    sensor: Box<dyn DistanceSensor>,
    actuator: Box<dyn Actuator>,
    input: Box<dyn InputSource>,
    worker: BackgroundWorker,
    render_timer: IntervalTimer,
    cycles: u64,
}

impl Crawler {
    /// Create a crawler with the given configuration and devices
    pub fn new(config: CrawlerConfig, hardware: Hardware) -> Result<Self, CrawlerError> {
        config.validate()?;

        let worker = BackgroundWorker::spawn(hardware.alert, hardware.camera, hardware.renderer)?;
        let state = CrawlerState::new(&config);
        info!(
            "Crawler ready: {}x{} grid, start {:?}, alert distance {}",
            config.grid.size,
            config.grid.size,
            state.tracker.current_pose(),
            config.navigation.alert_distance
        );

        Ok(Crawler {
            policy: NavigationPolicy::new(config.navigation.alert_distance),
            render_timer: IntervalTimer::new(config.render_interval()?),
            state,
            sensor: hardware.sensor,
            actuator: hardware.actuator,
            input: hardware.input,
            worker,
            cycles: 0,
            config,
        })
    }

    /// Configuration the crawler was built with
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Read-only view of grids, pose, annotations and mode
    pub fn state(&self) -> &CrawlerState {
        &self.state
    }

    /// Run one control cycle.
    ///
    /// `elapsed` is the time since the previous cycle and drives the periodic
    /// map render. Returns the navigation decision when the cycle ran in
    /// Automatic mode, or `Err(ShutdownRequested)` when the operator quit.
    pub fn run_cycle(&mut self, elapsed: Duration) -> Result<Option<Decision>, CrawlerError> {
        self.cycles += 1;

        for capture in self.worker.drain_captures() {
            self.state.mapper.annotate(capture.cell, capture.image);
        }

        if let Some(key) = self.input.poll() {
            match self.state.mode.handle_key(key) {
                ModeEvent::Quit => {
                    info!("Program stopped by user");
                    return Err(CrawlerError::ShutdownRequested);
                }
                ModeEvent::Motion(intent) => {
                    let speed = self.state.mode.speed();
                    self.policy.controller().execute(
                        intent,
                        speed,
                        &mut self.state.tracker,
                        self.actuator.as_mut(),
                    );
                }
                ModeEvent::Toggled(_) | ModeEvent::SpeedChanged(_) | ModeEvent::Ignored => (),
            }
        }

        let decision = match self.state.mode.mode() {
            Mode::Automatic => {
                let reading = SensorReading::from(self.sensor.sample());
                let decision = self
                    .policy
                    .tick(&mut self.state, reading, self.actuator.as_mut());
                if decision.alert {
                    self.worker.request_alert(decision.observed);
                }
                Some(decision)
            }
            Mode::Manual => None,
        };

        if self.render_timer.advance(elapsed) {
            self.worker.request_render(self.state.snapshot());
        }

        Ok(decision)
    }

    /// Stop the actuator, render the map one last time and wait for the worker
    pub fn shutdown(mut self) -> CrawlerStatus {
        info!("Shutting down crawler...");
        self.actuator.stop();

        for capture in self.worker.drain_captures() {
            self.state.mapper.annotate(capture.cell, capture.image);
        }
        let Crawler { worker, mut state, policy, cycles, .. } = self;
        for capture in worker.finish(state.snapshot()) {
            state.mapper.annotate(capture.cell, capture.image);
        }

        let status = status_of(&state, &policy, cycles);
        debug!("Final status: {:?}", status);
        status
    }

    /// Get current crawler status
    pub fn status(&self) -> CrawlerStatus {
        status_of(&self.state, &self.policy, self.cycles)
    }
}

fn status_of(state: &CrawlerState, policy: &NavigationPolicy, cycles: u64) -> CrawlerStatus {
    CrawlerStatus {
        mode: state.mode.mode(),
        speed: state.mode.speed(),
        pose: state.tracker.current_pose(),
        heading: state.tracker.heading(),
        nav_state: policy.state(),
        visited_cells: state.grid.visited().count(),
        obstacle_cells: state.grid.occupancy().count(),
        annotations: state.mapper.annotations().len(),
        cycles,
    }
}
