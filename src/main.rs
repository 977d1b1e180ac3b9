// src/main.rs
// Entry point for the crawler: loads configuration, wires the devices and runs the
// fixed-period control loop until the operator quits or the process is interrupted.

// Dependencies
// - env_logger: console logging, CRLF-terminated because the terminal is in raw mode.
// - ctrlc: SIGINT/SIGTERM flag for when no raw-mode keyboard is attached.
use crawler_nav::hardware::{
    DisabledCamera, FrameFileCamera, ImageCapture, InputSource, Key, KeyboardInput, LogActuator,
    PngMapRenderer, ScriptedSonar, TerminalBell,
};
use crawler_nav::{Crawler, CrawlerConfig, CrawlerError, Hardware};
use log::{debug, error, info, warn};
use std::env;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Stands in for the keyboard when stdin is not a terminal
struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> Option<Key> {
        None
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            write!(
                buf,
                "[{} {}] {}\r\n",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
    info!("Starting crawler...");

    // ---- CONFIGURATION ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let config = match args.len() {
        1 => {
            info!("No configuration file given, using defaults");
            CrawlerConfig::default()
        }
        2 => CrawlerConfig::load(&args[1])?,
        n => {
            return Err(CrawlerError::Config(format!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
            .into());
        }
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))?;
    }

    // ---- DEVICES ----

    let input: Box<dyn InputSource> = match KeyboardInput::new() {
        Ok(keyboard) => Box::new(keyboard),
        Err(e) => {
            warn!("Keyboard unavailable ({}), running without manual control", e);
            Box::new(NoInput)
        }
    };

    let camera: Box<dyn ImageCapture> = match &config.camera.frame_source {
        Some(source) => {
            info!("Capturing obstacle images from {:?}", source);
            Box::new(FrameFileCamera::new(source, &config.output.directory))
        }
        None => Box::new(DisabledCamera),
    };

    let hardware = Hardware {
        sensor: Box::new(ScriptedSonar::new(config.sonar.readings.clone())),
        actuator: Box::new(LogActuator::new()),
        input,
        alert: Box::new(TerminalBell),
        camera,
        renderer: Box::new(PngMapRenderer::new(
            config.output.directory.clone(),
            config.output.map_file.clone(),
        )),
    };

    let period = config.tick_period();
    let mut crawler = Crawler::new(config, hardware)?;
    info!("Press 'm' to switch between Automatic and Manual mode, 'q' to quit");

    // ---- MAIN LOOP ----

    let mut last_cycle = Instant::now();
    loop {
        let cycle_start = Instant::now();
        let elapsed = cycle_start - last_cycle;
        last_cycle = cycle_start;

        if interrupted.load(Ordering::SeqCst) {
            info!("Interrupt received");
            break;
        }

        match crawler.run_cycle(elapsed) {
            Ok(_) => (),
            Err(CrawlerError::ShutdownRequested) => break,
            Err(e) => {
                error!("Cycle failed: {}", e);
                break;
            }
        }

        let cycle_dur = Instant::now() - cycle_start;
        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - period.as_secs_f64()
            ),
        }
    }

    let status = crawler.shutdown();
    info!(
        "Stopped in {:?} mode at {:?} facing {:?}: {} cells visited, {} obstacles, {} images, {} cycles",
        status.mode,
        status.pose,
        status.heading,
        status.visited_cells,
        status.obstacle_cells,
        status.annotations,
        status.cycles
    );

    Ok(())
}
