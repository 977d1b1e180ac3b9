#[cfg(test)]
mod tests {
    use crawler_nav::core::{Cell, Grid, Heading, ImageRef, Mode, MotionKind, Pose};
    use crawler_nav::hardware::{
        Actuator, AlertSink, DistanceSensor, ImageCapture, InputSource, Key, MapRenderer,
        PngMapRenderer, read_annotations, read_occupancy,
    };
    use crawler_nav::{Crawler, CrawlerConfig, CrawlerError, Hardware};
    use rstest::rstest;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Everything the fakes saw, shared with the worker thread
    #[derive(Default)]
    struct Events {
        motions: Vec<(MotionKind, u32, u16)>,
        stops: u32,
        alerts: u32,
        /// (occupied cells, annotations) per render
        renders: Vec<(usize, usize)>,
    }

    type Shared = Arc<Mutex<Events>>;

    struct FakeSensor(VecDeque<Option<f64>>);

    impl DistanceSensor for FakeSensor {
        fn sample(&mut self) -> Option<f64> {
            self.0.pop_front().flatten()
        }
    }

    struct FakeInput(VecDeque<Option<Key>>);

    impl InputSource for FakeInput {
        fn poll(&mut self) -> Option<Key> {
            self.0.pop_front().flatten()
        }
    }

    struct FakeActuator(Shared);

    impl Actuator for FakeActuator {
        fn execute(&mut self, kind: MotionKind, steps: u32, speed: u16) {
            self.0.lock().unwrap().motions.push((kind, steps, speed));
        }

        fn stop(&mut self) {
            self.0.lock().unwrap().stops += 1;
        }
    }

    struct FakeAlert(Shared);

    impl AlertSink for FakeAlert {
        fn notify(&mut self) {
            self.0.lock().unwrap().alerts += 1;
        }
    }

    struct FakeCamera {
        taken: u32,
    }

    impl ImageCapture for FakeCamera {
        fn capture(&mut self) -> Option<ImageRef> {
            self.taken += 1;
            Some(ImageRef::new(format!("camera_image_{}.png", self.taken)))
        }
    }

    struct FakeRenderer(Shared);

    impl MapRenderer for FakeRenderer {
        fn render(
            &mut self,
            grid: &Grid,
            annotations: &HashMap<Cell, ImageRef>,
        ) -> Result<PathBuf, CrawlerError> {
            self.0
                .lock()
                .unwrap()
                .renders
                .push((grid.count(), annotations.len()));
            Ok(PathBuf::from("top_down_map.png"))
        }
    }

    fn crawler(
        config: CrawlerConfig,
        readings: Vec<Option<f64>>,
        keys: Vec<Option<Key>>,
    ) -> (Crawler, Shared) {
        let events = Shared::default();
        let hardware = Hardware {
            sensor: Box::new(FakeSensor(readings.into())),
            actuator: Box::new(FakeActuator(events.clone())),
            input: Box::new(FakeInput(keys.into())),
            alert: Box::new(FakeAlert(events.clone())),
            camera: Box::new(FakeCamera { taken: 0 }),
            renderer: Box::new(FakeRenderer(events.clone())),
        };
        (Crawler::new(config, hardware).unwrap(), events)
    }

    #[test]
    fn test_automatic_run_maps_obstacle_and_renders_on_shutdown() {
        let (mut crawler, events) = crawler(
            CrawlerConfig::default(),
            vec![Some(40.0), Some(40.0), Some(10.0)],
            Vec::new(),
        );

        let decisions: Vec<_> = (0..3)
            .map(|_| crawler.run_cycle(Duration::ZERO).unwrap().unwrap())
            .collect();
        assert_eq!(decisions[2].observed, Some(Cell::new(251, 150)));
        let status = crawler.shutdown();

        // forward into (251, 250), turn north on the revisit, then avoid from there:
        // back to (251, 251), turn west, two steps to (249, 251)
        assert_eq!(status.mode, Mode::Automatic);
        assert_eq!(status.pose, Pose::new(249, 251));
        assert_eq!(status.heading, Heading::West);
        assert_eq!(status.obstacle_cells, 1);
        assert_eq!(status.visited_cells, 1);
        assert_eq!(status.annotations, 1);
        assert_eq!(status.cycles, 3);

        let events = events.lock().unwrap();
        assert_eq!(
            events.motions,
            vec![
                (MotionKind::Forward, 1, 80),
                (MotionKind::TurnLeft, 1, 80),
                (MotionKind::Backward, 1, 80),
                (MotionKind::TurnLeft, 1, 80),
                (MotionKind::Forward, 2, 80),
            ]
        );
        assert_eq!(events.alerts, 1);
        assert_eq!(events.stops, 1);
        // only the final render, with the captured image attached
        assert_eq!(events.renders, vec![(1, 1)]);
    }

    #[test]
    fn test_manual_mode_drives_from_keys_only() {
        let keys = ['m', 'w', 'd', 'i', 'i', 's']
            .into_iter()
            .map(|c| Some(Key::Char(c)))
            .collect();
        // would trigger avoidance if the sensor were read
        let (mut crawler, events) = crawler(CrawlerConfig::default(), vec![Some(5.0); 6], keys);

        for _ in 0..6 {
            assert_eq!(crawler.run_cycle(Duration::ZERO).unwrap(), None);
        }
        let status = crawler.status();
        assert_eq!(status.mode, Mode::Manual);
        assert_eq!(status.speed, 100);
        assert_eq!(status.pose, Pose::new(251, 249));
        assert_eq!(status.heading, Heading::South);
        assert_eq!(status.visited_cells, 0);
        assert_eq!(status.obstacle_cells, 0);
        crawler.shutdown();

        let events = events.lock().unwrap();
        assert_eq!(
            events.motions,
            vec![
                (MotionKind::Forward, 1, 80),
                (MotionKind::TurnRight, 1, 80),
                (MotionKind::Backward, 1, 100),
            ]
        );
        assert_eq!(events.alerts, 0);
    }

    #[rstest]
    #[case(Key::Char('q'))]
    #[case(Key::Interrupt)]
    fn test_quit_key_requests_shutdown(#[case] key: Key) {
        let (mut crawler, events) =
            crawler(CrawlerConfig::default(), Vec::new(), vec![None, Some(key)]);

        assert!(crawler.run_cycle(Duration::ZERO).is_ok());
        assert!(matches!(
            crawler.run_cycle(Duration::ZERO),
            Err(CrawlerError::ShutdownRequested)
        ));
        let status = crawler.shutdown();
        assert_eq!(status.cycles, 2);
        assert_eq!(events.lock().unwrap().stops, 1);
    }

    #[test]
    fn test_periodic_renders_follow_interval() {
        let mut config = CrawlerConfig::default();
        config.output.render_interval_s = 1.0;
        let (mut crawler, events) = crawler(config, Vec::new(), Vec::new());

        for _ in 0..8 {
            crawler.run_cycle(Duration::from_millis(250)).unwrap();
        }
        crawler.shutdown();

        // two periodic renders plus the final one
        assert_eq!(events.lock().unwrap().renders.len(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = CrawlerConfig::default();
        config.speed.initial = 250;
        let hardware = Hardware {
            sensor: Box::new(FakeSensor(VecDeque::new())),
            actuator: Box::new(FakeActuator(Shared::default())),
            input: Box::new(FakeInput(VecDeque::new())),
            alert: Box::new(FakeAlert(Shared::default())),
            camera: Box::new(FakeCamera { taken: 0 }),
            renderer: Box::new(FakeRenderer(Shared::default())),
        };
        assert!(matches!(
            Crawler::new(config, hardware),
            Err(CrawlerError::Config(_))
        ));
    }

    #[rstest]
    #[case::render_interval_overflows(|c: &mut CrawlerConfig| c.output.render_interval_s = 1e30)]
    #[case::render_interval_nan(|c: &mut CrawlerConfig| c.output.render_interval_s = f64::NAN)]
    #[case::grid_too_large(|c: &mut CrawlerConfig| c.grid.size = 65_537)]
    #[case::speed_range_too_wide(|c: &mut CrawlerConfig| {
        c.speed.min = 0;
        c.speed.max = 1000;
    })]
    #[case::speed_above_ceiling(|c: &mut CrawlerConfig| c.speed.max = 210)]
    #[case::speed_below_floor(|c: &mut CrawlerConfig| {
        c.speed.min = 60;
        c.speed.initial = 60;
    })]
    #[case::zero_step(|c: &mut CrawlerConfig| c.speed.step = 0)]
    fn test_out_of_range_values_fail_validation(#[case] tweak: fn(&mut CrawlerConfig)) {
        let mut config = CrawlerConfig::default();
        tweak(&mut config);
        assert!(matches!(config.validate(), Err(CrawlerError::Config(_))));
    }

    #[test]
    fn test_boundary_values_pass_validation() {
        let mut config = CrawlerConfig::default();
        config.grid.size = 65_536;
        config.speed.min = 70;
        config.speed.max = 200;
        config.speed.initial = 200;
        config.output.render_interval_s = 0.5;

        assert!(config.validate().is_ok());
        assert_eq!(config.render_interval().unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_yaml_takes_defaults() {
        let config: CrawlerConfig = serde_yaml::from_str(
            "navigation:\n  alert_distance: 20.0\nsonar:\n  readings: [12.0, ~, 30.0]\n",
        )
        .unwrap();

        assert_eq!(config.navigation.alert_distance, 20.0);
        assert_eq!(config.navigation.tick_period_ms, 200);
        assert_eq!(config.grid.size, 500);
        assert_eq!(config.speed.max, 200);
        assert_eq!(config.sonar.readings, vec![Some(12.0), None, Some(30.0)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_reports_bad_yaml_as_config_error() {
        let path = std::env::temp_dir().join(format!("crawler_bad_{}.yaml", std::process::id()));
        std::fs::write(&path, "grid: [not, a, map]\n").unwrap();

        let result = CrawlerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(CrawlerError::Config(_))));
    }

    #[test]
    fn test_png_render_reads_back_identically() {
        let dir = std::env::temp_dir().join(format!("crawler_render_{}", std::process::id()));
        let mut renderer = PngMapRenderer::new(&dir, "top_down_map.png");

        let mut grid = Grid::new(32);
        for (x, y) in [(0, 0), (31, 0), (5, 17), (31, 31)] {
            grid.set(x, y).unwrap();
        }
        let mut annotations = HashMap::new();
        annotations.insert(Cell::new(5, 17), ImageRef::new("camera_image_1.png"));

        let path = renderer.render(&grid, &annotations).unwrap();
        let occupancy = read_occupancy(&path).unwrap();
        let restored = read_annotations(renderer.annotations_path()).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(path, dir.join("top_down_map.png"));
        assert_eq!(occupancy, grid);
        assert_eq!(restored, annotations);
    }
}
