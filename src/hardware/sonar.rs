// hardware/sonar.rs

// Replays a fixed list of sonar samples in a loop. Lets the crawler run its
// full decision loop off-robot, driven by the `sonar.readings` config list.

use super::DistanceSensor;

/// Distance sensor replaying a fixed list of samples
#[derive(Clone, Debug, Default)]
pub struct ScriptedSonar {
    readings: Vec<Option<f64>>,
    next: usize,
}

impl ScriptedSonar {
    /// Creates a sonar cycling through `readings`; an empty list always reads absent
    pub fn new(readings: Vec<Option<f64>>) -> Self {
        ScriptedSonar { readings, next: 0 }
    }
}

impl DistanceSensor for ScriptedSonar {
    fn sample(&mut self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let reading = self.readings[self.next];
        self.next = (self.next + 1) % self.readings.len();
        reading
    }
}
