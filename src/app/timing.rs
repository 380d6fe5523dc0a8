use std::time::{Duration, Instant};
use winit::window::Window;

const REPORT_INTERVAL: Duration = Duration::from_millis(500);

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_report_time: Instant,
    frame_count: u32,
    frame_dt: f32,
    tick_ms: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: &str, now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_report_time: now,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            tick_ms: 0.0,
            base_title: base_title.to_string(),
        }
    }

    pub fn set_tick_duration(&mut self, duration: Duration) {
        self.tick_ms = duration.as_secs_f32() * 1000.0;
    }

    /// Count a frame. Every half second returns a title with the frame rate.
    pub fn record(&mut self, now: Instant) -> Option<String> {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32();
        self.frame_count = self.frame_count.saturating_add(1);

        let elapsed = now.saturating_duration_since(self.last_report_time);
        if elapsed < REPORT_INTERVAL {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        self.frame_count = 0;
        self.last_report_time = now;
        Some(format!(
            "{} - {:.1} fps (cadence {:.2} ms, tick {:.2} ms)",
            self.base_title,
            fps,
            self.frame_dt * 1000.0,
            self.tick_ms
        ))
    }

    pub fn update(&mut self, window: &Window, now: Instant) {
        if let Some(title) = self.record(now) {
            window.set_title(&title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FrameTiming;
    use std::time::{Duration, Instant};

    #[test]
    fn reports_twice_a_second() {
        let start = Instant::now();
        let mut timing = FrameTiming::new("Portal", start);
        timing.set_tick_duration(Duration::from_millis(2));
        for frame in 1..30 {
            let now = start + Duration::from_millis(frame * 16);
            assert!(timing.record(now).is_none());
        }
        let title = timing
            .record(start + Duration::from_millis(500))
            .unwrap();
        assert!(title.starts_with("Portal - 60.0 fps"));
        assert!(title.ends_with("tick 2.00 ms)"));
    }
}
