use std::time::{Duration, Instant};

pub const MIN_MS_PER_FRAME: u64 = 30;
pub const MAX_MS_PER_FRAME: u64 = 1000;

/// Animation playback clock.
pub struct PreviewState {
    pub playing: bool,
    pub current_frame: usize,
    pub ms_per_frame: u64,
    pub last_tick: Instant,
    pub accumulator_ms: u64,
}

impl PreviewState {
    pub fn new(ms_per_frame: u64) -> Self {
        Self {
            playing: false,
            current_frame: 0,
            ms_per_frame: ms_per_frame.clamp(MIN_MS_PER_FRAME, MAX_MS_PER_FRAME),
            last_tick: Instant::now(),
            accumulator_ms: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
        self.last_tick = Instant::now();
        self.accumulator_ms = 0;
    }

    pub fn tick(&mut self, frame_count: usize) -> Option<usize> {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.advance(dt, frame_count)
    }

    /// Steps playback by `dt`. Returns the new frame when it changed.
    pub fn advance(&mut self, dt: Duration, frame_count: usize) -> Option<usize> {
        if !self.playing || frame_count == 0 {
            return None;
        }
        let step = self.ms_per_frame.max(1);
        self.accumulator_ms = self.accumulator_ms.saturating_add(dt.as_millis() as u64);
        let before = self.current_frame;
        let mut advanced = 0usize;
        while self.accumulator_ms >= step {
            self.accumulator_ms -= step;
            self.current_frame = (self.current_frame + 1) % frame_count;
            advanced += 1;
        }
        if advanced > 0 && self.current_frame != before { Some(self.current_frame) } else { None }
    }

    /// Restarts the clock without advancing, discarding time spent held.
    pub fn hold(&mut self) {
        self.last_tick = Instant::now();
        self.accumulator_ms = 0;
    }

    /// Keeps `current_frame` valid after frames were removed.
    pub fn clamp_to(&mut self, frame_count: usize) {
        self.current_frame = self.current_frame.min(frame_count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_preview_does_not_advance() {
        let mut p = PreviewState::new(100);
        assert_eq!(p.advance(Duration::from_millis(500), 4), None);
        assert_eq!(p.current_frame, 0);
    }

    #[test]
    fn advances_and_wraps() {
        let mut p = PreviewState::new(100);
        p.toggle();
        assert_eq!(p.advance(Duration::from_millis(50), 3), None);
        assert_eq!(p.advance(Duration::from_millis(60), 3), Some(1));
        assert_eq!(p.advance(Duration::from_millis(200), 3), Some(0));
        assert_eq!(p.accumulator_ms, 10);
    }

    #[test]
    fn hold_discards_pending_time() {
        let mut p = PreviewState::new(100);
        p.toggle();
        assert_eq!(p.advance(Duration::from_millis(90), 3), None);
        p.hold();
        assert_eq!(p.advance(Duration::from_millis(20), 3), None);
        assert_eq!(p.current_frame, 0);
        assert_eq!(p.advance(Duration::from_millis(80), 3), Some(1));
    }

    #[test]
    fn single_frame_never_reports_change() {
        let mut p = PreviewState::new(100);
        p.toggle();
        assert_eq!(p.advance(Duration::from_millis(300), 1), None);
    }

    #[test]
    fn interval_is_clamped_and_frame_clamps() {
        assert_eq!(PreviewState::new(1).ms_per_frame, MIN_MS_PER_FRAME);
        let mut p = PreviewState::new(150);
        p.current_frame = 5;
        p.clamp_to(2);
        assert_eq!(p.current_frame, 1);
    }
}
