//! Fixed-timestep accumulator.
//!
//! The host feeds it the wall-clock time of each rendered frame; it answers
//! how many fixed simulation steps are due and how far between the last two
//! states the frame falls:
//!
//! steps = floor((accumulator + min(frame_time, max_frame_time)) / dt)
//! alpha = remainder / dt

/// Converts variable frame times into whole fixed steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Simulation step length.
    dt: f64,
    /// Frame times above this are clamped, bounding the steps per frame.
    max_frame_time: f64,
    /// Unsimulated time carried to the next frame.
    accumulator: f64,
    /// Total number of steps handed out.
    steps: u64,
}

impl FixedTimestep {
    /// Create an accumulator. A non-positive `dt` is replaced by the default
    /// 0.01 s; `max_frame_time` is raised to at least `dt`.
    pub fn new(dt: f64, max_frame_time: f64) -> Self {
        let dt = if dt > 0.0 {
            dt
        } else {
            log::warn!("non-positive fixed timestep {dt}, using 0.01");
            0.01
        };
        Self {
            dt,
            max_frame_time: max_frame_time.max(dt),
            accumulator: 0.0,
            steps: 0,
        }
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[inline]
    pub fn max_frame_time(&self) -> f64 {
        self.max_frame_time
    }

    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Steps handed out since creation or the last reset.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Add one frame's worth of time and return the number of fixed steps
    /// now due. The caller is expected to run exactly that many steps.
    /// A non-finite `frame_time` counts as zero.
    pub fn accumulate(&mut self, frame_time: f64) -> usize {
        let frame_time = if frame_time.is_finite() {
            frame_time
        } else {
            log::warn!("non-finite frame time {frame_time}, treating as 0");
            0.0
        };
        let clamped = frame_time.clamp(0.0, self.max_frame_time);
        if clamped < frame_time {
            log::debug!("frame time {frame_time} clamped to {}", self.max_frame_time);
        }
        self.accumulator += clamped;

        let mut due = 0;
        while self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            due += 1;
        }
        self.steps += due as u64;
        due
    }

    /// Interpolation factor in [0, 1) between the previous and current state.
    #[inline]
    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.steps = 0;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(0.01, 0.015)
    }
}
