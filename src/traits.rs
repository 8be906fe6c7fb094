//! Capabilities the core consumes from its callers
//!
//! The grid assembler reports progress only through [`ProgressReporter`];
//! it never knows whether a progress bar, a log, or nothing is listening.

/// Receives progress while a grid of tiles is being assembled.
pub trait ProgressReporter {
    /// Called once before the first tile with the number of tiles to come.
    fn start(&mut self, total: u32);

    /// Called after each tile with the number of tiles done so far.
    fn update(&mut self, completed: u32);

    /// Called once after the last tile, or after a failed tile.
    fn stop(&mut self);
}

/// Ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&mut self, _total: u32) {}

    fn update(&mut self, _completed: u32) {}

    fn stop(&mut self) {}
}

/// Writes progress to the `log` facade, at most once per `step` percent.
#[derive(Debug, Clone)]
pub struct LogReporter {
    total: u32,
    step: u32,
    last_logged: u32,
}

impl LogReporter {
    pub fn new(step: u32) -> Self {
        Self {
            total: 0,
            step: step.clamp(1, 100),
            last_logged: 0,
        }
    }

    fn percent(&self, completed: u32) -> u32 {
        if self.total == 0 {
            100
        } else {
            (completed as u64 * 100 / self.total as u64) as u32
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressReporter for LogReporter {
    fn start(&mut self, total: u32) {
        self.total = total;
        self.last_logged = 0;
        log::info!("loading {} tiles", total);
    }

    fn update(&mut self, completed: u32) {
        let percent = self.percent(completed);
        if percent >= self.last_logged + self.step || completed == self.total {
            self.last_logged = percent;
            log::info!("loaded {}/{} tiles ({}%)", completed, self.total, percent);
        }
    }

    fn stop(&mut self) {
        log::debug!("tile loading finished");
    }
}
