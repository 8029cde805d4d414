//! Trailing-window mean over raw per-frame speech probabilities.

use std::collections::VecDeque;

/// Size of the trailing probability window (~160ms at 32ms frames).
pub const WINDOW_LEN: usize = 5;

/// Maintains the arithmetic mean of the last `WINDOW_LEN` raw probabilities.
#[derive(Debug, Default)]
pub struct ProbSmoother {
    window: VecDeque<f32>,
}

impl ProbSmoother {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_LEN),
        }
    }

    /// Push a new raw probability and return the updated window mean.
    ///
    /// The mean is recomputed from the (at most 5-element) window on every
    /// call rather than maintained as a running sum, so it stays exactly
    /// the window mean over an arbitrarily long pipeline run instead of
    /// drifting from accumulated floating-point error.
    pub fn push(&mut self, raw_prob: f32) -> f32 {
        self.window.push_back(raw_prob);
        if self.window.len() > WINDOW_LEN {
            self.window.pop_front();
        }

        self.window.iter().sum::<f32>() / self.window.len() as f32
    }
}
