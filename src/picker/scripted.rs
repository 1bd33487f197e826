//! In-memory sampler that replays a fixed script.
//!
//! Used by the controller and service tests, and by collaborators that need a
//! deterministic backend without touching the screen.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use super::{CursorPosition, PixelSampler};
use crate::color::Rgb;
use crate::error::SamplerError;

/// Une étape du script
/// One script step
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Color(Rgb),
    Fail(SamplerError),
    /// Blocks for the duration, then yields the color.
    Stall(Duration, Rgb),
}

/// Replays steps in order, one per `pixel_color_at` call. The last step
/// repeats once the script is exhausted.
#[derive(Debug)]
pub struct ScriptedSampler {
    steps: VecDeque<Step>,
    last: Option<Step>,
    cursor_calls: i32,
}

impl ScriptedSampler {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            last: None,
            cursor_calls: 0,
        }
    }

    fn next_step(&mut self) -> Option<Step> {
        if let Some(step) = self.steps.pop_front() {
            self.last = Some(step.clone());
            return Some(step);
        }
        self.last.clone()
    }
}

impl PixelSampler for ScriptedSampler {
    fn name(&self) -> &'static str {
        "scripted"
    }

    /// Moves one pixel to the right per call.
    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        let position = CursorPosition::new(self.cursor_calls, 0);
        self.cursor_calls += 1;
        Ok(position)
    }

    fn pixel_color_at(&mut self, _position: CursorPosition) -> Result<Rgb, SamplerError> {
        match self.next_step() {
            Some(Step::Color(rgb)) => Ok(rgb),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Stall(duration, rgb)) => {
                thread::sleep(duration);
                Ok(rgb)
            }
            None => Err(SamplerError::Capture("empty script".to_string())),
        }
    }
}
