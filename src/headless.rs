use std::collections::VecDeque;

use crate::coordinates::Point;
use crate::display::{Frame, Input, InputSource, Renderer};
use crate::Float;

/// Replays a fixed list of inputs, one entry per tick.
///
/// After `max_ticks` polls the window is closed. With `max_ticks == 0` it is closed once the
/// script has been played.
pub struct ScriptedInput {
    script: VecDeque<Vec<Input>>,
    max_ticks: u64,
    polls: u64,
}

impl ScriptedInput {
    pub fn new(script: Vec<Vec<Input>>, max_ticks: u64) -> Self {
        Self {
            script: script.into(),
            max_ticks,
            polls: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Vec<Input> {
        self.polls += 1;
        let out_of_time = self.max_ticks > 0 && self.polls >= self.max_ticks;
        match self.script.pop_front() {
            _ if out_of_time => vec![Input::Close],
            Some(inputs) => inputs,
            None if self.max_ticks == 0 => vec![Input::Close],
            None => vec![],
        }
    }
}

/// Logs a summary of every `log_every`-th frame instead of drawing it.
#[derive(Debug, Default)]
pub struct LogRenderer {
    log_every: u64,
    frames: u64,
}

impl LogRenderer {
    pub fn new(log_every: u64) -> Self {
        Self {
            log_every,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Mean position of the points, `None` for an empty cloud.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Point> {
    let (n, sum_x, sum_y) = points
        .into_iter()
        .fold((0usize, 0., 0.), |(n, x, y), p| (n + 1, x + p.x, y + p.y));
    (n > 0).then(|| Point::new(sum_x / n as Float, sum_y / n as Float))
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        if self.log_every == 0 || frame.tick % self.log_every != 0 {
            return;
        }
        let fps = match frame.frame_time.as_secs_f64() {
            t if t > 0. => 1. / t,
            _ => 0.,
        };
        let center = centroid(frame.cloud.iter());
        tracing::info!(
            tick = frame.tick,
            dt = frame.dt,
            animating = frame.animating,
            n_points = frame.cloud.number_of_points(),
            centroid = ?center.map(|p| (p.x, p.y)),
            fps = format_args!("{fps:.1}"),
            "frame"
        );
    }
}
