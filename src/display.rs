use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::cloud::CloudOfPoints;
use crate::config::InitialState;
use crate::error::{CommError, ConfigError};
use crate::events::UiEvent;
use crate::grid::VelocityGrid;
use crate::peer::Peer;
use crate::thread_comm::Channel;
use crate::vortices::Vortices;
use crate::wire::Snapshot;
use crate::Float;

/// User input the display understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Window closed.
    Close,
    /// `P`
    Play,
    /// `S`
    Stop,
    /// Up arrow.
    Faster,
    /// Down arrow.
    Slower,
    /// Right arrow.
    Step,
}

impl Input {
    pub fn event(self) -> UiEvent {
        match self {
            Input::Close => UiEvent::CloseWindow,
            Input::Play => UiEvent::AnimationStart,
            Input::Stop => UiEvent::AnimationStop,
            Input::Faster => UiEvent::TimestepIncrement,
            Input::Slower => UiEvent::TimestepDecrement,
            Input::Step => UiEvent::Advance,
        }
    }
}

impl FromStr for Input {
    type Err = ConfigError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Ok(match key {
            "Close" => Input::Close,
            "P" => Input::Play,
            "S" => Input::Stop,
            "Up" => Input::Faster,
            "Down" => Input::Slower,
            "Right" => Input::Step,
            other => return Err(ConfigError::Invalid(format!("unknown input {other:?}"))),
        })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Input::Close => "Close",
            Input::Play => "P",
            Input::Stop => "S",
            Input::Faster => "Up",
            Input::Slower => "Down",
            Input::Step => "Right",
        };
        f.write_str(key)
    }
}

/// Source of user input, drained once per tick.
pub trait InputSource {
    fn poll(&mut self) -> Vec<Input>;
}

/// Everything a renderer may draw for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub tick: u64,
    pub grid: &'a VelocityGrid,
    pub vortices: &'a Vortices,
    pub cloud: &'a CloudOfPoints,
    pub dt: Float,
    pub animating: bool,
    /// Time spent on the previous tick.
    pub frame_time: Duration,
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Peer that reads user input, forwards it as control events and shows the latest snapshot.
pub struct Display<C: Channel> {
    comm: C,
    mobile: bool,
    animating: bool,
    open: bool,
    dt: Float,
    ticks: u64,
    snapshots: u64,
    frame_time: Duration,
    vortices: Vortices,
    cloud: CloudOfPoints,
    grid: VelocityGrid,
}

impl<C: Channel> Display<C> {
    pub fn new(comm: C, state: InitialState, mobile: bool, dt: Float) -> Self {
        let InitialState {
            vortices,
            cloud,
            grid,
        } = state;
        Self {
            comm,
            mobile,
            animating: false,
            open: true,
            dt,
            ticks: 0,
            snapshots: 0,
            frame_time: Duration::ZERO,
            vortices,
            cloud,
            grid,
        }
    }

    pub fn dt(&self) -> Float {
        self.dt
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of snapshots received so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    pub fn vortices(&self) -> &Vortices {
        &self.vortices
    }

    pub fn cloud(&self) -> &CloudOfPoints {
        &self.cloud
    }

    pub fn grid(&self) -> &VelocityGrid {
        &self.grid
    }

    /// One rendering tick: forward input, wait for a snapshot if one is due, render.
    ///
    /// A snapshot is only awaited while animating or right after a single step was requested.
    /// A stop waits for the simulation to confirm it and applies every snapshot still on its
    /// way, so a later single step shows the step it asked for. Returns `false` once the window
    /// was closed.
    pub fn tick<I, R>(&mut self, input: &mut I, renderer: &mut R) -> Result<bool, CommError>
    where
        I: InputSource,
        R: Renderer,
    {
        let start = Instant::now();
        let mut advance = false;
        let mut stopped = false;
        for event in events_of(input.poll()) {
            self.send_control_event(event)?;
            match event {
                UiEvent::CloseWindow => {
                    self.open = false;
                    break;
                }
                UiEvent::AnimationStart => self.animating = true,
                UiEvent::AnimationStop => {
                    self.animating = false;
                    stopped = true;
                }
                UiEvent::TimestepIncrement | UiEvent::TimestepDecrement => {
                    self.dt = event.scale_dt(self.dt)
                }
                UiEvent::Advance => advance = true,
                UiEvent::Noop => {}
            }
        }
        if !self.open {
            return Ok(false);
        }

        if stopped {
            while let Some(snapshot) = self.receive_snapshot_or_stop()? {
                self.consume(snapshot)?;
            }
        }
        if self.animating || advance {
            let snapshot = self.receive_snapshot()?;
            self.consume(snapshot)?;
        }

        renderer.render(&Frame {
            tick: self.ticks,
            grid: &self.grid,
            vortices: &self.vortices,
            cloud: &self.cloud,
            dt: self.dt,
            animating: self.animating,
            frame_time: self.frame_time,
        });
        self.ticks += 1;
        self.frame_time = start.elapsed();
        Ok(true)
    }

    fn consume(&mut self, snapshot: Snapshot) -> Result<(), CommError> {
        snapshot.apply(&mut self.vortices, &mut self.cloud, &mut self.grid)?;
        self.acknowledge_snapshot(snapshot)?;
        self.snapshots += 1;
        Ok(())
    }

    /// Tick until the window closes, then meet the simulation at the barrier.
    pub fn run<I, R>(&mut self, input: &mut I, renderer: &mut R) -> Result<(), CommError>
    where
        I: InputSource,
        R: Renderer,
    {
        tracing::info!("######## Vortex simulator ########");
        tracing::info!("Press P to play animation");
        tracing::info!("Press S to stop animation");
        tracing::info!("Press right cursor to advance step by step in time");
        tracing::info!("Press down cursor to halve the time step");
        tracing::info!("Press up cursor to double the time step");

        while self.tick(input, renderer)? {}
        tracing::info!(
            ticks = self.ticks,
            snapshots = self.snapshots,
            "display closing"
        );
        self.comm.barrier()
    }
}

/// Control events of one tick: at most one per kind, nothing after a close, a single step last.
fn events_of(inputs: Vec<Input>) -> Vec<UiEvent> {
    let mut sent = [false; 7];
    let mut events = vec![];
    for input in inputs {
        let event = input.event();
        let category = u8::from(event) as usize;
        if sent[category] {
            continue;
        }
        sent[category] = true;
        events.push(event);
        if event == UiEvent::CloseWindow {
            break;
        }
    }
    if let Some(index) = events.iter().position(|&e| e == UiEvent::Advance) {
        let advance = events.remove(index);
        events.push(advance);
    }
    events
}

impl<C: Channel> Peer for Display<C> {
    type Channel = C;

    fn channel(&mut self) -> &mut C {
        &mut self.comm
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }
}
