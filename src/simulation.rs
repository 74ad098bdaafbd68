use std::thread;

use crate::cloud::CloudOfPoints;
use crate::config::InitialState;
use crate::error::CommError;
use crate::events::UiEvent;
use crate::grid::VelocityGrid;
use crate::peer::Peer;
use crate::runge_kutta::{solve_rk4_fixed_vortices, solve_rk4_movable_vortices};
use crate::thread_comm::Channel;
use crate::vortices::Vortices;
use crate::wire::Snapshot;
use crate::Float;

/// Number of snapshots that may be on their way to the display at once.
pub const MAX_SNAPSHOT_BUFFERS: usize = 2;

/// Peer that owns the physical state and integrates it.
pub struct Simulation<C: Channel> {
    comm: C,
    mobile: bool,
    animating: bool,
    do_step: bool,
    dt: Float,
    // Last control event received.
    ui_event: UiEvent,
    steps: u64,
    vortices: Vortices,
    cloud: CloudOfPoints,
    grid: VelocityGrid,
    // Free snapshot buffers. Empty means every buffer is still held by the display.
    snapshot_buffers: Vec<Snapshot>,
}

impl<C: Channel> Simulation<C> {
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
            do_step: false,
            dt,
            ui_event: UiEvent::Noop,
            steps: 0,
            vortices,
            cloud,
            grid,
            snapshot_buffers: vec![Snapshot::default(); MAX_SNAPSHOT_BUFFERS],
        }
    }

    pub fn dt(&self) -> Float {
        self.dt
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn last_event(&self) -> UiEvent {
        self.ui_event
    }

    /// Number of steps integrated and sent so far.
    pub fn steps(&self) -> u64 {
        self.steps
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

    /// Poll for one control event and, if asked to, integrate and send one step.
    ///
    /// Returns `false` once `CloseWindow` has been received. No snapshot is sent on that tick.
    pub fn tick(&mut self) -> Result<bool, CommError> {
        if let Some(event) = self.receive_control_event()? {
            self.ui_event = event;
            match event {
                UiEvent::CloseWindow => {
                    tracing::info!(steps = self.steps, "simulation closing");
                    return Ok(false);
                }
                UiEvent::AnimationStart => self.animating = true,
                UiEvent::AnimationStop => {
                    self.animating = false;
                    self.do_step = false;
                    self.confirm_stop()?;
                }
                UiEvent::TimestepIncrement | UiEvent::TimestepDecrement => {
                    self.dt = event.scale_dt(self.dt);
                    tracing::debug!(dt = self.dt, "time step changed");
                }
                UiEvent::Advance => self.do_step = true,
                UiEvent::Noop => {}
            }
        }

        if !(self.animating || self.do_step) {
            thread::yield_now();
            return Ok(true);
        }
        // Without a free buffer the step waits, a pending advance stays armed.
        let Some(mut snapshot) = self.snapshot_buffers.pop() else {
            thread::yield_now();
            return Ok(true);
        };
        self.step();
        snapshot.capture(
            self.mobile.then_some(&self.vortices),
            &self.cloud,
            &self.grid,
        );
        self.send_snapshot(snapshot)?;
        self.do_step = false;
        Ok(true)
    }

    /// Advance the state by one time step.
    pub fn step(&mut self) {
        self.cloud = if self.mobile {
            solve_rk4_movable_vortices(
                self.dt,
                &mut self.grid,
                &mut self.vortices,
                &self.cloud,
            )
        } else {
            solve_rk4_fixed_vortices(self.dt, &self.grid, &self.cloud)
        };
        self.steps += 1;
        tracing::trace!(step = self.steps, dt = self.dt, "integrated");
    }

    /// Serve the display until it closes, then meet it at the barrier.
    pub fn run(&mut self) -> Result<(), CommError> {
        tracing::info!(
            rank = self.comm.rank(),
            mobile = self.mobile,
            n_points = self.cloud.number_of_points(),
            n_vortices = self.vortices.number_of_vortices(),
            "simulation started"
        );
        while self.tick()? {}
        self.comm.barrier()
    }
}

impl<C: Channel> Peer for Simulation<C> {
    type Channel = C;

    fn channel(&mut self) -> &mut C {
        &mut self.comm
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn recycle(&mut self, snapshot: Snapshot) {
        self.snapshot_buffers.push(snapshot);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coordinates::Point;
    use crate::thread_comm::ThreadComm;
    use crate::vortices::Vortex;
    use crate::wire::{Message, MessageKind};

    fn state() -> InitialState {
        let mut grid = VelocityGrid::new((20, 20), Point::new(-1., -1.), 0.1);
        let vortices = Vortices::from_vortices(
            grid.domain(),
            [
                Vortex::new(Point::new(-0.3, 0.), 1.).unwrap(),
                Vortex::new(Point::new(0.3, 0.), 1.).unwrap(),
            ],
        );
        grid.update_velocity_field(&vortices);
        let cloud = CloudOfPoints::new(vec![Point::new(0.5, 0.5), Point::new(-0.2, 0.7)]);
        InitialState {
            vortices,
            cloud,
            grid,
        }
    }

    fn setup(mobile: bool) -> (ThreadComm, Simulation<ThreadComm>) {
        let mut communicators = ThreadComm::create_communicators(2);
        let sim_comm = communicators.pop().unwrap();
        let display_comm = communicators.pop().unwrap();
        (display_comm, Simulation::new(sim_comm, state(), mobile, 0.1))
    }

    fn send(comm: &mut ThreadComm, event: UiEvent) {
        comm.send(Message::Event(event.into())).unwrap();
    }

    fn drain(comm: &mut ThreadComm) -> Vec<MessageKind> {
        std::iter::from_fn(|| comm.try_recv().unwrap())
            .map(|message| message.kind())
            .collect()
    }

    #[test]
    fn test_idle_sends_nothing() {
        let (mut display, mut simulation) = setup(false);
        for _ in 0..5 {
            assert!(simulation.tick().unwrap());
        }
        assert_eq!(0, simulation.steps());
        assert!(drain(&mut display).is_empty());
    }

    #[test]
    fn test_advance_sends_one_snapshot() {
        for (mobile, expected) in [
            (false, vec![MessageKind::Cloud, MessageKind::Grid]),
            (
                true,
                vec![MessageKind::Vortices, MessageKind::Cloud, MessageKind::Grid],
            ),
        ] {
            let (mut display, mut simulation) = setup(mobile);
            let before = simulation.cloud().clone();
            send(&mut display, UiEvent::Advance);
            assert!(simulation.tick().unwrap());
            assert!(simulation.tick().unwrap());

            assert_eq!(1, simulation.steps());
            assert_eq!(UiEvent::Advance, simulation.last_event());
            assert_ne!(&before, simulation.cloud());
            assert_eq!(expected, drain(&mut display));
        }
    }

    #[test]
    fn test_close_while_animating() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::AnimationStart);
        assert!(simulation.tick().unwrap());
        assert!(simulation.is_animating());
        assert_eq!(1, simulation.steps());

        send(&mut display, UiEvent::CloseWindow);
        assert!(!simulation.tick().unwrap());
        // Only the snapshot of the first tick went out.
        assert_eq!(1, simulation.steps());
        assert_eq!(
            vec![MessageKind::Cloud, MessageKind::Grid],
            drain(&mut display)
        );
    }

    #[test]
    fn test_steps_wait_for_free_buffer() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::AnimationStart);
        for _ in 0..10 {
            assert!(simulation.tick().unwrap());
        }
        assert_eq!(MAX_SNAPSHOT_BUFFERS as u64, simulation.steps());

        // Hand one buffer back, one more step can go out.
        display.send(Message::Ack(Snapshot::default())).unwrap();
        for _ in 0..10 {
            assert!(simulation.tick().unwrap());
        }
        assert_eq!(MAX_SNAPSHOT_BUFFERS as u64 + 1, simulation.steps());
    }

    #[test]
    fn test_pending_advance_survives_missing_buffer() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::Advance);
        send(&mut display, UiEvent::Advance);
        send(&mut display, UiEvent::Advance);
        for _ in 0..5 {
            simulation.tick().unwrap();
        }
        assert_eq!(2, simulation.steps());
        display.send(Message::Ack(Snapshot::default())).unwrap();
        simulation.tick().unwrap();
        assert_eq!(3, simulation.steps());
    }

    #[test]
    fn test_stop_is_confirmed_after_sent_snapshots() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::AnimationStart);
        simulation.tick().unwrap();
        send(&mut display, UiEvent::AnimationStop);
        for _ in 0..5 {
            simulation.tick().unwrap();
        }
        assert!(!simulation.is_animating());
        assert_eq!(1, simulation.steps());
        assert_eq!(
            vec![MessageKind::Cloud, MessageKind::Grid, MessageKind::Event],
            drain(&mut display)
        );
    }

    #[test]
    fn test_stop_drops_pending_advance() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::AnimationStart);
        for _ in 0..5 {
            simulation.tick().unwrap();
        }
        // No free buffer left, the advance stays pending until the stop.
        send(&mut display, UiEvent::Advance);
        send(&mut display, UiEvent::AnimationStop);
        simulation.tick().unwrap();
        simulation.tick().unwrap();
        display.send(Message::Ack(Snapshot::default())).unwrap();
        for _ in 0..5 {
            simulation.tick().unwrap();
        }
        assert_eq!(MAX_SNAPSHOT_BUFFERS as u64, simulation.steps());
    }

    #[test]
    fn test_timestep_events() {
        let (mut display, mut simulation) = setup(false);
        send(&mut display, UiEvent::TimestepIncrement);
        simulation.tick().unwrap();
        assert_eq!(0.2, simulation.dt());
        send(&mut display, UiEvent::TimestepDecrement);
        send(&mut display, UiEvent::TimestepDecrement);
        simulation.tick().unwrap();
        simulation.tick().unwrap();
        assert_eq!(0.05, simulation.dt());
        assert_eq!(0, simulation.steps());
    }

    #[test]
    fn test_mobile_step_moves_vortices() {
        let (_display, mut simulation) = setup(true);
        let before = simulation.vortices().clone();
        simulation.step();
        assert_ne!(&before, simulation.vortices());

        let (_display, mut fixed) = setup(false);
        fixed.step();
        assert_eq!(&before, fixed.vortices());
    }
}
