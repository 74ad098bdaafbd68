pub mod cloud;
pub mod config;
pub mod coordinates;
pub mod display;
pub mod error;
pub mod events;
pub mod grid;
pub mod headless;
pub mod peer;
pub mod runge_kutta;
pub mod simulation;
pub mod thread_comm;
pub mod vortices;
pub mod wire;

/// Floating point type used for every coordinate, velocity and time step.
pub type Float = f64;

/// Radius below which the induced velocity of a vortex is regularized.
///
/// Inside this radius a vortex rotates like a solid body, so its velocity goes linearly to zero
/// at the center instead of diverging.
pub const CORE_RADIUS: Float = 1e-3;

/// Time step used until the display asks for another one.
pub const DEFAULT_DT: Float = 0.1;

/// Rank of the peer that renders and reads user input.
pub const DISPLAY_RANK: usize = 0;
/// Rank of the peer that integrates.
pub const SIMULATION_RANK: usize = 1;
/// The protocol runs on exactly two peers.
pub const N_PEERS: usize = 2;
