use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::cloud::{generate_points_in, CloudOfPoints};
use crate::coordinates::{Point, Rectangle};
use crate::display::Input;
use crate::error::{ConfigError, VortexError};
use crate::grid::VelocityGrid;
use crate::vortices::Vortices;
use crate::{Float, DEFAULT_DT, N_PEERS};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub particles: ParticlesConfig,
    #[serde(default)]
    pub vortices: Vec<VortexConfig>,
    /// Whether vortices are advected too.
    #[serde(default)]
    pub mobile: bool,
    #[serde(default = "default_dt")]
    pub dt: Float,
    pub seed: u64,
    /// Number of peers, must be 2.
    #[serde(default = "default_n_peers")]
    pub n_peers: usize,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    /// Bottom left vertex.
    pub origin: [Float; 2],
    /// Number of cells along x and y.
    pub n_cells: [usize; 2],
    pub step: Float,
}

#[derive(Debug, Deserialize)]
pub struct ParticlesConfig {
    pub count: usize,
    /// `[left, bottom, right, top]` to seed in. The whole grid if absent.
    pub area: Option<[Float; 4]>,
}

#[derive(Debug, Deserialize)]
pub struct VortexConfig {
    pub x: Float,
    pub y: Float,
    pub intensity: Float,
}

/// Headless front end.
#[derive(Debug, Default, Deserialize)]
pub struct DisplayConfig {
    /// Inputs of each tick, space separated keys (`P`, `S`, `Up`, `Down`, `Right`, `Close`).
    #[serde(default)]
    pub script: Vec<String>,
    /// Tick at which the window is closed if the script did not close it before.
    #[serde(default)]
    pub max_ticks: u64,
    /// Log every n-th frame.
    #[serde(default)]
    pub log_every: u64,
}

/// State both peers start from.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub vortices: Vortices,
    pub cloud: CloudOfPoints,
    pub grid: VelocityGrid,
}

fn default_dt() -> Float {
    DEFAULT_DT
}

fn default_n_peers() -> usize {
    N_PEERS
}

/// Read the configuration from `path`, overridden by `VORTEX_*` environment variables
/// (`VORTEX_GRID__STEP` sets `grid.step`).
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("VORTEX")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings: Config = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        let settings: Config = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_peers != N_PEERS {
            return Err(ConfigError::PeerCount(self.n_peers));
        }
        let GridConfig {
            origin,
            n_cells,
            step,
        } = &self.grid;
        if !(step.is_finite() && *step > 0.) {
            return Err(invalid(format!("grid step must be positive, got {step}")));
        }
        if n_cells.contains(&0) {
            return Err(invalid(format!("grid needs cells, got {n_cells:?}")));
        }
        if !origin.iter().all(|c| c.is_finite()) {
            return Err(invalid(format!("grid origin {origin:?} is not finite")));
        }
        if let Some(area) = self.particles.area {
            let [left, bottom, right, top] = area;
            if !area.iter().all(|c| c.is_finite()) || left > right || bottom > top {
                return Err(invalid(format!("bad particle area {area:?}")));
            }
        }
        for (index, vortex) in self.vortices.iter().enumerate() {
            if !(vortex.x.is_finite() && vortex.y.is_finite() && vortex.intensity.is_finite()) {
                return Err(invalid(format!("vortex {index} is not finite")));
            }
            if vortex.intensity == 0. {
                return Err(ConfigError::Vortex {
                    index,
                    source: VortexError::ZeroIntensity,
                });
            }
        }
        if !(self.dt.is_finite() && self.dt != 0.) {
            let dt = self.dt;
            return Err(invalid(format!("time step must be non-zero, got {dt}")));
        }
        self.script()?;
        Ok(())
    }

    /// The display script, one list of inputs per tick.
    pub fn script(&self) -> Result<Vec<Vec<Input>>, ConfigError> {
        self.display
            .script
            .iter()
            .map(|tick| {
                tick.split_whitespace()
                    .map(str::parse::<Input>)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    /// Build the grid, the vortices with the initial velocity field and the seeded cloud.
    pub fn build(&self) -> Result<InitialState, ConfigError> {
        let [x, y] = self.grid.origin;
        let [nx, ny] = self.grid.n_cells;
        let mut grid = VelocityGrid::new((nx, ny), Point::new(x, y), self.grid.step);

        let mut vortices = Vortices::new(grid.domain());
        for (index, vortex) in self.vortices.iter().enumerate() {
            vortices
                .add_new_vortex(Point::new(vortex.x, vortex.y), vortex.intensity)
                .map_err(|source| ConfigError::Vortex { index, source })?;
        }
        grid.update_velocity_field(&vortices);

        let area = match self.particles.area {
            Some([left, bottom, right, top]) => {
                Rectangle::new(Point::new(left, bottom), Point::new(right, top))
            }
            None => grid.domain(),
        };
        let mut rng = StdRng::seed_from_u64(self.seed);
        let cloud = generate_points_in(self.particles.count, &area, &mut rng);

        Ok(InitialState {
            vortices,
            cloud,
            grid,
        })
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
