use itertools::izip;
use rayon::prelude::*;

use crate::cloud::CloudOfPoints;
use crate::coordinates::{Point, Vector};
use crate::grid::VelocityGrid;
use crate::vortices::Vortices;
use crate::Float;

/// One classical RK4 step of `dp/dt = velocity(p)`.
fn rk4_step<F>(p: Point, dt: Float, velocity: F) -> Point
where
    F: Fn(Point) -> Vector,
{
    let k1 = velocity(p);
    let k2 = velocity(p + k1 * (dt / 2.));
    let k3 = velocity(p + k2 * (dt / 2.));
    let k4 = velocity(p + k3 * dt);
    p + (k1 + k2 * 2. + k3 * 2. + k4) * (dt / 6.)
}

/// Advect every particle of `cloud` by `dt` through the static field of `grid`.
///
/// Every stage point and the resulting position go through [VelocityGrid::update_position],
/// so particles stay inside the grid.
pub fn solve_rk4_fixed_vortices(
    dt: Float,
    grid: &VelocityGrid,
    cloud: &CloudOfPoints,
) -> CloudOfPoints {
    let velocity = |p: Point| grid.compute_velocity_for(grid.update_position(p));
    cloud
        .as_slice()
        .par_iter()
        .map(|&p| grid.update_position(rk4_step(p, dt, &velocity)))
        .collect::<Vec<_>>()
        .into()
}

/// Advance the vortices by `dt` under their mutual induction, refresh `grid` from their new
/// positions, then advect `cloud` through the refreshed field.
///
/// On return `vortices`, `grid` and the returned cloud all describe the same instant.
pub fn solve_rk4_movable_vortices(
    dt: Float,
    grid: &mut VelocityGrid,
    vortices: &mut Vortices,
    cloud: &CloudOfPoints,
) -> CloudOfPoints {
    advance_vortices(dt, vortices);
    grid.update_velocity_field(vortices);
    solve_rk4_fixed_vortices(dt, grid, cloud)
}

/// RK4 step for all vortex centers at once. Every stage is evaluated on a displaced copy of the
/// whole set so no vortex sees a partially advanced neighbour.
fn advance_vortices(dt: Float, vortices: &mut Vortices) {
    if vortices.number_of_vortices() < 2 {
        // A lone vortex induces nothing on itself.
        return;
    }
    let k1 = vortices.self_induced_velocities();
    let k2 = vortices.displaced(&k1, dt / 2.).self_induced_velocities();
    let k3 = vortices.displaced(&k2, dt / 2.).self_induced_velocities();
    let k4 = vortices.displaced(&k3, dt).self_induced_velocities();

    let increments: Vec<Vector> = izip!(&k1, &k2, &k3, &k4)
        .map(|(&k1, &k2, &k3, &k4)| k1 + k2 * 2. + k3 * 2. + k4)
        .collect();
    vortices.move_centers(&increments, dt / 6.);
    tracing::trace!(
        n_vortices = vortices.number_of_vortices(),
        dt,
        "vortices advanced"
    );
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::cloud::generate_points_in;
    use crate::vortices::Vortex;

    fn grid() -> VelocityGrid {
        VelocityGrid::new((200, 200), Point::new(-2., -2.), 0.02)
    }

    fn single_vortex(grid: &VelocityGrid) -> Vortices {
        Vortices::from_vortices(
            grid.domain(),
            [Vortex::new(Point::new(0., 0.), 1.).unwrap()],
        )
    }

    fn pair(grid: &VelocityGrid) -> Vortices {
        Vortices::from_vortices(
            grid.domain(),
            [
                Vortex::new(Point::new(-0.5, 0.), 1.).unwrap(),
                Vortex::new(Point::new(0.5, 0.), 1.).unwrap(),
            ],
        )
    }

    fn random_cloud(n_points: usize, grid: &VelocityGrid) -> CloudOfPoints {
        generate_points_in(n_points, &grid.domain(), &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_zero_field_is_identity() {
        let grid = grid();
        let cloud = random_cloud(100, &grid);
        assert_eq!(cloud, solve_rk4_fixed_vortices(0., &grid, &cloud));
        assert_eq!(cloud, solve_rk4_fixed_vortices(0.3, &grid, &cloud));
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let mut grid = grid();
        grid.update_velocity_field(&pair(&grid));
        let cloud = random_cloud(100, &grid);
        assert_eq!(cloud, solve_rk4_fixed_vortices(0., &grid, &cloud));
    }

    #[test]
    fn test_particle_count_conserved() {
        let mut grid = grid();
        grid.update_velocity_field(&pair(&grid));
        for n_points in [0, 1, 17, 500] {
            let cloud = random_cloud(n_points, &grid);
            for dt in [-0.2, 0., 0.05, 10.] {
                let advected = solve_rk4_fixed_vortices(dt, &grid, &cloud);
                assert_eq!(n_points, advected.number_of_points());
            }
        }
    }

    #[test]
    fn test_particles_stay_in_grid() {
        let mut grid = grid();
        grid.update_velocity_field(&pair(&grid));
        let cloud = random_cloud(200, &grid);
        let domain = grid.domain();
        let advected = solve_rk4_fixed_vortices(5., &grid, &cloud);
        assert!(advected.iter().all(|&p| domain.contains(p)));
    }

    #[test]
    fn test_single_vortex_rotates_particle() {
        let mut grid = grid();
        grid.update_velocity_field(&single_vortex(&grid));
        let cloud = CloudOfPoints::new(vec![Point::new(1., 0.)]);

        let advected = solve_rk4_fixed_vortices(0.1, &grid, &cloud);
        let p = advected[0];
        assert_ne!(Point::new(1., 0.), p);
        // Unit speed on the unit circle: a rotation by 0.1 rad.
        assert!((p.distance_to(Point::new(0., 0.)) - 1.).abs() < 1e-3);
        assert!((p.y.atan2(p.x) - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_movable_vortices_refresh_grid() {
        let mut grid = grid();
        let mut vortices = pair(&grid);
        grid.update_velocity_field(&vortices);
        let cloud = random_cloud(50, &grid);

        let advected = solve_rk4_movable_vortices(0.05, &mut grid, &mut vortices, &cloud);
        assert_eq!(50, advected.number_of_points());
        assert_ne!(pair(&grid), vortices);

        let mut fresh = VelocityGrid::new((200, 200), Point::new(-2., -2.), 0.02);
        fresh.update_velocity_field(&vortices);
        assert_eq!(fresh, grid);
        assert_eq!(advected, solve_rk4_fixed_vortices(0.05, &fresh, &cloud));
    }

    #[test]
    fn test_co_rotating_pair_keeps_separation() {
        let mut grid = grid();
        let mut vortices = pair(&grid);
        let mut cloud = random_cloud(10, &grid);
        for _ in 0..20 {
            cloud = solve_rk4_movable_vortices(0.05, &mut grid, &mut vortices, &cloud);
        }
        let separation = vortices.center(0).distance_to(vortices.center(1));
        assert!((separation - 1.).abs() < 1e-5, "{separation}");
        // Center of vorticity stays at the origin.
        let middle = vortices.center(0) + (vortices.center(1) - vortices.center(0)) * 0.5;
        assert!(middle.distance_to(Point::new(0., 0.)) < 1e-9);
    }

    #[test]
    fn test_movable_vortices_reversible() {
        let mut grid = grid();
        let start = pair(&grid);
        let mut vortices = start.clone();
        let cloud = random_cloud(10, &grid);

        let dt = 0.01;
        solve_rk4_movable_vortices(dt, &mut grid, &mut vortices, &cloud);
        assert!(vortices.center(0).distance_to(start.center(0)) > 1e-3);
        solve_rk4_movable_vortices(-dt, &mut grid, &mut vortices, &cloud);

        for i in 0..2 {
            let drift = vortices.center(i).distance_to(start.center(i));
            assert!(drift < 1e-8, "{drift}");
        }
    }

    #[test]
    fn test_single_movable_vortex_stays_put() {
        let mut grid = grid();
        let mut vortices = single_vortex(&grid);
        let cloud = CloudOfPoints::new(vec![Point::new(1., 0.)]);
        solve_rk4_movable_vortices(0.1, &mut grid, &mut vortices, &cloud);
        assert_eq!(single_vortex(&grid), vortices);
    }
}
