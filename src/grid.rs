use ndarray::{Array2, Zip};

use crate::coordinates::{grid_index_from_coordinate, GridIndex, Point, Rectangle, Vector};
use crate::vortices::Vortices;
use crate::Float;

/// Velocity field sampled on a regular cartesian grid.
///
/// Row `i` holds the cells whose bottom edge is at `bottom + i * step`, column `j` those whose
/// left edge is at `left + j * step`. Each cell stores the velocity at its center. The field is
/// laid out row-major, so the flat index of cell `(i, j)` is `i * width + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityGrid {
    width: usize,
    height: usize,
    left: Float,
    bottom: Float,
    step: Float,
    velocity_field: Array2<Vector>,
}

impl VelocityGrid {
    /// Grid of `width x height` cells with bottom left vertex `origin`, velocity set to zero.
    ///
    /// # Panics
    /// Panics if a dimension is 0 or `step <= 0`.
    pub fn new((width, height): (usize, usize), origin: Point, step: Float) -> Self {
        assert!(width > 0 && height > 0, "Grid needs at least one cell.");
        assert!(step > 0., "Grid step must be positive.");
        Self {
            width,
            height,
            left: origin.x,
            bottom: origin.y,
            step,
            velocity_field: Array2::from_elem((height, width), Vector::ZERO),
        }
    }

    pub fn left_bottom_vertex(&self) -> Point {
        Point::new(self.left, self.bottom)
    }

    pub fn right_top_vertex(&self) -> Point {
        Point::new(
            self.left + self.width as Float * self.step,
            self.bottom + self.height as Float * self.step,
        )
    }

    pub fn domain(&self) -> Rectangle {
        Rectangle::new(self.left_bottom_vertex(), self.right_top_vertex())
    }

    /// Number of cells as `(width, height)`.
    pub fn cell_geometry(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn number_of_cells(&self) -> usize {
        self.width * self.height
    }

    pub fn step(&self) -> Float {
        self.step
    }

    pub fn velocity_field(&self) -> &Array2<Vector> {
        &self.velocity_field
    }

    pub(crate) fn velocity_field_mut(&mut self) -> &mut Array2<Vector> {
        &mut self.velocity_field
    }

    /// Point at which cell `(i, j)` samples the field.
    pub fn cell_center(&self, i: GridIndex, j: GridIndex) -> Point {
        Point::new(
            self.left + (j as Float + 0.5) * self.step,
            self.bottom + (i as Float + 0.5) * self.step,
        )
    }

    /// Cell `(i, j)` containing `p` after mapping it into the grid with [Self::update_position].
    pub fn cell_index(&self, p: Point) -> (GridIndex, GridIndex) {
        let p = self.update_position(p);
        (
            grid_index_from_coordinate(p.y, self.bottom, self.step).min(self.height - 1),
            grid_index_from_coordinate(p.x, self.left, self.step).min(self.width - 1),
        )
    }

    /// Resample the whole field from `vortices` at every cell center.
    pub fn update_velocity_field(&mut self, vortices: &Vortices) {
        let (left, bottom, step) = (self.left, self.bottom, self.step);
        Zip::indexed(&mut self.velocity_field).par_for_each(|(i, j), velocity| {
            let center = Point::new(
                left + (j as Float + 0.5) * step,
                bottom + (i as Float + 0.5) * step,
            );
            *velocity = vortices.compute_speed(center);
        });
    }

    /// Stored velocity of cell `(i, j)`.
    ///
    /// # Panics
    /// Panics if `i >= height` or `j >= width`.
    pub fn get_velocity(&self, i: GridIndex, j: GridIndex) -> Vector {
        assert!(
            i < self.height && j < self.width,
            "Cell ({i}, {j}) out of range."
        );
        self.velocity_field[[i, j]]
    }

    /// Map `p` into the sampled rectangle by clamping each coordinate to its boundary.
    pub fn update_position(&self, p: Point) -> Point {
        self.domain().clamp(p)
    }

    /// Velocity at `p`, interpolated bilinearly between the four nearest cell centers.
    ///
    /// `p` is first clamped into the grid. Between the outermost cell centers and the grid
    /// boundary the field is extended with the value of the outermost cells.
    pub fn compute_velocity_for(&self, p: Point) -> Vector {
        let p = self.update_position(p);
        let fx = ((p.x - self.left) / self.step - 0.5).clamp(0., (self.width - 1) as Float);
        let fy = ((p.y - self.bottom) / self.step - 0.5).clamp(0., (self.height - 1) as Float);
        let (j0, i0) = (fx.floor() as usize, fy.floor() as usize);
        let (j1, i1) = ((j0 + 1).min(self.width - 1), (i0 + 1).min(self.height - 1));
        let (tx, ty) = (fx - j0 as Float, fy - i0 as Float);

        let field = &self.velocity_field;
        field[[i0, j0]] * ((1. - tx) * (1. - ty))
            + field[[i0, j1]] * (tx * (1. - ty))
            + field[[i1, j0]] * ((1. - tx) * ty)
            + field[[i1, j1]] * (tx * ty)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vortices::Vortex;

    fn grid() -> VelocityGrid {
        VelocityGrid::new((40, 20), Point::new(-2., -1.), 0.1)
    }

    fn vortices() -> Vortices {
        let domain = grid().domain();
        Vortices::from_vortices(
            domain,
            [
                Vortex::new(Point::new(0.33, 0.1), 1.).unwrap(),
                Vortex::new(Point::new(-1.1, -0.4), -0.5).unwrap(),
            ],
        )
    }

    #[test]
    fn test_geometry() {
        let grid = grid();
        assert_eq!((40, 20), grid.cell_geometry());
        assert_eq!(Point::new(-2., -1.), grid.left_bottom_vertex());
        let top_right = grid.right_top_vertex();
        assert!((top_right.x - 2.).abs() < 1e-12);
        assert!((top_right.y - 1.).abs() < 1e-12);
        assert_eq!(800, grid.velocity_field().len());
    }

    #[test]
    #[should_panic(expected = "Grid needs at least one cell.")]
    fn test_empty_grid() {
        VelocityGrid::new((0, 3), Point::new(0., 0.), 1.);
    }

    #[test]
    fn test_update_is_deterministic() {
        let mut first = grid();
        let mut second = grid();
        first.update_velocity_field(&vortices());
        second.update_velocity_field(&vortices());
        assert_eq!(first, second);
    }

    #[test]
    fn test_cells_sample_kernel_at_center() {
        let mut grid = grid();
        let vortices = vortices();
        grid.update_velocity_field(&vortices);
        for (i, j) in [(0, 0), (7, 13), (19, 39)] {
            assert_eq!(
                vortices.compute_speed(grid.cell_center(i, j)),
                grid.get_velocity(i, j)
            );
        }
    }

    #[test]
    #[should_panic(expected = "Cell (20, 0) out of range.")]
    fn test_get_velocity_out_of_range() {
        grid().get_velocity(20, 0);
    }

    #[test]
    fn test_update_position_clamps() {
        let grid = grid();
        let inside = Point::new(0.5, 0.5);
        assert_eq!(inside, grid.update_position(inside));
        let outside = Point::new(-5., 3.);
        assert_eq!(Point::new(-2., 1.), grid.update_position(outside));
    }

    #[test]
    fn test_cell_index() {
        let grid = grid();
        assert_eq!((0, 0), grid.cell_index(Point::new(-2., -1.)));
        assert_eq!((10, 20), grid.cell_index(Point::new(0.05, 0.05)));
        // Right and top edges belong to the last cell.
        assert_eq!((19, 39), grid.cell_index(Point::new(2., 1.)));
        assert_eq!((19, 39), grid.cell_index(Point::new(9., 9.)));
    }

    #[test]
    fn test_interpolation_matches_samples_at_centers() {
        let mut grid = grid();
        grid.update_velocity_field(&vortices());
        for (i, j) in [(3, 4), (10, 30), (19, 0)] {
            let interpolated = grid.compute_velocity_for(grid.cell_center(i, j));
            assert!((interpolated - grid.get_velocity(i, j)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_interpolation_is_linear_between_centers() {
        let mut grid = VelocityGrid::new((2, 1), Point::new(0., 0.), 1.);
        grid.velocity_field_mut()[[0, 0]] = Vector::new(1., 0.);
        grid.velocity_field_mut()[[0, 1]] = Vector::new(3., 2.);
        let halfway = grid.compute_velocity_for(Point::new(1., 0.5));
        assert!((halfway - Vector::new(2., 1.)).norm() < 1e-12);
        // Outside the centers the boundary value is held.
        let corner = grid.compute_velocity_for(Point::new(0.1, 0.9));
        assert_eq!(Vector::new(1., 0.), corner);
        let beyond = grid.compute_velocity_for(Point::new(7., 0.));
        assert_eq!(Vector::new(3., 2.), beyond);
    }

    #[test]
    fn test_interpolation_close_to_kernel() {
        let mut grid = VelocityGrid::new((200, 200), Point::new(-2., -2.), 0.02);
        let vortices = Vortices::from_vortices(
            grid.domain(),
            [Vortex::new(Point::new(0., 0.), 1.).unwrap()],
        );
        grid.update_velocity_field(&vortices);
        let p = Point::new(0.77, -0.93);
        let error = (grid.compute_velocity_for(p) - vortices.compute_speed(p)).norm();
        assert!(error < 1e-3, "{error}");
    }
}
