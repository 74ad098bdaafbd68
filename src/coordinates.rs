use std::ops::{Add, AddAssign, Mul, Sub};

use crate::Float;

/// 1D continuous coordinate.
pub type SpaceCoordinate = Float;
/// 1D discrete coordinate on grid.
pub type GridIndex = usize;

/// Position in the plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: SpaceCoordinate,
    pub y: SpaceCoordinate,
}

/// Displacement or velocity in the plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: Float,
    pub y: Float,
}

impl Point {
    pub const fn new(x: SpaceCoordinate, y: SpaceCoordinate) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> Float {
        (self - other).norm()
    }
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0., y: 0. };

    pub const fn new(x: Float, y: Float) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vector) -> Float {
        self.x * other.x + self.y * other.y
    }

    pub fn norm_squared(self) -> Float {
        self.dot(self)
    }

    pub fn norm(self) -> Float {
        self.norm_squared().sqrt()
    }

    /// Rotate by a quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Vector {
        Vector::new(-self.y, self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<Float> for Vector {
    type Output = Vector;

    fn mul(self, rhs: Float) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vector> for Float {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        rhs * self
    }
}

/// Axis aligned rectangle given by its bottom left and top right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub bottom_left: Point,
    pub top_right: Point,
}

impl Rectangle {
    pub const fn new(bottom_left: Point, top_right: Point) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }

    pub fn left(&self) -> SpaceCoordinate {
        self.bottom_left.x
    }

    pub fn right(&self) -> SpaceCoordinate {
        self.top_right.x
    }

    pub fn bottom(&self) -> SpaceCoordinate {
        self.bottom_left.y
    }

    pub fn top(&self) -> SpaceCoordinate {
        self.top_right.y
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.left()..=self.right()).contains(&p.x) && (self.bottom()..=self.top()).contains(&p.y)
    }

    /// Closest point of the rectangle to `p`.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.bottom(), self.top()),
        )
    }
}

/// Return the index of the cell of width `step` starting at `min` that contains `coord`.
///
/// # WARNING
/// Coordinates below `min` saturate to 0 and nothing bounds the result from above, so callers
/// clamp it to the number of cells they actually have.
///
/// # Panics
/// Panics if `step <= 0`.
pub fn grid_index_from_coordinate(
    coord: SpaceCoordinate,
    min: SpaceCoordinate,
    step: Float,
) -> GridIndex {
    assert!(step > 0., "Grid step must be positive.");
    ((coord - min) / step).floor().max(0.) as GridIndex
}
