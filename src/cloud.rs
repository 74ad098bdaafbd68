use std::ops::{Index, IndexMut};

use rand::Rng;

use crate::coordinates::{Point, Rectangle};

/// Tracer particles. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudOfPoints {
    points: Vec<Point>,
}

impl CloudOfPoints {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn add_a_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Remove the point at `index` in O(1). The last point takes its place.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn remove_a_point(&mut self, index: usize) {
        assert!(
            index < self.number_of_points(),
            "Point index {index} out of range."
        );
        self.points.swap_remove(index);
    }
}

impl Index<usize> for CloudOfPoints {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

impl IndexMut<usize> for CloudOfPoints {
    fn index_mut(&mut self, index: usize) -> &mut Point {
        &mut self.points[index]
    }
}

impl From<Vec<Point>> for CloudOfPoints {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for CloudOfPoints {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CloudOfPoints {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draw `n_points` points uniformly in `area`, both axes independently.
pub fn generate_points_in<R: Rng + ?Sized>(
    n_points: usize,
    area: &Rectangle,
    rng: &mut R,
) -> CloudOfPoints {
    (0..n_points)
        .map(|_| {
            Point::new(
                rng.gen_range(area.left()..=area.right()),
                rng.gen_range(area.bottom()..=area.top()),
            )
        })
        .collect()
}
