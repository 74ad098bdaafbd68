use crate::coordinates::{Point, Rectangle, Vector};
use crate::error::VortexError;
use crate::{Float, CORE_RADIUS};

/// Point vortex: a finite center and a signed, finite, non-zero intensity.
///
/// Positive intensities turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vortex {
    center: Point,
    intensity: Float,
}

impl Vortex {
    pub fn new(center: Point, intensity: Float) -> Result<Self, VortexError> {
        if !(intensity.is_finite() && center.x.is_finite() && center.y.is_finite()) {
            return Err(VortexError::NotFinite);
        }
        if intensity == 0. {
            return Err(VortexError::ZeroIntensity);
        }
        Ok(Self { center, intensity })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn intensity(&self) -> Float {
        self.intensity
    }

    /// Velocity induced by this vortex at `p`.
    ///
    /// Outside of [CORE_RADIUS] the speed is `intensity / r` and the direction is the radius
    /// turned a quarter counter-clockwise. Inside the core the vortex rotates as a solid body,
    /// `intensity * r / CORE_RADIUS^2`, which vanishes at the center.
    pub fn induced_velocity(&self, p: Point) -> Vector {
        let radius = p - self.center;
        let r2 = radius.norm_squared().max(CORE_RADIUS * CORE_RADIUS);
        radius.perpendicular() * (self.intensity / r2)
    }
}

/// Set of point vortices plus the rectangle they were generated in.
///
/// The domain is a hint for generation only, vortices are free to leave it.
///
/// Removal swaps the last vortex into the freed slot, so indices are not stable across
/// [Vortices::remove_vortex].
#[derive(Debug, Clone, PartialEq)]
pub struct Vortices {
    vortices: Vec<Vortex>,
    domain: Rectangle,
}

impl Vortices {
    pub fn new(domain: Rectangle) -> Self {
        Self {
            vortices: Vec::new(),
            domain,
        }
    }

    pub fn from_vortices(domain: Rectangle, vortices: impl IntoIterator<Item = Vortex>) -> Self {
        Self {
            vortices: vortices.into_iter().collect(),
            domain,
        }
    }

    pub fn number_of_vortices(&self) -> usize {
        self.vortices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vortices.is_empty()
    }

    pub fn domain(&self) -> Rectangle {
        self.domain
    }

    /// # Panics
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> Vortex {
        assert!(
            index < self.number_of_vortices(),
            "Vortex index {index} out of range."
        );
        self.vortices[index]
    }

    pub fn center(&self, index: usize) -> Point {
        self.get(index).center
    }

    pub fn intensity(&self, index: usize) -> Float {
        self.get(index).intensity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vortex> + '_ {
        self.vortices.iter()
    }

    /// Overwrite the vortex at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn set_vortex(
        &mut self,
        index: usize,
        center: Point,
        intensity: Float,
    ) -> Result<(), VortexError> {
        assert!(
            index < self.number_of_vortices(),
            "Vortex index {index} out of range."
        );
        self.vortices[index] = Vortex::new(center, intensity)?;
        Ok(())
    }

    pub fn add_new_vortex(&mut self, center: Point, intensity: Float) -> Result<(), VortexError> {
        self.vortices.push(Vortex::new(center, intensity)?);
        Ok(())
    }

    /// Remove the vortex at `index` in O(1). The last vortex takes its place.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn remove_vortex(&mut self, index: usize) {
        assert!(
            index < self.number_of_vortices(),
            "Vortex index {index} out of range."
        );
        self.vortices.swap_remove(index);
    }

    /// Velocity induced at `p` by all vortices.
    pub fn compute_speed(&self, p: Point) -> Vector {
        self.vortices
            .iter()
            .map(|vortex| vortex.induced_velocity(p))
            .fold(Vector::ZERO, |speed, v| speed + v)
    }

    /// Velocity induced at `p` by all vortices except the one at `skip`.
    pub fn compute_speed_excluding(&self, p: Point, skip: usize) -> Vector {
        self.vortices
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, vortex)| vortex.induced_velocity(p))
            .fold(Vector::ZERO, |speed, v| speed + v)
    }

    /// Velocity of every vortex under the flow of all the others.
    pub fn self_induced_velocities(&self) -> Vec<Vector> {
        self.vortices
            .iter()
            .enumerate()
            .map(|(i, vortex)| self.compute_speed_excluding(vortex.center, i))
            .collect()
    }

    /// Copy of this set with every center shifted by `scale * offsets[i]`.
    ///
    /// # Panics
    /// Panics if there is not exactly one offset per vortex.
    pub fn displaced(&self, offsets: &[Vector], scale: Float) -> Vortices {
        let mut moved = self.clone();
        moved.move_centers(offsets, scale);
        moved
    }

    /// Shift every center by `scale * offsets[i]` in place.
    pub fn move_centers(&mut self, offsets: &[Vector], scale: Float) {
        assert_eq!(
            offsets.len(),
            self.number_of_vortices(),
            "One offset per vortex required."
        );
        for (vortex, &offset) in self.vortices.iter_mut().zip(offsets) {
            vortex.center += offset * scale;
        }
    }
}
