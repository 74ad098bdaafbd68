//! Messages exchanged by the two peers.
//!
//! Every snapshot part is a flat array of `f64` made of fixed size records:
//!
//! | kind       | tag   | record                      |
//! |------------|-------|-----------------------------|
//! | vortices   | `'V'` | `x, y, intensity`           |
//! | cloud      | `'C'` | `x, y`                      |
//! | grid       | `'G'` | `vx, vy`, cells row-major   |
//!
//! Record counts are never transmitted. Both peers are built from the same configuration and a
//! payload whose length does not match the local count is rejected.
//!
//! Control events travel as one byte under tag `'E'`. Acks (`'A'`) hand the buffers of a
//! consumed snapshot back to the simulation so the next snapshot reuses them.

use itertools::Itertools;

use crate::cloud::CloudOfPoints;
use crate::coordinates::{Point, Vector};
use crate::error::WireError;
use crate::grid::VelocityGrid;
use crate::vortices::Vortices;
use crate::Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Event,
    Vortices,
    Cloud,
    Grid,
    Ack,
}

impl MessageKind {
    /// Stable identifier of the kind.
    pub const fn tag(self) -> u8 {
        match self {
            MessageKind::Event => b'E',
            MessageKind::Vortices => b'V',
            MessageKind::Cloud => b'C',
            MessageKind::Grid => b'G',
            MessageKind::Ack => b'A',
        }
    }
}

/// Typed layout of one snapshot part.
pub trait Records {
    const KIND: MessageKind;
    /// Number of `f64` per record.
    const RECORD_LEN: usize;

    fn n_records(&self) -> usize;

    /// Replace the content of `buffer` with the records of `self`.
    fn write_records(&self, buffer: &mut Vec<Float>);

    /// Overwrite `self` with the records in `buffer`.
    fn read_records(&mut self, buffer: &[Float]) -> Result<(), WireError>;

    fn check_len(&self, buffer: &[Float]) -> Result<(), WireError> {
        let expected = Self::RECORD_LEN * self.n_records();
        if buffer.len() != expected {
            return Err(WireError::LengthMismatch {
                kind: Self::KIND,
                expected,
                found: buffer.len(),
            });
        }
        Ok(())
    }
}

impl Records for Vortices {
    const KIND: MessageKind = MessageKind::Vortices;
    const RECORD_LEN: usize = 3;

    fn n_records(&self) -> usize {
        self.number_of_vortices()
    }

    fn write_records(&self, buffer: &mut Vec<Float>) {
        buffer.clear();
        for vortex in self.iter() {
            let center = vortex.center();
            buffer.extend([center.x, center.y, vortex.intensity()]);
        }
    }

    fn read_records(&mut self, buffer: &[Float]) -> Result<(), WireError> {
        self.check_len(buffer)?;
        for (index, record) in buffer.chunks_exact(Self::RECORD_LEN).enumerate() {
            let (x, y, intensity) = (record[0], record[1], record[2]);
            self.set_vortex(index, Point::new(x, y), intensity)
                .map_err(|_| WireError::InvalidVortex { index, intensity })?;
        }
        Ok(())
    }
}

impl Records for CloudOfPoints {
    const KIND: MessageKind = MessageKind::Cloud;
    const RECORD_LEN: usize = 2;

    fn n_records(&self) -> usize {
        self.number_of_points()
    }

    fn write_records(&self, buffer: &mut Vec<Float>) {
        buffer.clear();
        buffer.extend(self.iter().flat_map(|p| [p.x, p.y]));
    }

    fn read_records(&mut self, buffer: &[Float]) -> Result<(), WireError> {
        self.check_len(buffer)?;
        for (index, (&x, &y)) in buffer.iter().tuples().enumerate() {
            self[index] = Point::new(x, y);
        }
        Ok(())
    }
}

impl Records for VelocityGrid {
    const KIND: MessageKind = MessageKind::Grid;
    const RECORD_LEN: usize = 2;

    fn n_records(&self) -> usize {
        self.number_of_cells()
    }

    fn write_records(&self, buffer: &mut Vec<Float>) {
        buffer.clear();
        buffer.extend(self.velocity_field().iter().flat_map(|v| [v.x, v.y]));
    }

    fn read_records(&mut self, buffer: &[Float]) -> Result<(), WireError> {
        self.check_len(buffer)?;
        // Standard layout iterates row-major, the order the records were written in.
        for (velocity, (&x, &y)) in self
            .velocity_field_mut()
            .iter_mut()
            .zip(buffer.iter().tuples())
        {
            *velocity = Vector::new(x, y);
        }
        Ok(())
    }
}

/// Wire form of one simulation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Only present when vortices move.
    pub vortices: Option<Vec<Float>>,
    pub cloud: Vec<Float>,
    pub grid: Vec<Float>,
}

impl Snapshot {
    /// Fill the buffers from the current state, reusing their allocations.
    pub fn capture(
        &mut self,
        vortices: Option<&Vortices>,
        cloud: &CloudOfPoints,
        grid: &VelocityGrid,
    ) {
        let buffer = self.vortices.take();
        self.vortices = vortices.map(|vortices| {
            let mut buffer = buffer.unwrap_or_default();
            vortices.write_records(&mut buffer);
            buffer
        });
        cloud.write_records(&mut self.cloud);
        grid.write_records(&mut self.grid);
    }

    /// Copy the snapshot into local replicas. `vortices` is left alone when the snapshot carries
    /// no vortex part.
    pub fn apply(
        &self,
        vortices: &mut Vortices,
        cloud: &mut CloudOfPoints,
        grid: &mut VelocityGrid,
    ) -> Result<(), WireError> {
        if let Some(buffer) = &self.vortices {
            vortices.read_records(buffer)?;
        }
        cloud.read_records(&self.cloud)?;
        grid.read_records(&self.grid)
    }

    /// Parts in transmission order: vortices (if any), cloud, grid.
    pub fn into_parts(self) -> impl Iterator<Item = Message> {
        self.vortices
            .map(|data| Message::Part {
                kind: MessageKind::Vortices,
                data,
            })
            .into_iter()
            .chain([
                Message::Part {
                    kind: MessageKind::Cloud,
                    data: self.cloud,
                },
                Message::Part {
                    kind: MessageKind::Grid,
                    data: self.grid,
                },
            ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Control event byte.
    Event(u8),
    /// One part of a snapshot.
    Part { kind: MessageKind, data: Vec<Float> },
    /// Buffers of a consumed snapshot, returned to the simulation.
    Ack(Snapshot),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Event(_) => MessageKind::Event,
            Message::Part { kind, .. } => *kind,
            Message::Ack(_) => MessageKind::Ack,
        }
    }
}
