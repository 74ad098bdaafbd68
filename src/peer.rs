use crate::error::CommError;
use crate::events::UiEvent;
use crate::thread_comm::Channel;
use crate::wire::{Message, MessageKind, Snapshot};
use crate::Float;

/// What both roles can do with the link between them.
///
/// Control events flow from the display to the simulation, snapshots the other way. A snapshot
/// is sent as consecutive parts (vortices if they move, cloud, grid) and always read whole.
/// The simulation answers `AnimationStop` with the same event, after the last snapshot it sent
/// before the stop.
pub trait Peer {
    type Channel: Channel;

    fn channel(&mut self) -> &mut Self::Channel;

    /// Whether snapshots carry the vortex part.
    fn is_mobile(&self) -> bool;

    fn send_control_event(&mut self, event: UiEvent) -> Result<(), CommError> {
        let channel = self.channel();
        tracing::debug!(rank = channel.rank(), %event, "sending control event");
        channel.send(Message::Event(event.into()))
    }

    /// Take the oldest pending control event without blocking.
    ///
    /// Acks met on the way are handed to [Peer::recycle].
    fn receive_control_event(&mut self) -> Result<Option<UiEvent>, CommError> {
        while let Some(message) = self.channel().try_recv()? {
            match message {
                Message::Event(byte) => {
                    let event = UiEvent::try_from(byte)?;
                    tracing::debug!(rank = self.channel().rank(), %event, "received control event");
                    return Ok(Some(event));
                }
                Message::Ack(snapshot) => self.recycle(snapshot),
                other => {
                    return Err(CommError::UnexpectedMessage {
                        expected: MessageKind::Event,
                        found: other.kind(),
                    })
                }
            }
        }
        Ok(None)
    }

    /// Buffers of a snapshot the other peer is done with.
    fn recycle(&mut self, _snapshot: Snapshot) {}

    fn send_snapshot(&mut self, snapshot: Snapshot) -> Result<(), CommError> {
        let channel = self.channel();
        for part in snapshot.into_parts() {
            tracing::trace!(rank = channel.rank(), kind = ?part.kind(), "sending snapshot part");
            channel.send(part)?;
        }
        Ok(())
    }

    /// Tell the other peer that an `AnimationStop` was read and nothing more will be sent
    /// for it. Everything sent before stays ahead of this confirmation.
    fn confirm_stop(&mut self) -> Result<(), CommError> {
        let channel = self.channel();
        tracing::debug!(rank = channel.rank(), "confirming stop");
        channel.send(Message::Event(UiEvent::AnimationStop.into()))
    }

    /// Block until a whole snapshot has arrived.
    fn receive_snapshot(&mut self) -> Result<Snapshot, CommError> {
        let first = self.channel().recv()?;
        self.assemble_snapshot(first)
    }

    /// Block until either a whole snapshot or the confirmation of a stop has arrived.
    ///
    /// Returns `None` for the confirmation.
    fn receive_snapshot_or_stop(&mut self) -> Result<Option<Snapshot>, CommError> {
        let expected = if self.is_mobile() {
            MessageKind::Vortices
        } else {
            MessageKind::Cloud
        };
        match self.channel().recv()? {
            Message::Event(byte) => match UiEvent::try_from(byte)? {
                UiEvent::AnimationStop => Ok(None),
                _ => Err(CommError::UnexpectedMessage {
                    expected,
                    found: MessageKind::Event,
                }),
            },
            first => self.assemble_snapshot(first).map(Some),
        }
    }

    /// Read the remaining parts of a snapshot whose first part is `first`.
    fn assemble_snapshot(&mut self, first: Message) -> Result<Snapshot, CommError> {
        let (vortices, cloud) = if self.is_mobile() {
            let vortices = part(first, MessageKind::Vortices)?;
            let cloud = part(self.channel().recv()?, MessageKind::Cloud)?;
            (Some(vortices), cloud)
        } else {
            (None, part(first, MessageKind::Cloud)?)
        };
        let grid = part(self.channel().recv()?, MessageKind::Grid)?;
        tracing::debug!(rank = self.channel().rank(), "received snapshot");
        Ok(Snapshot {
            vortices,
            cloud,
            grid,
        })
    }

    /// Give the buffers of a consumed snapshot back to the sender.
    fn acknowledge_snapshot(&mut self, snapshot: Snapshot) -> Result<(), CommError> {
        self.channel().send(Message::Ack(snapshot))
    }
}

fn part(message: Message, expected: MessageKind) -> Result<Vec<Float>, CommError> {
    match message {
        Message::Part { kind, data } if kind == expected => Ok(data),
        other => Err(CommError::UnexpectedMessage {
            expected,
            found: other.kind(),
        }),
    }
}
