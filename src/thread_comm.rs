use std::thread;

use itertools::izip;
use lockfree::channel::mpsc::{Receiver, Sender};
use lockfree::channel::{mpsc, RecvErr};

use crate::error::CommError;
use crate::wire::Message;

/// Reliable, ordered, point-to-point link to the other peer.
pub trait Channel {
    /// Rank of the local peer.
    fn rank(&self) -> usize;

    fn send(&mut self, message: Message) -> Result<(), CommError>;

    /// Next pending message, or `None` if nothing has arrived yet.
    fn try_recv(&mut self) -> Result<Option<Message>, CommError>;

    /// Block until a message arrives.
    fn recv(&mut self) -> Result<Message, CommError> {
        loop {
            if let Some(message) = self.try_recv()? {
                return Ok(message);
            }
            thread::yield_now();
        }
    }

    /// Block until every peer reached the barrier.
    fn barrier(&mut self) -> Result<(), CommError>;
}

#[derive(Debug)]
pub struct MessageChannel {
    pub rx: Receiver<Message>,
    // Indexed by rank, `None` for the local rank.
    pub tx: Vec<Option<Sender<Message>>>,
}

#[derive(Debug)]
pub struct SyncChannel {
    pub rx: Receiver<bool>,
    pub tx: Vec<Option<Sender<bool>>>,
}

/// Communicator of one peer thread.
///
/// A peer holds no sender to itself, so once every other peer is gone its receivers report
/// [RecvErr::NoSender] instead of waiting forever.
#[derive(Debug)]
pub struct ThreadComm {
    pub rank: usize,
    // Total number of peers.
    pub size: usize,
    // Control events, snapshot parts and acks.
    pub message_channel: MessageChannel,
    // Channel for synchronization task.
    pub sync_channel: SyncChannel,
}

impl ThreadComm {
    pub fn create_communicators(number: usize) -> Vec<ThreadComm> {
        let (message_senders, message_receivers): (Vec<_>, Vec<_>) =
            (0..number).map(|_| mpsc::create()).unzip();
        let (sync_senders, sync_receivers): (Vec<_>, Vec<_>) =
            (0..number).map(|_| mpsc::create()).unzip();

        let mut communicators: Vec<ThreadComm> = vec![];
        for (i, (message_receiver, sync_receiver)) in
            izip!(message_receivers, sync_receivers).enumerate()
        {
            let comm = ThreadComm {
                rank: i,
                size: number,
                message_channel: MessageChannel {
                    rx: message_receiver,
                    tx: others(&message_senders, i),
                },
                sync_channel: SyncChannel {
                    rx: sync_receiver,
                    tx: others(&sync_senders, i),
                },
            };
            communicators.push(comm);
        }
        communicators
    }

    /// Rank of the other peer of a two peer communicator.
    pub fn peer(&self) -> usize {
        (self.rank + 1) % self.size
    }

    /// Send `message` to the peer of rank `dest`.
    ///
    /// # Panics
    /// Panics if `dest` is the local rank or out of range.
    pub fn send_to(&self, dest: usize, message: Message) -> Result<(), CommError> {
        let sender = self.message_channel.tx[dest]
            .as_ref()
            .unwrap_or_else(|| panic!("Rank {dest} cannot send to itself."));
        sender
            .send(message)
            .map_err(|_| CommError::Disconnected(dest))
    }
}

fn others<T>(senders: &[Sender<T>], rank: usize) -> Vec<Option<Sender<T>>> {
    senders
        .iter()
        .enumerate()
        .map(|(i, sender)| (i != rank).then(|| sender.clone()))
        .collect()
}

impl Channel for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn send(&mut self, message: Message) -> Result<(), CommError> {
        self.send_to(self.peer(), message)
    }

    fn try_recv(&mut self) -> Result<Option<Message>, CommError> {
        match self.message_channel.rx.recv() {
            Ok(message) => Ok(Some(message)),
            Err(RecvErr::NoMessage) => Ok(None),
            Err(RecvErr::NoSender) => Err(CommError::Disconnected(self.peer())),
        }
    }

    /// Blocking barrier for all threads in ThreadComm.
    ///
    /// # Returns
    /// Returns Ok(_) if successful or Err(CommError::Disconnected) if one of the peers is gone.
    fn barrier(&mut self) -> Result<(), CommError> {
        // Send signal.
        for (rank, sender) in self.sync_channel.tx.iter().enumerate() {
            if let Some(sender) = sender {
                sender
                    .send(true)
                    .map_err(|_| CommError::Disconnected(rank))?;
            }
        }

        // Receive signal.
        for _ in 1..self.size {
            loop {
                match self.sync_channel.rx.recv() {
                    Ok(_msg) => {
                        break;
                    }
                    Err(RecvErr::NoMessage) => thread::yield_now(),
                    Err(RecvErr::NoSender) => return Err(CommError::Disconnected(self.peer())),
                }
            }
        }

        Ok(())
    }
}
