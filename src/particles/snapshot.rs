use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::particles::ParticleBody;

/// Buffers in circulation per slab: one being filled, one being packed, one spare
pub const SNAPSHOT_BUFFERS: usize = 3;

/// Copy of one occupied slot, taken at the end of a simulation pass
#[derive(Debug, Clone)]
pub struct PublishedSlot<D> {
    pub slot: u32,
    /// Claim generation of the slot when the copy was taken
    pub generation: u32,
    pub body: ParticleBody,
    pub data: D,
}

pub type Snapshot<D> = Vec<PublishedSlot<D>>;

/// Hands slot snapshots from the simulation schedule to the render schedule
///
/// Buffers circulate through two queues and are reused. The simulation side
/// takes a spare, fills it and publishes it; the render side swaps the newest
/// publication in and returns the buffer it replaced. Neither side waits on
/// the other.
pub struct SnapshotExchange<D> {
    capacity: usize,
    published_tx: Sender<Snapshot<D>>,
    published_rx: Receiver<Snapshot<D>>,
    spare_tx: Sender<Snapshot<D>>,
    spare_rx: Receiver<Snapshot<D>>,
}

impl<D> SnapshotExchange<D> {
    /// The exchange plus the render side's initial (empty) snapshot
    pub fn new(capacity: usize) -> (Self, Snapshot<D>) {
        let (published_tx, published_rx) = unbounded();
        let (spare_tx, spare_rx) = unbounded();
        for _ in 1..SNAPSHOT_BUFFERS {
            // Both ends are held here, send cannot fail
            let _ = spare_tx.send(Vec::with_capacity(capacity));
        }

        let exchange = Self {
            capacity,
            published_tx,
            published_rx,
            spare_tx,
            spare_rx,
        };
        (exchange, Vec::with_capacity(capacity))
    }

    /// Simulation side: an empty buffer to fill
    ///
    /// When the render side has fallen behind, the oldest unread publication
    /// is taken back instead.
    pub fn acquire(&self) -> Snapshot<D> {
        let mut buffer = match self.spare_rx.try_recv() {
            Ok(buffer) => buffer,
            Err(_) => match self.published_rx.try_recv() {
                Ok(buffer) => buffer,
                Err(_) => {
                    log::trace!("Snapshot pool empty, allocating another buffer");
                    Vec::with_capacity(self.capacity)
                }
            },
        };
        buffer.clear();
        buffer
    }

    pub fn publish(&self, snapshot: Snapshot<D>) {
        let _ = self.published_tx.send(snapshot);
    }

    /// Render side: swap the newest publication into `current`
    ///
    /// Returns false when nothing was published since the last call.
    pub fn take_latest(&self, current: &mut Snapshot<D>) -> bool {
        let mut fresh = false;
        for next in self.published_rx.try_iter() {
            let replaced = std::mem::replace(current, next);
            let _ = self.spare_tx.send(replaced);
            fresh = true;
        }
        fresh
    }

    pub fn pending(&self) -> usize {
        self.published_rx.len()
    }
}
