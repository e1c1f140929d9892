//! Deferred dispatch: getting from the GPIO interrupt to task context
//!
//! The interrupt handler never touches the sensor bus. It only submits a
//! notification through a [`DeferredDispatch`] implementation, and a task
//! picks it up and runs the dispatch cycle. Two implementations exist:
//!
//! - [`EdgeSignal`]: a single-slot signal owned by one device and awaited by
//!   that device's own task ([`Iis2dlpc::run`](crate::driver::Iis2dlpc::run)).
//! - [`WorkItem`]: an entry on a [`WorkQueue`] shared by several devices and
//!   drained by a single worker task ([`WorkQueue::run`]).
//!
//! Neither needs to queue more than one notification per device, because the
//! pin interrupt stays masked until the dispatcher re-arms it.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;

/// Capability used by the interrupt bridge to wake the dispatch context.
pub trait DeferredDispatch {
    /// Hand off one edge. Called from interrupt context, must not block.
    ///
    /// Returns `false` if the edge could not be handed off; the bridge then
    /// stays armed instead of waiting for a dispatch that never comes.
    fn submit(&self) -> bool;
}

/// Single-slot notification consumed by a dedicated task
pub struct EdgeSignal {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl EdgeSignal {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Wait until an edge has been submitted, consuming it.
    pub async fn wait(&self) {
        self.signal.wait().await
    }

    /// Whether an edge is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }
}

impl Default for EdgeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredDispatch for EdgeSignal {
    fn submit(&self) -> bool {
        self.signal.signal(());
        true
    }
}

/// Identifier of a work item on a [`WorkQueue`]
pub type WorkId = u8;

/// Capacity of the shared work queue
///
/// One slot per possible work item id. An item is queued at most once while
/// pending, so the queue can never be full when a valid id is submitted.
pub const WORK_QUEUE_DEPTH: usize = 32;

/// Shared cooperative work queue drained by one worker task
pub struct WorkQueue {
    items: Channel<CriticalSectionRawMutex, WorkId, WORK_QUEUE_DEPTH>,
    /// Bit `n` set while item `n` sits in `items`
    pending: Mutex<CriticalSectionRawMutex, Cell<u32>>,
}

impl WorkQueue {
    /// Largest accepted work item id
    pub const MAX_ID: WorkId = (WORK_QUEUE_DEPTH - 1) as WorkId;

    pub const fn new() -> Self {
        Self {
            items: Channel::new(),
            pending: Mutex::new(Cell::new(0)),
        }
    }

    /// Queue `id` unless it is already pending. Safe to call from interrupt
    /// context. Returns `true` if the item is pending after the call, `false`
    /// if it was dropped.
    pub fn submit(&self, id: WorkId) -> bool {
        if id > Self::MAX_ID {
            warn!("Work item {} out of range, dropped", id);
            return false;
        }

        let bit = 1u32 << id;
        self.pending.lock(|pending| {
            if pending.get() & bit != 0 {
                return true;
            }

            match self.items.try_send(id) {
                Ok(()) => {
                    pending.set(pending.get() | bit);
                    true
                }
                Err(_) => {
                    warn!("Work queue full, item {} dropped", id);
                    false
                }
            }
        })
    }

    pub fn is_pending(&self, id: WorkId) -> bool {
        id <= Self::MAX_ID && self.pending.lock(|pending| pending.get() & (1 << id) != 0)
    }

    fn take(&self, id: WorkId) -> WorkId {
        self.pending
            .lock(|pending| pending.set(pending.get() & !(1u32 << id)));
        id
    }

    /// Wait for the next work item. The item stops being pending before it is
    /// returned, so it may be submitted again while its handler runs.
    pub async fn next(&self) -> WorkId {
        let id = self.items.receive().await;
        self.take(id)
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&self) -> Option<WorkId> {
        self.items.try_receive().ok().map(|id| self.take(id))
    }

    /// Worker loop: run `handler` for every work item, forever.
    pub async fn run<F>(&self, mut handler: F) -> !
    where
        F: AsyncFnMut(WorkId),
    {
        loop {
            let id = self.next().await;
            handler(id).await;
        }
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// A device's entry on a shared [`WorkQueue`]
pub struct WorkItem<'q> {
    queue: &'q WorkQueue,
    id: WorkId,
}

impl<'q> WorkItem<'q> {
    pub const fn new(queue: &'q WorkQueue, id: WorkId) -> Self {
        Self { queue, id }
    }

    pub const fn id(&self) -> WorkId {
        self.id
    }

    pub fn is_pending(&self) -> bool {
        self.queue.is_pending(self.id)
    }
}

impl DeferredDispatch for WorkItem<'_> {
    fn submit(&self) -> bool {
        self.queue.submit(self.id)
    }
}

/// Deferred dispatch mechanism selected by cargo features
#[cfg(feature = "trigger-global-thread")]
pub type DefaultDeferred = WorkItem<'static>;

/// Deferred dispatch mechanism selected by cargo features
#[cfg(all(feature = "trigger-own-thread", not(feature = "trigger-global-thread")))]
pub type DefaultDeferred = EdgeSignal;

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_edge_signal_collapses_repeated_submits() {
        let edge = EdgeSignal::new();
        assert!(!edge.is_pending());

        edge.submit();
        edge.submit();
        assert!(edge.is_pending());

        block_on(edge.wait());
        assert!(!edge.is_pending());
    }

    #[test]
    fn test_work_item_queued_once_while_pending() {
        let queue = WorkQueue::new();
        let item = WorkItem::new(&queue, 3);

        item.submit();
        item.submit();
        assert!(item.is_pending());

        assert_eq!(queue.try_next(), Some(3));
        assert_eq!(queue.try_next(), None);
        assert!(!item.is_pending());
    }

    #[test]
    fn test_work_item_can_resubmit_after_take() {
        let queue = WorkQueue::new();
        let item = WorkItem::new(&queue, 0);

        item.submit();
        assert_eq!(block_on(queue.next()), 0);

        item.submit();
        assert!(item.is_pending());
        assert_eq!(queue.try_next(), Some(0));
    }

    #[test]
    fn test_queue_keeps_submission_order() {
        let queue = WorkQueue::new();
        let first = WorkItem::new(&queue, 7);
        let second = WorkItem::new(&queue, 2);

        second.submit();
        first.submit();

        assert_eq!(queue.try_next(), Some(2));
        assert_eq!(queue.try_next(), Some(7));
    }

    #[test]
    fn test_out_of_range_id_is_dropped() {
        let queue = WorkQueue::new();
        assert!(!queue.submit(32));
        assert!(!queue.is_pending(32));
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn test_every_valid_id_fits_at_once() {
        let queue = WorkQueue::new();
        for id in 0..=WorkQueue::MAX_ID {
            assert!(queue.submit(id));
        }
        // Resubmitting pending items never needs another slot
        assert!(queue.submit(WorkQueue::MAX_ID));

        let drained = core::iter::from_fn(|| queue.try_next()).count();
        assert_eq!(drained, WORK_QUEUE_DEPTH);
    }

    #[test]
    fn test_edge_signal_and_work_item_accept_submissions() {
        let edge = EdgeSignal::new();
        assert!(edge.submit());

        let queue = WorkQueue::new();
        assert!(WorkItem::new(&queue, 0).submit());
        assert!(!WorkItem::new(&queue, WorkQueue::MAX_ID + 1).submit());
    }
}
