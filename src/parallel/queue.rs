use crossbeam::queue::SegQueue;

/// Thread-safe FIFO feeding the dynamic pool.
///
/// Workers only ever call [`try_pop`](Self::try_pop): a pop either yields an
/// item or reports exhaustion in one atomic step, so competing workers never
/// act on a stale emptiness check.
#[derive(Debug)]
pub struct SharedWorkQueue<T> {
    items: SegQueue<T>,
}

impl<T> SharedWorkQueue<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let queue = SegQueue::new();
        for item in items {
            queue.push(item);
        }
        Self { items: queue }
    }

    pub fn try_pop(&self) -> Option<T> {
        self.items.pop()
    }

    /// Number of queued items; racy while workers are popping
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every queued item, returning how many were discarded
    pub fn clear(&self) -> usize {
        let mut discarded = 0;
        while self.items.pop().is_some() {
            discarded += 1;
        }
        discarded
    }

    /// Copy the queued items in FIFO order.
    ///
    /// Rotates the whole queue, so it must not run while workers are popping.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut drained = Vec::with_capacity(self.items.len());
        while let Some(item) = self.items.pop() {
            drained.push(item);
        }
        for item in &drained {
            self.items.push(item.clone());
        }
        drained
    }
}
