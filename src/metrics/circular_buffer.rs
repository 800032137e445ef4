use std::fmt;

/// Fixed-capacity FIFO ring. Once full, every push overwrites the oldest item.
#[derive(Clone)]
pub struct CircularBuffer<T> {
    buffer: Vec<T>,
    write_pos: usize,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// `capacity` must be non-zero; callers validate it up front.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "circular buffer needs a non-zero capacity");
        Self {
            buffer: Vec::with_capacity(capacity),
            write_pos: 0,
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.write_pos] = item;
        }
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns two slices holding the items in chronological order: the
    /// first slice is older than the second. No copying happens.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.buffer.len() < self.capacity {
            (&self.buffer[..], &[])
        } else {
            let (newer, older) = self.buffer.split_at(self.write_pos);
            (older, newer)
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer)
    }

    pub fn last(&self) -> Option<&T> {
        self.iter().next_back()
    }

    pub fn as_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.write_pos = 0;
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
