//! Fixed-capacity pre-roll reservoir.
//!
//! Frames share their pixel data (`Bytes`), so pushing a clone is cheap and the
//! stored copy can never observe overlay drawing done by the driver.

use std::fmt;

use contracts::Frame;
use ringbuf::{traits::*, HeapRb};

/// Time-ordered ring of the most recent frames, oldest evicted first
pub struct FrameRingBuffer {
    frames: HeapRb<Frame>,
    evicted_count: u64,
}

impl fmt::Debug for FrameRingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRingBuffer")
            .field("len", &self.frames.occupied_len())
            .field("capacity", &self.capacity())
            .field("evicted", &self.evicted_count)
            .finish()
    }
}

impl FrameRingBuffer {
    /// Create a buffer holding at most `capacity` frames (clamped to at least 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: HeapRb::new(capacity.max(1)),
            evicted_count: 0,
        }
    }

    /// Append a frame, evicting the oldest one when full
    #[inline]
    pub fn push(&mut self, frame: Frame) {
        if self.frames.push_overwrite(frame).is_some() {
            self.evicted_count += 1;
        }
    }

    /// Current contents, oldest first. Does not mutate the buffer.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.frames.capacity().get()
    }

    /// Frames dropped by overflow since creation
    #[inline]
    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::PixelFormat;

    fn make_frame(frame_id: u64) -> Frame {
        Frame {
            frame_id,
            timestamp: frame_id as f64 * 0.1,
            width: 1,
            height: 1,
            format: PixelFormat::Rgb8,
            data: Bytes::from_static(&[0, 0, 0]),
        }
    }

    fn ids(frames: &[Frame]) -> Vec<u64> {
        frames.iter().map(|f| f.frame_id).collect()
    }

    #[test]
    fn test_overflow_evicts_oldest_in_order() {
        let mut ring = FrameRingBuffer::new(3);
        for id in 0..5 {
            ring.push(make_frame(id));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.evicted_count(), 2);
        assert_eq!(ids(&ring.snapshot()), vec![2, 3, 4]);
    }

    #[test]
    fn test_ten_seconds_at_ten_fps() {
        let mut ring = FrameRingBuffer::new(100);
        for id in 0..150 {
            ring.push(make_frame(id));
            assert!(ring.len() <= ring.capacity());
        }
        assert_eq!(ring.len(), 100);
        assert_eq!(ring.evicted_count(), 50);

        let snapshot = ring.snapshot();
        assert_eq!(snapshot.first().map(|f| f.frame_id), Some(50));
        assert_eq!(snapshot.last().map(|f| f.frame_id), Some(149));
    }

    #[test]
    fn test_snapshot_does_not_drain() {
        let mut ring = FrameRingBuffer::new(4);
        ring.push(make_frame(1));
        ring.push(make_frame(2));
        let first = ring.snapshot();
        let second = ring.snapshot();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ring = FrameRingBuffer::new(0);
        assert_eq!(ring.capacity(), 1);
        ring.push(make_frame(1));
        ring.push(make_frame(2));
        assert_eq!(ids(&ring.snapshot()), vec![2]);
    }

    #[test]
    fn test_clear() {
        let mut ring = FrameRingBuffer::new(2);
        ring.push(make_frame(1));
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.snapshot().is_empty());
    }
}
