use std::sync::Arc;

use parking_lot::Mutex;

/// One half of the double buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    First,
    Second,
}

impl Segment {
    /// Index of this segment within the buffer (0 or 1).
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// Fixed-size PCM buffer split into two independently locked halves.
///
/// The engine and the bus share one `DoubleBuffer`; cloning is cheap, the
/// halves are reference counted. While a transfer runs the bus works the
/// segment it is draining or filling and the engine services only the
/// segment named by the last completion event, so the two sides never
/// contend for the same half.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    halves: [Arc<Mutex<Box<[u8]>>>; 2],
}

impl DoubleBuffer {
    /// Allocate a zeroed buffer of `len` total bytes (two `len / 2` halves).
    pub fn new(len: usize) -> Self {
        let half = len / 2;
        Self {
            halves: [
                Arc::new(Mutex::new(vec![0u8; half].into_boxed_slice())),
                Arc::new(Mutex::new(vec![0u8; half].into_boxed_slice())),
            ],
        }
    }

    /// Total buffer length in bytes.
    pub fn len(&self) -> usize {
        self.segment_len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.segment_len() == 0
    }

    /// Length of one segment in bytes.
    pub fn segment_len(&self) -> usize {
        self.halves[0].lock().len()
    }

    /// Run `f` over the writable contents of one segment.
    pub fn with_segment_mut<R>(&self, segment: Segment, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut half = self.halves[segment.index()].lock();
        f(&mut half)
    }

    /// Copy one segment out.
    pub fn read_segment(&self, segment: Segment) -> Vec<u8> {
        self.halves[segment.index()].lock().to_vec()
    }

    /// Copy `data` into a segment, zero-filling any remainder.
    ///
    /// `data` longer than the segment is truncated.
    pub fn fill_segment(&self, segment: Segment, data: &[u8]) {
        self.with_segment_mut(segment, |half| {
            let n = data.len().min(half.len());
            half[..n].copy_from_slice(&data[..n]);
            half[n..].fill(0);
        });
    }

    /// Copy `data` across both segments from the start of the buffer,
    /// zero-filling any remainder. Used to prime a transfer.
    pub fn fill(&self, data: &[u8]) {
        let half = self.segment_len();
        let first = &data[..data.len().min(half)];
        let second = if data.len() > half { &data[half..] } else { &[][..] };
        self.fill_segment(Segment::First, first);
        self.fill_segment(Segment::Second, second);
    }

    /// Copy the whole buffer out, first segment then second.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = self.read_segment(Segment::First);
        out.extend(self.read_segment(Segment::Second));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buffer = DoubleBuffer::new(16);
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.segment_len(), 8);
        assert_eq!(buffer.snapshot(), vec![0u8; 16]);
    }

    #[test]
    fn fill_segment_pads_tail_with_zeros() {
        let buffer = DoubleBuffer::new(16);
        buffer.fill_segment(Segment::First, &[1, 2, 3]);
        assert_eq!(buffer.read_segment(Segment::First), vec![1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(buffer.read_segment(Segment::Second), vec![0u8; 8]);
    }

    #[test]
    fn fill_segment_truncates_long_input() {
        let buffer = DoubleBuffer::new(8);
        buffer.fill_segment(Segment::Second, &[9; 10]);
        assert_eq!(buffer.read_segment(Segment::Second), vec![9, 9, 9, 9]);
    }

    #[test]
    fn fill_primes_both_segments() {
        let buffer = DoubleBuffer::new(8);
        buffer.fill(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.read_segment(Segment::First), vec![1, 2, 3, 4]);
        assert_eq!(buffer.read_segment(Segment::Second), vec![5, 6, 0, 0]);
    }

    #[test]
    fn fill_with_short_input_zeroes_the_rest() {
        let buffer = DoubleBuffer::new(8);
        buffer.fill(&[7; 8]);
        buffer.fill(&[1, 2]);
        assert_eq!(buffer.snapshot(), vec![1, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn clones_share_the_same_storage() {
        let buffer = DoubleBuffer::new(8);
        let clone = buffer.clone();
        clone.fill_segment(Segment::First, &[5, 6, 7, 8]);
        assert_eq!(buffer.read_segment(Segment::First), vec![5, 6, 7, 8]);
    }

    #[test]
    fn with_segment_mut_exposes_the_half() {
        let buffer = DoubleBuffer::new(8);
        let len = buffer.with_segment_mut(Segment::Second, |half| {
            half[0] = 42;
            half.len()
        });
        assert_eq!(len, 4);
        assert_eq!(buffer.read_segment(Segment::Second)[0], 42);
    }

    #[test]
    fn segment_indices() {
        assert_eq!(Segment::First.index(), 0);
        assert_eq!(Segment::Second.index(), 1);
    }
}
