/// Rolling window of the most recent `W` analog samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow<const W: usize> {
    samples: [u16; W],
    next: usize,
    len: usize,
}

impl<const W: usize> Default for SampleWindow<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize> SampleWindow<W> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: [0; W],
            next: 0,
            len: 0,
        }
    }

    /// Store `sample`, overwriting the oldest one once the window is full.
    pub fn push(&mut self, sample: u16) {
        if W == 0 {
            return;
        }

        self.samples[self.next] = sample;
        self.next = (self.next + 1) % W;

        if self.len < W {
            self.len += 1;
        }
    }

    /// Number of samples currently held, never more than `W`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Arithmetic mean of the held samples, truncated toward zero.
    ///
    /// Returns `None` until the first sample arrives.
    #[must_use]
    pub fn average(&self) -> Option<u16> {
        if self.len == 0 {
            return None;
        }

        let sum: u32 = self.samples[..self.len]
            .iter()
            .map(|&s| u32::from(s))
            .sum();

        u16::try_from(sum / self.len as u32).ok()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
