//! Brightness index: sorted, tiled sample lists and rank lookup.
//!
//! ## Tiling
//!
//! The shorter image contributes fewer visible pixels than the output has
//! positions, so its list is grown to the canvas pixel count by repeatedly
//! appending a prefix of *itself as it currently stands*:
//!
//! ```text
//! [a b c]                target 8
//! [a b c a b c]          appended prefix of len min(3, 5)
//! [a b c a b c a b]      appended prefix of len min(6, 2)
//! ```
//!
//! After the first round the list is no longer monotone. Rank lookup still
//! runs over the whole tiled list, so [`SortedPixelList::lower_bound`] pins
//! down its exact midpoint sequence rather than delegating to
//! `slice::partition_point`.

use super::sample::PixelSample;

/// Samples ordered by ascending brightness, optionally tiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedPixelList {
    samples: Vec<PixelSample>,
}

impl SortedPixelList {
    /// Stable sort by brightness; equal brightness keeps extraction order.
    pub fn from_samples(mut samples: Vec<PixelSample>) -> Self {
        samples.sort_by(|a, b| a.brightness.total_cmp(&b.brightness));
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[PixelSample] {
        &self.samples
    }

    /// Grow to at least `target` entries by self-concatenation of prefixes.
    ///
    /// No-op when the list is empty or already long enough.
    pub fn tile_to(&mut self, target: usize) {
        if self.samples.is_empty() {
            return;
        }
        self.samples.reserve(target.saturating_sub(self.samples.len()));
        while self.samples.len() < target {
            let len = self.samples.len();
            let take = len.min(target - len);
            self.samples.extend_from_within(..take);
        }
    }

    /// Leftmost insertion index for `brightness`.
    ///
    /// Inclusive-bound binary search: `mid = (left + right) / 2` with
    /// `right = len - 1` initially. `hi` below is `right + 1`.
    pub fn lower_bound(&self, brightness: f64) -> usize {
        let mut lo = 0usize;
        let mut hi = self.samples.len();
        while lo < hi {
            let mid = (lo + hi - 1) / 2;
            if self.samples[mid].brightness < brightness {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Sample at `rank`, clamped to the last entry.
    ///
    /// An empty list yields [`PixelSample::SENTINEL`].
    pub fn sample_at(&self, rank: usize) -> &PixelSample {
        match self.samples.len() {
            0 => &PixelSample::SENTINEL,
            len => &self.samples[rank.min(len - 1)],
        }
    }
}
