//! Contains [FrameCache], a bounded least-recently-used cache that sits in
//! front of a [FrameBackend].
//!
//! Scrubbing and seeking are bursty and tend to revisit nearby frames, so
//! keeping the last few decoded frames around avoids most redundant decode
//! work. The cache is a transparent accelerator: it never validates frame
//! indices and never transforms backend errors.

use std::collections::VecDeque;

use crate::backend::{BackendStats, DecodeError, FrameBackend};
use crate::frame::Frame;

/// Wraps a [FrameBackend], serving recently decoded frames from memory.
///
/// Entries are kept in recency order (least-recently-used at the front). The
/// number of entries never exceeds [Self::capacity] and a capacity of `0`
/// disables caching entirely (every request is passed through).
///
/// There's no internal locking. If a cache is shared between threads, access
/// must be serialized by the caller.
#[derive(Debug)]
pub struct FrameCache<B: FrameBackend> {
    backend: B,
    entries: VecDeque<CacheEntry>,
    capacity: usize,
    stats: CacheStats,
}

#[derive(Debug)]
struct CacheEntry {
    index: usize,
    frame: Frame,
}

impl<B: FrameBackend> FrameCache<B> {
    /// Wrap `backend` in a cache that holds at most `capacity` frames.
    pub fn new(backend: B, capacity: usize) -> Self {
        Self {
            backend,
            entries: VecDeque::new(),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Wrap `backend` without caching anything (capacity `0`).
    pub fn uncached(backend: B) -> Self {
        Self::new(backend, 0)
    }

    /// Get frame `n`, from the cache if possible and from the backend
    /// otherwise.
    ///
    /// The returned frame is the caller's own copy; mutating it never affects
    /// what's cached. Errors from the backend are returned unchanged and
    /// nothing is cached for them.
    pub fn get_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        if let Some(position) = self.entries.iter().position(|entry| entry.index == n) {
            log::trace!("Frame cache hit for frame {n}.");
            self.stats.hits += 1;

            // Move the entry to the most-recently-used end. This moves the
            // entry itself, the pixels aren't copied.
            let entry = self
                .entries
                .remove(position)
                .expect("The position was just found.");
            let frame = entry.frame.clone();
            self.entries.push_back(entry);

            return Ok(frame);
        }

        log::trace!("Frame cache miss for frame {n}.");
        self.stats.misses += 1;

        let frame = self.backend.decode_frame(n)?;
        self.insert(n, &frame);
        Ok(frame)
    }

    /// Change the maximum number of frames to keep around. Negative values are
    /// treated as `0` (caching disabled).
    ///
    /// Shrinking the capacity drops least-recently-used frames right away, so
    /// the cache never holds more than [Self::capacity] frames.
    pub fn set_capacity(&mut self, capacity: i64) {
        let capacity = usize::try_from(capacity.max(0)).unwrap_or(usize::MAX);
        log::debug!("Frame cache capacity set to {capacity} (was {}).", self.capacity);
        self.capacity = capacity;

        if self.entries.len() > capacity {
            log::debug!(
                "Dropping {} frames to fit the new capacity.",
                self.entries.len() - capacity
            );
            // Front entries are the least recently used ones.
            self.entries.drain(..self.entries.len() - capacity);
        }
    }

    /// Release every cached frame. Calling this on an empty cache does nothing.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Clearing {} cached frames.", self.entries.len());
        }

        for entry in self.entries.iter_mut() {
            entry.frame.clear();
        }
        self.entries.clear();
    }

    /// Would write frame `n` into `buffer` as floating point samples. This
    /// conversion doesn't exist yet: nothing is written and no state changes.
    pub fn write_float_samples(&mut self, buffer: &mut [f32], n: usize) {
        _ = (buffer, n);
    }

    /// The maximum number of frames that will be kept around.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of frames currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether frame `n` is currently cached. This doesn't count as a use of
    /// the frame (recency order is unaffected).
    pub fn contains(&self, n: usize) -> bool {
        self.entries.iter().any(|entry| entry.index == n)
    }

    /// The indices of the cached frames, from least to most recently used.
    pub fn cached_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.index).collect()
    }

    /// Hit/miss counts since the cache was created.
    pub const fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// A reference to the wrapped backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// A *mutable* reference to the wrapped backend. Cached frames are not
    /// invalidated; call [Self::clear] if the backend's output changes.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Discard the cache and return the wrapped backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn insert(&mut self, n: usize, frame: &Frame) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.len() >= self.capacity {
            // Reuse the least-recently-used entry (and its pixel allocation)
            // instead of allocating a new one.
            let Some(mut victim) = self.entries.pop_front() else {
                return;
            };
            log::debug!("Evicting frame {} for frame {n}.", victim.index);

            victim.index = n;
            victim.frame.copy_from(frame);
            self.entries.push_back(victim);
        } else {
            self.entries.push_back(CacheEntry {
                index: n,
                frame: frame.clone(),
            });
        }
    }
}

/// A [FrameCache] is itself a backend, so it can be used anywhere a backend
/// can.
impl<B: FrameBackend> FrameBackend for FrameCache<B> {
    fn stats(&self) -> BackendStats {
        self.backend.stats()
    }

    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        self.get_frame(n)
    }
}

/// Counts of how [FrameCache::get_frame] requests were served.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// The fraction of requests served from the cache, in the range
    /// `[0.0, 1.0]`. `0.0` if there haven't been any requests.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::backend::MockFrameBackend;
    use crate::frame::{Dimensions, Pixel};

    /// A frame whose content encodes `n`, so frames for different indices are
    /// distinguishable.
    fn frame_for(n: usize) -> Frame {
        Frame::from_fill(
            Dimensions::new(2, 2).unwrap(),
            Pixel::from_rgba(n as u8, (n >> 8) as u8, 0, 0xFF),
        )
    }

    /// A backend that decodes any index and counts every decode.
    fn counting_backend() -> MockFrameBackend {
        let mut backend = MockFrameBackend::new();
        backend
            .expect_decode_frame()
            .returning(|n| Ok(frame_for(n)));
        backend
    }

    fn init_logger() {
        _ = env_logger::builder().is_test(true).try_init();
    }

    fn miss_count(cache: &FrameCache<MockFrameBackend>) -> u64 {
        cache.cache_stats().misses
    }

    #[test]
    fn oldest_frame_is_evicted_when_full() {
        init_logger();
        for capacity in 1..=5 {
            let mut cache = FrameCache::new(counting_backend(), capacity);

            for n in 0..=capacity {
                cache.get_frame(n).unwrap();
            }

            assert_eq!(cache.len(), capacity);
            assert!(!cache.contains(0));
            for n in 1..=capacity {
                assert!(cache.contains(n), "frame {n} should be cached");
            }
        }
    }

    #[test]
    fn zero_capacity_never_caches() {
        let mut backend = MockFrameBackend::new();
        backend
            .expect_decode_frame()
            .with(eq(7))
            .times(3)
            .returning(|n| Ok(frame_for(n)));

        let mut cache = FrameCache::uncached(backend);
        for _ in 0..3 {
            assert_eq!(cache.get_frame(7).unwrap(), frame_for(7));
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn hits_refresh_recency() {
        let mut cache = FrameCache::new(counting_backend(), 2);

        cache.get_frame(1).unwrap();
        cache.get_frame(2).unwrap();
        cache.get_frame(1).unwrap();
        cache.get_frame(3).unwrap();

        assert_eq!(cache.cached_indices(), vec![1, 3]);
        assert_eq!(cache.cache_stats(), CacheStats { hits: 1, misses: 3 });
    }

    #[test]
    fn hits_do_not_decode() {
        let mut backend = MockFrameBackend::new();
        backend
            .expect_decode_frame()
            .with(eq(4))
            .times(1)
            .returning(|n| Ok(frame_for(n)));

        let mut cache = FrameCache::new(backend, 8);
        for _ in 0..10 {
            assert_eq!(cache.get_frame(4).unwrap(), frame_for(4));
        }
        assert_eq!(cache.cache_stats().hits, 9);
    }

    #[test]
    fn clear_forces_a_decode() {
        init_logger();
        let mut cache = FrameCache::new(counting_backend(), 4);
        cache.get_frame(1).unwrap();
        cache.get_frame(2).unwrap();

        cache.clear();
        assert!(cache.is_empty());

        cache.get_frame(1).unwrap();
        assert_eq!(miss_count(&cache), 3);

        // Clearing an empty cache is fine.
        cache.clear();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn returned_frames_do_not_alias_the_cache() {
        let mut cache = FrameCache::new(counting_backend(), 4);

        let mut first = cache.get_frame(5).unwrap();
        first.fill(Pixel::WHITE);

        let mut second = cache.get_frame(5).unwrap();
        assert_eq!(second, frame_for(5));
        second.clear();

        assert_eq!(cache.get_frame(5).unwrap(), frame_for(5));
        assert_eq!(miss_count(&cache), 1);
    }

    #[test]
    fn reused_entries_hold_the_new_content() {
        let mut cache = FrameCache::new(counting_backend(), 1);
        cache.get_frame(1).unwrap();
        cache.get_frame(300).unwrap();

        assert_eq!(cache.cached_indices(), vec![300]);
        assert_eq!(cache.get_frame(300).unwrap(), frame_for(300));
    }

    #[test]
    fn decode_errors_pass_through_and_are_not_cached() {
        let mut backend = MockFrameBackend::new();
        backend
            .expect_decode_frame()
            .with(eq(99))
            .times(2)
            .returning(|n| {
                Err(DecodeError::OutOfRange {
                    index: n,
                    frame_count: 10,
                })
            });

        let mut cache = FrameCache::new(backend, 4);
        for _ in 0..2 {
            assert!(matches!(
                cache.get_frame(99),
                Err(DecodeError::OutOfRange {
                    index: 99,
                    frame_count: 10
                })
            ));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn shrinking_drops_least_recently_used_frames() {
        init_logger();
        let mut cache = FrameCache::new(counting_backend(), 4);
        for n in [1, 2, 3, 4] {
            cache.get_frame(n).unwrap();
        }
        cache.get_frame(1).unwrap();

        cache.set_capacity(2);
        assert_eq!(cache.cached_indices(), vec![4, 1]);

        cache.get_frame(5).unwrap();
        assert_eq!(cache.cached_indices(), vec![1, 5]);
    }

    #[test]
    fn negative_capacity_disables_caching() {
        let mut cache = FrameCache::new(counting_backend(), 4);
        cache.get_frame(1).unwrap();

        cache.set_capacity(-3);
        assert_eq!(cache.capacity(), 0);
        assert!(cache.is_empty());

        cache.get_frame(1).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn growing_keeps_existing_frames() {
        let mut cache = FrameCache::new(counting_backend(), 1);
        cache.get_frame(1).unwrap();

        cache.set_capacity(3);
        cache.get_frame(2).unwrap();
        cache.get_frame(3).unwrap();
        assert_eq!(cache.cached_indices(), vec![1, 2, 3]);
    }

    #[test]
    fn float_samples_are_left_alone() {
        let mut cache = FrameCache::new(counting_backend(), 2);
        cache.get_frame(1).unwrap();

        let mut buffer = [0.5_f32; 16];
        cache.write_float_samples(&mut buffer, 1);

        assert_eq!(buffer, [0.5; 16]);
        assert_eq!(cache.cache_stats(), CacheStats { hits: 0, misses: 1 });
    }

    #[test]
    fn cache_is_a_backend() {
        let mut backend = counting_backend();
        backend.expect_stats().returning(|| BackendStats {
            fps: 24.0,
            frame_count: 100,
            dimensions: Dimensions::new(2, 2).unwrap(),
        });

        let mut cache: Box<dyn FrameBackend> = Box::new(FrameCache::new(backend, 2));
        assert_eq!(cache.stats().frame_count, 100);
        assert_eq!(cache.decode_frame(3).unwrap(), frame_for(3));
    }

    #[test]
    fn huge_capacities_allocate_lazily() {
        let mut cache = FrameCache::new(counting_backend(), usize::MAX / 2);

        assert_eq!(cache.get_frame(3).unwrap(), frame_for(3));
        assert_eq!(cache.get_frame(3).unwrap(), frame_for(3));
        assert_eq!(cache.cached_indices(), vec![3]);
        assert_eq!(cache.cache_stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        assert_eq!(CacheStats { hits: 3, misses: 1 }.hit_rate(), 0.75);
    }
}
