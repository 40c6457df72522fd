//! Per-frame mapping of static runs onto pooled batches.

use strata_core::PoolHandle;
use tracing::warn;

use super::pool::BatchPool;
use super::upload::UploadTarget;
use crate::error::StrataResult;
use crate::instance::InstanceRecord;
use crate::ranges::RenderRange;

/// Outcome of one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignStats {
    /// Batches assigned this frame.
    pub batches: usize,
    /// Runs (or capacity-sized pieces of runs) that got no batch.
    pub dropped_ranges: usize,
    /// Instances staged.
    pub instances: usize,
    /// Bytes written to the upload target.
    pub uploaded_bytes: u64,
}

/// Assigns batches to static runs every frame.
///
/// All batches assigned on the previous frame are returned first; runs
/// longer than a batch are split across consecutive batches. The assigned
/// list is in sequence order.
#[derive(Debug)]
pub struct BatchAssigner {
    assigned: Vec<PoolHandle>,
    pack_chunk_size: usize,
    stats: AssignStats,
}

impl BatchAssigner {
    /// Creates an assigner packing at least `pack_chunk_size` instances per
    /// parallel task.
    #[must_use]
    pub fn new(pack_chunk_size: usize) -> Self {
        Self {
            assigned: Vec::new(),
            pack_chunk_size,
            stats: AssignStats::default(),
        }
    }

    /// Returns every assigned batch to the pool.
    ///
    /// Every handle is returned even if one fails; the list is empty after
    /// the call either way.
    ///
    /// # Errors
    ///
    /// Returns the first error if a handle was already returned elsewhere.
    pub fn release_all(&mut self, pool: &mut BatchPool) -> StrataResult<()> {
        let mut result = Ok(());
        for handle in self.assigned.drain(..) {
            if let Err(e) = pool.return_batch(handle) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Stages and uploads every static run in `ranges`.
    ///
    /// Exhaustion drops the remaining pieces and is reported in the stats,
    /// never as an error.
    ///
    /// # Errors
    ///
    /// Propagates upload-target errors.
    pub fn assign<U>(
        &mut self,
        pool: &mut BatchPool,
        ranges: &[RenderRange],
        sequence: &[InstanceRecord],
        target: &mut U,
        frame: u64,
    ) -> StrataResult<AssignStats>
    where
        U: UploadTarget + ?Sized,
    {
        self.release_all(pool)?;

        let capacity = pool.batch_capacity();
        let mut stats = AssignStats::default();

        for range in ranges.iter().filter(|r| r.is_static() && r.count > 0) {
            let end = range.end().min(sequence.len());
            let mut start = range.start;

            while start < end {
                let piece_end = (start + capacity).min(end);
                let Some(handle) = pool.get_batch() else {
                    stats.dropped_ranges += 1;
                    start = piece_end;
                    continue;
                };

                self.assigned.push(handle);
                let Some(batch) = pool.get_mut(handle) else {
                    start = piece_end;
                    continue;
                };
                batch.stage(&sequence[start..piece_end], start, frame, self.pack_chunk_size);

                target.write(batch.transform_offset(), batch.transform_bytes())?;
                target.write(batch.color_offset(), batch.color_bytes())?;

                stats.batches += 1;
                stats.instances += batch.count();
                stats.uploaded_bytes += (batch.transform_bytes().len() + batch.color_bytes().len()) as u64;
                start = piece_end;
            }
        }

        if stats.dropped_ranges > 0 {
            warn!(
                dropped = stats.dropped_ranges,
                ceiling = pool.stats().ceiling,
                "batch pool exhausted, ranges dropped"
            );
        }

        self.stats = stats;
        Ok(stats)
    }

    /// Batches assigned by the last pass, in sequence order.
    #[must_use]
    pub fn assigned(&self) -> &[PoolHandle] {
        &self.assigned
    }

    /// Stats of the last pass.
    #[must_use]
    pub const fn stats(&self) -> AssignStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batching::HostUploadBuffer;
    use crate::config::BatchingConfig;
    use crate::ranges::RangeKind;

    fn pool(capacity: usize, max: usize) -> BatchPool {
        BatchPool::new(&BatchingConfig {
            batch_capacity: capacity,
            initial_pool_size: 0,
            max_pool_size: max,
            pack_chunk_size: 1,
        })
    }

    fn run(start: usize, count: usize) -> RenderRange {
        RenderRange {
            start,
            count,
            kind: RangeKind::StaticRun,
            anchor: [0.0; 3],
        }
    }

    fn splice(start: usize) -> RenderRange {
        RenderRange {
            start,
            count: 0,
            kind: RangeKind::DynamicSplice,
            anchor: [0.0; 3],
        }
    }

    #[test]
    fn test_third_range_dropped_at_ceiling() {
        let mut pool = pool(8, 2);
        let mut target = HostUploadBuffer::new(pool.buffer_size_bytes() as usize);
        let sequence = vec![InstanceRecord::default(); 9];
        let ranges = [run(0, 3), splice(3), run(3, 3), splice(6), run(6, 3)];

        let mut assigner = BatchAssigner::new(1);
        let stats = assigner.assign(&mut pool, &ranges, &sequence, &mut target, 1).unwrap();

        assert_eq!(stats.batches, 2);
        assert_eq!(stats.dropped_ranges, 1);
        assert_eq!(stats.instances, 6);
        assert_eq!(stats.uploaded_bytes, 6 * 64);
    }

    #[test]
    fn test_long_run_splits_across_batches() {
        let mut pool = pool(4, 8);
        let mut target = HostUploadBuffer::new(pool.buffer_size_bytes() as usize);
        let sequence = vec![InstanceRecord::default(); 10];

        let mut assigner = BatchAssigner::new(1);
        let stats = assigner.assign(&mut pool, &[run(0, 10)], &sequence, &mut target, 1).unwrap();
        assert_eq!(stats.batches, 3);

        let counts: Vec<_> = assigner
            .assigned()
            .iter()
            .filter_map(|&h| pool.get(h))
            .map(|b| (b.start_index(), b.count()))
            .collect();
        assert_eq!(counts, vec![(0, 4), (4, 4), (8, 2)]);
    }

    #[test]
    fn test_previous_batches_are_returned() {
        let mut pool = pool(4, 2);
        let mut target = HostUploadBuffer::new(pool.buffer_size_bytes() as usize);
        let sequence = vec![InstanceRecord::default(); 8];
        let mut assigner = BatchAssigner::new(1);

        for frame in 0..5 {
            let stats = assigner.assign(&mut pool, &[run(0, 8)], &sequence, &mut target, frame).unwrap();
            assert_eq!(stats.dropped_ranges, 0);
            assert_eq!(pool.stats().in_use, 2);
            assert!(pool.stats().allocated <= 2);
        }
    }

    #[test]
    fn test_upload_lands_at_batch_offset() {
        let mut pool = pool(2, 2);
        let mut target = HostUploadBuffer::new(pool.buffer_size_bytes() as usize);
        let mut sequence = vec![InstanceRecord::default(); 3];
        sequence[2].color = [0.25, 0.5, 0.75, 1.0];

        let mut assigner = BatchAssigner::new(1);
        assigner.assign(&mut pool, &[run(0, 3)], &sequence, &mut target, 0).unwrap();

        let second = pool.get(assigner.assigned()[1]).unwrap();
        let bytes = target.copy_range(second.color_offset() as usize, 16).unwrap();
        let color: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(color, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_undersized_target_errors() {
        let mut pool = pool(4, 1);
        let mut target = HostUploadBuffer::new(8);
        let sequence = vec![InstanceRecord::default(); 2];
        let mut assigner = BatchAssigner::new(1);
        assert!(assigner.assign(&mut pool, &[run(0, 2)], &sequence, &mut target, 0).is_err());
    }

    #[test]
    fn test_release_returns_rest_after_stale_handle() {
        let mut pool = pool(4, 4);
        let mut target = HostUploadBuffer::new(pool.buffer_size_bytes() as usize);
        let sequence = vec![InstanceRecord::default(); 12];
        let mut assigner = BatchAssigner::new(1);
        assigner.assign(&mut pool, &[run(0, 12)], &sequence, &mut target, 0).unwrap();
        assert_eq!(pool.stats().in_use, 3);

        // Returned behind the assigner's back.
        let stale = assigner.assigned()[0];
        pool.return_batch(stale).unwrap();

        assert!(assigner.release_all(&mut pool).is_err());
        assert!(assigner.assigned().is_empty());
        assert_eq!(pool.stats().in_use, 0);
    }
}
