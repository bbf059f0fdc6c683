//! Scoped-thread helpers for running independent queries side by side.
//!
//! Uses `std::thread::scope`: borrowed inputs (an index, a query set) are
//! shared across workers without `Arc`, and no pool outlives the call.

use crate::error::Result;

/// Below this many items the work runs on the calling thread.
const MIN_ITEMS_PER_THREAD: usize = 8;

/// Evaluate `f(i)` for every `i` in `0..count`, returning results in index
/// order.
///
/// Work is split into contiguous chunks, one per available core. If any
/// call fails, the error from the lowest failing chunk is returned and no
/// partial output escapes.
pub fn try_map_indexed<F, R>(count: usize, f: F) -> Result<Vec<R>>
where
    F: Fn(usize) -> Result<R> + Sync,
    R: Send,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(count.div_ceil(MIN_ITEMS_PER_THREAD));

    if num_threads <= 1 {
        return (0..count).map(&f).collect();
    }
    let chunk_size = count.div_ceil(num_threads);
    let f = &f;

    let chunks: Vec<Result<Vec<R>>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..count)
            .step_by(chunk_size)
            .map(|start| {
                let end = (start + chunk_size).min(count);
                s.spawn(move || (start..end).map(f).collect::<Result<Vec<R>>>())
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut out = Vec::with_capacity(count);
    for chunk in chunks {
        out.extend(chunk?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BannError;

    #[test]
    fn test_preserves_order() {
        let out = try_map_indexed(1000, |i| Ok(i * 2)).unwrap();
        assert_eq!(out.len(), 1000);
        assert!(out.iter().enumerate().all(|(i, &v)| v == i * 2));
    }

    #[test]
    fn test_empty_range() {
        let out: Vec<usize> = try_map_indexed(0, Ok).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_error_fails_whole_batch() {
        let res: Result<Vec<usize>> = try_map_indexed(500, |i| {
            if i == 377 {
                Err(BannError::parameter("i", "boom"))
            } else {
                Ok(i)
            }
        });
        assert!(res.unwrap_err().is_parameter());
    }
}
