use rayon::prelude::*;

const PARALLEL_THRESHOLD: usize = 64;

/// Runs `f` over every element, on the rayon pool once the slice is large
/// enough to be worth it. Results never depend on scheduling order.
pub fn for_each_indexed_mut<T, F>(slice: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    if slice.len() >= PARALLEL_THRESHOLD {
        slice
            .par_iter_mut()
            .enumerate()
            .for_each(|(idx, value)| f(idx, value));
        return;
    }

    for (idx, value) in slice.iter_mut().enumerate() {
        f(idx, value);
    }
}
