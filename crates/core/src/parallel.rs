use rayon::prelude::*;

const PARALLEL_THRESHOLD: usize = 1024;

/// Per-element parallelism for large flat buffers; falls back to a
/// sequential loop below the threshold.
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

/// Fork-join over a small list of heavy, independent tasks. Unlike
/// `for_each_indexed_mut` the threshold is the task count itself: even two
/// tasks are worth a join when each covers hundreds of curves.
pub fn for_each_task_mut<T, F>(tasks: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    if tasks.len() > 1 {
        tasks.par_iter_mut().for_each(|task| f(task));
        return;
    }

    for task in tasks.iter_mut() {
        f(task);
    }
}
