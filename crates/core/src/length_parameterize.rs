//! Arc-length parameterization over evaluated polylines: uniform sample
//! generation and sample-pair interpolation of per-point data.

use glam::Vec3;

use crate::attribute_math::Blend;

/// Index of the point after `index`, wrapping past the end. The single wrap
/// helper shared by every interpolation call site; open curves never produce
/// a sample index on the final point, so the wrap only fires for cyclic data.
pub fn next_point_index(index: usize, point_count: usize) -> usize {
    if index + 1 == point_count {
        0
    } else {
        index + 1
    }
}

/// Accumulated lengths of the polyline's segments: `points.len() - 1` values
/// for open polylines, one more for cyclic ones (the wrap segment back to the
/// first point).
pub fn accumulate_lengths(points: &[[f32; 3]], cyclic: bool) -> Vec<f32> {
    if points.len() < 2 {
        return Vec::new();
    }
    let segment_count = if cyclic { points.len() } else { points.len() - 1 };
    let mut lengths = Vec::with_capacity(segment_count);
    let mut total = 0.0f32;
    for i in 0..segment_count {
        let a = Vec3::from(points[i]);
        let b = Vec3::from(points[next_point_index(i, points.len())]);
        total += (b - a).length();
        lengths.push(total);
    }
    lengths
}

/// Locates `sample_length` within accumulated segment lengths: the segment
/// index and the factor inside it.
fn sample_at_length(accumulated: &[f32], sample_length: f32) -> (u32, f32) {
    let index = accumulated
        .partition_point(|length| *length <= sample_length)
        .min(accumulated.len() - 1);
    let previous = if index == 0 { 0.0 } else { accumulated[index - 1] };
    let segment_length = accumulated[index] - previous;
    let factor = if segment_length > 0.0 {
        ((sample_length - previous) / segment_length).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (index as u32, factor)
}

/// Fills `indices`/`factors` with uniformly spaced sample pairs over the
/// accumulated lengths. With `include_last_point` (open curves) the final
/// pair is pinned to the end of the last segment; without it (cyclic curves)
/// the samples divide the full loop and the last pair's successor wraps to
/// point zero.
pub fn sample_uniform(
    accumulated: &[f32],
    include_last_point: bool,
    indices: &mut [u32],
    factors: &mut [f32],
) {
    debug_assert_eq!(indices.len(), factors.len());
    let count = indices.len();
    if count == 0 {
        return;
    }
    let total = accumulated.last().copied().unwrap_or(0.0);
    if count == 1 || total <= 0.0 {
        indices.fill(0);
        factors.fill(0.0);
        return;
    }
    let divisor = if include_last_point { count - 1 } else { count };
    let step = total / divisor as f32;
    let sampled = if include_last_point { count - 1 } else { count };
    for i in 0..sampled {
        let (index, factor) = sample_at_length(accumulated, step * i as f32);
        indices[i] = index;
        factors[i] = factor;
    }
    if include_last_point {
        indices[count - 1] = (accumulated.len() - 1) as u32;
        factors[count - 1] = 1.0;
    }
}

/// Interpolates per-point data at the given sample pairs:
/// `dst[i] = blend(src[indices[i]], src[next], factors[i])`.
pub fn interpolate<T: Blend>(src: &[T], indices: &[u32], factors: &[f32], dst: &mut [T]) {
    if src.is_empty() {
        dst.fill(T::default());
        return;
    }
    for i in 0..dst.len() {
        let index = indices[i] as usize;
        let next = next_point_index(index, src.len());
        dst[i] = T::lerp(src[index], src[next], factors[i]);
    }
}
