//! Arc-length resampling of curves. Selected curves are replaced by poly
//! curves with uniformly spaced points along their evaluated shape;
//! unselected curves pass through untouched. Per-point attributes are carried
//! across by interpolating control-point values onto the evaluated points
//! and then onto the sample positions.

use std::ops::Range;

use glam::Vec3;

use crate::attribute_math::{Blend, Rotation};
use crate::attributes::{
    split_spans, AttributeDomain, AttributeRef, AttributeRefMut, AttributeStorage, AttributeType,
};
use crate::curve_eval::{self, EvaluatedCurves};
use crate::curves::{
    CurveSet, CurveType, HANDLE_LEFT, HANDLE_RIGHT, HANDLE_TYPE_LEFT, HANDLE_TYPE_RIGHT,
    NURBS_WEIGHT,
};
use crate::fields::{Field, FieldContext};
use crate::length_parameterize::{interpolate, sample_uniform};
use crate::parallel;
use crate::selection::Selection;

/// Curves per parallel segment. The per-curve work is a handful of cache
/// misses plus an interpolation loop, so segments stay coarse.
const CURVE_SEGMENT_SIZE: usize = 512;

/// Optional extra outputs: names under which the sampled unit tangents and
/// minimal-twist normals are stored as point attributes on the result.
#[derive(Debug, Clone, Default)]
pub struct ResampleOutputs {
    pub tangent: Option<String>,
    pub normal: Option<String>,
}

/// How each point attribute crosses the resample.
///
/// Bezier handle data and NURBS weights only mean something on curves that
/// keep their type, so they are copied for unselected curves and dropped
/// entirely when no curve of that type remains in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributePolicy {
    Interpolate,
    CopyOnlyBezier,
    CopyOnlyNurbs,
}

fn attribute_policy(name: &str) -> AttributePolicy {
    match name {
        HANDLE_LEFT | HANDLE_RIGHT | HANDLE_TYPE_LEFT | HANDLE_TYPE_RIGHT => {
            AttributePolicy::CopyOnlyBezier
        }
        NURBS_WEIGHT => AttributePolicy::CopyOnlyNurbs,
        _ => AttributePolicy::Interpolate,
    }
}

/// Sizing inputs for the selected curves; slices are indexed by curve.
enum CountSpec<'a> {
    PerCurve(&'a [u32]),
    ByLength {
        sample_lengths: &'a [f32],
        keep_last_segment: bool,
    },
    Evaluated,
}

/// Point count for a uniform sample spacing over a curve of the given
/// length. A non-positive spacing collapses the curve to a single point;
/// `keep_last_segment` keeps at least one segment alive for open curves.
fn count_from_length(curve_length: f32, sample_length: f32, keep_last_segment: bool) -> u32 {
    if sample_length == 0.0 {
        return 1;
    }
    let count = (curve_length / sample_length).floor() as i64 + 1;
    let min = if keep_last_segment { 2 } else { 1 };
    count.max(min).min(u32::MAX as i64) as u32
}

/// Shared read-only state for the parallel sampling phase.
struct ResampleContext<'a> {
    src: &'a CurveSet,
    evaluated: &'a EvaluatedCurves,
    dst_offsets: &'a [u32],
    src_attributes: &'a [AttributeRef<'a>],
    policies: &'a [AttributePolicy],
    /// Copy evaluated points one-to-one instead of sampling uniformly.
    exact_evaluated: bool,
}

/// One parallel unit of work: a run of selected curves together with the
/// disjoint slices of every destination buffer their points land in.
struct SegmentTask<'a> {
    curves: &'a [u32],
    span_start: usize,
    indices: &'a mut [u32],
    factors: &'a mut [f32],
    positions: &'a mut [[f32; 3]],
    tangents: Option<&'a mut [[f32; 3]]>,
    normals: Option<&'a mut [[f32; 3]]>,
    attributes: Vec<AttributeRefMut<'a>>,
}

/// Reusable scratch for interpolating attributes onto evaluated points, one
/// buffer per value type so a segment allocates at most once per type.
#[derive(Default)]
struct EvalBuffer {
    floats: Vec<f32>,
    ints: Vec<i32>,
    bools: Vec<bool>,
    vec2: Vec<[f32; 2]>,
    vec3: Vec<[f32; 3]>,
    vec4: Vec<[f32; 4]>,
    quats: Vec<Rotation>,
}

fn local_range(context: &ResampleContext, span_start: usize, i_curve: usize) -> Range<usize> {
    context.dst_offsets[i_curve] as usize - span_start
        ..context.dst_offsets[i_curve + 1] as usize - span_start
}

fn renormalize(vectors: &mut [[f32; 3]]) {
    for value in vectors {
        let vector = Vec3::from(*value);
        if vector.length_squared() > 1.0e-12 {
            *value = vector.normalize().to_array();
        }
    }
}

/// Interpolates one attribute for every curve in a segment: directly from
/// the control points for poly curves, through the evaluated points for
/// every other type.
#[allow(clippy::too_many_arguments)]
fn resample_typed<T: Blend>(
    context: &ResampleContext,
    curves: &[u32],
    span_start: usize,
    indices: &[u32],
    factors: &[f32],
    src_values: &[T],
    dst_values: &mut [T],
    scratch: &mut Vec<T>,
) {
    for &index in curves {
        let i_curve = index as usize;
        let local = local_range(context, span_start, i_curve);
        let control = &src_values[context.src.points_range(i_curve)];
        let pair_indices = &indices[local.clone()];
        let pair_factors = &factors[local.clone()];
        let dst = &mut dst_values[local];
        if context.src.curve_types[i_curve] == CurveType::Poly {
            interpolate(control, pair_indices, pair_factors, dst);
        } else {
            let eval_count = context.evaluated.point_count(i_curve);
            scratch.clear();
            scratch.resize(eval_count, T::default());
            curve_eval::interpolate_to_evaluated(context.src, i_curve, control, scratch);
            interpolate(scratch, pair_indices, pair_factors, dst);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resample_attribute(
    context: &ResampleContext,
    task_curves: &[u32],
    span_start: usize,
    indices: &[u32],
    factors: &[f32],
    src_attr: AttributeRef,
    dst_attr: &mut AttributeRefMut,
    scratch: &mut EvalBuffer,
) {
    match (src_attr, dst_attr) {
        (AttributeRef::Float(src), AttributeRefMut::Float(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.floats,
        ),
        (AttributeRef::Int(src), AttributeRefMut::Int(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.ints,
        ),
        (AttributeRef::Bool(src), AttributeRefMut::Bool(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.bools,
        ),
        (AttributeRef::Vec2(src), AttributeRefMut::Vec2(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.vec2,
        ),
        (AttributeRef::Vec3(src), AttributeRefMut::Vec3(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.vec3,
        ),
        (AttributeRef::Vec4(src), AttributeRefMut::Vec4(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.vec4,
        ),
        (AttributeRef::Quat(src), AttributeRefMut::Quat(dst)) => resample_typed(
            context, task_curves, span_start, indices, factors, src, dst, &mut scratch.quats,
        ),
        _ => {}
    }
}

fn resample_segment(context: &ResampleContext, task: &mut SegmentTask) {
    // Sample pairs for every curve in the segment.
    for &index in task.curves {
        let i_curve = index as usize;
        let local = local_range(context, task.span_start, i_curve);
        if context.exact_evaluated {
            for (offset, slot) in task.indices[local.clone()].iter_mut().enumerate() {
                *slot = offset as u32;
            }
            task.factors[local].fill(0.0);
            continue;
        }
        let lengths = context.evaluated.lengths_for_curve(i_curve);
        if lengths.is_empty() {
            task.indices[local.clone()].fill(0);
            task.factors[local].fill(0.0);
        } else {
            let cyclic = context.src.cyclic[i_curve];
            sample_uniform(
                lengths,
                !cyclic,
                &mut task.indices[local.clone()],
                &mut task.factors[local],
            );
        }
    }

    // Generic attributes, reusing one scratch buffer per value type.
    let mut scratch = EvalBuffer::default();
    for ((src_attr, policy), dst_attr) in context
        .src_attributes
        .iter()
        .zip(context.policies)
        .zip(task.attributes.iter_mut())
    {
        if *policy != AttributePolicy::Interpolate {
            continue;
        }
        resample_attribute(
            context,
            task.curves,
            task.span_start,
            task.indices,
            task.factors,
            *src_attr,
            dst_attr,
            &mut scratch,
        );
    }

    // Positions and the optional frame outputs come from the evaluated
    // cache; direction vectors lose unit length under lerp.
    for &index in task.curves {
        let i_curve = index as usize;
        let local = local_range(context, task.span_start, i_curve);
        let eval_range = context.evaluated.point_range(i_curve);
        let pair_indices = &task.indices[local.clone()];
        let pair_factors = &task.factors[local.clone()];
        interpolate(
            &context.evaluated.positions[eval_range.clone()],
            pair_indices,
            pair_factors,
            &mut task.positions[local.clone()],
        );
        if let Some(tangents) = task.tangents.as_deref_mut() {
            let dst = &mut tangents[local.clone()];
            interpolate(
                &context.evaluated.tangents[eval_range.clone()],
                pair_indices,
                pair_factors,
                dst,
            );
            renormalize(dst);
        }
        if let Some(normals) = task.normals.as_deref_mut() {
            let dst = &mut normals[local.clone()];
            interpolate(
                &context.evaluated.normals[eval_range.clone()],
                pair_indices,
                pair_factors,
                dst,
            );
            renormalize(dst);
        }
    }
}

fn copy_unselected_attribute(
    src: &CurveSet,
    dst_offsets: &[u32],
    unselected: &Selection,
    src_attr: AttributeRef,
    storage: &mut AttributeStorage,
) {
    fn copy_ranges<T: Clone>(
        src: &CurveSet,
        dst_offsets: &[u32],
        unselected: &Selection,
        src_values: &[T],
        dst_values: &mut [T],
    ) {
        for index in unselected.iter() {
            let i_curve = index as usize;
            let dst_range =
                dst_offsets[i_curve] as usize..dst_offsets[i_curve + 1] as usize;
            dst_values[dst_range].clone_from_slice(&src_values[src.points_range(i_curve)]);
        }
    }

    match (src_attr, storage.as_mut()) {
        (AttributeRef::Float(s), AttributeRefMut::Float(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Int(s), AttributeRefMut::Int(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Bool(s), AttributeRefMut::Bool(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Vec2(s), AttributeRefMut::Vec2(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Vec3(s), AttributeRefMut::Vec3(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Vec4(s), AttributeRefMut::Vec4(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        (AttributeRef::Quat(s), AttributeRefMut::Quat(d)) => {
            copy_ranges(src, dst_offsets, unselected, s, d)
        }
        _ => {}
    }
}

/// Splits an optional flat buffer into per-span views, or a row of `None`s
/// when the output is not requested.
fn split_optional<'a>(
    buffer: &'a mut Option<Vec<[f32; 3]>>,
    spans: &[Range<usize>],
) -> Vec<Option<&'a mut [[f32; 3]]>> {
    match buffer {
        Some(values) => split_spans(values, spans).into_iter().map(Some).collect(),
        None => spans.iter().map(|_| None).collect(),
    }
}

fn resample_curves(
    src: &CurveSet,
    selection: &Selection,
    sizing: CountSpec,
    outputs: &ResampleOutputs,
) -> CurveSet {
    let _span = tracing::debug_span!("resample_curves", selected = selection.len()).entered();
    debug_assert!(selection
        .as_slice()
        .last()
        .map_or(true, |&index| (index as usize) < src.curves_num()));
    if selection.is_empty() {
        // Requested outputs are still allocated so callers can rely on
        // their presence; no curve was resampled, so they stay zeroed.
        let mut dst = src.clone();
        let total_points = dst.points_num();
        let point_attributes = dst.attributes.map_mut(AttributeDomain::Point);
        for name in [&outputs.tangent, &outputs.normal].into_iter().flatten() {
            point_attributes.insert(
                name.clone(),
                AttributeStorage::Vec3(vec![[0.0; 3]; total_points]),
            );
        }
        return dst;
    }

    let curve_count = src.curves_num();
    let evaluated = curve_eval::evaluate_curves(src);

    // Per-curve output counts; unselected curves keep their point count.
    let mut dst_counts: Vec<u32> =
        (0..curve_count).map(|i| src.points_count(i) as u32).collect();
    parallel::for_each_indexed_mut(&mut dst_counts, |i_curve, slot| {
        if !selection.contains(i_curve as u32) {
            return;
        }
        *slot = match &sizing {
            CountSpec::PerCurve(counts) => counts.get(i_curve).copied().unwrap_or(1).max(1),
            CountSpec::ByLength {
                sample_lengths,
                keep_last_segment,
            } => count_from_length(
                evaluated.total_length(i_curve),
                sample_lengths.get(i_curve).copied().unwrap_or(0.0),
                *keep_last_segment,
            ),
            CountSpec::Evaluated => (evaluated.point_count(i_curve) as u32).max(1),
        };
    });

    let mut dst = src.copy_curve_domain();
    dst.fill_curve_types(selection, CurveType::Poly);

    let mut total: u32 = 0;
    let mut offsets = vec![0u32; curve_count + 1];
    for (i_curve, count) in dst_counts.iter().enumerate() {
        offsets[i_curve] = total;
        total = match total.checked_add(*count) {
            Some(total) => total,
            None => {
                tracing::warn!(
                    curves = curve_count,
                    "resample point count overflows; returning empty curves"
                );
                return CurveSet::default();
            }
        };
    }
    offsets[curve_count] = total;
    dst.offsets = offsets;
    let total_points = total as usize;

    // Which attributes cross over. String data has no interpolation and is
    // dropped; type-restricted data is dropped when no curve of its type
    // survives. Copy-only storages stay at their defaults on selected
    // curves, so allocation doubles as initialization.
    let type_counts = dst.curve_type_counts();
    let has_bezier = type_counts[CurveType::Bezier.index()] > 0;
    let has_nurbs = type_counts[CurveType::Nurbs.index()] > 0;
    let mut names: Vec<String> = Vec::new();
    let mut src_attributes: Vec<AttributeRef> = Vec::new();
    let mut policies: Vec<AttributePolicy> = Vec::new();
    let mut dst_storages: Vec<AttributeStorage> = Vec::new();
    for (name, storage) in src.attributes.map(AttributeDomain::Point) {
        if storage.data_type() == AttributeType::String {
            tracing::debug!(name = %name, "string attribute dropped by resampling");
            continue;
        }
        let policy = attribute_policy(name);
        match policy {
            AttributePolicy::CopyOnlyBezier if !has_bezier => continue,
            AttributePolicy::CopyOnlyNurbs if !has_nurbs => continue,
            _ => {}
        }
        names.push(name.clone());
        src_attributes.push(storage.as_ref());
        policies.push(policy);
        dst_storages.push(AttributeStorage::with_default(storage.data_type(), total_points));
    }

    let mut positions = vec![[0.0f32; 3]; total_points];
    let mut sample_indices = vec![0u32; total_points];
    let mut sample_factors = vec![0.0f32; total_points];
    let mut tangent_buffer = outputs.tangent.as_ref().map(|_| vec![[0.0f32; 3]; total_points]);
    let mut normal_buffer = outputs.normal.as_ref().map(|_| vec![[0.0f32; 3]; total_points]);

    {
        let segments: Vec<&[u32]> = selection.segments(CURVE_SEGMENT_SIZE).collect();
        let spans: Vec<Range<usize>> = segments
            .iter()
            .map(|segment| {
                let first = segment[0] as usize;
                let last = segment[segment.len() - 1] as usize;
                dst.offsets[first] as usize..dst.offsets[last + 1] as usize
            })
            .collect();

        let index_parts = split_spans(&mut sample_indices, &spans);
        let factor_parts = split_spans(&mut sample_factors, &spans);
        let position_parts = split_spans(&mut positions, &spans);
        let tangent_parts = split_optional(&mut tangent_buffer, &spans);
        let normal_parts = split_optional(&mut normal_buffer, &spans);

        // [attribute][segment] views, transposed to [segment][attribute].
        let mut task_attributes: Vec<Vec<AttributeRefMut>> =
            segments.iter().map(|_| Vec::with_capacity(dst_storages.len())).collect();
        for storage in dst_storages.iter_mut() {
            for (task, part) in task_attributes
                .iter_mut()
                .zip(storage.split_spans_mut(&spans))
            {
                task.push(part);
            }
        }

        let mut tasks: Vec<SegmentTask> = Vec::with_capacity(segments.len());
        let parts = segments
            .iter()
            .copied()
            .zip(spans.iter())
            .zip(index_parts)
            .zip(factor_parts)
            .zip(position_parts)
            .zip(tangent_parts)
            .zip(normal_parts)
            .zip(task_attributes);
        for (((((((curves, span), indices), factors), positions), tangents), normals), attributes) in
            parts
        {
            tasks.push(SegmentTask {
                curves,
                span_start: span.start,
                indices,
                factors,
                positions,
                tangents,
                normals,
                attributes,
            });
        }

        let context = ResampleContext {
            src,
            evaluated: &evaluated,
            dst_offsets: &dst.offsets,
            src_attributes: &src_attributes,
            policies: &policies,
            exact_evaluated: matches!(sizing, CountSpec::Evaluated),
        };
        parallel::for_each_task_mut(&mut tasks, |task| resample_segment(&context, task));
    }

    // Unselected curves pass through with their point data intact.
    let unselected = selection.complement(curve_count);
    for index in unselected.iter() {
        let i_curve = index as usize;
        let dst_range = dst.points_range(i_curve);
        positions[dst_range].copy_from_slice(&src.positions[src.points_range(i_curve)]);
    }
    for (src_attr, storage) in src_attributes.iter().zip(dst_storages.iter_mut()) {
        copy_unselected_attribute(src, &dst.offsets, &unselected, *src_attr, storage);
    }
    // Unselected NURBS curves keep their explicit knot vectors; resampled
    // curves are poly and have none.
    for (index, knots) in &src.custom_knots {
        if dst.curve_types[*index as usize] == CurveType::Nurbs {
            dst.custom_knots.insert(*index, knots.clone());
        }
    }

    dst.positions = positions;
    let point_attributes = dst.attributes.map_mut(AttributeDomain::Point);
    for (name, storage) in names.into_iter().zip(dst_storages) {
        point_attributes.insert(name, storage);
    }
    if let Some(name) = &outputs.tangent {
        if let Some(buffer) = tangent_buffer {
            point_attributes.insert(name.clone(), AttributeStorage::Vec3(buffer));
        }
    }
    if let Some(name) = &outputs.normal {
        if let Some(buffer) = normal_buffer {
            point_attributes.insert(name.clone(), AttributeStorage::Vec3(buffer));
        }
    }
    dst
}

/// Resamples each selected curve to an explicit point count; `counts` is
/// indexed by curve and clamped to at least one point.
pub fn resample_to_count(
    src: &CurveSet,
    selection: &Selection,
    counts: &[u32],
    outputs: &ResampleOutputs,
) -> CurveSet {
    resample_curves(src, selection, CountSpec::PerCurve(counts), outputs)
}

/// Resamples each selected curve to uniform segments of approximately
/// `sample_lengths[i_curve]`. With `keep_last_segment` open curves never
/// collapse below two points.
pub fn resample_to_length(
    src: &CurveSet,
    selection: &Selection,
    sample_lengths: &[f32],
    outputs: &ResampleOutputs,
    keep_last_segment: bool,
) -> CurveSet {
    resample_curves(
        src,
        selection,
        CountSpec::ByLength {
            sample_lengths,
            keep_last_segment,
        },
        outputs,
    )
}

/// Replaces each selected curve by its evaluated points.
pub fn resample_to_evaluated(
    src: &CurveSet,
    selection: &Selection,
    outputs: &ResampleOutputs,
) -> CurveSet {
    resample_curves(src, selection, CountSpec::Evaluated, outputs)
}

fn evaluate_selection(
    context: &FieldContext,
    selection_field: &Field<bool>,
    curve_count: usize,
) -> Selection {
    let mask = selection_field.evaluate(context, curve_count);
    Selection::from_mask(&mask)
}

/// Field-driven variant of [`resample_to_count`]: the selection and counts
/// are evaluated per curve against the source. Non-positive counts clamp to
/// a single point.
pub fn resample_to_count_field(
    src: &CurveSet,
    context: &FieldContext,
    selection_field: &Field<bool>,
    count_field: &Field<i32>,
    outputs: &ResampleOutputs,
) -> CurveSet {
    let curve_count = src.curves_num();
    let selection = evaluate_selection(context, selection_field, curve_count);
    let counts: Vec<u32> = count_field
        .evaluate(context, curve_count)
        .into_iter()
        .map(|count| count.max(1) as u32)
        .collect();
    resample_to_count(src, &selection, &counts, outputs)
}

/// Field-driven variant of [`resample_to_length`].
pub fn resample_to_length_field(
    src: &CurveSet,
    context: &FieldContext,
    selection_field: &Field<bool>,
    sample_length_field: &Field<f32>,
    outputs: &ResampleOutputs,
    keep_last_segment: bool,
) -> CurveSet {
    let curve_count = src.curves_num();
    let selection = evaluate_selection(context, selection_field, curve_count);
    let sample_lengths = sample_length_field.evaluate(context, curve_count);
    resample_to_length(src, &selection, &sample_lengths, outputs, keep_last_segment)
}

/// Field-driven variant of [`resample_to_evaluated`].
pub fn resample_to_evaluated_field(
    src: &CurveSet,
    context: &FieldContext,
    selection_field: &Field<bool>,
    outputs: &ResampleOutputs,
) -> CurveSet {
    let selection = evaluate_selection(context, selection_field, src.curves_num());
    resample_to_evaluated(src, &selection, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::DEFAULT_RESOLUTION;

    fn close(a: [f32; 3], b: [f32; 3], tolerance: f32) -> bool {
        (Vec3::from(a) - Vec3::from(b)).length() <= tolerance
    }

    fn line(points: usize) -> Vec<[f32; 3]> {
        (0..points).map(|i| [i as f32, 0.0, 0.0]).collect()
    }

    #[test]
    fn count_resampling_spaces_samples_uniformly() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(4), CurveType::Poly, false);
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[7],
            &ResampleOutputs::default(),
        );
        assert_eq!(result.points_num(), 7);
        assert_eq!(result.curve_types[0], CurveType::Poly);
        for (i, position) in result.positions.iter().enumerate() {
            assert!(close(*position, [i as f32 * 0.5, 0.0, 0.0], 1.0e-6));
        }
    }

    #[test]
    fn count_of_one_collapses_to_first_point() {
        let mut curves = CurveSet::default();
        curves.push_curve(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], CurveType::Poly, false);
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[1],
            &ResampleOutputs::default(),
        );
        assert_eq!(result.points_num(), 1);
        assert!(close(result.positions[0], [1.0, 2.0, 3.0], 1.0e-6));
    }

    #[test]
    fn cyclic_samples_divide_the_full_loop() {
        let mut curves = CurveSet::default();
        curves.push_curve(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            CurveType::Poly,
            true,
        );
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[8],
            &ResampleOutputs::default(),
        );
        assert_eq!(result.points_num(), 8);
        // Loop length 4, eight samples: corners and edge midpoints,
        // including the wrap segment's midpoint.
        assert!(close(result.positions[0], [0.0, 0.0, 0.0], 1.0e-6));
        assert!(close(result.positions[1], [0.5, 0.0, 0.0], 1.0e-6));
        assert!(close(result.positions[2], [1.0, 0.0, 0.0], 1.0e-6));
        assert!(close(result.positions[7], [0.0, 0.5, 0.0], 1.0e-6));
    }

    #[test]
    fn length_resampling_picks_count_from_curve_length() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        // Length 2 at spacing 0.5: floor(2 / 0.5) + 1 = 5 points.
        let result = resample_to_length(
            &curves,
            &Selection::all(1),
            &[0.5],
            &ResampleOutputs::default(),
            false,
        );
        assert_eq!(result.points_num(), 5);
        for (i, position) in result.positions.iter().enumerate() {
            assert!(close(*position, [i as f32 * 0.5, 0.0, 0.0], 1.0e-6));
        }
    }

    #[test]
    fn keep_last_segment_never_collapses_open_curves() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(2), CurveType::Poly, false);
        let collapsed = resample_to_length(
            &curves,
            &Selection::all(1),
            &[10.0],
            &ResampleOutputs::default(),
            false,
        );
        assert_eq!(collapsed.points_num(), 1);
        let kept = resample_to_length(
            &curves,
            &Selection::all(1),
            &[10.0],
            &ResampleOutputs::default(),
            true,
        );
        assert_eq!(kept.points_num(), 2);
        assert!(close(kept.positions[1], [1.0, 0.0, 0.0], 1.0e-6));
    }

    #[test]
    fn negative_sample_length_honors_keep_last_segment() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        let collapsed = resample_to_length(
            &curves,
            &Selection::all(1),
            &[-1.0],
            &ResampleOutputs::default(),
            false,
        );
        assert_eq!(collapsed.points_num(), 1);
        let kept = resample_to_length(
            &curves,
            &Selection::all(1),
            &[-1.0],
            &ResampleOutputs::default(),
            true,
        );
        assert_eq!(kept.points_num(), 2);
    }

    #[test]
    fn zero_sample_length_collapses_to_one_point() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        let result = resample_to_length(
            &curves,
            &Selection::all(1),
            &[0.0],
            &ResampleOutputs::default(),
            false,
        );
        assert_eq!(result.points_num(), 1);
    }

    #[test]
    fn unselected_curves_pass_through_untouched() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(2), CurveType::Poly, false);
        curves.push_curve(vec![[0.0, 1.0, 0.0], [2.0, 1.0, 0.0]], CurveType::Bezier, false);
        let handles_left = vec![[0.0; 3], [0.0; 3], [-1.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let handles_right = vec![[0.0; 3], [0.0; 3], [1.0, 1.0, 0.0], [3.0, 1.0, 0.0]];
        curves
            .set_point_attribute(HANDLE_LEFT, AttributeStorage::Vec3(handles_left.clone()))
            .unwrap();
        curves
            .set_point_attribute(HANDLE_RIGHT, AttributeStorage::Vec3(handles_right.clone()))
            .unwrap();

        let selection = Selection::from_indices(vec![0]);
        let result =
            resample_to_count(&curves, &selection, &[5], &ResampleOutputs::default());
        assert_eq!(result.curve_types, vec![CurveType::Poly, CurveType::Bezier]);
        assert_eq!(result.points_count(0), 5);
        assert_eq!(result.points_count(1), 2);
        // Point data of the untouched curve is bit-identical.
        assert_eq!(
            &result.positions[result.points_range(1)],
            &curves.positions[curves.points_range(1)]
        );
        let Some(AttributeRef::Vec3(left)) = result.point_attribute(HANDLE_LEFT) else {
            panic!("expected handle data to survive");
        };
        assert_eq!(&left[result.points_range(1)], &handles_left[2..4]);
        // The resampled poly curve has no meaningful handles; defaults.
        assert_eq!(&left[result.points_range(0)], &[[0.0; 3]; 5]);
    }

    #[test]
    fn handle_attributes_dropped_when_no_bezier_remains() {
        let mut curves = CurveSet::default();
        curves.push_curve(vec![[0.0; 3], [1.0, 0.0, 0.0]], CurveType::Bezier, false);
        curves
            .set_point_attribute(HANDLE_LEFT, AttributeStorage::Vec3(vec![[0.0; 3]; 2]))
            .unwrap();
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[4],
            &ResampleOutputs::default(),
        );
        assert!(result.point_attribute(HANDLE_LEFT).is_none());
    }

    #[test]
    fn float_attribute_interpolates_along_poly_curves() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        curves.vertex_group_names = vec!["pin".to_owned()];
        curves
            .set_point_attribute("pin", AttributeStorage::Float(vec![0.0, 2.0, 4.0]))
            .unwrap();
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[5],
            &ResampleOutputs::default(),
        );
        let Some(AttributeRef::Float(weights)) = result.point_attribute("pin") else {
            panic!("expected interpolated group weights");
        };
        assert_eq!(weights, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        // Group names carry over so the weights stay addressable.
        assert_eq!(result.vertex_group_names, vec!["pin".to_owned()]);
    }

    #[test]
    fn string_attributes_are_dropped() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(2), CurveType::Poly, false);
        curves
            .set_point_attribute(
                "label",
                AttributeStorage::String(vec!["a".to_owned(), "b".to_owned()]),
            )
            .unwrap();
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[4],
            &ResampleOutputs::default(),
        );
        assert!(result.point_attribute("label").is_none());
    }

    #[test]
    fn evaluated_resampling_copies_the_evaluated_points() {
        let mut curves = CurveSet::default();
        curves.push_curve(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
                [3.0, 1.0, 0.0],
            ],
            CurveType::CatmullRom,
            false,
        );
        let result = resample_to_evaluated(
            &curves,
            &Selection::all(1),
            &ResampleOutputs::default(),
        );
        let evaluated = curve_eval::evaluate_curves(&curves);
        assert_eq!(result.points_num(), 3 * DEFAULT_RESOLUTION as usize + 1);
        assert_eq!(result.positions, evaluated.positions);
    }

    #[test]
    fn point_count_overflow_yields_empty_curves() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(2), CurveType::Poly, false);
        curves.push_curve(line(2), CurveType::Poly, false);
        let result = resample_to_count(
            &curves,
            &Selection::all(2),
            &[u32::MAX, u32::MAX],
            &ResampleOutputs::default(),
        );
        assert!(result.is_empty());
        assert_eq!(result.points_num(), 0);
    }

    #[test]
    fn empty_selection_returns_the_input() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::CatmullRom, true);
        let result = resample_to_count(
            &curves,
            &Selection::from_indices(Vec::new()),
            &[],
            &ResampleOutputs::default(),
        );
        assert_eq!(result, curves);
    }

    #[test]
    fn empty_selection_still_allocates_requested_outputs() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        let outputs = ResampleOutputs {
            tangent: Some("curve_tangent".to_owned()),
            normal: Some("curve_normal".to_owned()),
        };
        let result = resample_to_count(
            &curves,
            &Selection::from_indices(Vec::new()),
            &[],
            &outputs,
        );
        // No curve was resampled, but consumers can rely on the outputs
        // being present; they stay zeroed.
        let Some(AttributeRef::Vec3(tangents)) = result.point_attribute("curve_tangent") else {
            panic!("expected tangent output");
        };
        let Some(AttributeRef::Vec3(normals)) = result.point_attribute("curve_normal") else {
            panic!("expected normal output");
        };
        assert_eq!(tangents, &[[0.0; 3]; 3]);
        assert_eq!(normals, &[[0.0; 3]; 3]);
        assert_eq!(result.positions, curves.positions);
    }

    #[test]
    #[should_panic]
    fn out_of_range_selection_is_rejected_in_debug() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(2), CurveType::Poly, false);
        resample_to_count(
            &curves,
            &Selection::from_indices(vec![5]),
            &[0, 0, 0, 0, 0, 2],
            &ResampleOutputs::default(),
        );
    }

    #[test]
    fn tangent_and_normal_outputs_are_unit_vectors() {
        let mut curves = CurveSet::default();
        curves.push_curve(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 0.0, 1.0],
                [3.0, 1.0, 1.0],
            ],
            CurveType::CatmullRom,
            false,
        );
        curves.push_curve(line(3), CurveType::Poly, false);
        let outputs = ResampleOutputs {
            tangent: Some("curve_tangent".to_owned()),
            normal: Some("curve_normal".to_owned()),
        };
        let result =
            resample_to_count(&curves, &Selection::from_indices(vec![0]), &[9], &outputs);
        let Some(AttributeRef::Vec3(tangents)) = result.point_attribute("curve_tangent") else {
            panic!("expected tangent output");
        };
        let Some(AttributeRef::Vec3(normals)) = result.point_attribute("curve_normal") else {
            panic!("expected normal output");
        };
        assert_eq!(tangents.len(), result.points_num());
        for i in result.points_range(0) {
            assert!((Vec3::from(tangents[i]).length() - 1.0).abs() < 1.0e-4);
            assert!((Vec3::from(normals[i]).length() - 1.0).abs() < 1.0e-4);
        }
        // Frame outputs are only meaningful on resampled curves.
        for i in result.points_range(1) {
            assert_eq!(tangents[i], [0.0; 3]);
            assert_eq!(normals[i], [0.0; 3]);
        }
    }

    #[test]
    fn custom_knots_survive_only_on_unselected_nurbs() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(4), CurveType::Nurbs, false);
        curves.push_curve(line(4), CurveType::Nurbs, false);
        let knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        curves.custom_knots.insert(0, knots.clone());
        curves.custom_knots.insert(1, knots.clone());
        let result = resample_to_count(
            &curves,
            &Selection::from_indices(vec![0]),
            &[6],
            &ResampleOutputs::default(),
        );
        assert_eq!(result.curve_types, vec![CurveType::Poly, CurveType::Nurbs]);
        assert!(!result.custom_knots.contains_key(&0));
        assert_eq!(result.custom_knots.get(&1), Some(&knots));
    }

    #[test]
    fn count_field_clamps_to_one_point() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(4), CurveType::Poly, false);
        let context = FieldContext::new(&curves);
        let result = resample_to_count_field(
            &curves,
            &context,
            &Field::Constant(true),
            &Field::Constant(-5),
            &ResampleOutputs::default(),
        );
        assert_eq!(result.points_num(), 1);
    }

    #[test]
    fn selection_field_limits_the_resample() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(4), CurveType::Poly, false);
        curves.push_curve(line(3), CurveType::Poly, false);
        let context = FieldContext::new(&curves);
        let selection = Field::expr(|ctx: &FieldContext, i| ctx.curves.points_count(i) == 4);
        let result = resample_to_count_field(
            &curves,
            &context,
            &selection,
            &Field::Constant(9),
            &ResampleOutputs::default(),
        );
        assert_eq!(result.points_count(0), 9);
        assert_eq!(result.points_count(1), 3);
    }

    #[test]
    fn length_field_drives_spacing_per_curve() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        curves.push_curve(line(5), CurveType::Poly, false);
        let context = FieldContext::new(&curves);
        let result = resample_to_length_field(
            &curves,
            &context,
            &Field::Constant(true),
            &Field::Array(vec![1.0, 0.5]),
            &ResampleOutputs::default(),
            false,
        );
        // Lengths 2 and 4 at spacings 1.0 and 0.5.
        assert_eq!(result.points_count(0), 3);
        assert_eq!(result.points_count(1), 9);
    }

    #[test]
    fn evaluated_field_variant_matches_direct_call() {
        let mut curves = CurveSet::default();
        curves.push_curve(line(4), CurveType::CatmullRom, true);
        let context = FieldContext::new(&curves);
        let by_field = resample_to_evaluated_field(
            &curves,
            &context,
            &Field::Constant(true),
            &ResampleOutputs::default(),
        );
        let direct =
            resample_to_evaluated(&curves, &Selection::all(1), &ResampleOutputs::default());
        assert_eq!(by_field, direct);
        assert_eq!(by_field.points_num(), 4 * DEFAULT_RESOLUTION as usize);
    }

    #[test]
    fn quaternion_attributes_stay_normalized() {
        use glam::Quat;
        let mut curves = CurveSet::default();
        curves.push_curve(line(3), CurveType::Poly, false);
        let rotations = vec![
            Rotation(Quat::from_rotation_z(0.0).to_array()),
            Rotation(Quat::from_rotation_z(1.0).to_array()),
            Rotation(Quat::from_rotation_z(2.0).to_array()),
        ];
        curves
            .set_point_attribute("rotation", AttributeStorage::Quat(rotations))
            .unwrap();
        let result = resample_to_count(
            &curves,
            &Selection::all(1),
            &[6],
            &ResampleOutputs::default(),
        );
        let Some(AttributeRef::Quat(values)) = result.point_attribute("rotation") else {
            panic!("expected rotation attribute");
        };
        for rotation in values {
            assert!((rotation.as_quat().length() - 1.0).abs() < 1.0e-5);
        }
    }
}
