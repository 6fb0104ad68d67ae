//! Evaluated curve representation: tessellated positions, tangents, normals,
//! and accumulated arc lengths, plus interpolation of arbitrary per-point
//! data onto the evaluated points using each curve's own basis.

use std::ops::Range;

use glam::Vec3;

use crate::attribute_math::Blend;
use crate::curves::{CurveSet, CurveType};
use crate::length_parameterize::{accumulate_lengths, next_point_index};

const MIN_NURBS_ORDER: usize = 2;
const MAX_NURBS_ORDER: usize = 6;

/// The tessellated form of a curve set. Built once, single-threaded, before
/// any parallel sampling; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedCurves {
    pub offsets: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    lengths: Vec<f32>,
    length_offsets: Vec<u32>,
}

impl EvaluatedCurves {
    pub fn point_range(&self, i_curve: usize) -> Range<usize> {
        self.offsets[i_curve] as usize..self.offsets[i_curve + 1] as usize
    }

    pub fn point_count(&self, i_curve: usize) -> usize {
        (self.offsets[i_curve + 1] - self.offsets[i_curve]) as usize
    }

    /// Accumulated segment lengths for one curve; empty for curves with a
    /// single evaluated point. Cyclic curves include the wrap segment.
    pub fn lengths_for_curve(&self, i_curve: usize) -> &[f32] {
        let range =
            self.length_offsets[i_curve] as usize..self.length_offsets[i_curve + 1] as usize;
        &self.lengths[range]
    }

    pub fn total_length(&self, i_curve: usize) -> f32 {
        self.lengths_for_curve(i_curve).last().copied().unwrap_or(0.0)
    }
}

fn segment_count(point_count: usize, cyclic: bool) -> usize {
    if cyclic {
        point_count
    } else {
        point_count - 1
    }
}

fn nurbs_order(curves: &CurveSet, i_curve: usize) -> usize {
    (curves.nurbs_orders[i_curve] as usize).clamp(MIN_NURBS_ORDER, MAX_NURBS_ORDER)
}

/// Number of evaluated points a curve tessellates to.
pub fn evaluated_point_count(curves: &CurveSet, i_curve: usize) -> usize {
    let points = curves.points_count(i_curve);
    if points <= 1 {
        return points;
    }
    let cyclic = curves.cyclic[i_curve];
    let resolution = curves.resolutions[i_curve].max(1) as usize;
    let tail = usize::from(!cyclic);
    match curves.curve_types[i_curve] {
        CurveType::Poly => points,
        CurveType::CatmullRom | CurveType::Bezier => {
            segment_count(points, cyclic) * resolution + tail
        }
        CurveType::Nurbs => {
            let order = nurbs_order(curves, i_curve);
            if points < order {
                // Not enough control points for the basis; degrades to poly.
                points
            } else {
                let segments = if cyclic { points } else { points - order + 1 };
                segments * resolution + tail
            }
        }
    }
}

/// Catmull-Rom basis weights for the four neighborhood control values.
fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t + 2.0 * t2 - t3),
        0.5 * (2.0 - 5.0 * t2 + 3.0 * t3),
        0.5 * (t + 4.0 * t2 - 3.0 * t3),
        0.5 * (-t2 + t3),
    ]
}

/// Control indices of the Catmull-Rom neighborhood around segment `i`;
/// open ends clamp to the boundary points.
fn catmull_rom_neighborhood(i: usize, count: usize, cyclic: bool) -> [usize; 4] {
    let i0 = if i == 0 {
        if cyclic {
            count - 1
        } else {
            0
        }
    } else {
        i - 1
    };
    let i2 = (i + 1) % count;
    let i3 = if i + 2 < count {
        i + 2
    } else if cyclic {
        (i + 2) % count
    } else {
        i2
    };
    [i0, i, i2, i3]
}

fn evaluate_catmull_rom<T: Blend>(src: &[T], cyclic: bool, resolution: usize, dst: &mut [T]) {
    if src.len() < 2 {
        dst.copy_from_slice(src);
        return;
    }
    let count = src.len();
    let segments = segment_count(count, cyclic);
    debug_assert_eq!(dst.len(), segments * resolution + usize::from(!cyclic));
    for i in 0..segments {
        let [i0, i1, i2, i3] = catmull_rom_neighborhood(i, count, cyclic);
        for step in 0..resolution {
            let t = step as f32 / resolution as f32;
            let [w0, w1, w2, w3] = catmull_rom_weights(t);
            dst[i * resolution + step] = T::weighted([
                (src[i0], w0),
                (src[i1], w1),
                (src[i2], w2),
                (src[i3], w3),
            ]);
        }
    }
    if !cyclic {
        dst[segments * resolution] = src[count - 1];
    }
}

/// Per-segment linear mapping used for generic attributes on Bezier curves;
/// only positions follow the handles.
fn evaluate_linear_segments<T: Blend>(src: &[T], cyclic: bool, resolution: usize, dst: &mut [T]) {
    if src.len() < 2 {
        dst.copy_from_slice(src);
        return;
    }
    let count = src.len();
    let segments = segment_count(count, cyclic);
    debug_assert_eq!(dst.len(), segments * resolution + usize::from(!cyclic));
    for i in 0..segments {
        let a = src[i];
        let b = src[next_point_index(i, count)];
        for step in 0..resolution {
            let t = step as f32 / resolution as f32;
            dst[i * resolution + step] = T::lerp(a, b, t);
        }
    }
    if !cyclic {
        dst[segments * resolution] = src[count - 1];
    }
}

fn evaluate_bezier_positions(
    points: &[[f32; 3]],
    handles_left: Option<&[[f32; 3]]>,
    handles_right: Option<&[[f32; 3]]>,
    cyclic: bool,
    resolution: usize,
    dst: &mut [[f32; 3]],
) {
    if points.len() < 2 {
        dst.copy_from_slice(points);
        return;
    }
    let count = points.len();
    let segments = segment_count(count, cyclic);
    debug_assert_eq!(dst.len(), segments * resolution + usize::from(!cyclic));
    for i in 0..segments {
        let next = next_point_index(i, count);
        let p0 = Vec3::from(points[i]);
        let p3 = Vec3::from(points[next]);
        // Missing handle data degrades the segment to a straight line.
        let p1 = handles_right
            .map(|handles| Vec3::from(handles[i]))
            .unwrap_or_else(|| p0.lerp(p3, 1.0 / 3.0));
        let p2 = handles_left
            .map(|handles| Vec3::from(handles[next]))
            .unwrap_or_else(|| p0.lerp(p3, 2.0 / 3.0));
        for step in 0..resolution {
            let t = step as f32 / resolution as f32;
            let s = 1.0 - t;
            let value = p0 * (s * s * s)
                + p1 * (3.0 * s * s * t)
                + p2 * (3.0 * s * t * t)
                + p3 * (t * t * t);
            dst[i * resolution + step] = value.to_array();
        }
    }
    if !cyclic {
        dst[segments * resolution] = points[count - 1];
    }
}

/// Clamped-uniform (open) or uniform-periodic (cyclic) knot vector; a custom
/// vector of the right length replaces the generated one for open curves.
fn nurbs_knots(points: usize, order: usize, cyclic: bool, custom: Option<&[f32]>) -> Vec<f32> {
    let control_count = if cyclic { points + order - 1 } else { points };
    let len = control_count + order;
    if cyclic {
        return (0..len).map(|i| i as f32).collect();
    }
    if let Some(custom) = custom {
        if custom.len() == len {
            return custom.to_vec();
        }
    }
    (0..len)
        .map(|i| {
            if i < order {
                0.0
            } else if i < control_count {
                (i - order + 1) as f32
            } else {
                (control_count - order + 1) as f32
            }
        })
        .collect()
}

fn nurbs_find_span(knots: &[f32], u: f32, order: usize, control_count: usize) -> usize {
    let span = knots.partition_point(|knot| *knot <= u).saturating_sub(1);
    span.clamp(order - 1, control_count - 1)
}

/// Cox-de Boor basis functions over the span containing `u`; writes the
/// `order` non-zero values.
fn nurbs_basis(knots: &[f32], span: usize, u: f32, order: usize, basis: &mut [f32; MAX_NURBS_ORDER]) {
    let degree = order - 1;
    let mut left = [0.0f32; MAX_NURBS_ORDER];
    let mut right = [0.0f32; MAX_NURBS_ORDER];
    basis[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let term = if denom != 0.0 { basis[r] / denom } else { 0.0 };
            basis[r] = saved + right[r + 1] * term;
            saved = left[j - r] * term;
        }
        basis[j] = saved;
    }
}

fn evaluate_nurbs<T: Blend>(
    src: &[T],
    weights: Option<&[f32]>,
    order: usize,
    cyclic: bool,
    custom_knots: Option<&[f32]>,
    dst: &mut [T],
) {
    let points = src.len();
    debug_assert!(points >= order);
    let degree = order - 1;
    let control_count = if cyclic { points + degree } else { points };
    let knots = nurbs_knots(points, order, cyclic, custom_knots);
    let u_start = knots[degree];
    let u_end = knots[control_count];
    let count = dst.len();
    let mut basis = [0.0f32; MAX_NURBS_ORDER];
    for (j, slot) in dst.iter_mut().enumerate() {
        let t = if count <= 1 {
            0.0
        } else if cyclic {
            j as f32 / count as f32
        } else {
            j as f32 / (count - 1) as f32
        };
        let u = u_start + (u_end - u_start) * t;
        let span = nurbs_find_span(&knots, u, order, control_count);
        nurbs_basis(&knots, span, u, order, &mut basis);

        let control_index = |k: usize| (span - degree + k) % points;
        let point_weight =
            |k: usize| weights.map_or(1.0, |weights| weights[control_index(k)].max(0.0));
        let total: f32 = (0..order).map(|k| basis[k] * point_weight(k)).sum();
        *slot = if total > 1.0e-8 {
            T::weighted(
                (0..order).map(|k| (src[control_index(k)], basis[k] * point_weight(k) / total)),
            )
        } else {
            // Degenerate rational weights; fall back to the plain basis.
            T::weighted((0..order).map(|k| (src[control_index(k)], basis[k])))
        };
    }
}

/// Interpolates arbitrary per-point data onto a curve's evaluated points
/// using the curve's own basis. `src` holds the curve's control-point values,
/// `dst` must span exactly its evaluated points.
pub fn interpolate_to_evaluated<T: Blend>(
    curves: &CurveSet,
    i_curve: usize,
    src: &[T],
    dst: &mut [T],
) {
    let cyclic = curves.cyclic[i_curve];
    let resolution = curves.resolutions[i_curve].max(1) as usize;
    match curves.curve_types[i_curve] {
        CurveType::Poly => dst.copy_from_slice(src),
        CurveType::CatmullRom => evaluate_catmull_rom(src, cyclic, resolution, dst),
        CurveType::Bezier => evaluate_linear_segments(src, cyclic, resolution, dst),
        CurveType::Nurbs => {
            let order = nurbs_order(curves, i_curve);
            if src.len() < order {
                dst.copy_from_slice(src);
            } else {
                evaluate_nurbs(
                    src,
                    curves.nurbs_weights(i_curve),
                    order,
                    cyclic,
                    curves.custom_knots.get(&(i_curve as u32)).map(Vec::as_slice),
                    dst,
                );
            }
        }
    }
}

fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    if v.length_squared() > 1.0e-12 {
        v.normalize()
    } else {
        fallback
    }
}

fn polyline_tangents(positions: &[[f32; 3]], cyclic: bool, dst: &mut [[f32; 3]]) {
    let count = positions.len();
    if count == 0 {
        return;
    }
    if count == 1 {
        dst[0] = [0.0, 0.0, 1.0];
        return;
    }
    let point = |i: usize| Vec3::from(positions[i]);
    let mut previous = Vec3::Z;
    for i in 0..count {
        let direction = if cyclic {
            point((i + 1) % count) - point((i + count - 1) % count)
        } else if i == 0 {
            point(1) - point(0)
        } else if i == count - 1 {
            point(count - 1) - point(count - 2)
        } else {
            point(i + 1) - point(i - 1)
        };
        let tangent = normalize_or(direction, previous);
        dst[i] = tangent.to_array();
        previous = tangent;
    }
}

/// Minimal-twist normals: a seed perpendicular to the first tangent,
/// parallel-transported along the curve.
fn polyline_normals(tangents: &[[f32; 3]], dst: &mut [[f32; 3]]) {
    let count = tangents.len();
    if count == 0 {
        return;
    }
    let first = Vec3::from(tangents[0]);
    let reference = if first.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
    let mut normal = normalize_or(reference - first * reference.dot(first), Vec3::Y);
    for i in 0..count {
        let tangent = Vec3::from(tangents[i]);
        normal = normalize_or(normal - tangent * tangent.dot(normal), normal);
        dst[i] = normal.to_array();
    }
}

/// Tessellates every curve: positions, unit tangents and normals, and
/// accumulated arc lengths (with the wrap segment for cyclic curves).
pub fn evaluate_curves(curves: &CurveSet) -> EvaluatedCurves {
    let curve_count = curves.curves_num();
    let mut offsets = Vec::with_capacity(curve_count + 1);
    offsets.push(0u32);
    let mut total = 0usize;
    for i_curve in 0..curve_count {
        total += evaluated_point_count(curves, i_curve);
        offsets.push(total as u32);
    }

    let mut evaluated = EvaluatedCurves {
        offsets,
        positions: vec![[0.0; 3]; total],
        tangents: vec![[0.0; 3]; total],
        normals: vec![[0.0; 3]; total],
        lengths: Vec::new(),
        length_offsets: vec![0u32; curve_count + 1],
    };

    for i_curve in 0..curve_count {
        let src_range = curves.points_range(i_curve);
        let dst_range = evaluated.point_range(i_curve);
        let cyclic = curves.cyclic[i_curve];
        let resolution = curves.resolutions[i_curve].max(1) as usize;
        let control_points = &curves.positions[src_range];
        let dst = &mut evaluated.positions[dst_range.clone()];
        match curves.curve_types[i_curve] {
            CurveType::Poly => dst.copy_from_slice(control_points),
            CurveType::CatmullRom => {
                evaluate_catmull_rom(control_points, cyclic, resolution, dst)
            }
            CurveType::Bezier => {
                let (left, right) = curves.bezier_handles(i_curve);
                evaluate_bezier_positions(control_points, left, right, cyclic, resolution, dst);
            }
            CurveType::Nurbs => {
                let order = nurbs_order(curves, i_curve);
                if control_points.len() < order {
                    dst.copy_from_slice(control_points);
                } else {
                    evaluate_nurbs(
                        control_points,
                        curves.nurbs_weights(i_curve),
                        order,
                        cyclic,
                        curves.custom_knots.get(&(i_curve as u32)).map(Vec::as_slice),
                        dst,
                    );
                }
            }
        }

        let positions = &evaluated.positions[dst_range.clone()];
        polyline_tangents(positions, cyclic, &mut evaluated.tangents[dst_range.clone()]);
        let tangents = &evaluated.tangents[dst_range.clone()];
        polyline_normals(tangents, &mut evaluated.normals[dst_range.clone()]);

        let lengths = accumulate_lengths(&evaluated.positions[dst_range], cyclic);
        evaluated.lengths.extend_from_slice(&lengths);
        evaluated.length_offsets[i_curve + 1] = evaluated.lengths.len() as u32;
    }

    evaluated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeStorage;
    use crate::curves::{CurveSet, CurveType, HANDLE_LEFT, HANDLE_RIGHT};

    fn close(a: [f32; 3], b: [f32; 3], tolerance: f32) -> bool {
        (Vec3::from(a) - Vec3::from(b)).length() <= tolerance
    }

    #[test]
    fn poly_evaluates_to_control_points() {
        let mut curves = CurveSet::default();
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        curves.push_curve(points.clone(), CurveType::Poly, false);
        let evaluated = evaluate_curves(&curves);
        assert_eq!(evaluated.point_count(0), 3);
        assert_eq!(&evaluated.positions, &points);
        assert_eq!(evaluated.lengths_for_curve(0), &[1.0, 2.0]);
    }

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let mut curves = CurveSet::default();
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 1.0, 0.0],
        ];
        curves.push_curve(points.clone(), CurveType::CatmullRom, false);
        let evaluated = evaluate_curves(&curves);
        let resolution = curves.resolutions[0] as usize;
        assert_eq!(evaluated.point_count(0), 3 * resolution + 1);
        for (i, point) in points.iter().enumerate() {
            let at = (i * resolution).min(evaluated.point_count(0) - 1);
            assert!(close(evaluated.positions[at], *point, 1.0e-6));
        }
    }

    #[test]
    fn bezier_with_straight_handles_is_a_line() {
        let mut curves = CurveSet::default();
        let points = vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        curves.push_curve(points, CurveType::Bezier, false);
        curves
            .set_point_attribute(
                HANDLE_RIGHT,
                AttributeStorage::Vec3(vec![[1.0, 0.0, 0.0], [4.0, 0.0, 0.0]]),
            )
            .unwrap();
        curves
            .set_point_attribute(
                HANDLE_LEFT,
                AttributeStorage::Vec3(vec![[-1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]),
            )
            .unwrap();
        let evaluated = evaluate_curves(&curves);
        for position in &evaluated.positions {
            assert!(position[1].abs() < 1.0e-6);
            assert!(position[2].abs() < 1.0e-6);
        }
        assert!(close(evaluated.positions[0], [0.0, 0.0, 0.0], 1.0e-6));
        assert!(close(
            *evaluated.positions.last().unwrap(),
            [3.0, 0.0, 0.0],
            1.0e-6
        ));
    }

    #[test]
    fn nurbs_clamped_knots_interpolate_endpoints() {
        let mut curves = CurveSet::default();
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 0.0],
            [2.0, -1.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        curves.push_curve(points.clone(), CurveType::Nurbs, false);
        let evaluated = evaluate_curves(&curves);
        assert!(close(evaluated.positions[0], points[0], 1.0e-5));
        assert!(close(*evaluated.positions.last().unwrap(), points[3], 1.0e-5));
    }

    #[test]
    fn tangents_and_normals_are_unit_and_orthogonal() {
        let mut curves = CurveSet::default();
        curves.push_curve(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.5, 0.0],
                [2.0, 0.0, 1.0],
                [3.0, -0.5, 0.5],
            ],
            CurveType::CatmullRom,
            false,
        );
        let evaluated = evaluate_curves(&curves);
        for i in 0..evaluated.point_count(0) {
            let tangent = Vec3::from(evaluated.tangents[i]);
            let normal = Vec3::from(evaluated.normals[i]);
            assert!((tangent.length() - 1.0).abs() < 1.0e-5);
            assert!((normal.length() - 1.0).abs() < 1.0e-5);
            assert!(tangent.dot(normal).abs() < 1.0e-4);
        }
    }

    #[test]
    fn interpolate_to_evaluated_matches_counts() {
        let mut curves = CurveSet::default();
        curves.push_curve(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            CurveType::CatmullRom,
            true,
        );
        let count = evaluated_point_count(&curves, 0);
        let src = [1.0f32, 2.0, 3.0];
        let mut dst = vec![0.0f32; count];
        interpolate_to_evaluated(&curves, 0, &src, &mut dst);
        let resolution = curves.resolutions[0] as usize;
        // Segment starts hit the control values exactly.
        assert_eq!(dst[0], 1.0);
        assert_eq!(dst[resolution], 2.0);
        assert_eq!(dst[2 * resolution], 3.0);
    }
}
