use glam::Quat;
use serde::{Deserialize, Serialize};

/// Unit rotation stored as quaternion components in `[x, y, z, w]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation(pub [f32; 4]);

impl Default for Rotation {
    fn default() -> Self {
        Rotation([0.0, 0.0, 0.0, 1.0])
    }
}

impl Rotation {
    pub fn as_quat(self) -> Quat {
        Quat::from_array(self.0)
    }

    pub fn normalized(self) -> Self {
        let quat = self.as_quat();
        if quat.length_squared() <= 1.0e-12 {
            Rotation::default()
        } else {
            Rotation(quat.normalize().to_array())
        }
    }
}

/// Blending over the attribute value types that support interpolation.
///
/// `lerp` mixes two values; `weighted` combines a small set of values with
/// basis weights that sum to one (Catmull-Rom and NURBS bases, where
/// individual weights may be negative). Types without meaningful linear
/// blending (int, bool) fall back to nearest-value selection.
pub trait Blend: Copy + Default + Send + Sync + 'static {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self;
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl Blend for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        mix(a, b, t)
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        values.into_iter().map(|(value, weight)| value * weight).sum()
    }
}

impl Blend for [f32; 2] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [mix(a[0], b[0], t), mix(a[1], b[1], t)]
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        let mut out = [0.0; 2];
        for (value, weight) in values {
            out[0] += value[0] * weight;
            out[1] += value[1] * weight;
        }
        out
    }
}

impl Blend for [f32; 3] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            mix(a[0], b[0], t),
            mix(a[1], b[1], t),
            mix(a[2], b[2], t),
        ]
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        let mut out = [0.0; 3];
        for (value, weight) in values {
            for axis in 0..3 {
                out[axis] += value[axis] * weight;
            }
        }
        out
    }
}

impl Blend for [f32; 4] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            mix(a[0], b[0], t),
            mix(a[1], b[1], t),
            mix(a[2], b[2], t),
            mix(a[3], b[3], t),
        ]
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        let mut out = [0.0; 4];
        for (value, weight) in values {
            for axis in 0..4 {
                out[axis] += value[axis] * weight;
            }
        }
        out
    }
}

impl Blend for i32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        if t < 0.5 {
            a
        } else {
            b
        }
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        nearest(values)
    }
}

impl Blend for bool {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        if t < 0.5 {
            a
        } else {
            b
        }
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        nearest(values)
    }
}

impl Blend for Rotation {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        let mut b = b.0;
        // Stay on the same hemisphere so interpolation takes the short arc.
        if dot4(a.0, b) < 0.0 {
            b = neg4(b);
        }
        Rotation(<[f32; 4]>::lerp(a.0, b, t)).normalized()
    }

    fn weighted<I: IntoIterator<Item = (Self, f32)>>(values: I) -> Self {
        let mut iter = values.into_iter();
        let Some((first, first_weight)) = iter.next() else {
            return Rotation::default();
        };
        let reference = first.0;
        let mut accum = [0.0f32; 4];
        for axis in 0..4 {
            accum[axis] = reference[axis] * first_weight;
        }
        for (value, weight) in iter {
            let mut components = value.0;
            if dot4(reference, components) < 0.0 {
                components = neg4(components);
            }
            for axis in 0..4 {
                accum[axis] += components[axis] * weight;
            }
        }
        Rotation(accum).normalized()
    }
}

fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

fn neg4(v: [f32; 4]) -> [f32; 4] {
    [-v[0], -v[1], -v[2], -v[3]]
}

/// The value with the largest basis weight. With bases whose weights sum to
/// one this is the control value closest to the sample parameter.
fn nearest<T: Copy + Default, I: IntoIterator<Item = (T, f32)>>(values: I) -> T {
    let mut best: Option<(T, f32)> = None;
    for (value, weight) in values {
        match best {
            Some((_, best_weight)) if weight <= best_weight => {}
            _ => best = Some((value, weight)),
        }
    }
    best.map(|(value, _)| value).unwrap_or_default()
}
