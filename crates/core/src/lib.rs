mod attribute_math;
mod attributes;
mod curve_eval;
mod curves;
mod fields;
mod length_parameterize;
mod parallel;
mod resample;
mod selection;

pub use attribute_math::{Blend, Rotation};
pub use attributes::{
    AttributeDomain, AttributeError, AttributeRef, AttributeRefMut, AttributeStorage,
    AttributeType, CurveAttributes,
};
pub use curve_eval::{evaluate_curves, evaluated_point_count, EvaluatedCurves};
pub use curves::{
    CurveSet, CurveType, DEFAULT_NURBS_ORDER, DEFAULT_RESOLUTION, HANDLE_LEFT, HANDLE_RIGHT,
    HANDLE_TYPE_LEFT, HANDLE_TYPE_RIGHT, NURBS_WEIGHT,
};
pub use fields::{Field, FieldContext};
pub use length_parameterize::{accumulate_lengths, interpolate, next_point_index, sample_uniform};
pub use resample::{
    resample_to_count, resample_to_count_field, resample_to_evaluated,
    resample_to_evaluated_field, resample_to_length, resample_to_length_field, ResampleOutputs,
};
pub use selection::Selection;
