use std::fmt;
use std::sync::Arc;

use crate::curves::CurveSet;

/// Evaluation context for per-curve fields: the source curve set the values
/// are computed against.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    pub curves: &'a CurveSet,
}

impl<'a> FieldContext<'a> {
    pub fn new(curves: &'a CurveSet) -> Self {
        Self { curves }
    }

    pub fn curve_count(&self) -> usize {
        self.curves.curves_num()
    }
}

impl fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("curves", &self.curves.curves_num())
            .finish()
    }
}

/// A lazily-evaluated per-curve value: a constant, an explicit per-curve
/// array, or an expression computed on demand against the context.
#[derive(Clone)]
pub enum Field<T> {
    Constant(T),
    Array(Vec<T>),
    Expr(Arc<dyn Fn(&FieldContext, usize) -> T + Send + Sync>),
}

impl<T: Clone + Default> Field<T> {
    pub fn expr(f: impl Fn(&FieldContext, usize) -> T + Send + Sync + 'static) -> Self {
        Field::Expr(Arc::new(f))
    }

    /// One value per curve. Arrays shorter than the curve count repeat their
    /// last entry; an empty array yields defaults.
    pub fn evaluate(&self, context: &FieldContext, count: usize) -> Vec<T> {
        match self {
            Field::Constant(value) => vec![value.clone(); count],
            Field::Array(values) => (0..count)
                .map(|i| match values.get(i.min(values.len().wrapping_sub(1))) {
                    Some(value) => value.clone(),
                    None => T::default(),
                })
                .collect(),
            Field::Expr(f) => (0..count).map(|i| f(context, i)).collect(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Field::Array(values) => f.debug_tuple("Array").field(values).finish(),
            Field::Expr(_) => f.write_str("Expr(..)"),
        }
    }
}
