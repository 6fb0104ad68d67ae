use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attribute_math::Rotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeDomain {
    Point,
    Curve,
}

impl AttributeDomain {
    pub const ALL: [AttributeDomain; 2] = [AttributeDomain::Point, AttributeDomain::Curve];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeStorage {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Bool(Vec<bool>),
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
    Quat(Vec<Rotation>),
    String(Vec<String>),
}

impl AttributeStorage {
    pub fn len(&self) -> usize {
        match self {
            AttributeStorage::Float(values) => values.len(),
            AttributeStorage::Int(values) => values.len(),
            AttributeStorage::Bool(values) => values.len(),
            AttributeStorage::Vec2(values) => values.len(),
            AttributeStorage::Vec3(values) => values.len(),
            AttributeStorage::Vec4(values) => values.len(),
            AttributeStorage::Quat(values) => values.len(),
            AttributeStorage::String(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttributeType {
        match self {
            AttributeStorage::Float(_) => AttributeType::Float,
            AttributeStorage::Int(_) => AttributeType::Int,
            AttributeStorage::Bool(_) => AttributeType::Bool,
            AttributeStorage::Vec2(_) => AttributeType::Vec2,
            AttributeStorage::Vec3(_) => AttributeType::Vec3,
            AttributeStorage::Vec4(_) => AttributeType::Vec4,
            AttributeStorage::Quat(_) => AttributeType::Quat,
            AttributeStorage::String(_) => AttributeType::String,
        }
    }

    /// Storage of the given type filled with the type's default value.
    pub fn with_default(data_type: AttributeType, len: usize) -> Self {
        match data_type {
            AttributeType::Float => AttributeStorage::Float(vec![0.0; len]),
            AttributeType::Int => AttributeStorage::Int(vec![0; len]),
            AttributeType::Bool => AttributeStorage::Bool(vec![false; len]),
            AttributeType::Vec2 => AttributeStorage::Vec2(vec![[0.0; 2]; len]),
            AttributeType::Vec3 => AttributeStorage::Vec3(vec![[0.0; 3]; len]),
            AttributeType::Vec4 => AttributeStorage::Vec4(vec![[0.0; 4]; len]),
            AttributeType::Quat => AttributeStorage::Quat(vec![Rotation::default(); len]),
            AttributeType::String => AttributeStorage::String(vec![String::new(); len]),
        }
    }

    pub fn as_ref(&self) -> AttributeRef<'_> {
        match self {
            AttributeStorage::Float(values) => AttributeRef::Float(values.as_slice()),
            AttributeStorage::Int(values) => AttributeRef::Int(values.as_slice()),
            AttributeStorage::Bool(values) => AttributeRef::Bool(values.as_slice()),
            AttributeStorage::Vec2(values) => AttributeRef::Vec2(values.as_slice()),
            AttributeStorage::Vec3(values) => AttributeRef::Vec3(values.as_slice()),
            AttributeStorage::Vec4(values) => AttributeRef::Vec4(values.as_slice()),
            AttributeStorage::Quat(values) => AttributeRef::Quat(values.as_slice()),
            AttributeStorage::String(values) => AttributeRef::String(values.as_slice()),
        }
    }

    pub fn as_mut(&mut self) -> AttributeRefMut<'_> {
        match self {
            AttributeStorage::Float(values) => AttributeRefMut::Float(values.as_mut_slice()),
            AttributeStorage::Int(values) => AttributeRefMut::Int(values.as_mut_slice()),
            AttributeStorage::Bool(values) => AttributeRefMut::Bool(values.as_mut_slice()),
            AttributeStorage::Vec2(values) => AttributeRefMut::Vec2(values.as_mut_slice()),
            AttributeStorage::Vec3(values) => AttributeRefMut::Vec3(values.as_mut_slice()),
            AttributeStorage::Vec4(values) => AttributeRefMut::Vec4(values.as_mut_slice()),
            AttributeStorage::Quat(values) => AttributeRefMut::Quat(values.as_mut_slice()),
            AttributeStorage::String(values) => AttributeRefMut::String(values.as_mut_slice()),
        }
    }

    /// Splits the storage into disjoint mutable views, one per span.
    /// Spans must be ascending and non-overlapping; gaps between them are
    /// skipped.
    pub fn split_spans_mut(&mut self, spans: &[Range<usize>]) -> Vec<AttributeRefMut<'_>> {
        match self {
            AttributeStorage::Float(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Float).collect()
            }
            AttributeStorage::Int(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Int).collect()
            }
            AttributeStorage::Bool(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Bool).collect()
            }
            AttributeStorage::Vec2(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Vec2).collect()
            }
            AttributeStorage::Vec3(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Vec3).collect()
            }
            AttributeStorage::Vec4(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Vec4).collect()
            }
            AttributeStorage::Quat(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::Quat).collect()
            }
            AttributeStorage::String(values) => {
                split_spans(values, spans).into_iter().map(AttributeRefMut::String).collect()
            }
        }
    }
}

/// Splits `data` into one mutable sub-slice per span. Spans must be ascending
/// and non-overlapping.
pub fn split_spans<'a, T>(data: &'a mut [T], spans: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut parts = Vec::with_capacity(spans.len());
    let mut rest = data;
    let mut consumed = 0usize;
    for span in spans {
        let (_, tail) = rest.split_at_mut(span.start - consumed);
        let (part, tail) = tail.split_at_mut(span.end - span.start);
        parts.push(part);
        rest = tail;
        consumed = span.end;
    }
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeError {
    InvalidLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeRef<'a> {
    Float(&'a [f32]),
    Int(&'a [i32]),
    Bool(&'a [bool]),
    Vec2(&'a [[f32; 2]]),
    Vec3(&'a [[f32; 3]]),
    Vec4(&'a [[f32; 4]]),
    Quat(&'a [Rotation]),
    String(&'a [String]),
}

impl<'a> AttributeRef<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttributeRef::Float(values) => values.len(),
            AttributeRef::Int(values) => values.len(),
            AttributeRef::Bool(values) => values.len(),
            AttributeRef::Vec2(values) => values.len(),
            AttributeRef::Vec3(values) => values.len(),
            AttributeRef::Vec4(values) => values.len(),
            AttributeRef::Quat(values) => values.len(),
            AttributeRef::String(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttributeType {
        match self {
            AttributeRef::Float(_) => AttributeType::Float,
            AttributeRef::Int(_) => AttributeType::Int,
            AttributeRef::Bool(_) => AttributeType::Bool,
            AttributeRef::Vec2(_) => AttributeType::Vec2,
            AttributeRef::Vec3(_) => AttributeType::Vec3,
            AttributeRef::Vec4(_) => AttributeType::Vec4,
            AttributeRef::Quat(_) => AttributeType::Quat,
            AttributeRef::String(_) => AttributeType::String,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AttributeRefMut<'a> {
    Float(&'a mut [f32]),
    Int(&'a mut [i32]),
    Bool(&'a mut [bool]),
    Vec2(&'a mut [[f32; 2]]),
    Vec3(&'a mut [[f32; 3]]),
    Vec4(&'a mut [[f32; 4]]),
    Quat(&'a mut [Rotation]),
    String(&'a mut [String]),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveAttributes {
    point: HashMap<String, AttributeStorage>,
    curve: HashMap<String, AttributeStorage>,
}

impl CurveAttributes {
    pub fn map(&self, domain: AttributeDomain) -> &HashMap<String, AttributeStorage> {
        match domain {
            AttributeDomain::Point => &self.point,
            AttributeDomain::Curve => &self.curve,
        }
    }

    pub fn map_mut(&mut self, domain: AttributeDomain) -> &mut HashMap<String, AttributeStorage> {
        match domain {
            AttributeDomain::Point => &mut self.point,
            AttributeDomain::Curve => &mut self.curve,
        }
    }

    pub fn get(&self, domain: AttributeDomain, name: &str) -> Option<&AttributeStorage> {
        self.map(domain).get(name)
    }

    pub fn remove(&mut self, domain: AttributeDomain, name: &str) -> Option<AttributeStorage> {
        self.map_mut(domain).remove(name)
    }
}
