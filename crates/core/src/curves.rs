use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attributes::{
    AttributeDomain, AttributeError, AttributeRef, AttributeStorage, CurveAttributes,
};
use crate::selection::Selection;

pub const HANDLE_LEFT: &str = "handle_left";
pub const HANDLE_RIGHT: &str = "handle_right";
pub const HANDLE_TYPE_LEFT: &str = "handle_type_left";
pub const HANDLE_TYPE_RIGHT: &str = "handle_type_right";
pub const NURBS_WEIGHT: &str = "nurbs_weight";

pub const DEFAULT_RESOLUTION: u32 = 12;
pub const DEFAULT_NURBS_ORDER: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveType {
    Poly,
    CatmullRom,
    Bezier,
    Nurbs,
}

impl CurveType {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            CurveType::Poly => 0,
            CurveType::CatmullRom => 1,
            CurveType::Bezier => 2,
            CurveType::Nurbs => 3,
        }
    }
}

/// An ordered collection of curves over flat point arrays.
///
/// `offsets` has one entry per curve plus a trailing total; curve `i` owns
/// points `offsets[i]..offsets[i + 1]`. The ranges partition the point arrays
/// without gaps, in curve order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSet {
    pub offsets: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    pub curve_types: Vec<CurveType>,
    pub cyclic: Vec<bool>,
    pub resolutions: Vec<u32>,
    pub nurbs_orders: Vec<u8>,
    /// Explicit knot vectors for NURBS curves that carry one, by curve index.
    pub custom_knots: BTreeMap<u32, Vec<f32>>,
    pub vertex_group_names: Vec<String>,
    pub attributes: CurveAttributes,
}

impl Default for CurveSet {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            positions: Vec::new(),
            curve_types: Vec::new(),
            cyclic: Vec::new(),
            resolutions: Vec::new(),
            nurbs_orders: Vec::new(),
            custom_knots: BTreeMap::new(),
            vertex_group_names: Vec::new(),
            attributes: CurveAttributes::default(),
        }
    }
}

impl CurveSet {
    pub fn curves_num(&self) -> usize {
        self.curve_types.len()
    }

    pub fn points_num(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.curves_num() == 0
    }

    pub fn points_range(&self, i_curve: usize) -> Range<usize> {
        self.offsets[i_curve] as usize..self.offsets[i_curve + 1] as usize
    }

    pub fn points_count(&self, i_curve: usize) -> usize {
        (self.offsets[i_curve + 1] - self.offsets[i_curve]) as usize
    }

    pub fn push_curve(&mut self, points: Vec<[f32; 3]>, curve_type: CurveType, cyclic: bool) {
        let total = self.points_num() + points.len();
        self.positions.extend(points);
        self.offsets.push(total as u32);
        self.curve_types.push(curve_type);
        self.cyclic.push(cyclic);
        self.resolutions.push(DEFAULT_RESOLUTION);
        self.nurbs_orders.push(DEFAULT_NURBS_ORDER);
    }

    /// Number of curves of each type, indexed by `CurveType::index`.
    pub fn curve_type_counts(&self) -> [usize; CurveType::COUNT] {
        let mut counts = [0usize; CurveType::COUNT];
        for curve_type in &self.curve_types {
            counts[curve_type.index()] += 1;
        }
        counts
    }

    pub fn fill_curve_types(&mut self, selection: &Selection, curve_type: CurveType) {
        for i_curve in selection.iter() {
            self.curve_types[i_curve as usize] = curve_type;
        }
    }

    /// A new curve set with the same curves but no point data: curve-domain
    /// arrays and attributes are cloned, point counts are all zero. Custom
    /// knots are not carried; the caller copies them for curves that keep
    /// NURBS data.
    pub fn copy_curve_domain(&self) -> CurveSet {
        let mut attributes = CurveAttributes::default();
        *attributes.map_mut(AttributeDomain::Curve) =
            self.attributes.map(AttributeDomain::Curve).clone();
        CurveSet {
            offsets: vec![0; self.curves_num() + 1],
            positions: Vec::new(),
            curve_types: self.curve_types.clone(),
            cyclic: self.cyclic.clone(),
            resolutions: self.resolutions.clone(),
            nurbs_orders: self.nurbs_orders.clone(),
            custom_knots: BTreeMap::new(),
            vertex_group_names: self.vertex_group_names.clone(),
            attributes,
        }
    }

    pub fn set_point_attribute(
        &mut self,
        name: impl Into<String>,
        storage: AttributeStorage,
    ) -> Result<(), AttributeError> {
        let expected = self.points_num();
        if storage.len() != expected {
            return Err(AttributeError::InvalidLength {
                expected,
                actual: storage.len(),
            });
        }
        self.attributes
            .map_mut(AttributeDomain::Point)
            .insert(name.into(), storage);
        Ok(())
    }

    pub fn set_curve_attribute(
        &mut self,
        name: impl Into<String>,
        storage: AttributeStorage,
    ) -> Result<(), AttributeError> {
        let expected = self.curves_num();
        if storage.len() != expected {
            return Err(AttributeError::InvalidLength {
                expected,
                actual: storage.len(),
            });
        }
        self.attributes
            .map_mut(AttributeDomain::Curve)
            .insert(name.into(), storage);
        Ok(())
    }

    pub fn point_attribute(&self, name: &str) -> Option<AttributeRef<'_>> {
        self.attributes
            .get(AttributeDomain::Point, name)
            .map(AttributeStorage::as_ref)
    }

    /// Per-point NURBS weights for one curve, when stored.
    pub fn nurbs_weights(&self, i_curve: usize) -> Option<&[f32]> {
        match self.attributes.get(AttributeDomain::Point, NURBS_WEIGHT) {
            Some(AttributeStorage::Float(values)) => Some(&values[self.points_range(i_curve)]),
            _ => None,
        }
    }

    /// Absolute Bezier handle positions for one curve, when stored.
    pub fn bezier_handles(&self, i_curve: usize) -> (Option<&[[f32; 3]]>, Option<&[[f32; 3]]>) {
        let range = self.points_range(i_curve);
        let left = match self.attributes.get(AttributeDomain::Point, HANDLE_LEFT) {
            Some(AttributeStorage::Vec3(values)) => Some(&values[range.clone()]),
            _ => None,
        };
        let right = match self.attributes.get(AttributeDomain::Point, HANDLE_RIGHT) {
            Some(AttributeStorage::Vec3(values)) => Some(&values[range]),
            _ => None,
        };
        (left, right)
    }
}
