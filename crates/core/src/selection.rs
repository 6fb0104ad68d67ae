use serde::{Deserialize, Serialize};

/// An immutable set of curve indices, stored sorted and deduplicated.
///
/// Indices are not validated against any particular curve set; callers must
/// keep them within the curve count of the set they select from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    indices: Vec<u32>,
}

impl Selection {
    pub fn all(curve_count: usize) -> Self {
        Self {
            indices: (0..curve_count as u32).collect(),
        }
    }

    pub fn from_indices(mut indices: Vec<u32>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn from_mask(mask: &[bool]) -> Self {
        Self {
            indices: mask
                .iter()
                .enumerate()
                .filter_map(|(i, selected)| selected.then_some(i as u32))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Position of a curve index within the selection order.
    pub fn position(&self, index: u32) -> Option<usize> {
        self.indices.binary_search(&index).ok()
    }

    /// The curve indices in `0..curve_count` not in this selection.
    pub fn complement(&self, curve_count: usize) -> Selection {
        let mut indices = Vec::with_capacity(curve_count - self.indices.len().min(curve_count));
        let mut selected = self.indices.iter().copied().peekable();
        for i in 0..curve_count as u32 {
            if selected.peek() == Some(&i) {
                selected.next();
            } else {
                indices.push(i);
            }
        }
        Selection { indices }
    }

    /// Ascending chunks of at most `size` curve indices; chunk index ranges
    /// never interleave, so per-chunk destination spans stay disjoint.
    pub fn segments(&self, size: usize) -> std::slice::Chunks<'_, u32> {
        self.indices.chunks(size.max(1))
    }
}
