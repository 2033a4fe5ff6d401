//! # Lattice bounds
//!
//! Per-baseline range of admissible fringe offsets.
//!
//! For a baseline with linear coefficient `K_j`, the ambiguity planes that can cut the
//! region `|s| ≤ 2` of direction-cosine space are indexed by
//!
//! ```text
//! n0_j   = floor(2·K_j)
//! k_len_j = 2·n0_j + 1        offsets k ∈ {1, …, k_len_j}
//! ```
//!
//! The offset `k = n0_j + 1` selects the plane through the origin (the true direction).
use crate::constants::FringeOffset;
use crate::geometry::ArrayGeometry;

/// Base integer and admissible offset count of every baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeBounds {
    n0: Vec<u32>,
    k_len: Vec<u32>,
}

impl LatticeBounds {
    /// Compute the bounds from linear coefficients `K`.
    ///
    /// Coefficients too large for the offset type saturate at `u32::MAX`; geometries
    /// built through [`ArrayGeometry`] never get there.
    pub fn from_coefficients(k: &[f64]) -> Self {
        let n0: Vec<u32> = k.iter().map(|kj| (2.0 * kj).floor().max(0.0) as u32).collect();
        let k_len = n0
            .iter()
            .map(|n| n.saturating_mul(2).saturating_add(1))
            .collect();
        LatticeBounds { n0, k_len }
    }

    pub fn from_geometry(geometry: &ArrayGeometry) -> Self {
        Self::from_coefficients(&geometry.linear_coefficients())
    }

    #[inline]
    pub fn n0(&self) -> &[u32] {
        &self.n0
    }

    #[inline]
    pub fn k_len(&self) -> &[u32] {
        &self.k_len
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n0.is_empty()
    }

    /// Admissible offsets of baseline `j`, in enumeration order.
    #[inline]
    pub fn offsets(&self, j: usize) -> std::ops::RangeInclusive<FringeOffset> {
        1..=self.k_len[j]
    }

    /// Number of candidates of the seed stage (product of the first three ranges),
    /// saturating at `usize::MAX`.
    pub fn seed_candidates(&self) -> usize {
        self.k_len
            .iter()
            .take(3)
            .fold(1usize, |acc, k| acc.saturating_mul(*k as usize))
    }
}
