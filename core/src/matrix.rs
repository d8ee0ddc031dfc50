use crate::TermId;
use serde::{Deserialize, Serialize};

/// Sparse row vector with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<TermId>,
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Build from `(column, value)` pairs already sorted by column.
    pub fn from_sorted(entries: Vec<(TermId, f64)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        let (indices, values) = entries.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize { self.indices.len() }
    pub fn is_zero(&self) -> bool { self.values.iter().all(|v| *v == 0.0) }
    pub fn view(&self) -> RowView<'_> { RowView { indices: &self.indices, values: &self.values } }
}

/// Borrowed row of a [`CsrMatrix`] or a whole [`SparseVector`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub indices: &'a [TermId],
    pub values: &'a [f64],
}

impl<'a> RowView<'a> {
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Merge-join over the two sorted index lists.
    pub fn dot(&self, other: &RowView<'_>) -> f64 {
        let (mut i, mut j, mut acc) = (0, 0, 0.0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

    /// Cosine of the angle between the rows; 0.0 if either is all zero.
    pub fn cosine(&self, other: &RowView<'_>) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 { return 0.0; }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }
}

/// Compressed sparse row matrix: documents by vocabulary terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<TermId>,
    data: Vec<f64>,
}

impl CsrMatrix {
    pub fn empty(n_cols: usize) -> Self {
        Self { n_cols, indptr: vec![0], indices: Vec::new(), data: Vec::new() }
    }

    pub fn from_rows(rows: Vec<SparseVector>, n_cols: usize) -> Self {
        let mut m = Self::empty(n_cols);
        for row in rows {
            debug_assert!(row.indices.iter().all(|&c| (c as usize) < n_cols));
            m.indices.extend(row.indices);
            m.data.extend(row.values);
            m.indptr.push(m.indices.len());
        }
        m
    }

    pub fn n_rows(&self) -> usize { self.indptr.len().saturating_sub(1) }
    pub fn n_cols(&self) -> usize { self.n_cols }
    pub fn nnz(&self) -> usize { self.data.len() }

    pub fn row(&self, i: usize) -> RowView<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        RowView { indices: &self.indices[start..end], values: &self.data[start..end] }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// Structural sanity after decoding from disk.
    pub fn is_well_formed(&self) -> bool {
        self.indptr.first() == Some(&0)
            && self.indptr.windows(2).all(|w| w[0] <= w[1])
            && self.indptr.last() == Some(&self.indices.len())
            && self.indices.len() == self.data.len()
            && self.indices.iter().all(|&c| (c as usize) < self.n_cols)
            && self.indptr.windows(2).all(|w| self.indices[w[0]..w[1]].windows(2).all(|c| c[0] < c[1]))
    }
}
