//! Compressed sparse row (CSR) matrix for item features.
//!
//! Layout matches the usual CSR triplet:
//! - `indptr[r]..indptr[r + 1]` is the range of stored entries for row `r`
//! - `indices[j]` is the column of entry `j`
//! - `data[j]` is its value
//!
//! The serialized form keeps the same field names plus `shape: [rows, cols]`,
//! so an exported scipy CSR matrix maps onto it one-to-one.

use crate::{Result, ScoreError};
use serde::{Deserialize, Serialize};

/// Row-major sparse matrix, one row per item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl SparseMatrix {
    /// Build a matrix from its CSR parts, validating the structure
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self> {
        let matrix = Self {
            shape,
            indptr,
            indices,
            data,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// A matrix with the given shape and no stored entries
    pub fn empty(n_rows: usize, n_cols: usize) -> Self {
        Self {
            shape: (n_rows, n_cols),
            indptr: vec![0; n_rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Square identity matrix (each item is its own single feature)
    pub fn identity(n: usize) -> Self {
        Self {
            shape: (n, n),
            indptr: (0..=n).collect(),
            indices: (0..n).collect(),
            data: vec![1.0; n],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.shape.0
    }

    pub fn n_cols(&self) -> usize {
        self.shape.1
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Iterate the stored `(column, value)` pairs of one row.
    ///
    /// Panics if `row >= n_rows()`; callers check bounds first.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let start = self.indptr[row];
        let end = self.indptr[row + 1];
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.data[start..end].iter().copied())
    }

    /// Check the CSR invariants.
    ///
    /// Deserialized matrices are unchecked until this is called.
    pub fn validate(&self) -> Result<()> {
        let (n_rows, n_cols) = self.shape;

        let indptr_len = n_rows
            .checked_add(1)
            .ok_or_else(|| ScoreError::InvalidModel(format!("row count {} is too large", n_rows)))?;
        if self.indptr.len() != indptr_len {
            return Err(ScoreError::ShapeMismatch {
                what: "indptr".to_string(),
                expected: indptr_len,
                found: self.indptr.len(),
            });
        }
        if self.indices.len() != self.data.len() {
            return Err(ScoreError::ShapeMismatch {
                what: "indices".to_string(),
                expected: self.data.len(),
                found: self.indices.len(),
            });
        }
        if self.indptr.first() != Some(&0) {
            return Err(ScoreError::InvalidModel(
                "indptr must start at 0".to_string(),
            ));
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(ScoreError::InvalidModel(
                "indptr must be non-decreasing".to_string(),
            ));
        }
        let last = self.indptr.last().copied().unwrap_or(0);
        if last != self.data.len() {
            return Err(ScoreError::ShapeMismatch {
                what: "data".to_string(),
                expected: last,
                found: self.data.len(),
            });
        }
        if let Some(&col) = self.indices.iter().find(|&&c| c >= n_cols) {
            return Err(ScoreError::InvalidModel(format!(
                "column index {} out of range for {} columns",
                col, n_cols
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_matrix() -> SparseMatrix {
        // [[1, 0, 2],
        //  [0, 0, 0],
        //  [0, 3, 0]]
        SparseMatrix::new((3, 3), vec![0, 2, 2, 3], vec![0, 2, 1], vec![1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_row_iteration() {
        let m = small_matrix();

        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(0, 1.0), (2, 2.0)]);
        assert_eq!(m.row(1).count(), 0);
        assert_eq!(m.row(2).collect::<Vec<_>>(), vec![(1, 3.0)]);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn test_identity() {
        let m = SparseMatrix::identity(4);
        assert!(m.validate().is_ok());
        assert_eq!(m.n_rows(), 4);
        assert_eq!(m.row(3).collect::<Vec<_>>(), vec![(3, 1.0)]);
    }

    #[test]
    fn test_rejects_wrong_indptr_length() {
        let err = SparseMatrix::new((3, 3), vec![0, 1], vec![0], vec![1.0]).unwrap_err();
        assert!(matches!(err, ScoreError::ShapeMismatch { ref what, .. } if what == "indptr"));
    }

    #[test]
    fn test_rejects_column_out_of_range() {
        let err = SparseMatrix::new((1, 2), vec![0, 1], vec![5], vec![1.0]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidModel(_)));
    }

    #[test]
    fn test_rejects_overflowing_row_count() {
        let err = SparseMatrix::new((usize::MAX, 1), vec![0], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidModel(ref msg) if msg.contains("too large")));
    }

    #[test]
    fn test_rejects_decreasing_indptr() {
        let err = SparseMatrix::new((2, 2), vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidModel(_)));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{"shape": [2, 2], "indptr": [0, 1, 2], "indices": [1, 0], "data": [0.5, 1.5]}"#;
        let m: SparseMatrix = serde_json::from_str(json).unwrap();

        assert!(m.validate().is_ok());
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(1, 0.5)]);
    }
}
