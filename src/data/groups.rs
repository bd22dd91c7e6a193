//! Mapping from original categorical features to one-hot column ranges.
//!
//! After one-hot encoding, categorical feature `g` with `k` distinct values
//! occupies `k` contiguous columns of the encoded matrix. [`FeatureGroups`]
//! stores the cumulative boundaries so that group `g` spans
//! `boundaries[g]..boundaries[g + 1]`:
//!
//! ```text
//! cardinalities = [2, 3, 1]
//! boundaries    = [0, 2, 5, 6]
//!
//! columns:  0 1 | 2 3 4 | 5
//! group:     0  |   1   | 2
//! ```

use std::ops::Range;

use super::DatasetError;

/// Contiguous column ranges of the one-hot encoded original features.
///
/// Built once from the per-feature cardinality list and immutable afterwards.
/// Rebuild it whenever the encoding changes.
///
/// # Example
///
/// ```
/// use catiht::data::FeatureGroups;
///
/// let groups = FeatureGroups::from_cardinalities(&[2, 3, 1]).unwrap();
/// assert_eq!(groups.boundaries(), &[0, 2, 5, 6]);
/// assert_eq!(groups.range(1), 2..5);
/// assert_eq!(groups.n_columns(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGroups {
    cardinalities: Vec<usize>,
    /// Length `n_groups + 1`, starts at 0, ends at `n_columns`.
    boundaries: Vec<usize>,
}

impl FeatureGroups {
    /// Build the group index from per-feature cardinalities.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::NoFeatures`] if `cardinalities` is empty
    /// - [`DatasetError::InvalidCardinality`] if any entry is zero
    pub fn from_cardinalities(cardinalities: &[usize]) -> Result<Self, DatasetError> {
        if cardinalities.is_empty() {
            return Err(DatasetError::NoFeatures);
        }

        let mut boundaries = Vec::with_capacity(cardinalities.len() + 1);
        boundaries.push(0);
        let mut total = 0usize;
        for (feature, &cardinality) in cardinalities.iter().enumerate() {
            if cardinality == 0 {
                return Err(DatasetError::InvalidCardinality {
                    feature,
                    cardinality,
                });
            }
            total += cardinality;
            boundaries.push(total);
        }

        Ok(Self {
            cardinalities: cardinalities.to_vec(),
            boundaries,
        })
    }

    /// Number of original categorical features (groups).
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.cardinalities.len()
    }

    /// Total number of one-hot columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.boundaries[self.boundaries.len() - 1]
    }

    /// Cumulative boundaries, length `n_groups + 1`.
    #[inline]
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Number of categories per original feature.
    #[inline]
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    /// Column range of a group.
    ///
    /// # Panics
    ///
    /// Panics if `group >= n_groups()`.
    #[inline]
    pub fn range(&self, group: usize) -> Range<usize> {
        self.boundaries[group]..self.boundaries[group + 1]
    }

    /// Iterate over the column ranges of all groups, in group order.
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = Range<usize>> + '_ {
        self.boundaries.windows(2).map(|w| w[0]..w[1])
    }

    /// Group that owns a one-hot column, or `None` if the column is out of range.
    pub fn group_of_column(&self, column: usize) -> Option<usize> {
        if column >= self.n_columns() {
            return None;
        }
        // First boundary strictly greater than `column`, minus one.
        Some(self.boundaries.partition_point(|&b| b <= column) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_cumulative() {
        let groups = FeatureGroups::from_cardinalities(&[3, 1, 4]).unwrap();
        assert_eq!(groups.boundaries(), &[0, 3, 4, 8]);
        assert_eq!(groups.n_groups(), 3);
        assert_eq!(groups.n_columns(), 8);
        assert_eq!(groups.cardinalities(), &[3, 1, 4]);
    }

    #[test]
    fn ranges_cover_all_columns() {
        let groups = FeatureGroups::from_cardinalities(&[2, 2, 1]).unwrap();
        let ranges: Vec<_> = groups.ranges().collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn group_of_column_lookup() {
        let groups = FeatureGroups::from_cardinalities(&[2, 3, 1]).unwrap();
        let owners: Vec<_> = (0..6).map(|c| groups.group_of_column(c).unwrap()).collect();
        assert_eq!(owners, vec![0, 0, 1, 1, 1, 2]);
        assert_eq!(groups.group_of_column(6), None);
    }

    #[test]
    fn zero_cardinality_rejected() {
        let err = FeatureGroups::from_cardinalities(&[2, 0, 1]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidCardinality {
                feature: 1,
                cardinality: 0
            }
        ));
    }

    #[test]
    fn empty_cardinalities_rejected() {
        let err = FeatureGroups::from_cardinalities(&[]).unwrap_err();
        assert!(matches!(err, DatasetError::NoFeatures));
    }
}
