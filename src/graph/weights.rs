use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2, Axis, s};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WeightType { I64, F64 }

/// Node weights stored as type-separated matrices, one row per node (or per part).
#[derive(Clone, Debug, Default)]
pub(crate) struct WeightMatrix {
    series: HashMap<String, (WeightType, usize)>, // len = k_i + k_f
    i64: Array2<i64>, // (n, k_i)
    f64: Array2<f64>, // (n, k_f)
}

impl WeightMatrix {
    /// Construct a weight matrix with `num_rows` rows from named integer and float columns.
    pub(crate) fn new(num_rows: usize,
        weights_i64: HashMap<String, Vec<i64>>,
        weights_f64: HashMap<String, Vec<f64>>,
    ) -> Self {
        weights_i64.iter().for_each(|(name, v)| {
            assert!(v.len() == num_rows, "weights_i64[{name}].len() must equal num_rows");
        });
        weights_f64.iter().for_each(|(name, v)| {
            assert!(v.len() == num_rows, "weights_f64[{name}].len() must equal num_rows");
        });

        let mut i64 = Array2::<i64>::zeros((num_rows, weights_i64.len()));
        let mut f64 = Array2::<f64>::zeros((num_rows, weights_f64.len()));
        let mut series = HashMap::new();

        weights_i64.into_iter().enumerate().for_each(|(i, (name, values))| {
            i64.slice_mut(s![.., i]).assign(&Array1::from(values));
            series.insert(name, (WeightType::I64, i));
        });
        weights_f64.into_iter().enumerate().for_each(|(i, (name, values))| {
            f64.slice_mut(s![.., i]).assign(&Array1::from(values));
            series.insert(name, (WeightType::F64, i));
        });

        Self { series, i64, f64 }
    }

    /// Create a zeroed matrix with the same series layout and `num_rows` rows.
    pub(crate) fn copy_of_size(&self, num_rows: usize) -> Self {
        Self {
            series: self.series.clone(),
            i64: Array2::<i64>::zeros((num_rows, self.i64.ncols())),
            f64: Array2::<f64>::zeros((num_rows, self.f64.ncols())),
        }
    }

    /// Number of rows in the matrix.
    #[inline] pub(crate) fn num_rows(&self) -> usize { self.i64.nrows().max(self.f64.nrows()) }

    /// Check whether a named series exists.
    #[inline] pub(crate) fn contains(&self, series: &str) -> bool { self.series.contains_key(series) }

    /// Names of every series stored in the matrix.
    pub(crate) fn series(&self) -> HashSet<String> { self.series.keys().cloned().collect() }

    /// Read a single cell as f64, or None if the series does not exist.
    pub(crate) fn get_as_f64(&self, series: &str, row: usize) -> Option<f64> {
        match self.series.get(series)? {
            (WeightType::I64, col) => Some(self.i64[[row, *col]] as f64),
            (WeightType::F64, col) => Some(self.f64[[row, *col]]),
        }
    }

    /// Add row `other_row` of `other` into row `row` of self.
    pub(crate) fn add_row_from(&mut self, row: usize, other: &WeightMatrix, other_row: usize) {
        self.i64.row_mut(row).scaled_add(1, &other.i64.row(other_row));
        self.f64.row_mut(row).scaled_add(1.0, &other.f64.row(other_row));
    }

    /// Subtract row `other_row` of `other` from row `row` of self.
    pub(crate) fn subtract_row_from(&mut self, row: usize, other: &WeightMatrix, other_row: usize) {
        self.i64.row_mut(row).scaled_add(-1, &other.i64.row(other_row));
        self.f64.row_mut(row).scaled_add(-1.0, &other.f64.row(other_row));
    }

    /// Aggregate rows into `num_parts` buckets according to `assignments`.
    pub(crate) fn aggregate(&self, assignments: &[u32], num_parts: usize) -> Self {
        assert!(assignments.len() == self.num_rows(), "assignments.len() must equal num_rows");

        let mut totals = self.copy_of_size(num_parts);
        for (row, &part) in assignments.iter().enumerate() {
            totals.add_row_from(part as usize, self, row);
        }
        totals
    }

    /// Column sums of every series, as a single-row matrix.
    pub(crate) fn sum_rows(&self) -> Self {
        let mut totals = self.copy_of_size(1);
        totals.i64.row_mut(0).assign(&self.i64.sum_axis(Axis(0)));
        totals.f64.row_mut(0).assign(&self.f64.sum_axis(Axis(0)));
        totals
    }
}
