/// Equal-width binning of one bounded continuous dimension.
///
/// The `n_bins - 1` interior bin edges are computed once at construction and
/// reused on every call. Values outside the configured bounds are clamped to
/// the nearest edge bin - never an error.
#[derive(Clone, Debug)]
pub struct UniformBins {
    edges: Vec<f64>,
}

impl UniformBins {
    pub fn new(
        lower_bound: f64,
        upper_bound: f64,
        n_bins: usize,
    ) -> Self {
        assert!(n_bins > 0);
        assert!(upper_bound > lower_bound);
        let width = (upper_bound - lower_bound) / n_bins as f64;
        let edges = (1..n_bins).map(|i| lower_bound + width * i as f64).collect();
        Self { edges }
    }

    pub fn n_bins(&self) -> usize { self.edges.len() + 1 }

    /// Index of the bin containing `value`, in range `0..n_bins`
    pub fn bin_index(
        &self,
        value: f64,
    ) -> usize {
        self.edges.partition_point(|&edge| value >= edge)
    }
}

/// Combines per-dimension [UniformBins] and flattens the resulting bin index
/// tuple into a single row-major Q-table row index.
#[derive(Clone, Debug)]
pub struct UniformGridDiscretizer {
    dimensions: Vec<UniformBins>,
}

impl UniformGridDiscretizer {
    pub fn new(dimensions: Vec<UniformBins>) -> Self {
        assert!(!dimensions.is_empty());
        Self { dimensions }
    }

    /// Number of grid cells = product of the per-dimension bin counts
    pub fn state_space(&self) -> usize {
        self.dimensions.iter().map(|d| d.n_bins()).product()
    }

    /// Bin index per dimension
    pub fn grid_index(
        &self,
        values: &[f64],
    ) -> Vec<usize> {
        assert_eq!(values.len(), self.dimensions.len());
        self.dimensions
            .iter()
            .zip(values.iter())
            .map(|(dim, &value)| dim.bin_index(value))
            .collect()
    }

    /// Row-major flattening of [Self::grid_index]
    pub fn flat_index(
        &self,
        values: &[f64],
    ) -> usize {
        self.dimensions
            .iter()
            .zip(self.grid_index(values))
            .fold(0, |flat, (dim, bin)| flat * dim.n_bins() + bin)
    }
}
