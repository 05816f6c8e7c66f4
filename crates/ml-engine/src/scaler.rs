use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

/// Per-column min-max scaling to [0, 1].
///
/// Columns with zero range scale to 0.0 and invert back to their constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    range: Array1<f64>,
}

impl MinMaxScaler {
    pub fn fit(data: ArrayView2<f64>) -> Self {
        let min = data.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x));
        let max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x));
        let range = &max - &min;
        Self { min, range }
    }

    pub fn n_features(&self) -> usize {
        self.min.len()
    }

    pub fn transform(&self, data: ArrayView2<f64>) -> Array2<f64> {
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.min)
                .and(&self.range)
                .for_each(|x, &min, &range| *x = scale(*x, min, range));
        }
        out
    }

    pub fn inverse_transform(&self, data: ArrayView2<f64>) -> Array2<f64> {
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.min)
                .and(&self.range)
                .for_each(|x, &min, &range| *x = *x * range + min);
        }
        out
    }

    /// Scales a single value of column `col`.
    pub fn transform_value(&self, col: usize, value: f64) -> f64 {
        scale(value, self.min[col], self.range[col])
    }

    pub fn inverse_value(&self, col: usize, value: f64) -> f64 {
        value * self.range[col] + self.min[col]
    }
}

fn scale(x: f64, min: f64, range: f64) -> f64 {
    if range > 0.0 {
        (x - min) / range
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform() {
        let data = array![[1.0, 10.0, 5.0], [3.0, 20.0, 5.0], [2.0, 30.0, 5.0]];
        let scaler = MinMaxScaler::fit(data.view());
        let scaled = scaler.transform(data.view());

        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 1.0, 0.5]);
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 0.5, 1.0]);
        // constant column
        assert_eq!(scaled.column(2).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_round_trip() {
        let data = array![[101.5], [99.25], [130.0], [87.75]];
        let scaler = MinMaxScaler::fit(data.view());
        let restored = scaler.inverse_transform(scaler.transform(data.view()).view());

        for (a, b) in data.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        let v = scaler.transform_value(0, 115.0);
        assert!((scaler.inverse_value(0, v) - 115.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_inverts_to_constant() {
        let data = array![[4.0], [4.0]];
        let scaler = MinMaxScaler::fit(data.view());
        assert_eq!(scaler.inverse_value(0, 0.0), 4.0);
        assert_eq!(scaler.n_features(), 1);
    }
}
