//! Two stacked LSTM layers with dropout and a single linear output unit.

use analysis_core::AnalysisError;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, Ix1, Ix2};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::lstm::{dropout_mask, glorot, LayerGrads, LstmLayer};
use crate::optimizer::{Adam, Moments};

#[derive(Debug, Clone)]
pub struct SequenceModel {
    layer1: LstmLayer,
    layer2: LstmLayer,
    dense_w: Array1<f64>,
    dense_b: Array1<f64>,
    dropout: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

/// Loss history of one `fit` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub examples: usize,
    /// Mean squared error per epoch, on the scaled target
    pub losses: Vec<f64>,
    pub final_loss: f64,
}

struct ModelGrads {
    layer1: LayerGrads,
    layer2: LayerGrads,
    dense_w: Array1<f64>,
    dense_b: Array1<f64>,
}

impl ModelGrads {
    fn zeros_like(model: &SequenceModel) -> Self {
        Self {
            layer1: LayerGrads::zeros_like(&model.layer1),
            layer2: LayerGrads::zeros_like(&model.layer2),
            dense_w: Array1::zeros(model.dense_w.raw_dim()),
            dense_b: Array1::zeros(1),
        }
    }

    fn accumulate(&mut self, other: &ModelGrads) {
        self.layer1.accumulate(&other.layer1);
        self.layer2.accumulate(&other.layer2);
        self.dense_w += &other.dense_w;
        self.dense_b += &other.dense_b;
    }
}

struct LayerMoments {
    w_x: Moments<Ix2>,
    w_h: Moments<Ix2>,
    b: Moments<Ix1>,
}

impl LayerMoments {
    fn new(layer: &LstmLayer) -> Self {
        Self {
            w_x: Moments::zeros_like(&layer.w_x),
            w_h: Moments::zeros_like(&layer.w_h),
            b: Moments::zeros_like(&layer.b),
        }
    }

    fn apply(&mut self, adam: &Adam, step_size: f64, layer: &mut LstmLayer, grads: &LayerGrads) {
        let (w_x, w_h, b) = layer.params_mut();
        adam.update(step_size, w_x, &grads.w_x, &mut self.w_x);
        adam.update(step_size, w_h, &grads.w_h, &mut self.w_h);
        adam.update(step_size, b, &grads.b, &mut self.b);
    }
}

struct ModelMoments {
    layer1: LayerMoments,
    layer2: LayerMoments,
    dense_w: Moments<Ix1>,
    dense_b: Moments<Ix1>,
}

impl SequenceModel {
    pub fn new<R: Rng>(n_features: usize, hidden: usize, dropout: f64, rng: &mut R) -> Self {
        let layer1 = LstmLayer::new(n_features, hidden, rng);
        let layer2 = LstmLayer::new(hidden, hidden, rng);
        let dense_w = glorot(1, hidden, rng).remove_axis(Axis(0));

        Self {
            layer1,
            layer2,
            dense_w,
            dense_b: Array1::zeros(1),
            dropout,
        }
    }

    pub fn n_features(&self) -> usize {
        self.layer1.input_size()
    }

    pub fn hidden_units(&self) -> usize {
        self.layer1.hidden_size()
    }

    /// Scaled prediction for one `(L, F)` window. Dropout is not applied.
    pub fn predict(&self, window: ArrayView2<f64>) -> f64 {
        let first = self.layer1.forward(window);
        let second = self.layer2.forward(first.outputs());
        self.dense_w.dot(&second.last_output()) + self.dense_b[0]
    }

    /// Trains on `(N, L, F)` windows against `(N)` labels with mini-batch
    /// Adam on the mean squared error. Examples are reshuffled every epoch.
    pub fn fit<R: Rng>(
        &mut self,
        inputs: &Array3<f64>,
        labels: &Array1<f64>,
        options: &TrainingOptions,
        rng: &mut R,
    ) -> Result<TrainingReport, AnalysisError> {
        let n = inputs.len_of(Axis(0));
        if n == 0 || labels.len() != n {
            return Err(AnalysisError::InsufficientData {
                required: 1,
                available: n.min(labels.len()),
            });
        }

        let mut adam = Adam::new(options.learning_rate);
        let mut moments = ModelMoments {
            layer1: LayerMoments::new(&self.layer1),
            layer2: LayerMoments::new(&self.layer2),
            dense_w: Moments::zeros_like(&self.dense_w),
            dense_b: Moments::zeros_like(&self.dense_b),
        };

        let batch_size = options.batch_size.max(1);
        let mut order: Vec<usize> = (0..n).collect();
        let mut losses = Vec::with_capacity(options.epochs);

        for epoch in 0..options.epochs {
            order.shuffle(rng);
            let mut squared_error = 0.0;

            for batch in order.chunks(batch_size) {
                let scale = 2.0 / batch.len() as f64;
                let mut grads = ModelGrads::zeros_like(self);

                for &k in batch {
                    let window = inputs.index_axis(Axis(0), k);
                    let (example, err) = self.example_grads(window, labels[k], scale, rng);
                    grads.accumulate(&example);
                    squared_error += err * err;
                }

                self.apply(&grads, &mut adam, &mut moments);
            }

            let loss = squared_error / n as f64;
            tracing::debug!(epoch = epoch + 1, loss, "Epoch complete");
            losses.push(loss);
        }

        Ok(TrainingReport {
            epochs: options.epochs,
            examples: n,
            final_loss: losses.last().copied().unwrap_or(f64::NAN),
            losses,
        })
    }

    /// Gradients of `scale * (y - target)^2 / 2` for one window under fresh
    /// dropout masks. Returns the gradients and the prediction error.
    fn example_grads<R: Rng>(
        &self,
        window: ArrayView2<f64>,
        target: f64,
        scale: f64,
        rng: &mut R,
    ) -> (ModelGrads, f64) {
        let hidden = self.hidden_units();

        let first = self.layer1.forward(window);
        let mask1 = dropout_mask(first.outputs().raw_dim(), self.dropout, rng);
        let dropped1 = &first.outputs() * &mask1;

        let second = self.layer2.forward(dropped1.view());
        let mask2 = dropout_mask(Ix1(hidden), self.dropout, rng);
        let dropped2 = &second.last_output() * &mask2;

        let err = self.dense_w.dot(&dropped2) + self.dense_b[0] - target;
        let dy = scale * err;

        let d_last = &self.dense_w * dy * &mask2;
        let steps = window.nrows();
        let mut dh2 = Array2::zeros((steps, hidden));
        dh2.row_mut(steps - 1).assign(&d_last);

        let (layer2, dx2) = self.layer2.backward(&second, dh2.view());
        let dh1 = dx2 * &mask1;
        let (layer1, _) = self.layer1.backward(&first, dh1.view());

        let grads = ModelGrads {
            layer1,
            layer2,
            dense_w: dropped2 * dy,
            dense_b: Array1::from_elem(1, dy),
        };
        (grads, err)
    }

    fn apply(&mut self, grads: &ModelGrads, adam: &mut Adam, moments: &mut ModelMoments) {
        let step_size = adam.next_step();
        moments.layer1.apply(adam, step_size, &mut self.layer1, &grads.layer1);
        moments.layer2.apply(adam, step_size, &mut self.layer2, &grads.layer2);
        adam.update(step_size, &mut self.dense_w, &grads.dense_w, &mut moments.dense_w);
        adam.update(step_size, &mut self.dense_b, &grads.dense_b, &mut moments.dense_b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // windows of a rising ramp, label is the next ramp value
    fn ramp(n: usize, lookback: usize) -> (Array3<f64>, Array1<f64>) {
        let total = n + lookback;
        let value = |i: usize| i as f64 / total as f64;
        let inputs = Array3::from_shape_fn((n, lookback, 2), |(k, t, f)| {
            if f == 0 {
                value(k + t)
            } else {
                0.5
            }
        });
        let labels = Array1::from_shape_fn(n, |k| value(k + lookback));
        (inputs, labels)
    }

    #[test]
    fn test_predict_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = SequenceModel::new(2, 6, 0.2, &mut rng);
        let (inputs, _) = ramp(4, 5);
        let window = inputs.index_axis(Axis(0), 2);
        assert_eq!(model.predict(window), model.predict(window));
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.hidden_units(), 6);
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = SequenceModel::new(2, 8, 0.0, &mut rng);
        let (inputs, labels) = ramp(24, 6);
        let options = TrainingOptions {
            epochs: 150,
            batch_size: 8,
            learning_rate: 0.01,
        };

        let report = model.fit(&inputs, &labels, &options, &mut rng).unwrap();
        assert_eq!(report.losses.len(), 150);
        assert_eq!(report.examples, 24);
        assert!(report.final_loss < report.losses[0]);
        assert!(report.final_loss < 0.03);
    }

    #[test]
    fn test_fit_with_dropout_stays_finite() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut model = SequenceModel::new(2, 4, 0.2, &mut rng);
        let (inputs, labels) = ramp(10, 4);
        let options = TrainingOptions {
            epochs: 5,
            batch_size: 32,
            learning_rate: 0.001,
        };

        let report = model.fit(&inputs, &labels, &options, &mut rng).unwrap();
        assert!(report.losses.iter().all(|l| l.is_finite()));
        assert!(model.predict(inputs.index_axis(Axis(0), 0)).is_finite());
    }

    #[test]
    fn test_fit_without_examples() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut model = SequenceModel::new(2, 4, 0.2, &mut rng);
        let options = TrainingOptions {
            epochs: 1,
            batch_size: 1,
            learning_rate: 0.001,
        };
        let err = model
            .fit(&Array3::zeros((0, 4, 2)), &Array1::zeros(0), &options, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { available: 0, .. }));
    }
}
