//! Single LSTM layer with exact backpropagation through time.
//!
//! Gate pre-activations are stacked in one `4H` vector in the order input,
//! forget, cell candidate, output.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct LstmLayer {
    /// `(4H, I)` input kernel
    pub w_x: Array2<f64>,
    /// `(4H, H)` recurrent kernel
    pub w_h: Array2<f64>,
    /// `(4H)` bias
    pub b: Array1<f64>,
    hidden: usize,
}

/// Activations recorded by a forward pass, consumed by `backward`
#[derive(Debug, Clone)]
pub struct LayerCache {
    /// `(T, I)` inputs
    x: Array2<f64>,
    /// `(T + 1, H)` hidden states, row 0 is the zero initial state
    pub h: Array2<f64>,
    /// `(T + 1, H)` cell states, row 0 is the zero initial state
    c: Array2<f64>,
    /// `(T, 4H)` activated gates
    gates: Array2<f64>,
}

impl LayerCache {
    /// Hidden state after each step, `(T, H)`.
    pub fn outputs(&self) -> ArrayView2<'_, f64> {
        self.h.slice(s![1.., ..])
    }

    pub fn last_output(&self) -> ArrayView1<'_, f64> {
        self.h.row(self.h.nrows() - 1)
    }
}

#[derive(Debug, Clone)]
pub struct LayerGrads {
    pub w_x: Array2<f64>,
    pub w_h: Array2<f64>,
    pub b: Array1<f64>,
}

impl LayerGrads {
    pub fn zeros_like(layer: &LstmLayer) -> Self {
        Self {
            w_x: Array2::zeros(layer.w_x.raw_dim()),
            w_h: Array2::zeros(layer.w_h.raw_dim()),
            b: Array1::zeros(layer.b.raw_dim()),
        }
    }

    pub fn accumulate(&mut self, other: &LayerGrads) {
        self.w_x += &other.w_x;
        self.w_h += &other.w_h;
        self.b += &other.b;
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot-uniform matrix of shape `(fan_out, fan_in)`.
pub(crate) fn glorot<R: Rng>(fan_out: usize, fan_in: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::random_using((fan_out, fan_in), Uniform::new_inclusive(-limit, limit), rng)
}

impl LstmLayer {
    pub fn new<R: Rng>(input_size: usize, hidden: usize, rng: &mut R) -> Self {
        let mut b = Array1::zeros(4 * hidden);
        // forget gate starts open
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        Self {
            w_x: glorot(4 * hidden, input_size, rng),
            w_h: glorot(4 * hidden, hidden, rng),
            b,
            hidden,
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    pub fn input_size(&self) -> usize {
        self.w_x.ncols()
    }

    /// Runs the layer over a `(T, I)` sequence from a zero state.
    pub fn forward(&self, x: ArrayView2<f64>) -> LayerCache {
        let steps = x.nrows();
        let hd = self.hidden;

        let projected = x.dot(&self.w_x.t()) + &self.b;
        let mut h = Array2::<f64>::zeros((steps + 1, hd));
        let mut c = Array2::<f64>::zeros((steps + 1, hd));
        let mut gates = Array2::<f64>::zeros((steps, 4 * hd));

        for t in 0..steps {
            let z = &projected.row(t) + &self.w_h.dot(&h.row(t));
            let mut gate = gates.row_mut(t);
            for k in 0..4 * hd {
                gate[k] = if (2 * hd..3 * hd).contains(&k) {
                    z[k].tanh()
                } else {
                    sigmoid(z[k])
                };
            }

            for k in 0..hd {
                let (i, f, g, o) = (gate[k], gate[hd + k], gate[2 * hd + k], gate[3 * hd + k]);
                let cell = f * c[[t, k]] + i * g;
                c[[t + 1, k]] = cell;
                h[[t + 1, k]] = o * cell.tanh();
            }
        }

        LayerCache {
            x: x.to_owned(),
            h,
            c,
            gates,
        }
    }

    /// Backpropagates `dh`, the loss gradient w.r.t. each step's hidden
    /// output `(T, H)`. Returns the parameter gradients and the gradient
    /// w.r.t. the inputs `(T, I)`.
    pub fn backward(&self, cache: &LayerCache, dh: ArrayView2<f64>) -> (LayerGrads, Array2<f64>) {
        let steps = cache.x.nrows();
        let hd = self.hidden;

        let mut dz = Array2::zeros((steps, 4 * hd));
        let mut dh_next = Array1::<f64>::zeros(hd);
        let mut dc_next = Array1::<f64>::zeros(hd);

        for t in (0..steps).rev() {
            let gate = cache.gates.row(t);
            let mut dz_t = dz.row_mut(t);

            for k in 0..hd {
                let (i, f, g, o) = (gate[k], gate[hd + k], gate[2 * hd + k], gate[3 * hd + k]);
                let c_prev = cache.c[[t, k]];
                let tanh_c = cache.c[[t + 1, k]].tanh();

                let dh_k = dh[[t, k]] + dh_next[k];
                let dc = dh_k * o * (1.0 - tanh_c * tanh_c) + dc_next[k];

                dz_t[k] = dc * g * i * (1.0 - i);
                dz_t[hd + k] = dc * c_prev * f * (1.0 - f);
                dz_t[2 * hd + k] = dc * i * (1.0 - g * g);
                dz_t[3 * hd + k] = dh_k * tanh_c * o * (1.0 - o);

                dc_next[k] = dc * f;
            }

            dh_next = self.w_h.t().dot(&dz_t);
        }

        let grads = LayerGrads {
            w_x: dz.t().dot(&cache.x),
            w_h: dz.t().dot(&cache.h.slice(s![..steps, ..])),
            b: dz.sum_axis(Axis(0)),
        };
        let dx = dz.dot(&self.w_x);
        (grads, dx)
    }

    pub(crate) fn params_mut(&mut self) -> (&mut Array2<f64>, &mut Array2<f64>, &mut Array1<f64>) {
        (&mut self.w_x, &mut self.w_h, &mut self.b)
    }
}

/// Inverted dropout: zeroes each element with probability `rate` and scales
/// survivors by `1 / (1 - rate)`.
pub(crate) fn dropout_mask<R: Rng, D: ndarray::Dimension>(
    shape: D,
    rate: f64,
    rng: &mut R,
) -> ndarray::Array<f64, D> {
    let keep = 1.0 - rate;
    let mut mask = ndarray::Array::zeros(shape);
    if keep >= 1.0 {
        mask.fill(1.0);
        return mask;
    }
    Zip::from(&mut mask).for_each(|m| {
        *m = if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 };
    });
    mask
}
