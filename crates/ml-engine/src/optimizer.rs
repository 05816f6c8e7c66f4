use ndarray::{Array, Dimension, Zip};

/// Adam with the bias correction folded into the step size.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    step: i32,
}

/// First and second moment estimates for one parameter tensor
#[derive(Debug, Clone)]
pub struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    pub fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
        }
    }

    /// Advances the step counter and returns the bias-corrected step size for
    /// this update.
    pub fn next_step(&mut self) -> f64 {
        self.step += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step);
        let correction2 = 1.0 - self.beta2.powi(self.step);
        self.learning_rate * correction2.sqrt() / correction1
    }

    pub fn update<D: Dimension>(
        &self,
        step_size: f64,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        moments: &mut Moments<D>,
    ) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        Zip::from(param)
            .and(grad)
            .and(&mut moments.m)
            .and(&mut moments.v)
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *p -= step_size * *m / (v.sqrt() + eps);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.1);
        let mut param = array![1.0, -2.0];
        let grad = array![0.5, -3.0];
        let mut moments = Moments::zeros_like(&param);

        let step = adam.next_step();
        adam.update(step, &mut param, &grad, &mut moments);

        // first bias-corrected update is lr * sign(g)
        assert!((param[0] - 0.9).abs() < 1e-6);
        assert!((param[1] + 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::new(0.05);
        let mut param = array![[3.0, -4.0]];
        let mut moments = Moments::zeros_like(&param);

        for _ in 0..500 {
            let grad = param.mapv(|p| 2.0 * p);
            let step = adam.next_step();
            adam.update(step, &mut param, &grad, &mut moments);
        }
        assert!(param.iter().all(|p| p.abs() < 0.05));
    }
}
