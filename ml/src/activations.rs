//! Activation functions of a small feed forward digit classifier, together with their
//! elementwise derivatives.
//!
//! All functions work on arrays of any dimension. Softmax normalizes over all elements
//! of the array, so pass it the output vector of a single sample.
use crate::ImagePrecision;
use ndarray::{Array, Dimension};

/// Constants of the self normalizing ELU, Klambauer et al. 2017, https://arxiv.org/abs/1706.02515
const SELU_ALPHA: ImagePrecision = 1.673_263_2;
const SELU_LAMBDA: ImagePrecision = 1.050_701;

/// sqrt(2 / π), used by the tanh approximation of GELU
const GELU_C: ImagePrecision = 0.797_884_6;
const GELU_CUBIC: ImagePrecision = 0.044_715;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Sigmoid,
    Relu,
    LeakyRelu { a: ImagePrecision },
    Tanh,
    Softmax,
    SoftPlus,
    SoftSign,
    Elu { a: ImagePrecision },
    Selu,
    Gelu,
}

fn sigmoid(x: ImagePrecision) -> ImagePrecision {
    1. / (1. + (-x).exp())
}

/// Softmax over all elements, shifted by the maximum to keep exp from overflowing
pub fn softmax<D: Dimension>(data: &Array<ImagePrecision, D>) -> Array<ImagePrecision, D> {
    let max = data.fold(ImagePrecision::NEG_INFINITY, |m, &x| m.max(x));
    let ex = data.mapv(|x| (x - max).exp());
    let sum = ex.sum();
    ex / sum
}

impl Activation {
    pub fn activate<D: Dimension>(&self, data: &Array<ImagePrecision, D>) -> Array<ImagePrecision, D> {
        match *self {
            Activation::Sigmoid => data.mapv(sigmoid),
            Activation::Relu => data.mapv(|x| if x > 0. { x } else { 0. }),
            Activation::LeakyRelu { a } => data.mapv(|x| if x >= 0. { x } else { a * x }),
            Activation::Tanh => data.mapv(ImagePrecision::tanh),
            Activation::Softmax => softmax(data),
            Activation::SoftPlus => data.mapv(|x| x.exp().ln_1p()),
            Activation::SoftSign => data.mapv(|x| x / (x.abs() + 1.)),
            Activation::Elu { a } => data.mapv(|x| if x > 0. { x } else { a * x.exp_m1() }),
            Activation::Selu => data.mapv(|x| {
                if x > 0. {
                    SELU_LAMBDA * x
                } else {
                    SELU_LAMBDA * SELU_ALPHA * x.exp_m1()
                }
            }),
            Activation::Gelu => {
                data.mapv(|x| 0.5 * x * (1. + (GELU_C * (x + GELU_CUBIC * x.powi(3))).tanh()))
            }
        }
    }

    /// Elementwise derivative w.r.t. the input.
    ///
    /// Relu and leaky relu take the right hand derivative at 0 for relu (0)
    /// and the left hand one for leaky relu (a). Softmax returns the diagonal of its Jacobian,
    /// s (1 - s).
    pub fn derivate<D: Dimension>(&self, data: &Array<ImagePrecision, D>) -> Array<ImagePrecision, D> {
        match *self {
            Activation::Sigmoid => data.mapv(|x| {
                let s = sigmoid(x);
                s * (1. - s)
            }),
            Activation::Relu => data.mapv(|x| if x > 0. { 1. } else { 0. }),
            Activation::LeakyRelu { a } => data.mapv(|x| if x > 0. { 1. } else { a }),
            Activation::Tanh => data.mapv(|x| 1. - x.tanh().powi(2)),
            Activation::Softmax => softmax(data).mapv(|s| s * (1. - s)),
            // derivative of softplus is sigmoid
            Activation::SoftPlus => data.mapv(sigmoid),
            Activation::SoftSign => data.mapv(|x| 1. / (x.abs() + 1.).powi(2)),
            Activation::Elu { a } => data.mapv(|x| if x > 0. { 1. } else { a * x.exp() }),
            Activation::Selu => data.mapv(|x| {
                if x > 0. {
                    SELU_LAMBDA
                } else {
                    SELU_LAMBDA * SELU_ALPHA * x.exp()
                }
            }),
            Activation::Gelu => data.mapv(|x| {
                let inner = GELU_C * (x + GELU_CUBIC * x.powi(3));
                let sech2 = 1. - inner.tanh().powi(2);
                0.5 * (1. + inner.tanh())
                    + 0.5 * x * sech2 * GELU_C * (1. + 3. * GELU_CUBIC * x.powi(2))
            }),
        }
    }
}
