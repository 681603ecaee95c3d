//! Cost functions comparing a predicted vector against a target vector.
//!
//! All functions accept anything that can be viewed as a one dimensional array
//! (slices, `Vec`s, `Array1`, views), and refuse to compute anything when the lengths differ.
use crate::LossPrecision;
use ndarray::{Array1, ArrayView1, AsArray, Ix1};
use thiserror::Error;

pub type LossResult<T> = Result<T, LossError>;

#[derive(Error, Debug, PartialEq)]
pub enum LossError {
    #[error("Predicted vector has length {predicted}, target vector has length {target}.")]
    LengthMismatch { predicted: usize, target: usize },
    #[error("Cannot average over empty input.")]
    EmptyInput,
    #[error("Got {predicted} predicted samples but {target} target samples.")]
    BatchMismatch { predicted: usize, target: usize },
}

/// Predictions are clipped to [EPS, 1 - EPS] before taking logarithms
const EPS: LossPrecision = 1e-15;

fn check_lengths<'a>(
    predicted: &ArrayView1<'a, LossPrecision>,
    target: &ArrayView1<'a, LossPrecision>,
) -> LossResult<()> {
    if predicted.len() != target.len() {
        return Err(LossError::LengthMismatch {
            predicted: predicted.len(),
            target: target.len(),
        });
    }
    if predicted.is_empty() {
        return Err(LossError::EmptyInput);
    }
    Ok(())
}

/// Mean squared error, 1/n Σ (yᵢ - ŷᵢ)²
pub fn mse<'a, P, T>(predicted: P, target: T) -> LossResult<LossPrecision>
where
    P: AsArray<'a, LossPrecision, Ix1>,
    T: AsArray<'a, LossPrecision, Ix1>,
{
    let predicted: ArrayView1<LossPrecision> = predicted.into();
    let target: ArrayView1<LossPrecision> = target.into();
    check_lengths(&predicted, &target)?;

    let error = &target - &predicted;
    error.mapv(|e| e.powi(2)).mean().ok_or(LossError::EmptyInput)
}

/// Averaged derivative of the mean squared error w.r.t. the prediction,
/// 1/n Σ -2 (yᵢ - ŷᵢ)
pub fn der_mse<'a, P, T>(predicted: P, target: T) -> LossResult<LossPrecision>
where
    P: AsArray<'a, LossPrecision, Ix1>,
    T: AsArray<'a, LossPrecision, Ix1>,
{
    let predicted: ArrayView1<LossPrecision> = predicted.into();
    let target: ArrayView1<LossPrecision> = target.into();
    check_lengths(&predicted, &target)?;

    let error = -2. * (&target - &predicted);
    error.mean().ok_or(LossError::EmptyInput)
}

fn clip(predicted: &ArrayView1<LossPrecision>) -> Array1<LossPrecision> {
    predicted.mapv(|p| p.clamp(EPS, 1. - EPS))
}

/// Selects the cost used to score a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cost {
    Mse,
    CategoricalCrossEntropy,
}

impl Cost {
    /// Scalar cost of a single prediction.
    ///
    /// Categorical cross entropy is -Σ yᵢ ln(ŷᵢ), with ŷ clipped away from 0 and 1.
    pub fn calculate<'a, P, T>(&self, predicted: P, target: T) -> LossResult<LossPrecision>
    where
        P: AsArray<'a, LossPrecision, Ix1>,
        T: AsArray<'a, LossPrecision, Ix1>,
    {
        let predicted: ArrayView1<LossPrecision> = predicted.into();
        let target: ArrayView1<LossPrecision> = target.into();
        match self {
            Cost::Mse => mse(predicted, target),
            Cost::CategoricalCrossEntropy => {
                check_lengths(&predicted, &target)?;
                let log_p = clip(&predicted).mapv(LossPrecision::ln);
                Ok(-(&target * &log_p).sum())
            }
        }
    }

    /// Averaged derivative of the cost w.r.t. the prediction.
    ///
    /// For categorical cross entropy this is 1/n Σ -yᵢ / ŷᵢ.
    pub fn derivate<'a, P, T>(&self, predicted: P, target: T) -> LossResult<LossPrecision>
    where
        P: AsArray<'a, LossPrecision, Ix1>,
        T: AsArray<'a, LossPrecision, Ix1>,
    {
        let predicted: ArrayView1<LossPrecision> = predicted.into();
        let target: ArrayView1<LossPrecision> = target.into();
        match self {
            Cost::Mse => der_mse(predicted, target),
            Cost::CategoricalCrossEntropy => {
                check_lengths(&predicted, &target)?;
                let grad = -(&target / &clip(&predicted));
                grad.mean().ok_or(LossError::EmptyInput)
            }
        }
    }

    /// Mean cost over a batch of samples.
    pub fn calculate_batch(
        &self,
        predicted: &[Array1<LossPrecision>],
        target: &[Array1<LossPrecision>],
    ) -> LossResult<LossPrecision> {
        check_batch(predicted, target)?;

        let mut total = 0.;
        for (p, t) in predicted.iter().zip(target) {
            total += self.calculate(p, t)?;
        }
        Ok(total / predicted.len() as LossPrecision)
    }

    /// Mean derivative over a batch of samples.
    pub fn derivate_batch(
        &self,
        predicted: &[Array1<LossPrecision>],
        target: &[Array1<LossPrecision>],
    ) -> LossResult<LossPrecision> {
        check_batch(predicted, target)?;

        let mut total = 0.;
        for (p, t) in predicted.iter().zip(target) {
            total += self.derivate(p, t)?;
        }
        Ok(total / predicted.len() as LossPrecision)
    }
}

fn check_batch(
    predicted: &[Array1<LossPrecision>],
    target: &[Array1<LossPrecision>],
) -> LossResult<()> {
    if predicted.len() != target.len() {
        return Err(LossError::BatchMismatch {
            predicted: predicted.len(),
            target: target.len(),
        });
    }
    if predicted.is_empty() {
        return Err(LossError::EmptyInput);
    }
    Ok(())
}

impl std::str::FromStr for Cost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mse" => Ok(Cost::Mse),
            "cross-entropy" | "cce" => Ok(Cost::CategoricalCrossEntropy),
            _ => Err(format!(
                "Unknown cost {:?}, expected one of: mse, cross-entropy",
                s
            )),
        }
    }
}
