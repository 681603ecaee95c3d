//! Loss report printed by the `loss` command.
use ml::{der_mse, mse, Cost, LossPrecision, LossResult};
use std::fmt::Display;
use std::str::FromStr;

/// Softmax output of a digit classifier, used when no prediction is passed in
pub const DEFAULT_PREDICTED: [LossPrecision; 10] =
    [0.1, 0.31, 0., 0.004, 0.3, 0., 0.41, 0.2, 0.01, 0.];

/// One-hot label for the digit 6, used when no target is passed in
pub const DEFAULT_TARGET: [LossPrecision; 10] = [0., 0., 0., 0., 0., 0., 1., 0., 0., 0.];

/// A vector given on the command line, values separated by commas and/or whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(pub Vec<LossPrecision>);

impl Vector {
    pub fn as_slice(&self) -> &[LossPrecision] {
        &self.0
    }
}

impl FromStr for Vector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<LossPrecision>()
                    .map_err(|_| format!("{:?} is not a number", token))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Vector)
    }
}

/// Scores of a prediction against its target.
pub struct LossReport {
    pub mse: LossPrecision,
    pub der_mse: LossPrecision,
    /// Set when an additional cost other than MSE was requested
    pub extra: Option<(Cost, LossPrecision)>,
}

impl LossReport {
    pub fn new(
        predicted: &[LossPrecision],
        target: &[LossPrecision],
        cost: Cost,
    ) -> LossResult<LossReport> {
        let extra = match cost {
            Cost::Mse => None,
            other => Some((other, other.calculate(predicted, target)?)),
        };
        Ok(LossReport {
            mse: mse(predicted, target)?,
            der_mse: der_mse(predicted, target)?,
            extra,
        })
    }
}

impl Display for LossReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.mse, self.der_mse)?;
        if let Some((cost, value)) = &self.extra {
            write!(f, "\n{:?}: {}", cost, value)?;
        }
        Ok(())
    }
}
