use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<()> {
    ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf))
        .then_some(())
        .ok_or_else(|| Error::Configuration(String::from("`vi - vf` must have same sign as `rate`")))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> * f<sup>floor(t)</sup>, v<sub>f</sub>)
///
/// Decays by a constant factor once per unit of time, never dropping below the floor
#[derive(Debug, Clone, PartialEq)]
pub struct Multiplicative {
    factor: f32,
    vi: f32,
    vf: f32,
}

impl Multiplicative {
    /// **Errors** if `factor` is not in `(0, 1]` or if `vi` is less than `vf`
    pub fn new(factor: f32, vi: f32, vf: f32) -> Result<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(Error::Configuration(format!(
                "decay factor must be in (0, 1], got {factor}"
            )));
        }
        validate(1.0 - factor, vi, vf)?;
        Ok(Self { factor, vi, vf })
    }
}

impl Decay for Multiplicative {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { factor, vi, vf } = self;
        (vi * factor.powf(t.floor())).max(vf)
    }
}
