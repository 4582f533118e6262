use super::noise::NoiseEstimatorType;
use crate::core::base::*;
use crate::core::error::*;
use crate::core::param_set::*;

/// Batch rendering halt criteria. A zero value disables a criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct HaltConditions {
    pub spp: u32,
    pub time: f64,
    pub threshold: Float,
    pub threshold_step: u32,
    pub estimator: NoiseEstimatorType,
}

impl Default for HaltConditions {
    fn default() -> Self {
        HaltConditions {
            spp: 0,
            time: 0.0,
            threshold: 0.0,
            threshold_step: 16,
            estimator: NoiseEstimatorType::ConvTest,
        }
    }
}

impl HaltConditions {
    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        let spp = props.find_one_int("batch.haltspp", 0);
        let time = props.find_one_double("batch.halttime", 0.0);
        let threshold = props.find_one_float("batch.haltthreshold", 0.0);
        let step = props.find_one_int("batch.haltthreshold.step", 16);
        let estimator = NoiseEstimatorType::from_name(
            &props.find_one_string("batch.haltthreshold.estimator", "CONVTEST"),
        )?;
        if spp < 0 {
            return Err(RenderError::Config(format!("batch.haltspp must be >= 0: {}", spp)));
        }
        if time < 0.0 || time.is_nan() {
            return Err(RenderError::Config(format!("batch.halttime must be >= 0: {}", time)));
        }
        if threshold < 0.0 || threshold.is_nan() {
            return Err(RenderError::Config(format!(
                "batch.haltthreshold must be >= 0: {}",
                threshold
            )));
        }
        if step <= 0 {
            return Err(RenderError::Config(format!(
                "batch.haltthreshold.step must be > 0: {}",
                step
            )));
        }
        Ok(HaltConditions {
            spp: spp as u32,
            time,
            threshold,
            threshold_step: step as u32,
            estimator,
        })
    }

    pub fn is_enabled(&self) -> bool {
        return self.spp > 0 || self.time > 0.0 || self.threshold > 0.0;
    }
}

/// Progress of a criterion whose value grows toward `target`. Exactly 1.0 only
/// once the target is reached.
#[inline]
pub fn criterion_progress(value: f64, target: f64) -> Float {
    if value >= target {
        return 1.0;
    }
    if value <= 0.0 {
        return 0.0;
    }
    return Float::min((value / target) as Float, ONE_MINUS_EPSILON);
}
