use crate::api::error::{GemmError, GemmResult};
use crate::api::types::ErrorStats;

/// Compare `candidate` against `reference` element-wise, accumulating in `f64`.
///
/// Both buffers must be non-empty and of equal length. A NaN difference makes
/// `max_error` NaN, so [`ErrorStats::within`] fails.
pub fn measure_error(reference: &[f32], candidate: &[f32]) -> GemmResult<ErrorStats> {
    if reference.is_empty() {
        return Err(GemmError::InvalidShape(
            "cannot measure error on empty buffers".to_string(),
        ));
    }
    if candidate.len() != reference.len() {
        return Err(GemmError::shape("candidate", reference.len(), candidate.len()));
    }

    let mut sq_sum = 0.0f64;
    let mut abs_sum = 0.0f64;
    let mut max_error = 0.0f64;
    let mut max_reference = 0.0f64;
    for (&r, &c) in reference.iter().zip(candidate) {
        let diff = (r as f64 - c as f64).abs();
        sq_sum += diff * diff;
        abs_sum += diff;
        if diff.is_nan() || diff > max_error {
            max_error = diff;
        }
        max_reference = max_reference.max((r as f64).abs());
    }

    let count = reference.len() as f64;
    Ok(ErrorStats {
        mse: sq_sum / count,
        max_error,
        mean_abs_error: abs_sum / count,
        max_reference,
    })
}
