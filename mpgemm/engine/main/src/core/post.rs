//! Post-processing on flattened `[M x N]` result buffers.
//!
//! All functions validate shapes before reading or writing any element.

use crate::api::error::{GemmError, GemmResult};
use crate::api::types::ActivationKind;

fn check_result(c: &[f32], m: usize, n: usize) -> GemmResult<()> {
    let expected = m.checked_mul(n).ok_or_else(|| {
        GemmError::InvalidShape(format!("{} x {} overflows usize", m, n))
    })?;
    if c.len() != expected {
        return Err(GemmError::shape("result", expected, c.len()));
    }
    Ok(())
}

/// Broadcast-add `bias[j]` to every row: returns `c[i*n + j] + bias[j]`.
pub fn add_bias(c: &[f32], m: usize, n: usize, bias: &[f32]) -> GemmResult<Vec<f32>> {
    let mut out = c.to_vec();
    add_bias_inplace(&mut out, m, n, bias)?;
    Ok(out)
}

/// In-place [`add_bias`].
pub fn add_bias_inplace(c: &mut [f32], m: usize, n: usize, bias: &[f32]) -> GemmResult<()> {
    check_result(c, m, n)?;
    if bias.len() != n {
        return Err(GemmError::shape("bias", n, bias.len()));
    }
    for row in c.chunks_mut(n) {
        for (x, &b) in row.iter_mut().zip(bias) {
            *x += b;
        }
    }
    Ok(())
}

/// Apply `kind` to every element, returning a fresh buffer.
pub fn apply_activation(c: &[f32], m: usize, n: usize, kind: ActivationKind) -> GemmResult<Vec<f32>> {
    let mut out = c.to_vec();
    apply_activation_inplace(&mut out, m, n, kind)?;
    Ok(out)
}

/// In-place [`apply_activation`].
pub fn apply_activation_inplace(c: &mut [f32], m: usize, n: usize, kind: ActivationKind) -> GemmResult<()> {
    check_result(c, m, n)?;
    match kind {
        ActivationKind::Identity => {}
        ActivationKind::ReLU => c.iter_mut().for_each(|x| *x = x.max(0.0)),
        ActivationKind::Sigmoid => c.iter_mut().for_each(|x| *x = sigmoid(*x)),
        ActivationKind::Tanh => c.iter_mut().for_each(|x| *x = x.tanh()),
        ActivationKind::Gelu => c.iter_mut().for_each(|x| *x = gelu(*x)),
        ActivationKind::Silu => c.iter_mut().for_each(|x| *x *= sigmoid(*x)),
    }
    Ok(())
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// GELU, tanh approximation.
#[inline]
fn gelu(x: f32) -> f32 {
    let sqrt_2_over_pi = (2.0f32 / std::f32::consts::PI).sqrt();
    0.5 * x * (1.0 + (sqrt_2_over_pi * (x + 0.044715 * x.powi(3))).tanh())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_bias_broadcasts_rows() {
        let c = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = add_bias(&c, 2, 3, &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(out, vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_add_bias_shape_errors() {
        let c = [0.0f32; 6];
        assert_eq!(
            add_bias(&c, 2, 3, &[1.0, 2.0]).unwrap_err(),
            GemmError::shape("bias", 3, 2)
        );
        assert_eq!(
            add_bias(&c, 2, 2, &[1.0, 2.0]).unwrap_err(),
            GemmError::shape("result", 4, 6)
        );
    }

    #[test]
    fn test_inplace_untouched_on_error() {
        let mut c = vec![1.0f32, -1.0];
        assert!(add_bias_inplace(&mut c, 1, 2, &[5.0]).is_err());
        assert!(apply_activation_inplace(&mut c, 2, 2, ActivationKind::ReLU).is_err());
        assert_eq!(c, vec![1.0, -1.0]);
    }

    #[test]
    fn test_relu() {
        let out = apply_activation(&[-1.0, 0.0, 2.0, -3.0], 2, 2, ActivationKind::ReLU).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_relu_idempotent() {
        let c = [-0.5, 3.0, 1e-3, -7.0, 0.0, 2.5];
        let once = apply_activation(&c, 3, 2, ActivationKind::ReLU).unwrap();
        let twice = apply_activation(&once, 3, 2, ActivationKind::ReLU).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_identity_is_noop() {
        let c = [-1.5, f32::MAX, 0.0, 42.0];
        assert_eq!(apply_activation(&c, 2, 2, ActivationKind::Identity).unwrap(), c.to_vec());
    }

    #[test]
    fn test_smooth_activations() {
        let c = [0.0f32, 2.0];
        let sig = apply_activation(&c, 1, 2, ActivationKind::Sigmoid).unwrap();
        assert!((sig[0] - 0.5).abs() < 1e-6);
        assert!((sig[1] - 0.880_797).abs() < 1e-5);

        let tanh = apply_activation(&c, 1, 2, ActivationKind::Tanh).unwrap();
        assert_eq!(tanh[0], 0.0);
        assert!((tanh[1] - 0.964_028).abs() < 1e-5);

        let gelu = apply_activation(&c, 1, 2, ActivationKind::Gelu).unwrap();
        assert_eq!(gelu[0], 0.0);
        assert!((gelu[1] - 1.954_597).abs() < 1e-4);

        let silu = apply_activation(&c, 1, 2, ActivationKind::Silu).unwrap();
        assert_eq!(silu[0], 0.0);
        assert!((silu[1] - 1.761_594).abs() < 1e-5);
    }
}
