/// SIMD row kernels for the LUT backend.
///
/// Uses `std::arch` target-specific intrinsics with scalar fallbacks.
/// Every lane performs exactly one IEEE multiply or add, so results are
/// bit-identical across dispatch targets.
///
/// Dispatch hierarchy:
/// - x86_64: AVX2 (8 f32/op) -> SSE2 (4 f32/op) -> scalar tail
/// - aarch64: NEON (4 f32/op) -> scalar tail
/// - Other: scalar

/// Scalar `dst[j] += src[j]`.
fn add_assign_scalar(dst: &mut [f32], src: &[f32]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d += s;
    }
}

/// Scalar `dst[j] = src[j] * factor`.
fn scale_into_scalar(dst: &mut [f32], src: &[f32], factor: f32) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = s * factor;
    }
}

// --- x86_64 SIMD implementations ---

#[cfg(target_arch = "x86_64")]
mod x86 {
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn add_assign_avx2(dst: &mut [f32], src: &[f32]) {
        use std::arch::x86_64::*;

        let n = dst.len().min(src.len());
        let mut j = 0;
        while j + 8 <= n {
            let d = _mm256_loadu_ps(dst.as_ptr().add(j));
            let s = _mm256_loadu_ps(src.as_ptr().add(j));
            _mm256_storeu_ps(dst.as_mut_ptr().add(j), _mm256_add_ps(d, s));
            j += 8;
        }
        super::add_assign_scalar(&mut dst[j..n], &src[j..n]);
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn scale_into_avx2(dst: &mut [f32], src: &[f32], factor: f32) {
        use std::arch::x86_64::*;

        let n = dst.len().min(src.len());
        let f = _mm256_set1_ps(factor);
        let mut j = 0;
        while j + 8 <= n {
            let s = _mm256_loadu_ps(src.as_ptr().add(j));
            _mm256_storeu_ps(dst.as_mut_ptr().add(j), _mm256_mul_ps(s, f));
            j += 8;
        }
        super::scale_into_scalar(&mut dst[j..n], &src[j..n], factor);
    }

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn add_assign_sse2(dst: &mut [f32], src: &[f32]) {
        use std::arch::x86_64::*;

        let n = dst.len().min(src.len());
        let mut j = 0;
        while j + 4 <= n {
            let d = _mm_loadu_ps(dst.as_ptr().add(j));
            let s = _mm_loadu_ps(src.as_ptr().add(j));
            _mm_storeu_ps(dst.as_mut_ptr().add(j), _mm_add_ps(d, s));
            j += 4;
        }
        super::add_assign_scalar(&mut dst[j..n], &src[j..n]);
    }

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn scale_into_sse2(dst: &mut [f32], src: &[f32], factor: f32) {
        use std::arch::x86_64::*;

        let n = dst.len().min(src.len());
        let f = _mm_set1_ps(factor);
        let mut j = 0;
        while j + 4 <= n {
            let s = _mm_loadu_ps(src.as_ptr().add(j));
            _mm_storeu_ps(dst.as_mut_ptr().add(j), _mm_mul_ps(s, f));
            j += 4;
        }
        super::scale_into_scalar(&mut dst[j..n], &src[j..n], factor);
    }
}

// --- aarch64 SIMD implementations ---

#[cfg(target_arch = "aarch64")]
mod arm {
    pub(super) unsafe fn add_assign_neon(dst: &mut [f32], src: &[f32]) {
        use std::arch::aarch64::*;

        let n = dst.len().min(src.len());
        let mut j = 0;
        while j + 4 <= n {
            let d = vld1q_f32(dst.as_ptr().add(j));
            let s = vld1q_f32(src.as_ptr().add(j));
            vst1q_f32(dst.as_mut_ptr().add(j), vaddq_f32(d, s));
            j += 4;
        }
        super::add_assign_scalar(&mut dst[j..n], &src[j..n]);
    }

    pub(super) unsafe fn scale_into_neon(dst: &mut [f32], src: &[f32], factor: f32) {
        use std::arch::aarch64::*;

        let n = dst.len().min(src.len());
        let f = vdupq_n_f32(factor);
        let mut j = 0;
        while j + 4 <= n {
            let s = vld1q_f32(src.as_ptr().add(j));
            vst1q_f32(dst.as_mut_ptr().add(j), vmulq_f32(s, f));
            j += 4;
        }
        super::scale_into_scalar(&mut dst[j..n], &src[j..n], factor);
    }
}

// --- Public dispatch functions ---

/// Runtime-dispatched `dst[j] += src[j]` over `min(dst.len(), src.len())` lanes.
pub(crate) fn add_assign(dst: &mut [f32], src: &[f32]) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86::add_assign_avx2(dst, src) };
        }
        return unsafe { x86::add_assign_sse2(dst, src) };
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { arm::add_assign_neon(dst, src) };
    }

    #[allow(unreachable_code)]
    add_assign_scalar(dst, src)
}

/// Runtime-dispatched `dst[j] = src[j] * factor` over `min(dst.len(), src.len())` lanes.
pub(crate) fn scale_into(dst: &mut [f32], src: &[f32], factor: f32) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86::scale_into_avx2(dst, src, factor) };
        }
        return unsafe { x86::scale_into_sse2(dst, src, factor) };
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { arm::scale_into_neon(dst, src, factor) };
    }

    #[allow(unreachable_code)]
    scale_into_scalar(dst, src, factor)
}

/// Scalar-only row add (for testing).
#[cfg(test)]
pub fn add_assign_scalar_ref(dst: &mut [f32], src: &[f32]) {
    add_assign_scalar(dst, src)
}

/// Scalar-only row scale (for testing).
#[cfg(test)]
pub fn scale_into_scalar_ref(dst: &mut [f32], src: &[f32], factor: f32) {
    scale_into_scalar(dst, src, factor)
}
