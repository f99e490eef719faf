use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::error::{GemmError, GemmResult};

/// Global threshold (output rows) at which backends switch from a sequential row
/// loop to rayon row chunks.
pub(crate) static PAR_ROWS_THRESHOLD: AtomicUsize = AtomicUsize::new(64);

/// Current row threshold for parallel execution.
pub(crate) fn par_rows_threshold() -> usize {
    PAR_ROWS_THRESHOLD.load(Ordering::Relaxed)
}

/// Runtime configuration for parallelism and thread management.
///
/// Parallel execution never changes results: every output cell is produced by one
/// lane with the same summation order as the sequential path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of rayon threads. 0 means auto-detect (use all available cores).
    pub num_threads: usize,
    /// Output row count below which backends stay sequential (default 64).
    pub par_rows_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            par_rows_threshold: 64,
        }
    }
}

impl RuntimeConfig {
    /// Apply this runtime configuration globally.
    ///
    /// Writes the row threshold to a global atomic and, when `num_threads > 0`,
    /// builds rayon's global thread pool. The pool can only be built once per
    /// process; a second attempt is reported as a configuration error.
    pub fn apply(&self) -> GemmResult<()> {
        if self.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .map_err(|e| {
                    GemmError::Configuration(format!("Failed to set rayon thread pool: {}", e))
                })?;
        }

        PAR_ROWS_THRESHOLD.store(self.par_rows_threshold, Ordering::Relaxed);

        log::debug!(
            "[runtime] SIMD: {}, rayon threads: {}, par_rows_threshold: {}",
            Self::detect_simd(),
            rayon::current_num_threads(),
            self.par_rows_threshold
        );
        Ok(())
    }

    /// Detect the SIMD instruction set the LUT kernels dispatch to.
    pub fn detect_simd() -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return "AVX2";
            }
            if is_x86_feature_detected!("sse2") {
                return "SSE2";
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            // NEON is always available on aarch64
            return "NEON";
        }
        #[allow(unreachable_code)]
        "scalar"
    }
}

/// Optimization profiles for A/B benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptProfile {
    /// Default thresholds.
    Optimized,
    /// Parallel paths disabled (threshold set to MAX).
    Baseline,
    /// Lower threshold (8 rows) for aggressive parallelism.
    Aggressive,
}

impl OptProfile {
    /// Build a `RuntimeConfig` matching this profile.
    pub fn runtime_config(&self) -> RuntimeConfig {
        match self {
            OptProfile::Optimized => RuntimeConfig::default(),
            OptProfile::Baseline => RuntimeConfig {
                par_rows_threshold: usize::MAX,
                ..RuntimeConfig::default()
            },
            OptProfile::Aggressive => RuntimeConfig {
                par_rows_threshold: 8,
                ..RuntimeConfig::default()
            },
        }
    }

    /// Whether any parallel path can be taken under this profile.
    pub fn is_parallel(&self) -> bool {
        *self != OptProfile::Baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.num_threads, 0);
        assert_eq!(config.par_rows_threshold, 64);
    }

    #[test]
    fn test_detect_simd() {
        let simd = RuntimeConfig::detect_simd();
        assert!(!simd.is_empty());
    }

    #[test]
    fn test_opt_profile_baseline() {
        let p = OptProfile::Baseline;
        assert_eq!(p.runtime_config().par_rows_threshold, usize::MAX);
        assert!(!p.is_parallel());
    }

    #[test]
    fn test_opt_profile_aggressive() {
        let p = OptProfile::Aggressive;
        assert_eq!(p.runtime_config().par_rows_threshold, 8);
        assert!(p.is_parallel());
        assert_eq!(OptProfile::Optimized.runtime_config(), RuntimeConfig::default());
    }
}
