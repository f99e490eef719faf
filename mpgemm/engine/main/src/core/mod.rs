pub mod engine;
pub mod levels;
pub mod lut;
pub mod matrix;
pub mod metrics;
pub mod naive;
pub mod post;
pub mod runtime;
pub mod simd;
