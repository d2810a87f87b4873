//! # Stats
//!
//! $$
//! \hat\mu = \frac1n\sum_i x_i,\qquad s^2 = \frac{1}{n-1}\sum_i (x_i - \hat\mu)^2
//! $$
//!
pub mod descriptive;
