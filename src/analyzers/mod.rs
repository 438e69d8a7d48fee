//! The analysis core: indicator normalization, the convergent weighting
//! engine behind the composite quality index, OLS regression with
//! significance diagnostics, backward stepwise elimination against the
//! critical-value tables, and one-step-ahead forecasting.
//!
//! Everything here is synchronous, CPU-bound, and pure with respect to its
//! inputs; independent analysis runs can proceed concurrently without any
//! shared state.

pub mod composite;
pub mod correlation;
pub mod forecast;
pub mod normalize;
pub mod regression;
pub mod stepwise;
pub mod tables;
pub mod types;
pub mod utility;
