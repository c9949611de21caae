//! Comparison mode: several calculators, one n, cross-checked results.
//!
//! Each calculator gets its own progress slot and its own arena; the
//! reclaim controller admits at most one of them (the rest run without it).
//! Disagreement between algorithms is an implementation bug and surfaces as
//! `Internal`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use num_bigint::BigUint;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::calculator::Calculator;
use crate::context::CalcContext;
use crate::error::FibError;
use crate::observer::ProgressObserver;
use crate::options::Options;

/// Outcome of one calculator in a comparison run.
#[derive(Debug)]
pub struct CalculationResult {
    /// Algorithm name.
    pub algorithm: String,
    /// The computed value, if the run succeeded.
    pub value: Option<BigUint>,
    /// Wall time of the run.
    pub duration: Duration,
    /// The failure, if the run did not succeed.
    pub error: Option<FibError>,
}

impl CalculationResult {
    fn from_outcome(
        algorithm: &str,
        outcome: Result<BigUint, FibError>,
        duration: Duration,
    ) -> Self {
        match outcome {
            Ok(value) => Self {
                algorithm: algorithm.to_string(),
                value: Some(value),
                duration,
                error: None,
            },
            Err(error) => Self {
                algorithm: algorithm.to_string(),
                value: None,
                duration,
                error: Some(error),
            },
        }
    }
}

/// Run every calculator on the same n concurrently.
///
/// `calc_index` is the calculator's position, so a shared subject keeps one
/// progress slot per algorithm.
pub fn run_comparison(
    calculators: &[Arc<dyn Calculator>],
    n: u64,
    opts: &Options,
    ctx: &CalcContext,
    observer: &dyn ProgressObserver,
) -> Vec<CalculationResult> {
    if let [calc] = calculators {
        let started = Instant::now();
        let outcome = calc.calculate(ctx, observer, 0, n, opts);
        return vec![CalculationResult::from_outcome(
            calc.name(),
            outcome,
            started.elapsed(),
        )];
    }

    calculators
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(index, calc)| {
            let started = Instant::now();
            let outcome = calc.calculate(ctx, observer, index, n, opts);
            CalculationResult::from_outcome(calc.name(), outcome, started.elapsed())
        })
        .collect()
}

/// Check that every successful result carries the same value.
pub fn verify_agreement(results: &[CalculationResult]) -> Result<(), FibError> {
    let successes: Vec<&CalculationResult> = results
        .iter()
        .filter(|r| r.value.is_some() && r.error.is_none())
        .collect();

    let Some(first) = successes.first() else {
        return Err(FibError::Internal("no calculator produced a result".into()));
    };
    let reference = first.value.as_ref().ok_or_else(|| {
        FibError::Internal("filtered result lost its value".into())
    })?;

    for result in &successes[1..] {
        if result.value.as_ref() != Some(reference) {
            return Err(FibError::Internal(format!(
                "{} disagrees with {}",
                result.algorithm, first.algorithm
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::FibCalculator;
    use crate::fastdoubling::FastDoubling;
    use crate::matrix::MatrixExponentiation;
    use crate::observers::NoOpObserver;

    fn fast() -> Arc<dyn Calculator> {
        Arc::new(FibCalculator::new(Arc::new(FastDoubling::new())))
    }

    fn matrix() -> Arc<dyn Calculator> {
        Arc::new(FibCalculator::new(Arc::new(MatrixExponentiation::new())))
    }

    fn result(algorithm: &str, value: Option<u64>, error: Option<FibError>) -> CalculationResult {
        CalculationResult {
            algorithm: algorithm.into(),
            value: value.map(BigUint::from),
            duration: Duration::from_millis(1),
            error,
        }
    }

    #[test]
    fn single_calculator_runs_inline() {
        let results = run_comparison(
            &[fast()],
            100,
            &Options::default(),
            &CalcContext::new(),
            &NoOpObserver::new(),
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].error.is_none());
        assert_eq!(
            results[0].value.as_ref().unwrap(),
            &BigUint::parse_bytes(b"354224848179261915075", 10).unwrap()
        );
    }

    #[test]
    fn multiple_calculators_run_and_agree() {
        let results = run_comparison(
            &[fast(), matrix()],
            1000,
            &Options::default(),
            &CalcContext::new(),
            &NoOpObserver::new(),
        );
        assert_eq!(results.len(), 2);
        for r in &results {
            assert!(r.error.is_none(), "{} failed: {:?}", r.algorithm, r.error);
        }
        assert!(verify_agreement(&results).is_ok());
    }

    #[test]
    fn cancellation_reaches_every_calculator() {
        let ctx = CalcContext::new();
        ctx.cancel();
        let results = run_comparison(
            &[fast(), matrix()],
            1_000_000,
            &Options::default(),
            &ctx,
            &NoOpObserver::new(),
        );
        for r in &results {
            assert!(matches!(r.error, Some(FibError::Cancelled)), "{}", r.algorithm);
        }
    }

    #[test]
    fn agreement_accepts_matching_values() {
        let results = vec![result("A", Some(55), None), result("B", Some(55), None)];
        assert!(verify_agreement(&results).is_ok());
    }

    #[test]
    fn agreement_rejects_mismatch() {
        let results = vec![result("A", Some(55), None), result("B", Some(56), None)];
        assert!(matches!(
            verify_agreement(&results),
            Err(FibError::Internal(_))
        ));
    }

    #[test]
    fn agreement_ignores_failed_runs() {
        let results = vec![
            result("A", Some(55), None),
            result("B", None, Some(FibError::Cancelled)),
            result("C", Some(55), None),
        ];
        assert!(verify_agreement(&results).is_ok());
    }

    #[test]
    fn agreement_needs_at_least_one_success() {
        let results = vec![result("A", None, Some(FibError::Cancelled))];
        assert!(matches!(
            verify_agreement(&results),
            Err(FibError::Internal(_))
        ));
    }
}
