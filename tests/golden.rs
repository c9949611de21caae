//! Workspace-level golden and end-to-end tests.
//!
//! Reads tests/testdata/fibonacci_golden.json and checks every registered
//! algorithm against it, then exercises the facade contracts: budget
//! rejection, cancellation, last-digits equivalence, progress monotonicity,
//! and options normalization.

use std::sync::Arc;

use num_bigint::BigUint;
use serde::Deserialize;

use fibengine_core::calculator::Calculator;
use fibengine_core::context::CalcContext;
use fibengine_core::error::FibError;
use fibengine_core::modular::FastDoublingMod;
use fibengine_core::observers::{ChannelObserver, NoOpObserver};
use fibengine_core::options::{GcMode, Options};
use fibengine_core::registry::{CalculatorFactory, DefaultFactory};

// ---------------------------------------------------------------------------
// Golden data
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GoldenData {
    #[allow(dead_code)]
    description: String,
    values: Vec<GoldenEntry>,
}

#[derive(Deserialize)]
struct GoldenEntry {
    n: u64,
    #[serde(default)]
    fib: Option<String>,
    #[serde(default)]
    fib_prefix: Option<String>,
    #[serde(default)]
    fib_digits: Option<usize>,
}

fn load_golden_data() -> GoldenData {
    let path = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/testdata/fibonacci_golden.json"
    );
    let data = std::fs::read_to_string(path).expect("failed to read golden file");
    serde_json::from_str(&data).expect("failed to parse golden JSON")
}

fn compute(calc: &dyn Calculator, n: u64, opts: &Options) -> BigUint {
    calc.calculate(&CalcContext::new(), &NoOpObserver::new(), 0, n, opts)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Golden values across every registered algorithm
// ---------------------------------------------------------------------------

#[test]
fn golden_values_all_algorithms() {
    let factory = DefaultFactory::new();
    let data = load_golden_data();
    let opts = Options::default();

    for name in factory.list() {
        let calc = match factory.get(&name) {
            Ok(calc) => calc,
            Err(FibError::Unavailable(_)) => continue,
            Err(err) => panic!("factory.get({name}) failed: {err}"),
        };
        for entry in &data.values {
            let result = compute(calc.as_ref(), entry.n, &opts).to_string();
            if let Some(expected) = &entry.fib {
                assert_eq!(&result, expected, "{name} wrong at n={}", entry.n);
            }
            if let Some(prefix) = &entry.fib_prefix {
                assert!(
                    result.starts_with(prefix),
                    "{name} wrong prefix at n={}",
                    entry.n
                );
            }
            if let Some(digits) = entry.fib_digits {
                assert_eq!(result.len(), digits, "{name} wrong length at n={}", entry.n);
            }
        }
    }
}

#[test]
fn algorithms_agree_on_larger_inputs() {
    let factory = DefaultFactory::new();
    let opts = Options::default();
    let reference = compute(factory.get("fast").unwrap().as_ref(), 20_000, &opts);

    for name in ["matrix", "fft"] {
        let result = compute(factory.get(name).unwrap().as_ref(), 20_000, &opts);
        assert_eq!(result, reference, "{name} disagrees at n=20000");
    }
}

// ---------------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------------

#[test]
fn boundary_around_the_u64_table() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let opts = Options::default();

    assert_eq!(compute(calc.as_ref(), 0, &opts), BigUint::ZERO);
    assert_eq!(compute(calc.as_ref(), 1, &opts), BigUint::from(1u32));
    assert_eq!(compute(calc.as_ref(), 2, &opts), BigUint::from(1u32));
    assert_eq!(
        compute(calc.as_ref(), 93, &opts),
        BigUint::from(12_200_160_415_121_876_738u64)
    );
    // First value through the big-integer path.
    assert_eq!(
        compute(calc.as_ref(), 94, &opts).to_string(),
        "19740274219868223167"
    );
}

#[test]
fn empty_options_match_explicit_defaults() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();

    let zeroed = Options {
        parallel_threshold: 0,
        fft_threshold: 0,
        parallel_fft_threshold: 0,
        strassen_threshold: 0,
        fft_cache_min_bitlen: 0,
        fft_cache_max_entries: 0,
        dynamic_adjustment_interval: 0,
        ..Options::default()
    };
    assert_eq!(
        compute(calc.as_ref(), 1000, &zeroed),
        compute(calc.as_ref(), 1000, &Options::default())
    );
}

// ---------------------------------------------------------------------------
// Last digits
// ---------------------------------------------------------------------------

#[test]
fn f1000_last_six_digits() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let full = compute(calc.as_ref(), 1000, &Options::default());
    assert_eq!(
        &full % BigUint::from(1_000_000u32),
        BigUint::from(228_875u32)
    );

    let opts = Options {
        last_digits: 6,
        ..Options::default()
    };
    assert_eq!(
        compute(calc.as_ref(), 1000, &opts),
        BigUint::from(228_875u32)
    );
}

#[test]
fn modular_path_matches_full_computation_tail() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let full = compute(calc.as_ref(), 500, &Options::default());

    let modulus = BigUint::from(10u32).pow(100);
    let modular = FastDoublingMod::fibonacci_mod(
        500,
        &modulus,
        &CalcContext::new(),
        &NoOpObserver::new(),
        0,
    )
    .unwrap();
    assert_eq!(modular, &full % &modulus);
}

// ---------------------------------------------------------------------------
// Budget and cancellation
// ---------------------------------------------------------------------------

#[test]
fn tight_budget_is_rejected_up_front() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let opts = Options {
        memory_limit: 1_000_000,
        gc_mode: GcMode::Disabled,
        ..Options::default()
    };
    let result = calc.calculate(
        &CalcContext::new(),
        &NoOpObserver::new(),
        0,
        10_000_000,
        &opts,
    );
    match result {
        Err(FibError::BudgetExceeded { estimated, limit }) => {
            assert!(estimated > limit);
            assert_eq!(limit, 1_000_000);
        }
        other => panic!("expected BudgetExceeded, got {other:?}"),
    }
}

#[test]
fn cancellation_returns_no_partial_result() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let ctx = CalcContext::new();
    ctx.cancel();

    let result = calc.calculate(&ctx, &NoOpObserver::new(), 0, 1_000_000, &Options::default());
    assert!(matches!(result, Err(FibError::Cancelled)));
}

#[test]
fn deadline_is_reported_as_deadline() {
    let factory = DefaultFactory::new();
    let calc = factory.get("fast").unwrap();
    let ctx = CalcContext::with_timeout(std::time::Duration::from_nanos(1));
    std::thread::sleep(std::time::Duration::from_millis(1));

    let result = calc.calculate(&ctx, &NoOpObserver::new(), 0, 1_000_000, &Options::default());
    assert!(matches!(result, Err(FibError::DeadlineExceeded(_))));
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[test]
fn progress_is_monotonic_and_bounded() {
    let factory = DefaultFactory::new();
    let (tx, rx) = crossbeam_channel::unbounded();
    let observer = ChannelObserver::new(tx);

    let calc = factory.get("fast").unwrap();
    let result = calc.calculate(
        &CalcContext::new(),
        &observer,
        0,
        500_000,
        &Options::default(),
    );
    assert!(result.is_ok());

    let mut last = 0.0f64;
    let mut count = 0usize;
    while let Ok(update) = rx.try_recv() {
        assert!(
            update.progress >= last,
            "progress regressed: {} -> {}",
            last,
            update.progress
        );
        assert!((0.0..=1.0).contains(&update.progress));
        last = update.progress;
        count += 1;
    }
    assert!(count >= 10, "expected at least 10 updates, got {count}");
}

#[test]
fn comparison_mode_keeps_slots_independent() {
    use fibengine_core::observer::SequenceProgress;
    use fibengine_core::progress::ProgressUpdate;

    let subject = SequenceProgress::new(3);
    subject.update(&ProgressUpdate::new(0, "a", 0.2, 1, 10));
    subject.update(&ProgressUpdate::new(2, "c", 0.9, 9, 10));

    let snapshot = subject.freeze();
    assert!((snapshot[0] - 0.2).abs() < f64::EPSILON);
    assert!(snapshot[1].abs() < f64::EPSILON);
    assert!((snapshot[2] - 0.9).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// NTT facade differential check
// ---------------------------------------------------------------------------

#[test]
fn ntt_facade_matches_native_multiplication() {
    use num_traits::One;

    let a = (BigUint::one() << 20_000u32) - BigUint::one();
    let b = (BigUint::one() << 15_000u32) - BigUint::from(9u32);
    assert_eq!(fibengine_bigfft::mul(&a, &b), &a * &b);
    assert_eq!(fibengine_bigfft::sqr(&a), &a * &a);
}

#[test]
fn concurrent_calculators_agree() {
    let factory = Arc::new(DefaultFactory::new());
    let opts = Options::default();

    let handles: Vec<_> = ["fast", "matrix", "fft"]
        .into_iter()
        .map(|name| {
            let factory = Arc::clone(&factory);
            let opts = opts.clone();
            std::thread::spawn(move || {
                let calc = factory.get(name).unwrap();
                (
                    name,
                    calc.calculate(&CalcContext::new(), &NoOpObserver::new(), 0, 10_000, &opts)
                        .unwrap(),
                )
            })
        })
        .collect();

    let mut results: Vec<(&str, BigUint)> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let reference = results.pop().unwrap().1;
    for (name, value) in results {
        assert_eq!(value, reference, "{name} disagrees under concurrency");
    }
}
