//! Property-based tests over the core algorithms.
//!
//! These drive the `CoreCalculator` implementations directly, below the
//! facade's fast path.

use num_bigint::BigUint;
use proptest::prelude::*;

use fibengine_core::calculator::CoreCalculator;
use fibengine_core::context::CalcContext;
use fibengine_core::fastdoubling::FastDoubling;
use fibengine_core::fft_based::FftDoubling;
use fibengine_core::matrix::MatrixExponentiation;
use fibengine_core::modular::FastDoublingMod;
use fibengine_core::observers::NoOpObserver;
use fibengine_core::options::Options;

fn compute_core(algo: &dyn CoreCalculator, n: u64) -> BigUint {
    algo.calculate_core(
        &CalcContext::new(),
        &NoOpObserver::new(),
        0,
        n,
        &Options::default(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// All core algorithms agree for random n past the u64 table.
    #[test]
    fn core_algorithms_agree(n in 94u64..5000) {
        let fast = compute_core(&FastDoubling::new(), n);
        let matrix = compute_core(&MatrixExponentiation::new(), n);
        let fft = compute_core(&FftDoubling::new(), n);

        prop_assert_eq!(&fast, &matrix, "FastDoubling != Matrix at n={}", n);
        prop_assert_eq!(&fast, &fft, "FastDoubling != FftDoubling at n={}", n);
    }

    /// The additive recurrence holds across computed values.
    #[test]
    fn addition_identity(n in 2u64..2000) {
        let algo = FastDoubling::new();
        let a = compute_core(&algo, n);
        let b = compute_core(&algo, n + 1);
        let c = compute_core(&algo, n + 2);
        prop_assert_eq!(&a + &b, c, "F({}) + F({}) != F({})", n, n + 1, n + 2);
    }

    /// The modular path matches the full computation reduced.
    #[test]
    fn modular_matches_full(n in 94u64..2000, k in 1u32..8) {
        let full = compute_core(&FastDoubling::new(), n);
        let modulus = BigUint::from(10u32).pow(k);
        let expected = &full % &modulus;

        let result = FastDoublingMod::fibonacci_mod(
            n,
            &modulus,
            &CalcContext::new(),
            &NoOpObserver::new(),
            0,
        ).unwrap();

        prop_assert_eq!(result, expected, "F({}) mod 10^{} mismatch", n, k);
    }

    /// Strassen-heavy matrix runs agree with the plain symmetric product.
    #[test]
    fn strassen_agrees_with_symmetric(n in 94u64..1500) {
        let plain = compute_core(&MatrixExponentiation::new(), n);
        let strassen_opts = Options { strassen_threshold: 1, ..Options::default() };
        let strassen = MatrixExponentiation::new()
            .calculate_core(&CalcContext::new(), &NoOpObserver::new(), 0, n, &strassen_opts)
            .unwrap();
        prop_assert_eq!(plain, strassen, "Strassen mismatch at n={}", n);
    }
}
