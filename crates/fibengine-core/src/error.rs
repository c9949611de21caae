//! Structured errors for the engine.

/// Error type for Fibonacci calculations.
///
/// Multiplications fail only with `Cancelled`, `DeadlineExceeded`, or
/// `Internal`; the strategy and the iteration drivers propagate those upward
/// untransformed.
#[derive(Debug, thiserror::Error)]
pub enum FibError {
    /// Bad input: unknown algorithm name, zero modulus, malformed limit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pre-call memory estimate exceeds the user-supplied limit.
    #[error("estimated memory {estimated} bytes exceeds limit {limit} bytes; \
             consider the modular last-digits mode")]
    BudgetExceeded {
        /// Estimated peak footprint in bytes.
        estimated: u64,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// The cancellation token fired mid-calculation.
    #[error("calculation cancelled")]
    Cancelled,

    /// The context deadline passed mid-calculation.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// An arithmetic invariant was violated; indicates an implementation bug.
    #[error("internal error: {0}")]
    Internal(String),

    /// An optional backend was requested but not compiled in.
    #[error("backend unavailable: {0}")]
    Unavailable(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(
            FibError::InvalidArgument("bad".into()).to_string(),
            "invalid argument: bad"
        );
        assert_eq!(FibError::Cancelled.to_string(), "calculation cancelled");
        assert!(FibError::BudgetExceeded {
            estimated: 100,
            limit: 10
        }
        .to_string()
        .contains("modular last-digits"));
    }

    #[test]
    fn variants_are_matchable() {
        let err = FibError::Unavailable("gmp");
        assert!(matches!(err, FibError::Unavailable("gmp")));
    }
}
