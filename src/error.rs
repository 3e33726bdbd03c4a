use thiserror::Error;

/// Arithmetic failures on exact decimal values.
///
/// Everything except division is total; division by zero is the only
/// way price math can fail, and it is always guarded before use
/// (a zero-range candle produces a zero ATR, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
}

/// Recoverable engine errors.
///
/// None of these are fatal: the engine swallows them at the `handle`
/// boundary and degrades to "no signal this update". Insufficient
/// history is deliberately *not* an error: indicators return `None`
/// during warm-up.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-order input; the update is skipped without
    /// mutating any state.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// An event that contradicts the current position lifecycle phase
    /// (e.g. a fill with no pending entry). Logged and ignored.
    #[error("state violation: {0}")]
    StateViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_error_converts() {
        let err: EngineError = ArithmeticError::DivisionByZero.into();
        assert!(matches!(err, EngineError::Arithmetic(_)));
        assert_eq!(err.to_string(), "division by zero");
    }
}
