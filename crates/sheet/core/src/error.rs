//! Common error infrastructure for sheet-core.
//!
//! The resolution engine is deliberately forgiving: malformed rules data degrades to
//! a neutral value (zero, empty string, "not satisfied") so that a sheet always
//! renders. The only hard failure that escapes a recalculation is an
//! [`ArithmeticError`], which signals a data-authoring bug such as a zero
//! denominator in a modifier fraction.
//!
//! Parse errors live next to the types they parse (`fxp`, `units`, `modifier`,
//! `attribute::formula`) and all implement [`SheetError`].

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller can fix the input and retry
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: the computation cannot produce any answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error, e.g. an unparseable amount typed into an editor.
    Recoverable,

    /// Validation error, e.g. a persisted value outside its valid domain.
    Validation,

    /// Internal error, indicating a bug in the engine itself.
    Internal,

    /// Fatal error, e.g. arithmetic that cannot yield a result.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all sheet-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Keep error codes stable; persistence tooling matches on them
pub trait SheetError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Failure of fixed-point arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("fixed-point overflow")]
    Overflow,
}

impl SheetError for ArithmeticError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DivisionByZero => "ARITHMETIC_DIVISION_BY_ZERO",
            Self::Overflow => "ARITHMETIC_OVERFLOW",
        }
    }
}

/// Result alias for computations that can only fail arithmetically.
pub type CalcResult<T> = Result<T, ArithmeticError>;
