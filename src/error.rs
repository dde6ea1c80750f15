use thiserror::Error;

#[doc = r#"
Errors produced while constructing the core value objects.

Codec-specific failures live in [`io::ReadError`](crate::io::ReadError) and
[`io::WriteError`](crate::io::WriteError).
"#]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The denominator of a signature was not a positive power of two.
    #[error("invalid signature {nominator}/{denominator} (the denominator must be a positive power of two)")]
    InvalidSignature {
        /// The offending nominator.
        nominator: u64,
        /// The offending denominator.
        denominator: u64,
    },
    /// A rescale target smaller than the current denominator.
    #[error("invalid target denominator {0} (must not be smaller than the current denominator)")]
    InvalidDenominator(u64),
    /// A tone notation string that does not match `[A-G][#b]*(-?digits)?`.
    #[error("invalid tone notation {0:?}")]
    InvalidNotation(String),
    /// A note velocity outside of `[0.0, 1.0]`.
    #[error("velocity {0} is outside [0.0, 1.0]")]
    InvalidVelocity(f64),
}
