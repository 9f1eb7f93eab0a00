//! Error taxonomy for the unity-ring kernel.
//!
//! Ring arithmetic over well-formed operands cannot fail, so every variant
//! here is a caller contract violation detected at the API boundary: a bad
//! `(p, exp, n)` triple, operands from different rings, a specialized
//! squarer invoked on the wrong order, or an out-of-range coefficient index.
//! Nothing is retryable.

/// Contract violations reported by context construction and element operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnityError {
    /// The root-of-unity order must be a prime power; `p` is not prime.
    NotPrime { p: u64 },
    /// The exponent `k` of the order `p^k` must be at least 1.
    ZeroExponent,
    /// `p^exp` exceeds the largest supported ring dimension.
    OrderTooLarge { p: u64, exp: u32 },
    /// The working modulus `n` must be greater than 1.
    InvalidModulus,
    /// Operands of a binary operation were built over different `(p, exp, n)`.
    ContextMismatch,
    /// A specialized squarer was handed an element of another order.
    WrongOrder {
        expected_p: u64,
        expected_exp: u32,
        p: u64,
        exp: u32,
    },
    /// A caller-supplied coefficient vector is longer than `p^exp`.
    TooManyCoefficients { len: usize, order: usize },
    /// Coefficient index outside `0..p^exp`.
    CoefficientIndex { index: usize, order: usize },
    /// Automorphism index shares a factor with `p` (σ_x needs gcd(x, p) = 1).
    NotCoprime { x: u64, p: u64 },
    /// Ring elements are not invertible in general; exponents must be ≥ 0.
    NegativeExponent,
}

impl std::fmt::Display for UnityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnityError::NotPrime { p } => write!(f, "root-of-unity base {} is not prime", p),
            UnityError::ZeroExponent => write!(f, "order exponent must be at least 1"),
            UnityError::OrderTooLarge { p, exp } => {
                write!(f, "order {}^{} exceeds the supported ring dimension", p, exp)
            }
            UnityError::InvalidModulus => write!(f, "modulus n must be greater than 1"),
            UnityError::ContextMismatch => {
                write!(f, "operands belong to different (p, exp, n) rings")
            }
            UnityError::WrongOrder {
                expected_p,
                expected_exp,
                p,
                exp,
            } => write!(
                f,
                "squarer for order {}^{} called on element of order {}^{}",
                expected_p, expected_exp, p, exp
            ),
            UnityError::TooManyCoefficients { len, order } => write!(
                f,
                "{} coefficients supplied but the ring dimension is {}",
                len, order
            ),
            UnityError::CoefficientIndex { index, order } => {
                write!(f, "coefficient index {} out of range 0..{}", index, order)
            }
            UnityError::NotCoprime { x, p } => {
                write!(f, "automorphism index {} is not coprime to {}", x, p)
            }
            UnityError::NegativeExponent => write!(f, "exponent must be non-negative"),
        }
    }
}

impl std::error::Error for UnityError {}
