//! # Params — Ring Context and Configuration
//!
//! A computation over Z[ζ]/(n), with ζ a primitive `p^k`-th root of unity,
//! is fixed by the triple `(p, exp, n)`. [`UnityCtx`] validates the triple
//! once, precomputes the derived sizes every operation needs, and is then
//! shared read-only (behind an `Arc`) by all elements of one run.
//!
//! ## Derived Sizes
//!
//! - `order = p^k`: stored coefficients per element (cyclic fold width).
//! - `sub_order = p^(k-1)`: stride of the cyclotomic polynomial
//!   Φ_{p^k}(x) = Σ_{j<p} x^(j·p^(k-1)).
//! - `phi = (p-1)·p^(k-1)`: degree of Φ_{p^k}; canonical elements have no
//!   non-zero coefficient at index ≥ phi.
//!
//! ## Configuration
//!
//! [`RingConfig`] is the serde/TOML form of the triple. `n` is carried as a
//! decimal string since it is usually hundreds to thousands of digits:
//!
//! ```toml
//! p = 7
//! exp = 1
//! n = "170141183460469231731687303715884105727"
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rug::Integer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::SquareStrategy;
use crate::error::UnityError;

/// Largest supported ring dimension `p^k`.
pub const MAX_ORDER: usize = 1 << 20;

/// Shared parameters of one unity-ring computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnityCtx {
    p: u64,
    exp: u32,
    n: Integer,
    order: usize,
    sub_order: usize,
    phi: usize,
    strategy: SquareStrategy,
}

impl UnityCtx {
    /// Validate `(p, exp, n)` and build the shared context.
    ///
    /// # Errors
    ///
    /// `ZeroExponent` for `exp == 0`, `OrderTooLarge` if `p^exp > MAX_ORDER`,
    /// `NotPrime` if `p` is composite, `InvalidModulus` if `n <= 1`.
    pub fn new(p: u64, exp: u32, n: Integer) -> Result<Arc<Self>, UnityError> {
        if exp == 0 {
            return Err(UnityError::ZeroExponent);
        }
        if p > MAX_ORDER as u64 {
            return Err(UnityError::OrderTooLarge { p, exp });
        }
        if !is_prime_u64(p) {
            return Err(UnityError::NotPrime { p });
        }
        if n <= 1 {
            return Err(UnityError::InvalidModulus);
        }

        let order = (p as usize)
            .checked_pow(exp)
            .filter(|&o| o <= MAX_ORDER)
            .ok_or(UnityError::OrderTooLarge { p, exp })?;
        let sub_order = order / p as usize;
        let phi = order - sub_order;
        let strategy = SquareStrategy::select(p, exp);

        debug!(
            p,
            exp,
            order,
            modulus_bits = n.significant_bits(),
            ?strategy,
            "unity: context created"
        );

        Ok(Arc::new(UnityCtx {
            p,
            exp,
            n,
            order,
            sub_order,
            phi,
            strategy,
        }))
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    pub fn exp(&self) -> u32 {
        self.exp
    }

    /// The working modulus n.
    pub fn modulus(&self) -> &Integer {
        &self.n
    }

    /// Ring dimension p^k (stored coefficients per element).
    pub fn order(&self) -> usize {
        self.order
    }

    /// p^(k-1).
    pub fn sub_order(&self) -> usize {
        self.sub_order
    }

    /// Degree of the cyclotomic polynomial Φ_{p^k}.
    pub fn phi(&self) -> usize {
        self.phi
    }

    /// Squaring strategy chosen for this `(p, exp)`.
    pub fn strategy(&self) -> SquareStrategy {
        self.strategy
    }

    /// True if both contexts describe the same `(p, exp, n)` ring.
    pub fn same_ring(&self, other: &UnityCtx) -> bool {
        std::ptr::eq(self, other)
            || (self.p == other.p && self.exp == other.exp && self.n == other.n)
    }
}

/// Deterministic trial-division primality check for the small base `p`.
pub(crate) fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5u64;
    while d * d <= n {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}

fn default_exp() -> u32 {
    1
}

/// Serializable `(p, exp, n)` triple, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    pub p: u64,
    #[serde(default = "default_exp")]
    pub exp: u32,
    /// Decimal representation of the modulus.
    pub n: String,
}

impl RingConfig {
    pub fn new(p: u64, exp: u32, n: &Integer) -> Self {
        RingConfig {
            p,
            exp,
            n: n.to_string(),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse ring config")
    }

    /// Read and parse a TOML ring config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ring config {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("failed to serialize ring config")
    }

    /// Parse the decimal modulus.
    pub fn modulus(&self) -> Result<Integer> {
        self.n
            .trim()
            .parse::<Integer>()
            .with_context(|| format!("invalid modulus {:?}", self.n))
    }

    /// Validate the triple and build the shared ring context.
    pub fn build(&self) -> Result<Arc<UnityCtx>> {
        let n = self.modulus()?;
        let ctx = UnityCtx::new(self.p, self.exp, n)
            .with_context(|| format!("invalid ring parameters p={} exp={}", self.p, self.exp))?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    //! # Context and Configuration Tests
    //!
    //! Covers triple validation (each `UnityError` constructor path), the
    //! derived sizes for prime and prime-power orders, strategy selection as
    //! seen through the context, and TOML round-trips of `RingConfig`.

    use super::*;

    #[test]
    fn derived_sizes_for_prime_order() {
        let ctx = UnityCtx::new(7, 1, Integer::from(1009)).unwrap();
        assert_eq!(ctx.order(), 7);
        assert_eq!(ctx.sub_order(), 1);
        assert_eq!(ctx.phi(), 6);
        assert_eq!(ctx.strategy(), SquareStrategy::Order7);
    }

    #[test]
    fn derived_sizes_for_prime_power_order() {
        // 3^3 = 27, Φ_27 has degree 18
        let ctx = UnityCtx::new(3, 3, Integer::from(1000003)).unwrap();
        assert_eq!(ctx.order(), 27);
        assert_eq!(ctx.sub_order(), 9);
        assert_eq!(ctx.phi(), 18);
        assert_eq!(ctx.strategy(), SquareStrategy::Generic);
    }

    #[test]
    fn rejects_invalid_triples() {
        let n = Integer::from(101);
        assert_eq!(UnityCtx::new(5, 0, n.clone()), Err(UnityError::ZeroExponent));
        assert_eq!(UnityCtx::new(6, 1, n.clone()), Err(UnityError::NotPrime { p: 6 }));
        assert_eq!(UnityCtx::new(1, 1, n.clone()), Err(UnityError::NotPrime { p: 1 }));
        assert_eq!(UnityCtx::new(5, 1, Integer::from(1)), Err(UnityError::InvalidModulus));
        assert_eq!(UnityCtx::new(5, 1, Integer::from(-7)), Err(UnityError::InvalidModulus));
        assert_eq!(
            UnityCtx::new(2, 21, n.clone()),
            Err(UnityError::OrderTooLarge { p: 2, exp: 21 })
        );
        assert_eq!(
            UnityCtx::new(u64::MAX, 1, n),
            Err(UnityError::OrderTooLarge { p: u64::MAX, exp: 1 })
        );
    }

    #[test]
    fn same_ring_compares_values_not_pointers() {
        let a = UnityCtx::new(5, 1, Integer::from(101)).unwrap();
        let b = UnityCtx::new(5, 1, Integer::from(101)).unwrap();
        let c = UnityCtx::new(5, 1, Integer::from(103)).unwrap();
        assert!(a.same_ring(&a));
        assert!(a.same_ring(&b));
        assert!(!a.same_ring(&c));
    }

    #[test]
    fn is_prime_u64_small_values() {
        let primes: Vec<u64> = (0..60).filter(|&n| is_prime_u64(n)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59]
        );
        assert!(is_prime_u64(1_048_573));
        assert!(!is_prime_u64(1_048_575));
    }

    #[test]
    fn config_parses_toml_with_default_exp() {
        let cfg = RingConfig::from_toml_str("p = 5\nn = \"1000000007\"\n").unwrap();
        assert_eq!(cfg.exp, 1);
        let ctx = cfg.build().unwrap();
        assert_eq!(ctx.p(), 5);
        assert_eq!(*ctx.modulus(), 1_000_000_007u64);
    }

    #[test]
    fn config_toml_roundtrip() {
        let n = Integer::from(Integer::u_pow_u(2, 127)) - 1u32;
        let cfg = RingConfig::new(3, 2, &n);
        let raw = cfg.to_toml_string().unwrap();
        let back = RingConfig::from_toml_str(&raw).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.modulus().unwrap(), n);
    }

    #[test]
    fn config_reports_bad_modulus_and_bad_params() {
        let bad_n = RingConfig {
            p: 5,
            exp: 1,
            n: "12x".to_string(),
        };
        assert!(bad_n.build().is_err());

        let bad_p = RingConfig {
            p: 9,
            exp: 1,
            n: "101".to_string(),
        };
        let err = bad_p.build().unwrap_err();
        assert_eq!(
            err.downcast_ref::<UnityError>(),
            Some(&UnityError::NotPrime { p: 9 })
        );
    }

    #[test]
    fn config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.toml");
        std::fs::write(&path, "p = 7\nexp = 1\nn = \"1009\"\n").unwrap();
        let cfg = RingConfig::load(&path).unwrap();
        assert_eq!(cfg.p, 7);
        assert!(RingConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
