//! # Unity — Elements of Z[ζ]/(n)
//!
//! A [`UnityElement`] is a polynomial in a primitive `p^k`-th root of unity ζ
//! with coefficients modulo n, stored as a fixed-capacity vector of `p^k`
//! `rug::Integer`s plus an explicit logical length.
//!
//! ## Invariants
//!
//! Held before and after every public operation:
//!
//! - `coeffs.len() == p^k`, and `len <= p^k` is the highest non-zero index
//!   plus one (`len == 0` is the zero element). Entries at `len..` are zero.
//! - Every coefficient lies in `[0, n)`.
//! - Binary operations only combine elements of the same `(p, exp, n)`
//!   ring; mismatches return `UnityError::ContextMismatch`.
//!
//! Arithmetic results are additionally *canonical*: reduced modulo
//! Φ_{p^k}(ζ), so every coefficient at index `≥ φ(p^k)` is zero. Elements
//! built from caller-supplied coefficients may be non-canonical until the
//! first arithmetic operation or an explicit [`UnityElement::reduce`].
//! Equality compares canonical forms, so it is true ring equality.

use std::fmt;
use std::sync::Arc;

use rug::ops::{RemRounding, SubFrom};
use rug::{Assign, Integer};

use crate::error::UnityError;
use crate::params::UnityCtx;
use crate::reduce::{self, normalised_len, reduce_full};

/// An element of Z[ζ_{p^k}]/(n).
#[derive(Clone, Debug)]
pub struct UnityElement {
    pub(crate) ctx: Arc<UnityCtx>,
    pub(crate) coeffs: Vec<Integer>,
    pub(crate) len: usize,
}

impl UnityElement {
    /// The zero element.
    pub fn zero(ctx: &Arc<UnityCtx>) -> Self {
        UnityElement {
            ctx: Arc::clone(ctx),
            coeffs: vec![Integer::new(); ctx.order()],
            len: 0,
        }
    }

    /// The multiplicative identity.
    pub fn one(ctx: &Arc<UnityCtx>) -> Self {
        let mut e = Self::zero(ctx);
        e.coeffs[0].assign(1);
        e.len = 1;
        e
    }

    /// ζ^h, in canonical form.
    pub fn zeta_pow(ctx: &Arc<UnityCtx>, h: u64) -> Self {
        let mut e = Self::zero(ctx);
        let idx = (h % ctx.order() as u64) as usize;
        e.coeffs[idx].assign(1);
        e.len = idx + 1;
        e.reduce();
        e
    }

    /// Build an element from coefficients of ζ^0, ζ^1, ...
    ///
    /// Each value is reduced into `[0, n)`; missing trailing coefficients are
    /// zero. The result is not cyclotomic-reduced.
    pub fn from_coeffs(ctx: &Arc<UnityCtx>, values: &[Integer]) -> Result<Self, UnityError> {
        if values.len() > ctx.order() {
            return Err(UnityError::TooManyCoefficients {
                len: values.len(),
                order: ctx.order(),
            });
        }
        let mut e = Self::zero(ctx);
        for (c, v) in e.coeffs.iter_mut().zip(values) {
            *c = v.clone().rem_euc(ctx.modulus());
        }
        e.normalise();
        Ok(e)
    }

    pub fn from_u64s(ctx: &Arc<UnityCtx>, values: &[u64]) -> Result<Self, UnityError> {
        let ints: Vec<Integer> = values.iter().map(|&v| Integer::from(v)).collect();
        Self::from_coeffs(ctx, &ints)
    }

    pub fn ctx(&self) -> &Arc<UnityCtx> {
        &self.ctx
    }

    pub fn p(&self) -> u64 {
        self.ctx.p()
    }

    pub fn exp(&self) -> u32 {
        self.ctx.exp()
    }

    pub fn modulus(&self) -> &Integer {
        self.ctx.modulus()
    }

    /// Logical length (highest non-zero index + 1).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_zero(&self) -> bool {
        self.len == 0
    }

    /// No non-zero coefficient; same as [`Self::is_zero`].
    pub fn is_empty(&self) -> bool {
        self.is_zero()
    }

    /// All `p^k` coefficients, trailing zeros included.
    pub fn coeffs(&self) -> &[Integer] {
        &self.coeffs
    }

    /// Coefficient of ζ^i.
    pub fn coeff(&self, i: usize) -> Result<&Integer, UnityError> {
        self.coeffs.get(i).ok_or(UnityError::CoefficientIndex {
            index: i,
            order: self.ctx.order(),
        })
    }

    /// True if no coefficient at index `≥ φ(p^k)` is set.
    pub fn is_canonical(&self) -> bool {
        self.len <= self.ctx.phi()
    }

    pub(crate) fn active(&self) -> &[Integer] {
        &self.coeffs[..self.len]
    }

    pub(crate) fn normalise(&mut self) {
        self.len = normalised_len(&self.coeffs);
    }

    pub(crate) fn set_zero(&mut self) {
        for c in &mut self.coeffs[..self.len] {
            c.assign(0);
        }
        self.len = 0;
    }

    pub(crate) fn check_ring(&self, other: &UnityElement) -> Result<(), UnityError> {
        if self.ctx.same_ring(&other.ctx) {
            Ok(())
        } else {
            Err(UnityError::ContextMismatch)
        }
    }

    fn check_index(&self, i: usize) -> Result<(), UnityError> {
        if i < self.ctx.order() {
            Ok(())
        } else {
            Err(UnityError::CoefficientIndex {
                index: i,
                order: self.ctx.order(),
            })
        }
    }

    // ── Coefficient updates ─────────────────────────────────────────

    /// Set the coefficient of ζ^i to `value mod n`.
    pub fn set_coeff(&mut self, i: usize, value: &Integer) -> Result<(), UnityError> {
        self.check_index(i)?;
        self.coeffs[i] = value.clone().rem_euc(self.ctx.modulus());
        self.normalise();
        Ok(())
    }

    pub fn set_coeff_u64(&mut self, i: usize, value: u64) -> Result<(), UnityError> {
        self.set_coeff(i, &Integer::from(value))
    }

    /// Add `value` to the coefficient of ζ^i.
    pub fn add_coeff_u64(&mut self, i: usize, value: u64) -> Result<(), UnityError> {
        self.check_index(i)?;
        let c = &mut self.coeffs[i];
        *c += value;
        if *c >= *self.ctx.modulus() {
            reduce_full(c, self.ctx.modulus());
        }
        self.normalise();
        Ok(())
    }

    /// Increment the coefficient of ζ^i by one.
    pub fn inc_coeff(&mut self, i: usize) -> Result<(), UnityError> {
        self.add_coeff_u64(i, 1)
    }

    // ── Additive structure ──────────────────────────────────────────

    /// `self += other`.
    pub fn add_assign(&mut self, other: &UnityElement) -> Result<(), UnityError> {
        self.check_ring(other)?;
        let n = self.ctx.modulus();
        for (c, o) in self.coeffs.iter_mut().zip(other.active()) {
            *c += o;
            if *c >= *n {
                *c -= n;
            }
        }
        self.normalise();
        Ok(())
    }

    pub fn add(&self, other: &UnityElement) -> Result<UnityElement, UnityError> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    /// `self -= other`.
    pub fn sub_assign(&mut self, other: &UnityElement) -> Result<(), UnityError> {
        self.check_ring(other)?;
        let n = self.ctx.modulus();
        for (c, o) in self.coeffs.iter_mut().zip(other.active()) {
            *c -= o;
            if *c < 0 {
                *c += n;
            }
        }
        self.normalise();
        Ok(())
    }

    pub fn sub(&self, other: &UnityElement) -> Result<UnityElement, UnityError> {
        let mut out = self.clone();
        out.sub_assign(other)?;
        Ok(out)
    }

    /// Additive inverse.
    pub fn neg(&self) -> UnityElement {
        let mut out = self.clone();
        let n = out.ctx.modulus();
        for c in &mut out.coeffs[..out.len] {
            if *c != 0 {
                c.sub_from(n);
            }
        }
        out
    }

    /// Multiply every coefficient by `s` modulo n.
    pub fn mul_scalar(&mut self, s: &Integer) {
        let n = self.ctx.modulus();
        for c in &mut self.coeffs[..self.len] {
            *c *= s;
            reduce_full(c, n);
        }
        self.normalise();
    }

    pub fn mul_scalar_u64(&mut self, s: u64) {
        self.mul_scalar(&Integer::from(s));
    }

    // ── Reduction and ring structure ────────────────────────────────

    /// Bring the element into canonical form (reduce modulo Φ_{p^k}).
    /// A no-op on canonical elements.
    pub fn reduce(&mut self) {
        if self.is_canonical() {
            return;
        }
        reduce::reduce_cyclotomic(&mut self.coeffs, &self.ctx);
        self.normalise();
    }

    /// Canonical copy of `self`.
    pub fn reduced(&self) -> UnityElement {
        let mut out = self.clone();
        out.reduce();
        out
    }

    /// Galois automorphism σ_x: ζ ↦ ζ^x, for x coprime to p.
    pub fn aut(&self, x: u64) -> Result<UnityElement, UnityError> {
        if x % self.ctx.p() == 0 {
            return Err(UnityError::NotCoprime { x, p: self.ctx.p() });
        }
        let order = self.ctx.order() as u64;
        let x = x % order;
        let mut out = UnityElement::zero(&self.ctx);
        // x is a unit mod p^k, so i -> i·x is a permutation of the indices
        for (i, c) in self.active().iter().enumerate() {
            let j = (i as u64 * x % order) as usize;
            out.coeffs[j].assign(c);
        }
        out.normalise();
        out.reduce();
        Ok(out)
    }

    /// If `self == ζ^h` for some `h` in `0..p^k`, return `Some(h)`.
    pub fn is_unity(&self) -> Option<usize> {
        let g = self.reduced();
        let nonzero: Vec<usize> = g
            .active()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0)
            .map(|(i, _)| i)
            .collect();

        // h < φ: a single coefficient equal to 1
        if nonzero.len() == 1 && g.coeffs[nonzero[0]] == 1 {
            return Some(nonzero[0]);
        }

        // h ≥ φ: ζ^h = -Σ_{j<p-1} ζ^(h-φ+j·p^(k-1))
        let terms = self.ctx.p() as usize - 1;
        let stride = self.ctx.sub_order();
        if nonzero.len() != terms {
            return None;
        }
        let r = nonzero[0];
        let minus_one = Integer::from(self.ctx.modulus() - 1u32);
        let matches = r < stride
            && nonzero
                .iter()
                .enumerate()
                .all(|(j, &i)| i == r + j * stride && g.coeffs[i] == minus_one);
        if matches {
            Some(r + self.ctx.phi())
        } else {
            None
        }
    }
}

impl PartialEq for UnityElement {
    fn eq(&self, other: &Self) -> bool {
        if !self.ctx.same_ring(&other.ctx) {
            return false;
        }
        if self.is_canonical() && other.is_canonical() {
            return self.active() == other.active();
        }
        self.reduced().coeffs == other.reduced().coeffs
    }
}

impl Eq for UnityElement {}

impl fmt::Display for UnityElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.coeffs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "] (p={}, exp={})", self.ctx.p(), self.ctx.exp())
    }
}
