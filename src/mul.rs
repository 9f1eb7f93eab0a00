//! # Mul — Generic Multiplication and Squaring
//!
//! Order-agnostic ring multiplication: schoolbook convolution of the two
//! coefficient vectors (length `la + lb − 1 ≤ 2·p^k − 1`), each output entry
//! reduced modulo n once, followed by a reduction engine pass (cyclic fold
//! and cyclotomic reduction, see [`crate::reduce`]).
//!
//! Squaring uses the symmetric half of the convolution: each cross product
//! `x_i·x_j` (i < j) is computed once and doubled, so a square costs
//! `L(L+1)/2` multiplications instead of `L²`.
//!
//! The product is always built in a separate buffer and swapped into the
//! destination, so `a.mul_assign(&a.clone())` and `a.sqr_generic_assign()`
//! give the same result as the out-of-place forms.

use rug::{Assign, Integer};

use crate::error::UnityError;
use crate::reduce::{fold_cyclic, normalised_len, reduce_cyclotomic, reduce_full};
use crate::unity::UnityElement;

/// Resize `out` to `len` zeroed entries, reusing existing allocations.
fn reset(out: &mut Vec<Integer>, len: usize) {
    out.truncate(len);
    for c in out.iter_mut() {
        c.assign(0);
    }
    out.resize(len, Integer::new());
}

/// Full convolution of `a` and `b`, every entry reduced into `[0, n)`.
/// Leaves `out` empty if either operand is empty.
pub(crate) fn mul_into(out: &mut Vec<Integer>, a: &[Integer], b: &[Integer], n: &Integer) {
    if a.is_empty() || b.is_empty() {
        out.clear();
        return;
    }
    reset(out, a.len() + b.len() - 1);
    for (i, x) in a.iter().enumerate() {
        if *x == 0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    for c in out.iter_mut() {
        reduce_full(c, n);
    }
}

/// Convolution of `a` with itself using half-products.
pub(crate) fn sqr_into(out: &mut Vec<Integer>, a: &[Integer], n: &Integer) {
    if a.is_empty() {
        out.clear();
        return;
    }
    let len = a.len();
    reset(out, 2 * len - 1);
    for i in 0..len {
        if a[i] == 0 {
            continue;
        }
        for j in (i + 1)..len {
            out[i + j] += &a[i] * &a[j];
        }
    }
    for c in out.iter_mut() {
        *c <<= 1u32;
    }
    for (i, x) in a.iter().enumerate() {
        out[2 * i] += x * x;
    }
    for c in out.iter_mut() {
        reduce_full(c, n);
    }
}

impl UnityElement {
    /// Replace `self` with the reduced contents of a raw product buffer.
    /// On return `buf` holds the previous coefficient storage.
    pub(crate) fn load_product(&mut self, buf: &mut Vec<Integer>) {
        if buf.is_empty() {
            self.set_zero();
            return;
        }
        fold_cyclic(buf, self.ctx.order(), self.ctx.modulus());
        reduce_cyclotomic(buf, &self.ctx);
        std::mem::swap(&mut self.coeffs, buf);
        self.len = normalised_len(&self.coeffs);
    }

    /// `self · other`.
    pub fn mul(&self, other: &UnityElement) -> Result<UnityElement, UnityError> {
        self.check_ring(other)?;
        let mut buf = Vec::with_capacity(2 * self.ctx.order());
        mul_into(&mut buf, self.active(), other.active(), self.ctx.modulus());
        let mut out = UnityElement::zero(&self.ctx);
        out.load_product(&mut buf);
        Ok(out)
    }

    /// `self ← self · other`.
    pub fn mul_assign(&mut self, other: &UnityElement) -> Result<(), UnityError> {
        self.check_ring(other)?;
        let mut buf = Vec::with_capacity(2 * self.ctx.order());
        self.mul_assign_with(other, &mut buf);
        Ok(())
    }

    /// `self ← self · other` using `buf` as the product buffer. Callers
    /// guarantee both operands share a ring.
    pub(crate) fn mul_assign_with(&mut self, other: &UnityElement, buf: &mut Vec<Integer>) {
        mul_into(buf, self.active(), other.active(), self.ctx.modulus());
        self.load_product(buf);
    }

    /// `self²` through the generic convolution path, whatever the order.
    pub fn sqr_generic(&self) -> UnityElement {
        let mut out = self.clone();
        out.sqr_generic_assign();
        out
    }

    /// `self ← self²` through the generic convolution path.
    pub fn sqr_generic_assign(&mut self) {
        let mut buf = Vec::with_capacity(2 * self.ctx.order());
        self.sqr_generic_with(&mut buf);
    }

    pub(crate) fn sqr_generic_with(&mut self, buf: &mut Vec<Integer>) {
        sqr_into(buf, self.active(), self.ctx.modulus());
        self.load_product(buf);
    }
}
