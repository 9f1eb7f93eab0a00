//! # Small-Order Squarers — Closed Forms for ζ_5 and ζ_7
//!
//! APR-CL certificates pick the auxiliary primes 5 and 7 more often than any
//! other odd order, and the exponentiation loop spends almost all its time
//! squaring. For these two orders the square is expanded by hand.
//!
//! ## Algorithm
//!
//! 1. Reduce the input modulo Φ_p: with ζ^(p−1) = −Σ_{i<p−1} ζ^i, the
//!    element becomes `x_i = c_i − c_{p−1}` for `i < p−1` (`x_{p−1} = 0`).
//! 2. Square in Z[x]/(x^p − 1): `y_k = Σ_{i+j ≡ k (mod p)} x_i·x_j`. With
//!    `x_{p−1} = 0` every `y_k` is at most one square plus a doubled sum of
//!    cross products (tables below).
//! 3. Reduce the result modulo Φ_p again: `r_i = y_i − y_{p−1}`.
//!
//! Cost: 10 multiplications for p = 5 and 21 for p = 7, against 25 and 49
//! for the full convolution, with no separate fold pass.
//!
//! ## Scratch Space
//!
//! Temporaries live in a caller-owned [`Scratch`]. An exponentiation loop
//! creates one, passes it to every square, and drops it at the end. A
//! `Scratch` belongs to one thread at a time (`&mut` enforces this).

use rug::{Assign, Integer};

use crate::error::UnityError;
use crate::reduce::{normalised_len, reduce_full};
use crate::unity::UnityElement;

/// Temporaries held by a [`Scratch`]: 6 inputs + 7 outputs for p = 7, rounded up.
pub const SCRATCH_SLOTS: usize = 16;

/// Reusable big-integer work area for squaring and multiplication.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub(crate) t: Vec<Integer>,
    /// Product buffer for the generic convolution path.
    pub(crate) product: Vec<Integer>,
}

impl Scratch {
    pub fn new() -> Self {
        Scratch {
            t: vec![Integer::new(); SCRATCH_SLOTS],
            product: Vec::new(),
        }
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// One output coefficient of the cyclic square: an optional square term
/// plus a doubled sum of cross products, as indices into `x`.
type Term = (Option<usize>, &'static [(usize, usize)]);

/// y_k for p = 5 with x_4 = 0.
const SQR5_TERMS: [Term; 5] = [
    (Some(0), &[(2, 3)]),
    (Some(3), &[(0, 1)]),
    (Some(1), &[(0, 2)]),
    (None, &[(0, 3), (1, 2)]),
    (Some(2), &[(1, 3)]),
];

/// y_k for p = 7 with x_6 = 0.
const SQR7_TERMS: [Term; 7] = [
    (Some(0), &[(2, 5), (3, 4)]),
    (Some(4), &[(0, 1), (3, 5)]),
    (Some(1), &[(0, 2), (4, 5)]),
    (Some(5), &[(0, 3), (1, 2)]),
    (Some(2), &[(0, 4), (1, 3)]),
    (None, &[(0, 5), (1, 4), (2, 3)]),
    (Some(3), &[(1, 5), (2, 4)]),
];

/// `x_i = c_i − c_top (mod n)` for `i < x.len()`, where `top = x.len()`.
fn load_reduced_input(x: &mut [Integer], coeffs: &[Integer], n: &Integer) {
    let top = &coeffs[x.len()];
    if *top == 0 {
        for (xi, c) in x.iter_mut().zip(coeffs) {
            xi.assign(c);
        }
        return;
    }
    for (xi, c) in x.iter_mut().zip(coeffs) {
        xi.assign(c - top);
        if *xi < 0 {
            *xi += n;
        }
    }
}

fn eval_term(out: &mut Integer, term: &Term, x: &[Integer]) {
    let (square, pairs) = *term;
    out.assign(0);
    for &(a, b) in pairs {
        *out += &x[a] * &x[b];
    }
    *out <<= 1u32;
    if let Some(s) = square {
        *out += &x[s] * &x[s];
    }
}

/// Closed-form square of a prime-order element in place. The caller has
/// checked that the element's order is `P` and that `terms` is its table.
fn square_prime_order<const P: usize>(
    f: &mut UnityElement,
    scratch: &mut Scratch,
    terms: &[Term; P],
) {
    if f.len == 0 {
        return;
    }
    let UnityElement { ctx, coeffs, len } = f;
    let n = ctx.modulus();

    let (x, rest) = scratch.t.split_at_mut(P - 1);
    let y = &mut rest[..P];

    load_reduced_input(x, coeffs, n);
    for (yk, term) in y.iter_mut().zip(terms.iter()) {
        eval_term(yk, term, x);
    }

    let (low, top) = y.split_at(P - 1);
    let top = &top[0];
    for (c, yk) in coeffs.iter_mut().zip(low) {
        c.assign(yk - top);
        reduce_full(c, n);
    }
    coeffs[P - 1].assign(0);
    *len = normalised_len(coeffs);
}

fn expect_order(f: &UnityElement, p: u64) -> Result<(), UnityError> {
    if f.p() == p && f.exp() == 1 {
        Ok(())
    } else {
        Err(UnityError::WrongOrder {
            expected_p: p,
            expected_exp: 1,
            p: f.p(),
            exp: f.exp(),
        })
    }
}

pub(crate) fn sqr5_unchecked(f: &mut UnityElement, scratch: &mut Scratch) {
    square_prime_order::<5>(f, scratch, &SQR5_TERMS);
}

pub(crate) fn sqr7_unchecked(f: &mut UnityElement, scratch: &mut Scratch) {
    square_prime_order::<7>(f, scratch, &SQR7_TERMS);
}

/// Square an element of Z[ζ_5]/(n) in place.
///
/// # Errors
///
/// `WrongOrder` unless the element has `p = 5, exp = 1`.
pub fn sqr5(f: &mut UnityElement, scratch: &mut Scratch) -> Result<(), UnityError> {
    expect_order(f, 5)?;
    sqr5_unchecked(f, scratch);
    Ok(())
}

/// Square an element of Z[ζ_7]/(n) in place.
///
/// # Errors
///
/// `WrongOrder` unless the element has `p = 7, exp = 1`.
pub fn sqr7(f: &mut UnityElement, scratch: &mut Scratch) -> Result<(), UnityError> {
    expect_order(f, 7)?;
    sqr7_unchecked(f, scratch);
    Ok(())
}
