//! # Reduce — Cyclic Fold and Cyclotomic Reduction
//!
//! Multiplying two elements of dimension `p^k` yields up to `2·p^k − 1`
//! coefficients. Restoring the canonical representative takes two passes:
//!
//! 1. **Cyclic fold** ([`fold_cyclic`]): apply ζ^(p^k) = 1 by adding each
//!    coefficient at index `i ≥ p^k` into index `i − p^k`, sweeping downward.
//!    Both summands are already in `[0, n)`, so one conditional subtraction
//!    of n restores the range — no big-integer division.
//! 2. **Cyclotomic reduction** ([`reduce_cyclotomic`]): apply
//!    Φ_{p^k}(ζ) = 0, i.e. ζ^φ = −Σ_{j<p−1} ζ^(j·p^(k−1)), clearing every
//!    coefficient at index `≥ φ`. Each subtraction is corrected by one
//!    conditional addition of n.
//!
//! Both loops iterate over `Range::rev()`, so no index ever underflows.

use rug::ops::RemRounding;
use rug::Integer;

use crate::params::UnityCtx;

/// Fully reduce `c` into `[0, n)`.
#[inline]
pub(crate) fn reduce_full(c: &mut Integer, n: &Integer) {
    *c = std::mem::take(c).rem_euc(n);
}

/// Fold a coefficient buffer modulo `x^order − 1` and leave exactly `order`
/// entries, each in `[0, n)`.
///
/// Entries must already lie in `[0, n)`. Buffers shorter than `order` are
/// zero-padded.
pub fn fold_cyclic(buf: &mut Vec<Integer>, order: usize, n: &Integer) {
    if buf.len() <= order {
        buf.resize(order, Integer::new());
        return;
    }
    for i in (order..buf.len()).rev() {
        let high = std::mem::take(&mut buf[i]);
        let low = &mut buf[i - order];
        *low += high;
        if *low >= *n {
            *low -= n;
        }
    }
    buf.truncate(order);
}

/// Reduce a folded buffer (at least `order` entries, all in `[0, n)`) modulo
/// Φ_{p^k}, zeroing every coefficient at index `≥ phi`.
pub fn reduce_cyclotomic(buf: &mut [Integer], ctx: &UnityCtx) {
    debug_assert!(buf.len() >= ctx.order());
    let n = ctx.modulus();
    let phi = ctx.phi();
    let stride = ctx.sub_order();
    let terms = ctx.p() as usize - 1;

    for i in (phi..ctx.order()).rev() {
        if buf[i] == 0 {
            continue;
        }
        let c = std::mem::take(&mut buf[i]);
        // targets i − phi + j·stride are all below phi
        let base = i - phi;
        for j in 0..terms {
            let t = &mut buf[base + j * stride];
            *t -= &c;
            if *t < 0 {
                *t += n;
            }
        }
    }
}

/// Logical length: index of the highest non-zero coefficient plus one.
pub fn normalised_len(buf: &[Integer]) -> usize {
    buf.iter().rposition(|c| *c != 0).map_or(0, |i| i + 1)
}

/// Full reduction engine pass: fold, then reduce modulo Φ_{p^k}.
/// Returns the resulting logical length.
pub fn reduce_buffer(buf: &mut Vec<Integer>, ctx: &UnityCtx) -> usize {
    fold_cyclic(buf, ctx.order(), ctx.modulus());
    reduce_cyclotomic(buf, ctx);
    normalised_len(buf)
}
