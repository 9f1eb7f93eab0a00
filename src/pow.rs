//! # Pow — Exponentiation of Unity Elements
//!
//! The APR-CL witnesses are powers `g^e` in Z[ζ_{p^k}]/(n) with `e` about
//! the size of n, so almost all of a certificate's running time is spent in
//! the loops below. Every square goes through the dispatcher
//! ([`UnityElement::square_in_place`]), so the ζ_5 and ζ_7 closed forms are
//! picked up automatically.
//!
//! ## Algorithms
//!
//! - [`UnityElement::pow`]: left-to-right binary method, one square per bit
//!   plus one multiply per set bit.
//! - [`UnityElement::pow_sliding`]: sliding window of up to `w` bits with
//!   `2^(w−1)` precomputed odd powers, trading a small table for roughly
//!   `bits / (w + 1)` multiplies instead of `bits / 2`.
//! - [`par_pow`]: independent exponentiations fanned out over rayon, one
//!   [`Scratch`] per worker. Within a single exponentiation every step
//!   depends on the previous one, so there is nothing to parallelise there.
//!
//! Bit loops count the unprocessed bits down to zero instead of indexing
//! from the top, so no unsigned index wraps below zero.

use rayon::prelude::*;
use rug::Integer;
use tracing::debug;

use crate::error::UnityError;
use crate::sqr_small::Scratch;
use crate::unity::UnityElement;

/// Sliding-window width for an exponent of `bits` bits.
pub fn window_bits(bits: u32) -> u32 {
    match bits {
        0..=8 => 1,
        9..=24 => 2,
        25..=80 => 3,
        81..=240 => 4,
        241..=672 => 5,
        _ => 6,
    }
}

impl UnityElement {
    /// `self^e` by the binary method. The result is canonical.
    ///
    /// # Errors
    ///
    /// `NegativeExponent` if `e < 0`.
    pub fn pow(&self, e: &Integer, scratch: &mut Scratch) -> Result<UnityElement, UnityError> {
        if *e < 0 {
            return Err(UnityError::NegativeExponent);
        }
        if *e == 0 {
            return Ok(UnityElement::one(&self.ctx));
        }

        let mut acc = self.reduced();
        let mut remaining = e.significant_bits() - 1;
        while remaining > 0 {
            remaining -= 1;
            acc.square_in_place(scratch);
            if e.get_bit(remaining) {
                acc.mul_assign_with(self, &mut scratch.product);
            }
        }
        Ok(acc)
    }

    pub fn pow_u64(&self, e: u64, scratch: &mut Scratch) -> UnityElement {
        let mut acc = UnityElement::one(&self.ctx);
        if e == 0 {
            return acc;
        }
        acc = self.reduced();
        let mut remaining = 64 - e.leading_zeros() - 1;
        while remaining > 0 {
            remaining -= 1;
            acc.square_in_place(scratch);
            if (e >> remaining) & 1 == 1 {
                acc.mul_assign_with(self, &mut scratch.product);
            }
        }
        acc
    }

    /// `self^e` by the sliding-window method. Same result as [`Self::pow`].
    pub fn pow_sliding(
        &self,
        e: &Integer,
        scratch: &mut Scratch,
    ) -> Result<UnityElement, UnityError> {
        if *e < 0 {
            return Err(UnityError::NegativeExponent);
        }
        if *e == 0 {
            return Ok(UnityElement::one(&self.ctx));
        }

        let bits = e.significant_bits();
        let w = window_bits(bits);
        debug!(
            bits,
            window = w,
            strategy = %self.ctx.strategy(),
            "unity: sliding-window exponentiation"
        );

        // odd powers g, g^3, ..., g^(2^w - 1)
        let base = self.reduced();
        let mut g2 = base.clone();
        g2.square_in_place(scratch);
        let table_len = 1usize << (w - 1);
        let mut table = Vec::with_capacity(table_len);
        table.push(base);
        for i in 1..table_len {
            let mut next = table[i - 1].clone();
            next.mul_assign_with(&g2, &mut scratch.product);
            table.push(next);
        }

        let mut acc = UnityElement::one(&self.ctx);
        let mut started = false;
        let mut pos = bits;
        while pos > 0 {
            let top = pos - 1;
            if !e.get_bit(top) {
                acc.square_in_place(scratch);
                pos = top;
                continue;
            }

            // longest window ending in a set bit, at most w bits wide
            let mut low = (top + 1).saturating_sub(w);
            while !e.get_bit(low) {
                low += 1;
            }
            let mut window = 0usize;
            for i in (low..=top).rev() {
                window = (window << 1) | e.get_bit(i) as usize;
            }
            let entry = &table[window >> 1];

            if started {
                for _ in low..=top {
                    acc.square_in_place(scratch);
                }
                acc.mul_assign_with(entry, &mut scratch.product);
            } else {
                acc = entry.clone();
                started = true;
            }
            pos = low;
        }
        Ok(acc)
    }
}

/// Raise every base to `e` in parallel. Results keep the order of `bases`.
pub fn par_pow(bases: &[UnityElement], e: &Integer) -> Result<Vec<UnityElement>, UnityError> {
    debug!(
        count = bases.len(),
        bits = e.significant_bits(),
        "unity: parallel exponentiation"
    );
    bases
        .par_iter()
        .map_init(Scratch::new, |scratch, g| g.pow_sliding(e, scratch))
        .collect()
}
