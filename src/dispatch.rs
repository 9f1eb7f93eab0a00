//! # Dispatch — Squaring Strategy Selection
//!
//! Every squaring request is routed by the `(p, exp)` of the element's ring:
//! the closed forms of [`crate::sqr_small`] for ζ_5 and ζ_7, the generic
//! convolution for everything else. The choice is made once, when the
//! [`UnityCtx`](crate::params::UnityCtx) is built, and the per-call routing is
//! an exhaustive `match` on [`SquareStrategy`], so exactly one path runs.

use serde::{Deserialize, Serialize};

use crate::error::UnityError;
use crate::sqr_small::{sqr5_unchecked, sqr7_unchecked, Scratch};
use crate::unity::UnityElement;

/// How elements of a given ring are squared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareStrategy {
    /// Closed form for p = 5, exp = 1.
    Order5,
    /// Closed form for p = 7, exp = 1.
    Order7,
    /// Convolution + reduction, valid for every order.
    Generic,
}

impl SquareStrategy {
    /// Pure function of `(p, exp)`; never fails.
    pub fn select(p: u64, exp: u32) -> Self {
        match (p, exp) {
            (5, 1) => SquareStrategy::Order5,
            (7, 1) => SquareStrategy::Order7,
            _ => SquareStrategy::Generic,
        }
    }
}

impl std::fmt::Display for SquareStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SquareStrategy::Order5 => write!(f, "order5"),
            SquareStrategy::Order7 => write!(f, "order7"),
            SquareStrategy::Generic => write!(f, "generic"),
        }
    }
}

impl UnityElement {
    /// `self ← self²` using the fastest strategy for this ring and the
    /// caller's scratch space.
    pub fn square_in_place(&mut self, scratch: &mut Scratch) {
        match self.ctx.strategy() {
            SquareStrategy::Order5 => sqr5_unchecked(self, scratch),
            SquareStrategy::Order7 => sqr7_unchecked(self, scratch),
            SquareStrategy::Generic => self.sqr_generic_with(&mut scratch.product),
        }
    }

    /// `self²`, allocating its own scratch space.
    pub fn square(&self) -> UnityElement {
        let mut out = self.clone();
        out.square_in_place(&mut Scratch::new());
        out
    }

    /// `self ← self · other` reusing the scratch product buffer.
    pub fn mul_assign_scratch(
        &mut self,
        other: &UnityElement,
        scratch: &mut Scratch,
    ) -> Result<(), UnityError> {
        self.check_ring(other)?;
        self.mul_assign_with(other, &mut scratch.product);
        Ok(())
    }
}

/// Square `g` repeatedly `count` times: g^(2^count).
pub fn square_repeatedly(g: &UnityElement, count: u32, scratch: &mut Scratch) -> UnityElement {
    let mut acc = g.clone();
    for _ in 0..count {
        acc.square_in_place(scratch);
    }
    acc.reduce();
    acc
}
