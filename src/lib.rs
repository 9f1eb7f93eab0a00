//! # darkreach-aprcl — Cyclotomic Ring Arithmetic for APR-CL Proofs
//!
//! The innermost kernel of an Adleman–Pomerance–Rumely / Cohen–Lenstra
//! primality proof: arithmetic in Z[ζ]/(n), where ζ is a primitive `p^k`-th
//! root of unity and n is the candidate under test.
//!
//! ## Modules
//!
//! - [`params`]: the `(p, exp, n)` ring context shared by every element of a
//!   run, plus its TOML configuration form.
//! - [`unity`]: [`UnityElement`] — representation, coefficient access,
//!   addition, scalar multiplication, Galois automorphisms, `is_unity`.
//! - [`reduce`]: the reduction engine (cyclic fold, cyclotomic reduction).
//! - `mul`: generic convolution multiply and square.
//! - [`sqr_small`]: closed-form squarers for ζ_5 and ζ_7 and the reusable
//!   [`Scratch`] area.
//! - [`dispatch`]: routes each square to the fastest correct strategy.
//! - [`pow`]: binary and sliding-window exponentiation, parallel batches.
//! - [`checkpoint`]: resumable long exponentiations.
//!
//! ## Usage
//!
//! ```
//! use darkreach_aprcl::{Scratch, UnityCtx, UnityElement};
//! use rug::Integer;
//!
//! let ctx = UnityCtx::new(5, 1, Integer::from(101)).unwrap();
//! let g = UnityElement::from_u64s(&ctx, &[2, 3, 0, 1, 4]).unwrap();
//! let mut scratch = Scratch::new();
//! let mut acc = g.clone();
//! acc.square_in_place(&mut scratch);
//! assert_eq!(acc, g.mul(&g).unwrap());
//! ```
//!
//! ## Threading
//!
//! Elements and contexts are `Send + Sync`; the modulus is shared read-only
//! through an `Arc`. A [`Scratch`] is mutably borrowed by every square, so
//! each thread owns its own. Independent exponentiations parallelise with
//! [`pow::par_pow`].
//!
//! ## References
//!
//! - L.M. Adleman, C. Pomerance, R.S. Rumely, "On Distinguishing Prime
//!   Numbers from Composite Numbers", Annals of Mathematics, 117(1), 1983.
//! - H. Cohen, H.W. Lenstra Jr., "Primality Testing and Jacobi Sums",
//!   Mathematics of Computation, 42(165), 1984.
//! - H. Cohen, "A Course in Computational Algebraic Number Theory",
//!   Springer GTM 138, §9.1.

pub mod checkpoint;
pub mod dispatch;
pub mod error;
mod mul;
pub mod params;
pub mod pow;
pub mod reduce;
pub mod sqr_small;
pub mod unity;

pub use dispatch::SquareStrategy;
pub use error::UnityError;
pub use params::{RingConfig, UnityCtx};
pub use sqr_small::{sqr5, sqr7, Scratch};
pub use unity::UnityElement;
