//! # Checkpoint — Resumable Exponentiation State
//!
//! A single witness exponentiation `g^e` over a modulus of tens of thousands
//! of digits runs for hours. [`pow_checkpointed`] periodically persists the
//! state of the binary-method loop (accumulator plus the number of exponent
//! bits still to process) so an interrupted run resumes where it stopped.
//!
//! ## Atomic Writes
//!
//! Checkpoint files are written atomically: write to a temp file, then rename.
//! This prevents corruption from mid-write crashes or power loss.
//!
//! ## Integrity
//!
//! A SHA-256 hash is stored alongside the JSON data. On load, the hash is
//! verified — corrupted checkpoints are detected and skipped, falling back
//! to the most recent valid generation (up to 3 generations kept).
//!
//! ## Matching
//!
//! A checkpoint records the ring `(p, exp, n)`, the base and the exponent.
//! It is only resumed when all of them match the requested computation.
//! A checkpoint of any other computation is left on disk untouched and
//! [`pow_checkpointed`] returns an error instead of overwriting it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rug::Integer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::UnityError;
use crate::params::{RingConfig, UnityCtx};
use crate::sqr_small::Scratch;
use crate::unity::UnityElement;

/// Number of backup generations to keep.
const GENERATIONS: usize = 3;

/// Saved state of a binary-method exponentiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowCheckpoint {
    pub ring: RingConfig,
    /// Base coefficients, decimal.
    pub base: Vec<String>,
    /// Exponent, decimal.
    pub exponent: String,
    /// Exponent bits `0..remaining` are still to be processed.
    pub remaining: u32,
    /// Accumulator coefficients, decimal.
    pub accumulator: Vec<String>,
}

fn coeff_strings(e: &UnityElement) -> Vec<String> {
    e.coeffs().iter().map(|c| c.to_string()).collect()
}

impl PowCheckpoint {
    pub fn capture(
        base: &UnityElement,
        acc: &UnityElement,
        exponent: &Integer,
        remaining: u32,
    ) -> Self {
        PowCheckpoint {
            ring: RingConfig::new(base.p(), base.exp(), base.modulus()),
            base: coeff_strings(base),
            exponent: exponent.to_string(),
            remaining,
            accumulator: coeff_strings(acc),
        }
    }

    /// True if this checkpoint was taken while computing `base^exponent`.
    pub fn matches(&self, base: &UnityElement, exponent: &Integer) -> bool {
        self.ring == RingConfig::new(base.p(), base.exp(), base.modulus())
            && self.exponent == exponent.to_string()
            && self.base == coeff_strings(base)
            && self.remaining < exponent.significant_bits()
    }

    /// Rebuild the saved accumulator in `ctx`.
    pub fn restore(&self, ctx: &Arc<UnityCtx>) -> Result<UnityElement> {
        let coeffs = self
            .accumulator
            .iter()
            .map(|s| s.parse::<Integer>())
            .collect::<Result<Vec<_>, _>>()
            .context("invalid accumulator coefficient in checkpoint")?;
        let mut acc = UnityElement::from_coeffs(ctx, &coeffs)?;
        acc.reduce();
        Ok(acc)
    }
}

// ── On-disk format ──────────────────────────────────────────────

/// Checkpoint state sealed with the SHA-256 digest of its compact JSON.
#[derive(Serialize, Deserialize)]
struct Sealed {
    sha256: String,
    state: serde_json::Value,
}

fn digest(state: &serde_json::Value) -> Result<String> {
    let compact = serde_json::to_string(state)?;
    Ok(format!("{:x}", Sha256::digest(compact.as_bytes())))
}

/// Slot 0 is `path` itself, older slots append `.1`, `.2`, ...
fn slot_path(path: &Path, slot: usize) -> PathBuf {
    if slot == 0 {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", slot));
    PathBuf::from(name)
}

/// Shift every existing slot one generation older; the oldest is overwritten.
fn rotate(path: &Path) {
    for slot in (1..GENERATIONS).rev() {
        let newer = slot_path(path, slot - 1);
        if !newer.exists() {
            continue;
        }
        let older = slot_path(path, slot);
        if let Err(err) = fs::rename(&newer, &older) {
            warn!(
                from = %newer.display(),
                to = %older.display(),
                error = %err,
                "checkpoint: rotation failed"
            );
        }
    }
}

/// Persist `checkpoint` at `path`, keeping up to two older generations.
pub fn save(path: &Path, checkpoint: &PowCheckpoint) -> Result<()> {
    let state = serde_json::to_value(checkpoint)?;
    let sealed = Sealed {
        sha256: digest(&state)?,
        state,
    };
    let json = serde_json::to_string_pretty(&sealed)?;

    rotate(path);
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move checkpoint to {}", path.display()))?;
    Ok(())
}

/// Newest generation that parses and passes its digest check.
pub fn load(path: &Path) -> Option<PowCheckpoint> {
    (0..GENERATIONS).find_map(|slot| {
        let p = slot_path(path, slot);
        let cp = read_slot(&p)?;
        if slot > 0 {
            warn!(generation = slot, path = %p.display(), "checkpoint: recovered older generation");
        }
        Some(cp)
    })
}

fn read_slot(path: &Path) -> Option<PowCheckpoint> {
    let raw = fs::read_to_string(path).ok()?;
    let sealed: Sealed = serde_json::from_str(&raw).ok()?;
    let actual = digest(&sealed.state).ok()?;
    if actual != sealed.sha256 {
        warn!(path = %path.display(), "checkpoint: digest mismatch, skipping");
        return None;
    }
    serde_json::from_value(sealed.state).ok()
}

/// Remove every generation and any half-written temp file.
pub fn clear(path: &Path) {
    let files = (0..GENERATIONS)
        .map(|slot| slot_path(path, slot))
        .chain(std::iter::once(path.with_extension("tmp")));
    for file in files {
        if let Err(err) = fs::remove_file(&file) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %file.display(), error = %err, "checkpoint: cleanup failed");
            }
        }
    }
}

// ── Resumable exponentiation ────────────────────────────────────

/// `base^e` by the binary method, saving a checkpoint every `every` bits
/// (0 disables saving) and resuming from `path` if it holds a matching one.
/// Checkpoint files are removed once the result is computed.
///
/// # Errors
///
/// Fails without touching the files if `path` holds a checkpoint of a
/// different computation, and on a negative exponent or I/O failure.
pub fn pow_checkpointed(
    base: &UnityElement,
    e: &Integer,
    scratch: &mut Scratch,
    path: &Path,
    every: u32,
) -> Result<UnityElement> {
    if *e < 0 {
        return Err(UnityError::NegativeExponent.into());
    }
    if *e == 0 {
        return Ok(UnityElement::one(base.ctx()));
    }

    let bits = e.significant_bits();
    let (mut acc, mut remaining) = match load(path) {
        Some(cp) if cp.matches(base, e) => {
            info!(remaining = cp.remaining, bits, "checkpoint: resuming exponentiation");
            (cp.restore(base.ctx())?, cp.remaining)
        }
        Some(cp) => {
            warn!(path = %path.display(), "checkpoint: belongs to another computation");
            bail!(
                "checkpoint {} holds p={} exp={} exponent {}, not this computation",
                path.display(),
                cp.ring.p,
                cp.ring.exp,
                cp.exponent
            );
        }
        None => (base.reduced(), bits - 1),
    };

    let mut since_save = 0u32;
    while remaining > 0 {
        remaining -= 1;
        acc.square_in_place(scratch);
        if e.get_bit(remaining) {
            acc.mul_assign_scratch(base, scratch)?;
        }
        since_save += 1;
        if every > 0 && since_save >= every && remaining > 0 {
            save(path, &PowCheckpoint::capture(base, &acc, e, remaining))?;
            since_save = 0;
        }
    }

    clear(path);
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::ops::Pow;
    use std::io::Write;

    fn ring() -> Arc<UnityCtx> {
        let n = Integer::from(2u32).pow(89u32) - 1u32;
        UnityCtx::new(7, 1, n).unwrap()
    }

    fn base(ctx: &Arc<UnityCtx>) -> UnityElement {
        UnityElement::from_u64s(ctx, &[9, 8, 7, 6, 5, 4, 3]).unwrap()
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let cp = PowCheckpoint::capture(&g, &g.square(), &Integer::from(1000u32), 7);
        save(&path, &cp).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, cp);
        assert_eq!(loaded.restore(&c).unwrap(), g.square());
    }

    #[test]
    fn rotation_keeps_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(1u64 << 40);

        for remaining in [30u32, 20, 10] {
            save(&path, &PowCheckpoint::capture(&g, &g, &e, remaining)).unwrap();
        }

        assert_eq!(read_slot(&path).unwrap().remaining, 10);
        assert_eq!(read_slot(&slot_path(&path, 1)).unwrap().remaining, 20);
        assert_eq!(read_slot(&slot_path(&path, 2)).unwrap().remaining, 30);
    }

    #[test]
    fn fallback_on_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(1u64 << 40);
        save(&path, &PowCheckpoint::capture(&g, &g, &e, 25)).unwrap();
        save(&path, &PowCheckpoint::capture(&g, &g, &e, 12)).unwrap();

        {
            let mut f = fs::File::create(&path).unwrap();
            f.write_all(b"corrupted data!!!").unwrap();
        }

        assert_eq!(load(&path).unwrap().remaining, 25);
    }

    #[test]
    fn tampered_checksum_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        save(&path, &PowCheckpoint::capture(&g, &g, &Integer::from(99u32), 3)).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, raw.replace("\"remaining\": 3", "\"remaining\": 2")).unwrap();
        assert!(load(&path).is_none());
    }

    #[test]
    fn checkpointed_pow_matches_pow_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(c.modulus() - 1u32);
        let mut scratch = Scratch::new();

        let got = pow_checkpointed(&g, &e, &mut scratch, &path, 8).unwrap();
        assert_eq!(got, g.pow(&e, &mut scratch).unwrap());
        assert!(!path.exists());
        assert!(!slot_path(&path, 1).exists());
    }

    #[test]
    fn resume_continues_from_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(0b1101_0110_1011u32);
        let mut scratch = Scratch::new();

        // run the top 5 bits by hand: acc = g^(0b11010)
        let prefix = g.pow(&Integer::from(0b11010u32), &mut scratch).unwrap();
        let remaining = e.significant_bits() - 5;
        save(&path, &PowCheckpoint::capture(&g, &prefix, &e, remaining)).unwrap();

        let got = pow_checkpointed(&g, &e, &mut scratch, &path, 0).unwrap();
        assert_eq!(got, g.pow(&e, &mut scratch).unwrap());
    }

    #[test]
    fn resume_uses_saved_accumulator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(12345u32);
        let marker = UnityElement::zeta_pow(&c, 3);
        save(&path, &PowCheckpoint::capture(&g, &marker, &e, 0)).unwrap();

        let mut scratch = Scratch::new();
        let got = pow_checkpointed(&g, &e, &mut scratch, &path, 0).unwrap();
        assert_eq!(got, marker);
    }

    #[test]
    fn foreign_checkpoint_is_left_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let other_e = Integer::from(777u32);
        let marker = UnityElement::zeta_pow(&c, 3);
        let foreign = PowCheckpoint::capture(&g, &marker, &other_e, 0);
        save(&path, &foreign).unwrap();

        let e = Integer::from(12345u32);
        let mut scratch = Scratch::new();
        let err = pow_checkpointed(&g, &e, &mut scratch, &path, 4).unwrap_err();
        assert!(err.to_string().contains("777"), "{}", err);

        assert_eq!(load(&path).unwrap(), foreign);
        assert!(!slot_path(&path, 1).exists());

        // a separate path runs the same computation normally
        let other = dir.path().join("other.json");
        let got = pow_checkpointed(&g, &e, &mut scratch, &other, 4).unwrap();
        assert_eq!(got, g.pow(&e, &mut scratch).unwrap());
        assert_eq!(load(&path).unwrap(), foreign);
    }

    #[test]
    fn rotation_failure_keeps_saving() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(1u64 << 40);
        save(&path, &PowCheckpoint::capture(&g, &g, &e, 30)).unwrap();
        // non-empty directories in the older slots make both renames fail
        for slot in 1..GENERATIONS {
            fs::create_dir(slot_path(&path, slot)).unwrap();
            fs::write(slot_path(&path, slot).join("x"), b"x").unwrap();
        }

        save(&path, &PowCheckpoint::capture(&g, &g, &e, 20)).unwrap();
        assert_eq!(load(&path).unwrap().remaining, 20);
    }

    #[test]
    fn clear_removes_every_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let g = base(&c);
        let e = Integer::from(1u64 << 40);
        for remaining in [3u32, 2, 1] {
            save(&path, &PowCheckpoint::capture(&g, &g, &e, remaining)).unwrap();
        }
        clear(&path);
        assert!((0..GENERATIONS).all(|slot| !slot_path(&path, slot).exists()));
        assert!(load(&path).is_none());
        clear(&path);
    }

    #[test]
    fn negative_exponent_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pow.json");
        let c = ring();
        let mut scratch = Scratch::new();
        let err = pow_checkpointed(&base(&c), &Integer::from(-5), &mut scratch, &path, 0)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<UnityError>(),
            Some(&UnityError::NegativeExponent)
        );
    }
}
