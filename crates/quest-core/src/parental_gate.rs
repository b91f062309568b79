//! Parental gate: an arithmetic speed-bump in front of parent-only screens.
//!
//! A child tapping into the admin area is asked for the product of two
//! small numbers. Passing the gate means "probably an adult", nothing
//! more; it is a cognitive filter, not authentication. A fresh pair is
//! drawn every time the gate opens and after every failed answer, so a
//! memorized answer from a previous attempt is useless.

use rand::Rng;

/// Lower bound (inclusive) of each challenge operand.
pub const OPERAND_MIN: u8 = 2;

/// Upper bound (inclusive) of each challenge operand.
pub const OPERAND_MAX: u8 = 9;

/// One multiplication challenge.
///
/// Operands are private so callers cannot quietly reuse a pair; a new
/// challenge comes from [`Challenge::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    a: u8,
    b: u8,
}

impl Challenge {
    /// Draw a fresh challenge from the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draw a fresh challenge from the provided RNG (seedable in tests).
    ///
    /// Both operands are drawn independently and uniformly from
    /// [`OPERAND_MIN`]..=[`OPERAND_MAX`].
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            a: rng.random_range(OPERAND_MIN..=OPERAND_MAX),
            b: rng.random_range(OPERAND_MIN..=OPERAND_MAX),
        }
    }

    /// The two operands to display, e.g. "7 × 8 = ?".
    pub const fn operands(&self) -> (u8, u8) {
        (self.a, self.b)
    }

    /// True iff `answer` is the product of the operands.
    pub fn verify(&self, answer: u32) -> bool {
        // u8 * u8 fits comfortably in u32.
        answer == u32::from(self.a).saturating_mul(u32::from(self.b))
    }
}
