//! Bit-packed variable fields for embedding contexts.
//!
//! Machine models for constrained targets declare numeric variables with a
//! fixed bit width (an 11-bit millisecond counter, 1-bit input/output
//! flags). [`BitField`] gives those fields explicit masking semantics: every
//! store is reduced modulo 2^width, so overflow wraps at the declared
//! boundary instead of at the carrier type's.

use serde::{Deserialize, Serialize};

/// A fixed-width unsigned field with wraparound at 2^width.
///
/// # Example
///
/// ```
/// use strata::runtime::BitField;
///
/// let mut elapsed_ms = BitField::new(11); // values 0..=2047
/// elapsed_ms.set(2047);
/// elapsed_ms.add(1);
/// assert_eq!(elapsed_ms.get(), 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BitField {
    width: u32,
    value: u32,
}

impl BitField {
    /// Create a zeroed field of `width` bits (1 to 32).
    pub fn new(width: u32) -> Self {
        let width = width.clamp(1, 32);
        Self { width, value: 0 }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// The field's modulus minus one: the largest storable value.
    pub fn max_value(&self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    pub fn get(&self) -> u32 {
        self.value
    }

    /// Store a value, reduced modulo 2^width.
    pub fn set(&mut self, value: u32) {
        self.value = value & self.max_value();
    }

    /// Add with wraparound at the field boundary.
    pub fn add(&mut self, delta: u32) {
        self.value = self.value.wrapping_add(delta) & self.max_value();
    }

    /// Convenience for 1-bit flag fields.
    pub fn is_set(&self) -> bool {
        self.value != 0
    }
}
