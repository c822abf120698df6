//! This module implements utility functions.

use std::fmt;
use std::mem::size_of;
use std::slice;

/// Reinterprets the given reference as a slice of bytes.
pub fn reinterpret<T>(val: &T) -> &[u8] {
	unsafe {
		slice::from_raw_parts(val as *const _ as *const u8, size_of::<T>())
	}
}

/// Performs a division of `a` by `b`, rounding the result up.
pub fn ceil_division(a: usize, b: usize) -> usize {
	(a + b - 1) / b
}

/// Structure representing a number of bytes.
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut order = (63 - self.0.max(1).leading_zeros() as u64) / 10;

		let suffix = match order {
			0 => "bytes",
			1 => "KiB",
			2 => "MiB",
			3 => "GiB",
			4 => "TiB",

			_ => {
				order = 0;
				"bytes"
			}
		};

		let unit = 1024u64.pow(order as u32);
		write!(fmt, "{} {}", self.0 / unit, suffix)
	}
}
