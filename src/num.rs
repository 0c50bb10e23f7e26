//! Exact decimal-scaled rational numbers.
//!
//! A [`Numeric`] carries an exact rational magnitude, the display scale fixed
//! when the value was created (how many fractional digits its literal or the
//! producing operation declared) and a live handle to the engine's current
//! scale cell. Scale-sensitive operations (division, remainder, power) read
//! the cell at execution time, so changing the global scale retroactively
//! affects values created earlier. The magnitude itself is never silently
//! truncated; truncation happens only at the operation boundaries below and
//! when rendering.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use rug::{Integer, Rational, ops::Pow};

use crate::errors::CalcError;

///truncate an exact rational to a number of decimal digits, toward zero
pub(crate) fn truncate(r: &Rational, scale: u32) -> Rational {
	let f = Rational::from(Integer::from(10u32).pow(scale));
	let scaled = Rational::from(r * &f).trunc();
	scaled / f
}

///arbitrary-precision number with a fixed display scale
#[derive(Clone)]
pub struct Numeric {
	///exact magnitude, a ratio of integers
	mag: Rational,
	///fractional digits declared at construction
	scale: u32,
	///live handle to the engine's current scale
	global: Rc<Cell<u32>>
}
impl Numeric {
	pub fn new(mag: Rational, scale: u32, global: Rc<Cell<u32>>) -> Self {
		Self {mag, scale, global}
	}

	///parse a literal: optional `_` negation, digits `0-9A-F`, optional `.` and
	///more digits
	///
	///digit characters are always the base-16 set, but their place value comes
	///from the current input base: `FE` is 15*base+14, not necessarily 254.
	///the display scale is the character count after the point, regardless of
	///base.
	pub fn from_literal(lit: &[u8], base: u32, global: Rc<Cell<u32>>) -> Self {
		let mut digits = lit;
		let neg = if digits.first() == Some(&b'_') {
			digits = &digits[1..];
			true
		}
		else {false};

		let mut acc = Integer::new();
		let mut frac: u32 = 0;
		let mut seen_point = false;
		for &b in digits {
			if b == b'.' {
				seen_point = true;
				continue;
			}
			let d = if b.is_ascii_digit() {u32::from(b - b'0')} else {u32::from(b - b'A') + 10};
			acc *= base;
			acc += d;
			if seen_point {frac += 1;}
		}

		let mut mag = Rational::from((acc, Integer::from(base).pow(frac)));
		if neg {mag = -mag;}
		Self {mag, scale: frac, global}
	}

	#[inline(always)]
	///display scale (fractional digit count)
	pub fn scale(&self) -> u32 {
		self.scale
	}

	pub fn to_rational(&self) -> Rational {
		self.mag.clone()
	}

	///integer part, truncated toward zero
	pub fn to_integer(&self) -> Integer {
		self.mag.clone().trunc().into_numer_denom().0
	}

	pub fn to_f64(&self) -> f64 {
		self.mag.to_f64()
	}

	pub fn is_zero(&self) -> bool {
		self.mag.cmp0() == Ordering::Equal
	}

	fn derive(&self, mag: Rational, scale: u32) -> Self {
		Self {mag, scale, global: Rc::clone(&self.global)}
	}

	pub fn neg(&self) -> Self {
		self.derive(Rational::from(-&self.mag), self.scale)
	}

	///exact sum, scale is the larger operand scale
	pub fn add(&self, other: &Self) -> Self {
		self.derive(Rational::from(&self.mag + &other.mag), self.scale.max(other.scale))
	}

	///exact difference, scale is the larger operand scale
	pub fn sub(&self, other: &Self) -> Self {
		self.derive(Rational::from(&self.mag - &other.mag), self.scale.max(other.scale))
	}

	///product truncated to min(sa+sb, max(sa, sb, current scale))
	pub fn mul(&self, other: &Self) -> Self {
		let s = (self.scale + other.scale).min(self.scale.max(other.scale).max(self.global.get()));
		self.derive(truncate(&Rational::from(&self.mag * &other.mag), s), s)
	}

	///quotient truncated to the current scale
	pub fn div(&self, other: &Self) -> Result<Self, CalcError> {
		if other.is_zero() {
			return Err(CalcError::Internal("division by zero".into()));
		}
		let s = self.global.get();
		Ok(self.derive(truncate(&Rational::from(&self.mag / &other.mag), s), s))
	}

	///remainder, defined so that a = (a/b)*b + a%b at the current scale
	pub fn rem(&self, other: &Self) -> Result<Self, CalcError> {
		let quot = self.div(other)?;
		Ok(self.sub(&quot.mul(other)))
	}

	///power with a truncated integer exponent, result truncated to the current
	///scale
	pub fn pow(&self, exponent: &Self) -> Result<Self, CalcError> {
		let e = exponent.to_integer().to_i32()
			.ok_or_else(|| CalcError::Range("exponent magnitude too large".into()))?;
		if e < 0 && self.is_zero() {
			return Err(CalcError::Internal("division by zero".into()));
		}
		let s = self.global.get();
		Ok(self.derive(truncate(&Rational::from((&self.mag).pow(e)), s), s))
	}

	///digit count of the base-10 rendering, ignoring sign and radix point:
	///leading zeros of the integer part don't count, zeros right after the
	///point do
	pub fn length(&self) -> u32 {
		let s = self.to_radix(10);
		let s = s.trim_start_matches('-');
		let (int, frac) = s.split_once('.').unwrap_or((s, ""));
		let n = int.trim_start_matches('0').len() + frac.len();
		if n == 0 {1} else {n as u32}
	}

	///render in any base from 2 to 36, letters upper-cased, with exactly
	///`scale` fractional digits produced by repeated multiplication
	pub fn to_radix(&self, base: u32) -> String {
		let mut out = String::new();
		if self.mag.cmp0() == Ordering::Less {out.push('-');}
		let mag = truncate(&Rational::from(self.mag.abs_ref()), self.scale);
		let int = mag.clone().trunc().into_numer_denom().0;
		out.push_str(&int.to_string_radix(base as i32).to_uppercase());
		if self.scale > 0 {
			out.push('.');
			let mut frac = mag - &int;
			for _ in 0..self.scale {
				frac *= base;
				let d = frac.clone().trunc().into_numer_denom().0;
				out.push_str(&d.to_string_radix(base as i32).to_uppercase());
				frac -= d;
			}
		}
		out
	}
}
impl PartialEq for Numeric {
	fn eq(&self, other: &Self) -> bool {
		self.mag == other.mag
	}
}
impl PartialOrd for Numeric {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.mag.partial_cmp(&other.mag)
	}
}
impl fmt::Display for Numeric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_radix(10))
	}
}
impl fmt::Debug for Numeric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (scale {})", self.to_radix(10), self.scale)
	}
}
