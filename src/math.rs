//! Numeric helper routines: modular exponentiation and n-th roots over exact
//! rationals.

use rug::{Integer, Rational, ops::Pow};

use crate::errors::CalcError;
use crate::num::truncate;

///floored modulo over rationals, the reduction step of [`modexp`]
fn rmod(a: &Rational, m: &Rational) -> Rational {
	let q = Rational::from(a / m).floor();
	Rational::from(a - &(q * m))
}

///modular exponentiation by repeated squaring, reducing after each
///multiplication step
///
///the exponent must be a non-negative integer; the base and modulus may be
///any rationals. an exponent of zero yields 1 before any other check.
pub fn modexp(base: &Rational, exponent: &Rational, modulus: &Rational) -> Result<Rational, CalcError> {
	if *exponent == 0 {
		return Ok(Rational::from(1));
	}
	if *exponent < 0 || !exponent.is_integer() {
		return Err(CalcError::Range(format!("exponent '{exponent}' is not a non-negative integer")));
	}
	if *modulus == 0 {
		return Err(CalcError::Range("zero modulus".into()));
	}

	let mut exp = exponent.clone().into_numer_denom().0;
	let mut result = Rational::from(1);
	let mut factor = base.clone();
	while exp > 0 {
		if exp.is_odd() {
			result *= &factor;
		}
		result = rmod(&result, modulus);
		exp >>= 1u32;
		factor = Rational::from(&factor * &factor);
	}
	Ok(result)
}

///n-th root by Newton-Raphson iteration, truncated (not rounded) to the
///requested decimal scale
///
///seeded from a float estimate; the iteration cap grows with the scale so
///termination is guaranteed even when convergence stalls.
pub fn root(base: &Rational, degree: u32, scale: u32) -> Rational {
	let est = base.to_f64().powf(1.0 / f64::from(degree));
	let mut x0 = Rational::from_f64(est).unwrap_or_else(|| base.clone());
	let tolerance = Rational::from((Integer::from(1), Integer::from(10u32).pow(scale + 1)));
	let epsilon = Rational::from(&tolerance * &tolerance);
	let deg = Rational::from(degree);

	let mut x1 = x0.clone();
	for _ in 0..(scale + 3) * 20 {
		let y = Rational::from((&x0).pow(degree as i32)) - base;
		let y_deriv = Rational::from((&x0).pow(degree as i32 - 1)) * &deg;
		if Rational::from(y_deriv.abs_ref()) < epsilon {
			break;
		}
		x1 = x0.clone() - y / y_deriv;
		if x1 == 0 {
			break;
		}
		let rel = Rational::from(&x1 - &x0).abs() / Rational::from(x1.abs_ref());
		if rel < tolerance {
			break;
		}
		x0 = x1.clone();
	}
	truncate(&x1, scale)
}
