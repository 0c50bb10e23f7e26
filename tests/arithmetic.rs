mod common;

use common::*;
use rdc::{CalcError, ExtensionSet};
use rug::Rational;

#[test]
fn adds_two_numbers() {
	let (_, out) = exec("1 2 +p");
	assert_eq!(out, "3\n");
}

#[test]
fn subtracts_two_numbers() {
	let (_, out) = exec("2 1 -p");
	assert_eq!(out, "1\n");
}

#[test]
fn handles_negative_results_from_subtraction() {
	let (stack, out) = exec("3 5 -p");
	assert_eq!(out, "-2\n");
	assert_eq!(rats(&stack), ints(&[-2]));
}

#[test]
fn remainder_matches_the_division_identity() {
	//GNU dc documents that % is the same as the sequence Sd dld/ Ld*-
	for a in [4i32, -4, 2, -2] {
		for b in [2i32, -2, 1, -1] {
			let numbers = format!("{} {}", dc_int(a), dc_int(b));
			let (stack, _) = exec(&format!("{numbers} % {numbers} Sd dld/ Ld*-"));
			let vals = rats(&stack);
			assert_eq!(vals.len(), 2);
			assert_eq!(vals[0], vals[1], "{a} % {b}");
		}
	}
}

#[test]
fn remainder_identity_holds_at_higher_scales() {
	for scale in [0u32, 3, 7] {
		let (stack, _) = exec(&format!("{scale}k 17 7 % 17 7 Sd dld/ Ld*-"));
		let vals = rats(&stack);
		assert_eq!(vals[0], vals[1], "scale {scale}");
	}
}

#[test]
fn multiplies_with_the_correct_precision() {
	let (stack, _) = exec("2.3 5.12* 4k 2.3 5.12*");
	assert_eq!(rats(&stack), vec![
		Rational::from((1177, 100)),
		Rational::from((11776, 1000))
	]);
}

#[test]
fn divides_with_the_correct_precision() {
	let (stack, _) = exec("3 2/ 1k 3 2/");
	assert_eq!(rats(&stack), vec![
		Rational::from(1),
		Rational::from((3, 2))
	]);
}

#[test]
fn division_by_zero_is_fatal() {
	assert!(matches!(exec_err(ExtensionSet::none(), "1 0/"), CalcError::Internal(_)));
	assert!(matches!(exec_err(ExtensionSet::none(), "1 0%"), CalcError::Internal(_)));
}

#[test]
fn power_truncates_to_the_current_scale() {
	let (_, out) = exec("2 10^p");
	assert_eq!(out, "1024\n");
	let (stack, _) = exec("2 _1^ 1k 2 _1^");
	assert_eq!(rats(&stack), vec![Rational::from(0), Rational::from((1, 2))]);
}

#[test]
fn divmod_pushes_quotient_then_remainder() {
	let (stack, _) = exec("17 5~");
	assert_eq!(rats(&stack), ints(&[3, 2]));
}

#[test]
fn arithmetic_underflow_is_fatal() {
	assert!(matches!(exec_err(ExtensionSet::none(), "1 +"), CalcError::Internal(_)));
}

#[test]
fn arithmetic_on_strings_is_fatal() {
	assert!(matches!(exec_err(ExtensionSet::none(), "[a] 1 +"), CalcError::Internal(_)));
}

///dc spells negative literals with an underscore
fn dc_int(v: i32) -> String {
	v.to_string().replace('-', "_")
}
