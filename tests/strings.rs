mod common;

use common::*;
use rdc::{CalcError, Extension, ExtensionSet, Value};

fn gnu() -> ExtensionSet {
	ExtensionSet::none().with(Extension::Gnu)
}

fn freebsd() -> ExtensionSet {
	ExtensionSet::none().with(Extension::Freebsd)
}

#[test]
fn parses_strings_in_brackets() {
	let (stack, _) = exec("[hello]");
	assert_eq!(stack, vec![Value::Str(b"hello".to_vec())]);
}

#[test]
fn prints_strings_with_p() {
	let (_, out) = exec("[hello]p");
	assert_eq!(out, "hello\n");
}

#[test]
fn parses_adjacent_strings_separately() {
	let (stack, _) = exec("[hello][goodbye]");
	assert_eq!(stack, vec![
		Value::Str(b"hello".to_vec()),
		Value::Str(b"goodbye".to_vec())
	]);
}

#[test]
fn keeps_nested_brackets_in_the_string() {
	let (stack, out) = exec("[hello[goodbye]]p");
	assert_eq!(stack, vec![Value::Str(b"hello[goodbye]".to_vec())]);
	assert_eq!(out, "hello[goodbye]\n");
}

#[test]
fn executes_strings_with_x() {
	let (stack, _) = exec("[4 5*]x");
	assert_eq!(rats(&stack), ints(&[20]));
}

#[test]
fn unbalanced_brackets_are_fatal() {
	assert!(matches!(exec_err(ExtensionSet::none(), "[hello]]p"), CalcError::UnbalancedBrackets));
}

#[test]
fn p_uppercase_prints_strings_without_a_newline() {
	let (_, out) = exec("[hello]P");
	assert_eq!(out, "hello");
}

#[test]
fn p_uppercase_decodes_numbers_to_bytes() {
	let (_, out) = exec("16i 48656C6C6F2C20776F726C64210A P");
	assert_eq!(out, "Hello, world!\n");
}

#[test]
fn a_converts_numbers_modulo_256() {
	//gnu overrides freebsd: every code becomes a one-byte string
	for exts in [gnu(), ExtensionSet::all()] {
		for n in [0u32, 1, 65, 255, 256, 321, 1000] {
			let (stack, _) = exec_ext(exts, &format!("{n}a"));
			assert_eq!(stack, vec![Value::Str(vec![(n % 256) as u8])], "{n}a");
		}
	}
}

#[test]
fn a_maps_nul_to_the_empty_string_on_freebsd() {
	for n in [0u32, 256] {
		let (stack, _) = exec_ext(freebsd(), &format!("{n}a"));
		assert_eq!(stack, vec![Value::Str(Vec::new())], "{n}a");
	}
	let (stack, _) = exec_ext(freebsd(), "65a");
	assert_eq!(stack, vec![Value::Str(b"A".to_vec())]);
}

#[test]
fn a_takes_the_first_character_of_strings() {
	for exts in [gnu(), freebsd(), ExtensionSet::all()] {
		let (stack, _) = exec_ext(exts, "[xob]a");
		assert_eq!(stack, vec![Value::Str(b"x".to_vec())]);

		let (stack, _) = exec_ext(exts, "[]a");
		assert_eq!(stack, vec![Value::Str(Vec::new())]);
	}
}

#[test]
fn a_requires_an_extension() {
	assert!(matches!(
		exec_err(ExtensionSet::none(), "1a"),
		CalcError::UnsupportedExtension {op: 'a', ..}
	));
}

#[test]
fn strings_reassemble_across_run_calls() {
	let out = run_chunks(ExtensionSet::none(), &["[4 ", "5 *]x", "[7 ", "3 +", "]x"]);
	assert_eq!(rats(&out.stack), ints(&[20, 10]));
}

#[test]
fn strings_span_lines_within_one_chunk() {
	let out = run_chunks(ExtensionSet::none(), &["[4 \n5 *]x\n[7 3 +\n]x"]);
	assert_eq!(rats(&out.stack), ints(&[20, 10]));
}

#[test]
fn nested_strings_reassemble_across_run_calls() {
	let out = run_chunks(ExtensionSet::none(), &["[[\n4 ", "5 *]\nx]x", "[\n[7 ", "3 +", "]x", "]x"]);
	assert_eq!(rats(&out.stack), ints(&[20, 10]));
}

#[test]
fn question_mark_reads_and_executes_one_line() {
	let out = run_chunks_with_input(ExtensionSet::none(), "4 5 *\n6 *\n", &["2 ? 3*p"]).unwrap();
	assert_eq!(rats(&out.stack), ints(&[2, 60]));
	assert_eq!(out.output, b"60\n");
}

#[test]
fn shell_escapes_require_insecure_mode() {
	assert!(matches!(exec_err(ExtensionSet::all(), "! true"), CalcError::Insecure));
	//insecure mode actually runs the command
	let out = run_chunks(ExtensionSet::all().with(Extension::Insecure), &["! true", "42p"]);
	assert_eq!(out.output, b"42\n");
}
