#![allow(dead_code)]

use std::io::Cursor;

use rdc::{CalcError, Calculator, ExtensionSet, Value};
use rug::Rational;

///everything observable after feeding a program to a fresh engine
pub struct Outcome {
	///result of the last `run` call: false only for a top-level quit
	pub done: bool,
	pub stack: Vec<Value>,
	pub output: Vec<u8>
}

///run chunks in order on one engine, with a canned input source for `?`
pub fn run_chunks_with_input(exts: ExtensionSet, input: &str, chunks: &[&str]) -> Result<Outcome, CalcError> {
	let mut input = Cursor::new(input.as_bytes().to_vec());
	let mut output: Vec<u8> = Vec::new();
	let mut done = true;
	let stack;
	{
		let mut calc = Calculator::new(&mut input, &mut output, exts);
		for chunk in chunks {
			done = calc.run(chunk.as_bytes())?;
		}
		stack = calc.stack().to_vec();
	}
	Ok(Outcome {done, stack, output})
}

pub fn run_chunks(exts: ExtensionSet, chunks: &[&str]) -> Outcome {
	run_chunks_with_input(exts, "", chunks).expect("program should not error")
}

pub fn exec_ext(exts: ExtensionSet, program: &str) -> (Vec<Value>, String) {
	let out = run_chunks(exts, &[program]);
	(out.stack, String::from_utf8(out.output).expect("output should be utf-8"))
}

pub fn exec(program: &str) -> (Vec<Value>, String) {
	exec_ext(ExtensionSet::none(), program)
}

///run a program expected to fail, returning the error
pub fn exec_err(exts: ExtensionSet, program: &str) -> CalcError {
	match run_chunks_with_input(exts, "", &[program]) {
		Err(e) => e,
		Ok(_) => panic!("expected an error from {program:?}")
	}
}

///numeric stack snapshot, bottom first
pub fn rats(stack: &[Value]) -> Vec<Rational> {
	stack.iter().map(|v| {
		v.as_num().unwrap_or_else(|| panic!("expected a number, got {v:?}")).to_rational()
	}).collect()
}

pub fn ints(values: &[i64]) -> Vec<Rational> {
	values.iter().map(|&v| Rational::from(v)).collect()
}
