//! The interpreter engine: operand stack, registers, dispatch and the macro
//! control-flow protocol.
//!
//! One [`Calculator`] owns all mutable state. Program text is fed to
//! [`Calculator::run`] in chunks; the scanner keeps enough state that string
//! literals may span chunk boundaries. Macro invocation recurses through
//! ordinary function calls, and the two quit operators unwind by propagating
//! a [`Signal`] value back through those calls rather than by native
//! unwinding, so that a leveled quit can resume execution in the middle of an
//! ancestor's token stream.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Write};
use std::rc::Rc;
use phf::{phf_map, Map};
use rug::{Integer, Rational, integer::Order};
use tracing::{debug, trace};

use crate::{Extension, ExtensionSet, Value};
use crate::errors::CalcError;
use crate::math;
use crate::num::Numeric;
use crate::scan::{Cursor, Scanner, Token};

///result of one program-text invocation
#[derive(Clone, Copy, Debug, PartialEq)]
enum Signal {
	///normal completion, carrying the depth as of the end of the invocation;
	///lower values request unwinding of enclosing macro levels
	Done(usize),
	///stop the whole program
	Terminated
}

///extension requirement for a gated operator
enum Gate {
	///either compatibility mode
	Compat,
	///freebsd only
	Freebsd
}

///operators whose extension must be checked before anything else
static GATED: Map<u8, Gate> = phf_map! {
	b'r' => Gate::Compat,
	b'n' => Gate::Compat,
	b'a' => Gate::Compat,
	b'R' => Gate::Freebsd,
	b'(' => Gate::Freebsd,
	b'{' => Gate::Freebsd,
	b'G' => Gate::Freebsd,
	b'N' => Gate::Freebsd,
};

///required stack depths, checked before execution
static ARITY: Map<u8, usize> = phf_map! {
	b'+' => 2,
	b'-' => 2,
	b'*' => 2,
	b'/' => 2,
	b'%' => 2,
	b'^' => 2,
	b'~' => 2,
	b'|' => 3,
	b'r' => 2,
	b'(' => 2,
	b'{' => 2,
	b'G' => 2,
	b'v' => 1,
	b'a' => 1,
	b'x' => 1,
	b'n' => 1,
	b'P' => 1,
	b'Z' => 1,
	b'X' => 1,
	b'N' => 1,
	b'k' => 1,
	b'i' => 1,
	b'o' => 1,
	b'Q' => 1,
	b'd' => 1,
	b'p' => 1,
	b'R' => 1,
};

///one pushed register entry: a value paired with its sparse array
///
///the pair is pushed and popped only as a unit (`S`/`L`); `s`/`l` and the
///array operators mutate the current top pair in place
#[derive(Clone, Debug)]
pub struct RegFrame {
	value: Value,
	array: BTreeMap<u64, Value>
}
impl RegFrame {
	fn new(value: Value) -> Self {
		Self {value, array: BTreeMap::new()}
	}

	pub fn value(&self) -> &Value {
		&self.value
	}

	pub fn array(&self) -> &BTreeMap<u64, Value> {
		&self.array
	}
}

///Bundled state for one interpreter instance.
///
///Usage of the provided IO streams:
///- input: read by the command `?` one line at a time
///- output: normal printing by the commands `pnfP`
pub struct Calculator<'io> {
	input: &'io mut dyn BufRead,
	output: &'io mut dyn Write,
	exts: ExtensionSet,
	///main stack
	stack: Vec<Value>,
	///registers, touched lazily
	regs: HashMap<u8, Vec<RegFrame>>,
	scanner: Scanner,
	///current scale, shared with every number the engine creates
	scale: Rc<Cell<u32>>,
	///input base, 2 to 16
	ibase: u32,
	///output base, 2 to 36
	obase: u32,
	///count of currently-nested macro invocations
	depth: usize,
	///true while plain `q` semantics apply; cleared by `Q` for the rest of
	///the chunk
	break_mode: bool
}
impl<'io> Calculator<'io> {
	pub fn new(input: &'io mut dyn BufRead, output: &'io mut dyn Write, exts: ExtensionSet) -> Self {
		Self {
			input,
			output,
			exts,
			stack: Vec::new(),
			regs: HashMap::new(),
			scanner: Scanner::default(),
			scale: Rc::new(Cell::new(0)),
			ibase: 10,
			obase: 10,
			depth: 0,
			break_mode: true
		}
	}

	///Execute one chunk of program text.
	///
	///Returns `Ok(false)` only when execution was stopped by a quit at the
	///outermost level; `Ok(true)` otherwise, including after leveled quits
	///that resumed enclosing code. May be called repeatedly: registers, the
	///operand stack and an unfinished string literal all carry over.
	pub fn run(&mut self, program: &[u8]) -> Result<bool, CalcError> {
		debug!(bytes = program.len(), "executing chunk");
		self.depth = 0;
		self.break_mode = true;
		match self.exec(program)? {
			Signal::Terminated => Ok(false),
			Signal::Done(_) => Ok(true)
		}
	}

	///scan and dispatch tokens until the text is exhausted or a signal aborts
	///the loop
	fn exec(&mut self, program: &[u8]) -> Result<Signal, CalcError> {
		let mut cur = Cursor::new(program);
		while let Some(tok) = self.scanner.next_token(&mut cur)? {
			if let Some(sig) = self.dispatch(tok)? {
				return Ok(sig);
			}
		}
		Ok(Signal::Done(self.depth))
	}

	fn dispatch(&mut self, tok: Token) -> Result<Option<Signal>, CalcError> {
		match tok {
			Token::Num(lit) => {
				let n = Numeric::from_literal(&lit, self.ibase, Rc::clone(&self.scale));
				self.stack.push(Value::Num(n));
				Ok(None)
			}
			Token::Str(s) => {
				self.stack.push(Value::Str(s));
				Ok(None)
			}
			Token::Reg(op, reg) => {
				self.register_op(op, reg)?;
				Ok(None)
			}
			Token::Cond {op, reg, invert} => self.conditional(op, reg, invert),
			Token::Shell(cmd) => {
				self.shell(&cmd)?;
				Ok(None)
			}
			Token::Op(op) => self.operator(op)
		}
	}

	///single-byte operators: gate check, arity check, then the operator table
	fn operator(&mut self, op: u8) -> Result<Option<Signal>, CalcError> {
		if let Some(gate) = GATED.get(&op) {
			let (enabled, required) = match gate {
				Gate::Compat => (self.exts.compat(), "gnu or freebsd"),
				Gate::Freebsd => (self.exts.contains(Extension::Freebsd), "freebsd")
			};
			if !enabled {
				return Err(CalcError::UnsupportedExtension {op: char::from(op), required});
			}
		}
		if let Some(&need) = ARITY.get(&op) {
			if self.stack.len() < need {
				return Err(CalcError::Internal(
					format!("'{}' needs {} operand{}", char::from(op), need, if need == 1 {""} else {"s"})
				));
			}
		}

		match op {
			/*----------------
				ARITHMETIC
			----------------*/
			b'+' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.add(&b)));
			}

			b'-' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.sub(&b)));
			}

			b'*' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.mul(&b)));
			}

			b'/' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.div(&b)?));
			}

			b'%' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.rem(&b)?));
			}

			//quotient and remainder at once, remainder on top
			b'~' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				let quot = a.div(&b)?;
				let rem = a.rem(&b)?;
				self.stack.push(Value::Num(quot));
				self.stack.push(Value::Num(rem));
			}

			b'^' => {
				let b = self.pop_num(op)?;
				let a = self.pop_num(op)?;
				self.stack.push(Value::Num(a.pow(&b)?));
			}

			//modular exponentiation: modulus, exponent, base popped in that order
			b'|' => {
				let m = self.pop_num(op)?;
				let e = self.pop_num(op)?;
				let b = self.pop_num(op)?;
				let res = math::modexp(&b.to_rational(), &e.to_rational(), &m.to_rational())?;
				let res = self.number(res, 0);
				self.stack.push(Value::Num(res));
			}

			//square root at the current scale
			b'v' => {
				let a = self.pop_num(op)?;
				if a.to_rational() < 0 {
					return Err(CalcError::Range("square root of a negative number".into()));
				}
				let s = self.scale.get();
				let res = self.number(math::root(&a.to_rational(), 2, s), s);
				self.stack.push(Value::Num(res));
			}

			//logical not
			b'N' => {
				let a = self.pop_num(op)?;
				let res = self.number(Rational::from(u32::from(a.is_zero())), 0);
				self.stack.push(Value::Num(res));
			}

			/*-----------------------------------
				VALUE-PRODUCING COMPARISONS
			-----------------------------------*/
			b'('|b'{'|b'G' => {
				let t = self.pop_num(op)?;
				let s = self.pop_num(op)?;
				let holds = match op {
					b'(' => t < s,
					b'{' => t <= s,
					_ => t == s
				};
				let res = self.number(Rational::from(u32::from(holds)), 0);
				self.stack.push(Value::Num(res));
			}

			/*------------------------
				STACK MANIPULATION
			------------------------*/
			//duplicate top of stack
			b'd' => {
				let top = self.stack.last().unwrap().clone();
				self.stack.push(top);
			}

			//clear stack, registers untouched
			b'c' => {
				self.stack.clear();
			}

			//swap top two
			b'r' => {
				let len = self.stack.len();
				self.stack.swap(len - 2, len - 1);
			}

			//drop top
			b'R' => {
				self.stack.pop();
			}

			//push stack depth
			b'z' => {
				let res = self.number(Rational::from(self.stack.len() as u64), 0);
				self.stack.push(Value::Num(res));
			}

			//pop and push length: digit count for numbers, byte count for strings
			b'Z' => {
				let n = match self.pop(op)? {
					Value::Num(n) => n.length(),
					Value::Str(s) => s.len() as u32
				};
				let res = self.number(Rational::from(n), 0);
				self.stack.push(Value::Num(res));
			}

			//pop and push display scale
			b'X' => {
				let n = match self.pop(op)? {
					Value::Num(n) => n.scale(),
					Value::Str(_) => 0
				};
				let res = self.number(Rational::from(n), 0);
				self.stack.push(Value::Num(res));
			}

			/*--------------
				PRINTING
			--------------*/
			//print top with newline, no pop
			b'p' => {
				let top = self.stack.last().unwrap().clone();
				self.print_value(&top, true)?;
			}

			//pop and print without newline
			b'n' => {
				let top = self.pop(op)?;
				self.print_value(&top, false)?;
				self.output.flush()?;
			}

			//print full stack top to bottom, no pop
			b'f' => {
				for i in (0..self.stack.len()).rev() {
					let v = self.stack[i].clone();
					self.print_value(&v, true)?;
				}
			}

			//pop and print raw: strings verbatim, numbers as the bytes of their
			//integer part
			b'P' => {
				match self.pop(op)? {
					Value::Num(n) => {
						let bytes = n.to_integer().abs().to_digits::<u8>(Order::Msf);
						self.output.write_all(&bytes)?;
					}
					Value::Str(s) => {
						self.output.write_all(&s)?;
					}
				}
				self.output.flush()?;
			}

			/*----------------
				PARAMETERS
			----------------*/
			//set scale
			b'k' => {
				let n = self.pop_int(op)?;
				match n.to_u32() {
					Some(s) => {self.scale.set(s);}
					None => {return Err(CalcError::Range("scale must be a non-negative integer".into()));}
				}
			}

			//set input base
			b'i' => {
				let n = self.pop_int(op)?;
				if n < 2 || n > 16 {
					return Err(CalcError::Range("input base must be between 2 and 16".into()));
				}
				self.ibase = n.to_u32().unwrap();
			}

			//set output base
			b'o' => {
				let n = self.pop_int(op)?;
				if n < 2 || n > 36 {
					return Err(CalcError::Range("output base must be between 2 and 36".into()));
				}
				self.obase = n.to_u32().unwrap();
			}

			//read scale, input base, output base
			b'K' => {
				let res = self.number(Rational::from(self.scale.get()), 0);
				self.stack.push(Value::Num(res));
			}

			b'I' => {
				let res = self.number(Rational::from(self.ibase), 0);
				self.stack.push(Value::Num(res));
			}

			b'O' => {
				let res = self.number(Rational::from(self.obase), 0);
				self.stack.push(Value::Num(res));
			}

			/*---------------------
				CHARACTER CONVERSION
			---------------------*/
			//number to the character with that code mod 256, or string to its
			//first character; freebsd without gnu maps the nul byte to the
			//empty string
			b'a' => {
				let out = match self.pop(op)? {
					Value::Num(n) => {
						let byte = n.to_integer().div_rem_euc(Integer::from(256)).1.to_u8().unwrap();
						if byte == 0 && self.exts.contains(Extension::Freebsd) && !self.exts.contains(Extension::Gnu) {
							Vec::new()
						}
						else {
							vec![byte]
						}
					}
					Value::Str(s) => {
						match s.first() {
							Some(&b) => vec![b],
							None => Vec::new()
						}
					}
				};
				self.stack.push(Value::Str(out));
			}

			/*------------
				MACROS
			------------*/
			//execute string as macro; numbers go back untouched
			b'x' => {
				match self.pop(op)? {
					Value::Str(mac) => {return self.invoke(&mac);}
					v @ Value::Num(_) => {self.stack.push(v);}
				}
			}

			//read one line from the input source and execute it
			b'?' => {
				let mut line = Vec::new();
				self.input.read_until(b'\n', &mut line)?;
				return self.invoke(&line);
			}

			//request to quit: the whole program at top level, two macro levels
			//otherwise
			b'q' => {
				return Ok(Some(if self.depth == 0 {
					Signal::Terminated
				}
				else {
					trace!(depth = self.depth, "hard quit");
					Signal::Done(self.depth - 1)
				}));
			}

			//quit the requested number of macro levels, then resume
			b'Q' => {
				let level = self.pop_int(op)?;
				self.break_mode = false;
				let d = self.depth;
				let resp = if level > d as u64 {
					1
				}
				else if level < 1 {
					d + 1	//unwinds nothing
				}
				else {
					d - level.to_usize().unwrap() + 1
				};
				trace!(%level, depth = d, resp, "leveled quit");
				return Ok(Some(Signal::Done(resp)));
			}

			_ => {
				return Err(CalcError::InvalidCommand(op));
			}
		}
		Ok(None)
	}

	///macro invocation: recurse one level deeper and interpret the resulting
	///signal
	fn invoke(&mut self, text: &[u8]) -> Result<Option<Signal>, CalcError> {
		trace!(depth = self.depth + 1, len = text.len(), "invoking macro");
		self.depth += 1;
		let result = self.exec(text);
		self.depth -= 1;
		match result? {
			Signal::Terminated => Ok(Some(Signal::Terminated)),
			Signal::Done(resp) if resp <= self.depth => {
				//this level is unwound too: abort the rest of its text. a
				//plain-q chain that has fully unwound stops the program; a
				//leveled chain lets the top level resume
				trace!(resp, depth = self.depth, "unwinding");
				Ok(Some(if self.depth == 0 && self.break_mode {
					Signal::Terminated
				}
				else {
					Signal::Done(resp)
				}))
			}
			Signal::Done(_) => Ok(None)
		}
	}

	///conditional macro invocation against a register
	fn conditional(&mut self, op: u8, reg: u8, invert: bool) -> Result<Option<Signal>, CalcError> {
		let t = self.pop_num(op)?;
		let s = self.pop_num(op)?;
		let holds = match op {
			b'<' => t < s,
			b'=' => t == s,
			_ => t > s
		};
		if holds == invert {
			return Ok(None);
		}
		let mac = match self.regs.get(&reg).and_then(|f| f.last()) {
			Some(frame) => match &frame.value {
				Value::Str(m) => m.clone(),
				Value::Num(_) => {
					return Err(CalcError::Internal(format!("top of register '{}' is not a macro", char::from(reg))));
				}
			},
			None => {
				return Err(CalcError::Internal(format!("register '{}' is empty", char::from(reg))));
			}
		};
		self.invoke(&mac)
	}

	///register store/load and array operators
	fn register_op(&mut self, op: u8, reg: u8) -> Result<(), CalcError> {
		match op {
			//push value as a new frame, with a fresh array
			b'S' => {
				let v = self.pop(op)?;
				self.regs.entry(reg).or_default().push(RegFrame::new(v));
			}

			//pop the top frame, value back onto the stack, array discarded
			b'L' => {
				let frame = self.regs.get_mut(&reg).and_then(|f| f.pop())
					.ok_or_else(|| CalcError::Internal(format!("register '{}' is empty", char::from(reg))))?;
				self.stack.push(frame.value);
			}

			//overwrite the current frame's value, array untouched
			b's' => {
				let v = self.pop(op)?;
				let frames = self.regs.entry(reg).or_default();
				match frames.last_mut() {
					Some(f) => {f.value = v;}
					None => {frames.push(RegFrame::new(v));}
				}
			}

			//peek the current frame's value
			b'l' => {
				let v = self.top_frame(reg).value.clone();
				self.stack.push(v);
			}

			//store into the current frame's array
			b':' => {
				let idx = self.pop_index(op)?;
				let v = self.pop(op)?;
				self.top_frame(reg).array.insert(idx, v);
			}

			//load from the current frame's array, missing entries read as zero
			b';' => {
				let idx = self.pop_index(op)?;
				let v = self.top_frame(reg).array.get(&idx).cloned();
				let v = match v {
					Some(v) => v,
					None => Value::Num(self.number(Rational::new(), 0))
				};
				self.stack.push(v);
			}

			_ => unreachable!("scanner only produces register ops")
		}
		Ok(())
	}

	///`!` shell escape, one line handed to sh
	fn shell(&mut self, cmd: &[u8]) -> Result<(), CalcError> {
		if self.exts.secure() {
			return Err(CalcError::Insecure);
		}
		let line = String::from_utf8_lossy(cmd);
		let line = line.trim();
		if line.is_empty() {
			return Ok(());
		}
		debug!(command = %line, "shell escape");
		let mut child = std::process::Command::new("sh").arg("-c").arg(line).spawn()?;
		child.wait()?;
		Ok(())
	}

	fn print_value(&mut self, v: &Value, newline: bool) -> Result<(), CalcError> {
		match v {
			Value::Num(n) => {
				self.output.write_all(n.to_radix(self.obase).as_bytes())?;
			}
			Value::Str(s) => {
				self.output.write_all(s)?;
			}
		}
		if newline {
			self.output.write_all(b"\n")?;
		}
		Ok(())
	}

	#[inline(always)]
	///new number sharing the engine's scale cell
	fn number(&self, mag: Rational, scale: u32) -> Numeric {
		Numeric::new(mag, scale, Rc::clone(&self.scale))
	}

	fn pop(&mut self, op: u8) -> Result<Value, CalcError> {
		self.stack.pop()
			.ok_or_else(|| CalcError::Internal(format!("stack underflow in '{}'", char::from(op))))
	}

	fn pop_num(&mut self, op: u8) -> Result<Numeric, CalcError> {
		match self.pop(op)? {
			Value::Num(n) => Ok(n),
			Value::Str(_) => Err(CalcError::Internal(format!("'{}' expects a number", char::from(op))))
		}
	}

	///truncated integer operand
	fn pop_int(&mut self, op: u8) -> Result<Integer, CalcError> {
		Ok(self.pop_num(op)?.to_integer())
	}

	///non-negative array index operand
	fn pop_index(&mut self, op: u8) -> Result<u64, CalcError> {
		self.pop_int(op)?.to_u64()
			.ok_or_else(|| CalcError::Internal(format!("'{}' expects a non-negative index", char::from(op))))
	}

	///current top frame of a register, created with a zero value on first use
	fn top_frame(&mut self, reg: u8) -> &mut RegFrame {
		let zero = Value::Num(Numeric::new(Rational::new(), 0, Rc::clone(&self.scale)));
		let frames = self.regs.entry(reg).or_default();
		if frames.is_empty() {
			frames.push(RegFrame::new(zero));
		}
		frames.last_mut().unwrap()
	}

	/*---------------------
		INTROSPECTION
	---------------------*/
	///operand stack, bottom first
	pub fn stack(&self) -> &[Value] {
		&self.stack
	}

	///a register's frames, bottom first
	pub fn register(&self, reg: u8) -> &[RegFrame] {
		self.regs.get(&reg).map(Vec::as_slice).unwrap_or(&[])
	}

	///the current frame's array of a register, if the register has ever been
	///touched
	pub fn register_array(&self, reg: u8) -> Option<&BTreeMap<u64, Value>> {
		self.regs.get(&reg).and_then(|f| f.last()).map(RegFrame::array)
	}

	///enabled extensions in sorted order
	pub fn extensions(&self) -> Vec<Extension> {
		self.exts.list()
	}

	pub fn secure(&self) -> bool {
		self.exts.secure()
	}

	pub fn ibase(&self) -> u32 {
		self.ibase
	}

	pub fn obase(&self) -> u32 {
		self.obase
	}

	pub fn scale(&self) -> u32 {
		self.scale.get()
	}
}
