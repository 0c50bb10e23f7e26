//! Incremental, restartable tokenizer.
//!
//! The scanner owns the engine's only piece of cross-call persistent parse
//! state: a bracket-nesting counter and a partially accumulated string
//! literal. A bracketed string left unclosed at the end of one input chunk is
//! retained and resumes accumulating on the next chunk, so callers may split
//! program text at arbitrary byte boundaries.

use regex::bytes::Regex;

use crate::errors::CalcError;

lazy_static! {
	//digit characters are always the base-16 set; place value is applied later
	static ref NUMBER: Regex = Regex::new(r"^_?(?:[0-9A-F]+(?:\.[0-9A-F]*)?|\.[0-9A-F]+)").unwrap();
}

///one recognized operator invocation
#[derive(Debug, PartialEq)]
pub enum Token {
	///numeric literal, raw bytes (possibly `_`-negated, possibly fractional)
	Num(Vec<u8>),
	///bracketed string literal, brackets stripped
	Str(Vec<u8>),
	///register operator `s l S L : ;` plus its register byte
	Reg(u8, u8),
	///conditional macro operator `< = >` (optionally `!`-negated) plus its
	///register byte
	Cond {
		op: u8,
		reg: u8,
		invert: bool
	},
	///`!` shell escape, rest of the line
	Shell(Vec<u8>),
	///any other single-byte operator
	Op(u8)
}

///byte cursor over one input chunk
pub struct Cursor<'a> {
	buf: &'a [u8],
	pos: usize
}
impl<'a> Cursor<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Self {buf, pos: 0}
	}

	#[inline(always)]
	fn peek(&self) -> Option<u8> {
		self.buf.get(self.pos).copied()
	}

	#[inline(always)]
	fn bump(&mut self) -> Option<u8> {
		let b = self.peek();
		if b.is_some() {self.pos += 1;}
		b
	}

	#[inline(always)]
	fn rest(&self) -> &[u8] {
		&self.buf[self.pos..]
	}
}

///tokenizer state that survives between `run` calls
#[derive(Default)]
pub struct Scanner {
	///bracket depth of the literal being accumulated
	nesting: usize,
	///unclosed literal carried over from previous chunks
	pending: Option<Vec<u8>>
}
impl Scanner {
	///extract the next token, or None when the chunk is exhausted (possibly
	///mid-literal, to be resumed by the next chunk)
	pub fn next_token(&mut self, cur: &mut Cursor) -> Result<Option<Token>, CalcError> {
		loop {
			//resume or continue a string literal first
			if self.nesting > 0 {
				let mut buf = self.pending.take().unwrap_or_default();
				while let Some(b) = cur.bump() {
					match b {
						b'[' => {
							self.nesting += 1;
							buf.push(b);
						}
						b']' => {
							self.nesting -= 1;
							if self.nesting == 0 {
								return Ok(Some(Token::Str(buf)));
							}
							buf.push(b);
						}
						_ => {buf.push(b);}
					}
				}
				self.pending = Some(buf);	//suspend until the next chunk
				return Ok(None);
			}

			let b = match self.skip_blanks(cur) {
				Some(b) => b,
				None => {return Ok(None);}
			};

			match b {
				b'[' => {
					cur.bump();
					self.nesting = 1;
					self.pending = Some(Vec::new());
				}

				b']' => {
					return Err(CalcError::UnbalancedBrackets);
				}

				b'0'..=b'9'|b'A'..=b'F'|b'.'|b'_' => {
					return if let Some(m) = NUMBER.find(cur.rest()) {
						let lit = m.as_bytes().to_vec();
						cur.pos += m.end();
						Ok(Some(Token::Num(lit)))
					}
					else {
						//a lone `_` or `.` with no digits
						Err(CalcError::InvalidCommand(b))
					};
				}

				//negated conditional digraph, or shell escape to end of line
				b'!' => {
					cur.bump();
					return match cur.peek() {
						Some(op @ (b'<'|b'='|b'>')) => {
							cur.bump();
							let reg = cur.bump().ok_or(CalcError::InvalidCommand(op))?;
							Ok(Some(Token::Cond {op, reg, invert: true}))
						}
						_ => {
							let mut cmd = Vec::new();
							while let Some(c) = cur.bump() {
								if c == b'\n' {break;}
								cmd.push(c);
							}
							Ok(Some(Token::Shell(cmd)))
						}
					};
				}

				b's'|b'l'|b'S'|b'L'|b':'|b';' => {
					cur.bump();
					let reg = cur.bump().ok_or(CalcError::InvalidCommand(b))?;
					return Ok(Some(Token::Reg(b, reg)));
				}

				b'<'|b'='|b'>' => {
					cur.bump();
					let reg = cur.bump().ok_or(CalcError::InvalidCommand(b))?;
					return Ok(Some(Token::Cond {op: b, reg, invert: false}));
				}

				_ => {
					cur.bump();
					return Ok(Some(Token::Op(b)));
				}
			}
		}
	}

	///skip whitespace and #-comments, returning the next significant byte
	///without consuming it
	fn skip_blanks(&self, cur: &mut Cursor) -> Option<u8> {
		loop {
			let b = cur.peek()?;
			if b.is_ascii_whitespace() {
				cur.bump();
			}
			else if b == b'#' {
				while let Some(c) = cur.bump() {
					if c == b'\n' {break;}
				}
			}
			else {
				return Some(b);
			}
		}
	}
}
