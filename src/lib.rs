//! rdc - Embeddable rewrite of the classic dc RPN calculator / esoteric programming language.
//!
//! The engine executes dc program text against an operand stack, 256 registers
//! (each a stack of value+array frames) and three numeric-formatting parameters
//! (scale, input base, output base). Numbers are exact rationals; truncation to
//! the current scale happens only at division, remainder, power, root and
//! formatting boundaries. Bracketed strings are first-class values and can be
//! invoked as macros with `x`, nested arbitrarily deep and exited early with
//! `q`/`Q`.
//!
//! ```no_run
//! use std::io::{self, BufReader};
//! use rdc::{Calculator, ExtensionSet};
//!
//! let mut input = BufReader::new(io::stdin());
//! let mut output = io::stdout();
//! let mut calc = Calculator::new(&mut input, &mut output, ExtensionSet::none());
//! calc.run(b"2 3 + p").unwrap();
//! ```

#[macro_use]
extern crate lazy_static;

pub mod errors;
pub mod num;
pub mod math;
pub mod scan;
pub mod engine;

pub use engine::{Calculator, RegFrame};
pub use errors::CalcError;
pub use num::Numeric;

///basic object: either number or byte string
///
///the language is byte-wise, not unicode-aware; strings are raw bytes
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Num(Numeric),
	Str(Vec<u8>)
}
impl Value {
	///numeric payload, if any
	pub fn as_num(&self) -> Option<&Numeric> {
		match self {
			Value::Num(n) => Some(n),
			Value::Str(_) => None
		}
	}

	///string payload, if any
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Value::Num(_) => None,
			Value::Str(s) => Some(s)
		}
	}
}

///optional compatibility modes, fixed at engine construction
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
	///FreeBSD dc operators: `R ( { G N` and the nul-to-empty-string rule for `a`
	Freebsd,
	///GNU dc operators shared with FreeBSD: `r n a`
	Gnu,
	///allow `!` shell escapes
	Insecure
}
impl std::fmt::Display for Extension {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Extension::Freebsd => "freebsd",
			Extension::Gnu => "gnu",
			Extension::Insecure => "insecure"
		})
	}
}

///set of enabled extensions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtensionSet {
	gnu: bool,
	freebsd: bool,
	insecure: bool
}
impl ExtensionSet {
	///no extensions, strict operator set
	pub const fn none() -> Self {
		Self {gnu: false, freebsd: false, insecure: false}
	}

	///both compatibility modes, still secure
	pub const fn all() -> Self {
		Self {gnu: true, freebsd: true, insecure: false}
	}

	///builder-style enable
	pub const fn with(mut self, ext: Extension) -> Self {
		match ext {
			Extension::Gnu => {self.gnu = true;}
			Extension::Freebsd => {self.freebsd = true;}
			Extension::Insecure => {self.insecure = true;}
		}
		self
	}

	pub const fn contains(&self, ext: Extension) -> bool {
		match ext {
			Extension::Gnu => self.gnu,
			Extension::Freebsd => self.freebsd,
			Extension::Insecure => self.insecure
		}
	}

	///enabled extensions in sorted order
	pub fn list(&self) -> Vec<Extension> {
		let mut v = Vec::new();
		if self.freebsd {v.push(Extension::Freebsd);}
		if self.gnu {v.push(Extension::Gnu);}
		if self.insecure {v.push(Extension::Insecure);}
		v
	}

	///true unless shell escapes are allowed
	pub const fn secure(&self) -> bool {
		!self.insecure
	}

	#[inline(always)]
	pub(crate) const fn compat(&self) -> bool {
		self.gnu || self.freebsd
	}
}
impl FromIterator<Extension> for ExtensionSet {
	fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
		let mut s = Self::none();
		for e in iter {
			s = s.with(e);
		}
		s
	}
}
