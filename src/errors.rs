//! Fatal error taxonomy. Every variant aborts the current `run` call; the
//! engine keeps whatever state execution had reached.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
	///unrecognized leading character, carries the offending byte
	#[error("invalid command '{}' (0x{:02X})", char::from(*.0), .0)]
	InvalidCommand(u8),

	///operator recognized but its extension is not enabled
	#[error("operator '{op}' requires the {required} extension")]
	UnsupportedExtension {
		op: char,
		required: &'static str
	},

	///close bracket with no matching open
	#[error("unbalanced brackets")]
	UnbalancedBrackets,

	///shell escape attempted in secure mode
	#[error("shell commands are disabled in secure mode")]
	Insecure,

	///stack underflow or type mismatch: a malformed program or an engine bug
	#[error("internal error: {0}")]
	Internal(String),

	///domain violation in a numeric operator
	#[error("range error: {0}")]
	Range(String),

	///read/write failure on one of the engine's streams
	#[error("io error: {0}")]
	Io(#[from] std::io::Error)
}
