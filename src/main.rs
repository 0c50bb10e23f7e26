use std::io::{self, BufRead, BufReader, Write};
use std::process::exit;

use rdc::{Calculator, Extension, ExtensionSet};

const HELPMSG: &str = r##"rdc - dc RPN calculator with exact rational arithmetic

Command line options:
(order/position of --flags doesn't matter)

<nothing>
	Defaults to "-i".

--inter|-i
	Interactive mode, standard prompt-eval loop.

--expr|-e [--inter|-i] EXPR1 [EXPR2] [EXPR3] ...
	Expression mode, executes expressions in order. If combined with -i, enters interactive mode afterwards.

[--file|-f] [--inter|-i] FILE1 [FILE2] [FILE3] ...
	File mode, executes contents of files in order. May also be combined with -i.
	-f is optional: if names are provided without any --flags, file mode is implied.

--gnu, --freebsd, --all
	Enable the GNU and/or FreeBSD operator extensions (--all enables both).

--insecure
	Allow ! shell escapes.

--help|-h
	Ignores all other options and prints this help message."##;

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_writer(io::stderr)
		.init();

	//parse options
	let (mut i, mut e, mut f, mut h) = (false, false, false, false);
	let mut exts = ExtensionSet::none();
	let mut names: Vec<String> = Vec::new();
	let args: Vec<String> = std::env::args().skip(1).collect();	//get args, skip name of binary
	if args.is_empty() {i = true;}	//default to interactive
	for arg in args {
		if let Some(flag) = arg.strip_prefix("--") {	//long option
			match flag {
				"inter" => {i = true;}
				"expr" => {e = true;}
				"file" => {f = true;}
				"help" => {h = true;}
				"gnu" => {exts = exts.with(Extension::Gnu);}
				"freebsd" => {exts = exts.with(Extension::Freebsd);}
				"all" => {exts = ExtensionSet::all();}
				"insecure" => {exts = exts.with(Extension::Insecure);}
				_ => {
					eprintln!("! Unrecognized option: --{flag}, use -h for help");
					exit(1);
				}
			}
			continue;
		}
		if arg.starts_with('-') {	//short option, multiple at once possible
			for flag in arg.chars().skip(1) {
				match flag {
					'i' => {i = true;}
					'e' => {e = true;}
					'f' => {f = true;}
					'h' => {h = true;}
					_ => {
						eprintln!("! Unrecognized option: -{flag}, use -h for help");
						exit(1);
					}
				}
			}
			continue;
		}
		names.push(arg);
	}

	if h {	//always exits
		println!("{HELPMSG}");
		exit(0);
	}
	match (i, e, f) {
		(false, false, false) => {file_mode(exts, names, false);}	//no flags: assume filenames
		(true, false, false) => {interactive_mode(exts);}
		(_, true, false) => {expression_mode(exts, names, i);}
		(_, false, true) => {file_mode(exts, names, i);}
		(_, true, true) => {
			eprintln!("! Invalid options: both -e and -f present");
			exit(1);
		}
	}
}

///prompt-eval loop; a quit request ends the process
fn interactive_mode(exts: ExtensionSet) {
	let mut input = BufReader::new(io::stdin());
	let mut output = io::stdout();
	let mut calc = Calculator::new(&mut input, &mut output, exts);
	loop {
		print!("> ");
		io::stdout().flush().unwrap();
		let mut line = String::new();
		match io::stdin().lock().read_line(&mut line) {
			Ok(0) => {break;}	//eof
			Ok(_) => {}
			Err(err) => {
				eprintln!("! Unable to read input: {err}");
				break;
			}
		}
		match calc.run(line.as_bytes()) {
			Ok(true) => {}
			Ok(false) => {break;}	//quit requested
			Err(err) => {eprintln!("! {err}");}	//state keeps whatever was reached
		}
	}
}

fn expression_mode(exts: ExtensionSet, exprs: Vec<String>, inter: bool) {
	if exprs.is_empty() {
		eprintln!("! No expression provided");
		exit(1);
	}
	let mut input = BufReader::new(io::stdin());
	let mut output = io::stdout();
	let mut calc = Calculator::new(&mut input, &mut output, exts);
	for expr in exprs {
		if !run_or_die(&mut calc, expr.as_bytes()) {
			return;
		}
	}
	drop(calc);
	if inter {
		interactive_mode(exts);
	}
}

fn file_mode(exts: ExtensionSet, files: Vec<String>, inter: bool) {
	if files.is_empty() {
		eprintln!("! No file name provided");
		exit(1);
	}
	let mut input = BufReader::new(io::stdin());
	let mut output = io::stdout();
	let mut calc = Calculator::new(&mut input, &mut output, exts);
	for file in files {
		match std::fs::read(&file) {
			Ok(script) => {
				if !run_or_die(&mut calc, &script) {
					return;
				}
			}
			Err(err) => {
				eprintln!("! Unable to read file \"{file}\": {err}");
				exit(1);
			}
		}
	}
	drop(calc);
	if inter {
		interactive_mode(exts);
	}
}

///run one chunk; false means a quit was requested and the caller should stop
fn run_or_die(calc: &mut Calculator, chunk: &[u8]) -> bool {
	match calc.run(chunk) {
		Ok(done) => done,
		Err(err) => {
			eprintln!("! {err}");
			exit(1);
		}
	}
}
