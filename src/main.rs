mod builtin;
mod exec;
mod search;
mod term;
mod token;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "psh> ";

fn main() {
	// Saved terminal modes are held for the life of the session.
	let _tmodes = term::init_shell();

	let mut rl = match DefaultEditor::new() {
		Ok(rl) => rl,
		Err(e) => {
			eprintln!("psh: cannot read input: {e}");
			std::process::exit(1);
		}
	};

	loop {
		match rl.readline(PROMPT) {
			Ok(line) => {
				let tokens = token::tokenize(&line);
				if tokens.is_empty() {
					continue;
				}
				let _ = rl.add_history_entry(line.as_str());
				if let Err(e) = exec::run_line(&tokens) {
					eprintln!("psh: {e}");
				}
			}
			Err(ReadlineError::Interrupted) => continue,
			Err(ReadlineError::Eof) => break,
			Err(e) => {
				eprintln!("psh: {e}");
				break;
			}
		}
	}
}
