use std::io::{self, IsTerminal};
use std::os::fd::AsFd;

use nix::sys::signal::{killpg, Signal};
use nix::sys::termios::{self, Termios};
use nix::unistd;

/// One-time session setup: brings the shell into the terminal's foreground
/// process group and saves the terminal attributes for the life of the
/// session. Returns `None` when standard input is not a terminal; failures
/// are reported but non-fatal, the shell just runs without owning the
/// terminal.
pub fn init_shell() -> Option<Termios> {
	let stdin = io::stdin();
	if !stdin.is_terminal() {
		return None;
	}

	// A shell started in the background receives SIGTTIN here and stops
	// until it is moved to the foreground.
	loop {
		let pgrp = unistd::getpgrp();
		match unistd::tcgetpgrp(stdin.as_fd()) {
			Ok(foreground) if foreground == pgrp => break,
			Ok(_) => {
				let _ = killpg(pgrp, Signal::SIGTTIN);
			}
			Err(e) => {
				eprintln!("psh: tcgetpgrp: {e}");
				return None;
			}
		}
	}

	if let Err(e) = unistd::tcsetpgrp(stdin.as_fd(), unistd::getpid()) {
		eprintln!("psh: tcsetpgrp: {e}");
	}

	match termios::tcgetattr(stdin.as_fd()) {
		Ok(modes) => Some(modes),
		Err(e) => {
			eprintln!("psh: tcgetattr: {e}");
			None
		}
	}
}
