use std::ffi::{CString, NulError};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStringExt;

use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::builtin;
use crate::search;
use crate::token::Tokens;

/// Errors surfaced while setting up or executing a pipeline.
#[derive(Debug)]
pub enum ExecError {
	Nix(nix::Error),
	Io(io::Error),
	Nul(NulError),
	/// A redirection target that could not be opened.
	Open(String, io::Error),
	/// A redirection operator with no file name after it.
	BadRedirect(&'static str),
}

impl From<nix::Error> for ExecError {
	fn from(e: nix::Error) -> ExecError {
		ExecError::Nix(e)
	}
}

impl From<io::Error> for ExecError {
	fn from(e: io::Error) -> ExecError {
		ExecError::Io(e)
	}
}

impl From<NulError> for ExecError {
	fn from(e: NulError) -> ExecError {
		ExecError::Nul(e)
	}
}

impl fmt::Display for ExecError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExecError::Nix(e) => write!(f, "system call failed: {e}"),
			ExecError::Io(e) => write!(f, "I/O error: {e}"),
			ExecError::Nul(e) => write!(f, "argument contains an interior NUL: {e}"),
			ExecError::Open(target, e) => write!(f, "{target}: {e}"),
			ExecError::BadRedirect(op) => write!(f, "syntax error: `{op}` expects a file name"),
		}
	}
}

impl std::error::Error for ExecError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ExecError::Nix(e) => Some(e),
			ExecError::Io(e) | ExecError::Open(_, e) => Some(e),
			ExecError::Nul(e) => Some(e),
			ExecError::BadRedirect(_) => None,
		}
	}
}

/// One inter-segment pipe. Both ends close when their owner drops, so every
/// end is closed exactly once no matter which path unwinds.
struct PipePair {
	read: OwnedFd,
	write: OwnedFd,
}

fn alloc_pipes(count: usize) -> nix::Result<Vec<PipePair>> {
	let mut pipes = Vec::with_capacity(count);
	for _ in 0..count {
		let (read, write) = unistd::pipe()?;
		pipes.push(PipePair { read, write });
	}
	Ok(pipes)
}

/// Splits the token sequence into per-command index ranges, excluding the
/// `|` separators themselves.
fn segment_ranges(tokens: &Tokens) -> Vec<(usize, usize)> {
	let mut ranges = Vec::new();
	let mut start = 0;
	for i in 0..tokens.len() {
		if tokens.get(i) == Some("|") {
			ranges.push((start, i));
			start = i + 1;
		}
	}
	ranges.push((start, tokens.len()));
	ranges
}

/// Runs one tokenized input line: a lone builtin un-forked in the shell's own
/// process, anything else as a pipeline of forked segments. Per-segment exit
/// statuses are reported to stderr as diagnostics; `Err` is reserved for
/// setup failures (pipe allocation, fork).
pub fn run_line(tokens: &Tokens) -> Result<i32, ExecError> {
	let words = tokens.words();
	if words.is_empty() {
		return Ok(0);
	}

	let ranges = segment_ranges(tokens);

	// The only path where cd and exit affect the interpreter itself.
	if ranges.len() == 1 {
		if let Some(builtin) = builtin::lookup(&words[0]) {
			return Ok((builtin.handler)(words));
		}
	}

	if ranges.iter().any(|&(start, end)| start == end) {
		eprintln!("psh: missing command near `|`");
		return Ok(1);
	}

	let mut pipes = alloc_pipes(ranges.len() - 1)?;

	let mut children: Vec<Pid> = Vec::with_capacity(ranges.len());
	let mut fork_error = None;
	for (index, &(start, end)) in ranges.iter().enumerate() {
		match unsafe { unistd::fork() } {
			Ok(ForkResult::Child) => {
				let (pipe_in, pipe_out) = claim_pipe_ends(&mut pipes, index);
				run_segment(&words[start..end], pipe_in, pipe_out);
			}
			Ok(ForkResult::Parent { child }) => children.push(child),
			Err(e) => {
				fork_error = Some(e);
				break;
			}
		}
	}

	// Both ends of every pipe must close in the parent, or downstream
	// readers never see end-of-stream.
	drop(pipes);

	reap(&children);

	match fork_error {
		Some(e) => Err(ExecError::Nix(e)),
		None => Ok(0),
	}
}

/// Runs in the freshly forked child: keeps the end feeding this segment and
/// the end it feeds, closes every other inherited pipe end. The parent's copy
/// of the pipe set is untouched, fork gave the child its own.
fn claim_pipe_ends(
	pipes: &mut Vec<PipePair>,
	index: usize,
) -> (Option<OwnedFd>, Option<OwnedFd>) {
	let mut pipe_in = None;
	let mut pipe_out = None;
	for (i, pair) in mem::take(pipes).into_iter().enumerate() {
		let PipePair { read, write } = pair;
		if i + 1 == index {
			pipe_in = Some(read);
		}
		if i == index {
			pipe_out = Some(write);
		}
		// unclaimed ends drop here
	}
	(pipe_in, pipe_out)
}

/// Waits for each forked child exactly once, in creation order. Abnormal
/// terminations are diagnostics, not pipeline failures.
fn reap(children: &[Pid]) {
	for (index, &pid) in children.iter().enumerate() {
		match waitpid(pid, None) {
			Ok(WaitStatus::Exited(_, status)) if status != 0 => {
				eprintln!("psh: process {index} exited with status {status}");
			}
			Ok(WaitStatus::Signaled(_, signal, _)) => {
				eprintln!("psh: process {index} terminated by signal {signal}");
			}
			Ok(_) => {}
			Err(e) => eprintln!("psh: wait: {e}"),
		}
	}
}

/// Entry point for one pipeline segment, run in the current (already forked)
/// process. Never returns: on success the process image is replaced, on any
/// failure the process exits.
fn run_segment(words: &[String], pipe_in: Option<OwnedFd>, pipe_out: Option<OwnedFd>) -> ! {
	let status = do_run_segment(words, pipe_in, pipe_out).unwrap_or_else(|e| {
		eprintln!("psh: {e}");
		1
	});
	exit_process(status)
}

fn do_run_segment(
	words: &[String],
	pipe_in: Option<OwnedFd>,
	pipe_out: Option<OwnedFd>,
) -> Result<i32, ExecError> {
	if let Some(fd) = pipe_in {
		install(&fd, libc::STDIN_FILENO)?;
	}
	if let Some(fd) = pipe_out {
		install(&fd, libc::STDOUT_FILENO)?;
	}

	let name = &words[0];
	if let Some(builtin) = builtin::lookup(name) {
		return Ok((builtin.handler)(words));
	}

	let Some(path) = search::resolve(name) else {
		eprintln!("{name}: command not found");
		return Ok(1);
	};

	// Redirections run after pipe wiring, so they win the standard-stream
	// slot over the pipe set up above.
	let args = apply_redirects(words)?;

	let mut argv: Vec<CString> = Vec::with_capacity(args.len());
	argv.push(CString::new(path.into_os_string().into_vec())?);
	for arg in args.iter().skip(1) {
		argv.push(CString::new(arg.as_str())?);
	}

	// The Rust runtime ignores SIGPIPE; executed programs expect the default.
	unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }?;

	unistd::execv(&argv[0], &argv)?;
	unreachable!()
}

/// Strips `<`/`>` operator-and-filename pairs from the segment, opening and
/// installing each target as it goes. Returns the words that remain for the
/// argument vector.
fn apply_redirects(words: &[String]) -> Result<Vec<String>, ExecError> {
	let mut args = Vec::with_capacity(words.len());
	let mut iter = words.iter();
	while let Some(word) = iter.next() {
		match word.as_str() {
			"<" => {
				let target = iter.next().ok_or(ExecError::BadRedirect("<"))?;
				let file = File::open(target)
					.map_err(|e| ExecError::Open(target.clone(), e))?;
				install(&file, libc::STDIN_FILENO)?;
			}
			">" => {
				let target = iter.next().ok_or(ExecError::BadRedirect(">"))?;
				let file = OpenOptions::new()
					.write(true)
					.create(true)
					.truncate(true)
					.open(target)
					.map_err(|e| ExecError::Open(target.clone(), e))?;
				install(&file, libc::STDOUT_FILENO)?;
			}
			_ => args.push(word.clone()),
		}
	}
	Ok(args)
}

// Installs `fd` over the given standard stream. The original descriptor stays
// owned by the caller and closes when it drops; the duplicate survives on the
// stream.
fn install<F: AsRawFd>(fd: &F, stream: RawFd) -> nix::Result<()> {
	unistd::dup2(fd.as_raw_fd(), stream)?;
	Ok(())
}

// Stdout may hold buffered output; flush before the no-cleanup exit.
fn exit_process(status: i32) -> ! {
	let _ = io::stdout().flush();
	unsafe { libc::_exit(status as libc::c_int) }
}
