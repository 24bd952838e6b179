use std::env;
use std::path::PathBuf;
use std::process;

pub type BuiltinFn = fn(&[String]) -> i32;

/// One entry of the dispatch table: the literal command name, its handler,
/// and the line `help` prints for it.
pub struct Builtin {
	pub name: &'static str,
	pub handler: BuiltinFn,
	pub doc: &'static str,
}

const TABLE: &[Builtin] = &[
	Builtin { name: "?", handler: cmd_help, doc: "show this help menu" },
	Builtin { name: "help", handler: cmd_help, doc: "show this help menu" },
	Builtin { name: "exit", handler: cmd_exit, doc: "exit the command shell" },
	Builtin { name: "pwd", handler: cmd_pwd, doc: "print current working directory" },
	Builtin { name: "cd", handler: cmd_cd, doc: "change current working directory" },
];

/// Looks a builtin up by exact name match.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
	TABLE.iter().find(|builtin| builtin.name == name)
}

// Returns 1 even though printing succeeded; longstanding quirk, kept.
fn cmd_help(_args: &[String]) -> i32 {
	for builtin in TABLE {
		println!("{} - {}", builtin.name, builtin.doc);
	}
	1
}

// Ends whichever process invoked it: the shell itself when run un-forked as
// a lone command, only the forked child when part of a pipeline.
fn cmd_exit(_args: &[String]) -> i32 {
	process::exit(0);
}

fn cmd_pwd(_args: &[String]) -> i32 {
	match env::current_dir() {
		Ok(dir) => {
			println!("{}", dir.display());
			0
		}
		Err(e) => {
			eprintln!("pwd: {e}");
			1
		}
	}
}

fn cmd_cd(args: &[String]) -> i32 {
	if args.len() > 2 {
		eprintln!("cd: too many arguments");
		return 1;
	}

	let target = match args.get(1) {
		None => match env::var_os("HOME") {
			Some(home) => PathBuf::from(home),
			None => {
				eprintln!("cd: HOME environment variable not set");
				return 1;
			}
		},
		Some(arg) => match expand_tilde(arg) {
			Some(path) => path,
			None => {
				eprintln!("cd: HOME environment variable not set");
				return 1;
			}
		},
	};

	if let Err(e) = env::set_current_dir(&target) {
		eprintln!("cd: {}: {e}", target.display());
		return 1;
	}
	0
}

// `~` alone and `~/rest` expand from HOME; anything else (including `~user`)
// stays literal. Returns None only when expansion needs HOME and it is unset.
fn expand_tilde(arg: &str) -> Option<PathBuf> {
	if arg == "~" || arg.starts_with("~/") {
		let mut path = PathBuf::from(env::var_os("HOME")?);
		if let Some(rest) = arg.strip_prefix("~/") {
			path.push(rest);
		}
		Some(path)
	} else {
		Some(PathBuf::from(arg))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| w.to_string()).collect()
	}

	#[test]
	fn lookup_matches_exact_names_only() {
		assert!(lookup("cd").is_some());
		assert!(lookup("pwd").is_some());
		assert!(lookup("exit").is_some());
		assert!(lookup("?").is_some());
		assert!(lookup("help").is_some());
		assert!(lookup("ls").is_none());
		assert!(lookup("CD").is_none());
		assert!(lookup("").is_none());
	}

	#[test]
	fn help_reports_nonzero() {
		assert_eq!(cmd_help(&args(&["?"])), 1);
	}

	// cwd and HOME are process-global, so every case that touches them lives
	// in this one test body.
	#[test]
	fn cd_semantics() {
		let before = env::current_dir().unwrap();
		let saved_home = env::var_os("HOME");

		// too many arguments: usage error, directory unchanged
		assert_eq!(cmd_cd(&args(&["cd", "a", "b"])), 1);
		assert_eq!(env::current_dir().unwrap(), before);

		// missing target: error, directory unchanged
		assert_eq!(cmd_cd(&args(&["cd", "/no/such/dir"])), 1);
		assert_eq!(env::current_dir().unwrap(), before);

		// explicit target
		assert_eq!(cmd_cd(&args(&["cd", "/"])), 0);
		assert_eq!(env::current_dir().unwrap(), PathBuf::from("/"));

		// bare cd goes to HOME
		env::set_var("HOME", "/tmp");
		assert_eq!(cmd_cd(&args(&["cd"])), 0);
		assert_eq!(env::current_dir().unwrap(), PathBuf::from("/tmp"));

		// ~ and ~/rest expand from HOME
		env::set_var("HOME", "/usr");
		assert_eq!(expand_tilde("~"), Some(PathBuf::from("/usr")));
		assert_eq!(expand_tilde("~/bin"), Some(PathBuf::from("/usr/bin")));
		assert_eq!(expand_tilde("~user"), Some(PathBuf::from("~user")));
		assert_eq!(expand_tilde("plain"), Some(PathBuf::from("plain")));
		assert_eq!(cmd_cd(&args(&["cd", "~/bin"])), 0);
		assert_eq!(env::current_dir().unwrap(), PathBuf::from("/usr/bin"));

		// unset HOME: bare cd and ~ expansion both fail
		env::remove_var("HOME");
		assert_eq!(cmd_cd(&args(&["cd"])), 1);
		assert_eq!(expand_tilde("~"), None);

		match saved_home {
			Some(home) => env::set_var("HOME", home),
			None => env::remove_var("HOME"),
		}
		env::set_current_dir(before).unwrap();
	}
}
