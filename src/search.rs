use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn is_executable(path: &Path) -> bool {
	match fs::metadata(path) {
		Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
		Err(_) => false,
	}
}

/// Maps a command name to a verified executable path.
///
/// A name containing a slash is taken as a direct path and only checked for
/// being a regular, executable file. A bare name is searched through the
/// directories of `PATH` in order; the first regular file with an execute bit
/// wins. `PATH` is re-read on every call, so changes take effect immediately.
pub fn resolve(name: &str) -> Option<PathBuf> {
	if name.contains('/') {
		let path = PathBuf::from(name);
		return is_executable(&path).then_some(path);
	}

	let path_var = env::var_os("PATH")?;
	for dir in env::split_paths(&path_var) {
		let candidate = dir.join(name);
		if is_executable(&candidate) {
			return Some(candidate);
		}
	}
	None
}
