use std::mem;

/// Ordered words of one tokenized input line.
///
/// Consumers only ever read the sequence; the owned storage is released when
/// the value drops.
#[derive(Debug)]
pub struct Tokens {
	words: Vec<String>,
}

impl Tokens {
	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&str> {
		self.words.get(index).map(String::as_str)
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}
}

/// Splits a raw input line into whitespace-separated words. A double-quoted
/// span keeps its interior whitespace, and a backslash inside double quotes
/// escapes the next character. Operators (`|`, `<`, `>`) are ordinary words,
/// so they are only recognized when whitespace-separated.
pub fn tokenize(line: &str) -> Tokens {
	let mut words = Vec::new();
	let mut word = String::new();
	let mut in_word = false;

	let mut chars = line.chars();
	while let Some(c) = chars.next() {
		match c {
			'"' => {
				in_word = true;
				while let Some(q) = chars.next() {
					match q {
						'"' => break,
						'\\' => {
							if let Some(escaped) = chars.next() {
								word.push(escaped);
							}
						}
						_ => word.push(q),
					}
				}
			}
			c if c.is_ascii_whitespace() => {
				if in_word {
					words.push(mem::take(&mut word));
					in_word = false;
				}
			}
			_ => {
				in_word = true;
				word.push(c);
			}
		}
	}
	if in_word {
		words.push(word);
	}

	Tokens { words }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(line: &str) -> Vec<String> {
		tokenize(line).words().to_vec()
	}

	#[test]
	fn splits_on_whitespace() {
		assert_eq!(words("ls -l  /tmp"), ["ls", "-l", "/tmp"]);
		assert_eq!(words("  cat\tfile\n"), ["cat", "file"]);
	}

	#[test]
	fn blank_lines_yield_no_tokens() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("   \t  ").is_empty());
	}

	#[test]
	fn operators_are_plain_tokens() {
		assert_eq!(words("a | b > out < in"), ["a", "|", "b", ">", "out", "<", "in"]);
	}

	#[test]
	fn double_quotes_keep_whitespace() {
		assert_eq!(words("echo \"a  b\" c"), ["echo", "a  b", "c"]);
		assert_eq!(words("sh -c \"exit 3\""), ["sh", "-c", "exit 3"]);
	}

	#[test]
	fn backslash_escapes_inside_quotes() {
		assert_eq!(words(r#"echo "a\"b""#), ["echo", "a\"b"]);
	}

	#[test]
	fn quoted_span_joins_adjacent_text() {
		assert_eq!(words(r#"ab"c d"e"#), ["abc de"]);
		assert_eq!(words(r#"echo """#), ["echo", ""]);
	}

	#[test]
	fn indexed_access() {
		let tokens = tokenize("one two three");
		assert_eq!(tokens.len(), 3);
		assert_eq!(tokens.get(0), Some("one"));
		assert_eq!(tokens.get(2), Some("three"));
		assert_eq!(tokens.get(3), None);
	}
}
