use super::SourceError;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Ident,
	Number,
	Literal,
	Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub kind: TokenKind,
	pub start: usize,
	pub end: usize,
}

impl Token {
	pub fn range(&self) -> Range<usize> {
		self.start..self.end
	}
}

/// Tokens plus the comment spans that were skipped
#[derive(Debug, Clone, Default)]
pub struct Scanned {
	pub tokens: Vec<Token>,
	/// Line comments end before their newline
	pub comments: Vec<Range<usize>>,
}

impl Scanned {
	pub fn text<'a>(&self, source: &'a str, index: usize) -> &'a str {
		let token = &self.tokens[index];
		&source[token.start..token.end]
	}

	pub fn is_ident(&self, source: &str, index: usize, word: &str) -> bool {
		self.tokens.get(index).is_some_and(|t| t.kind == TokenKind::Ident)
			&& self.text(source, index) == word
	}

	pub fn is_punct(&self, source: &str, index: usize, ch: char) -> bool {
		self.tokens.get(index).is_some_and(|t| t.kind == TokenKind::Punct)
			&& source[self.tokens[index].start..].starts_with(ch)
	}
}

fn is_ident_start(c: char) -> bool {
	c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
	c == '_' || c == '$' || c.is_alphanumeric()
}

pub fn tokenize(source: &str) -> Result<Scanned, SourceError> {
	let chars: Vec<(usize, char)> = source.char_indices().collect();
	let offset_at = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(source.len());
	let mut scanned = Scanned::default();
	let mut i = 0;

	while i < chars.len() {
		let (start, c) = chars[i];
		let next = chars.get(i + 1).map(|(_, c)| *c);

		if c.is_whitespace() {
			i += 1;
			continue;
		}

		if c == '/' && next == Some('/') {
			let mut j = i + 2;
			while j < chars.len() && chars[j].1 != '\n' {
				j += 1;
			}
			scanned.comments.push(start..offset_at(j));
			i = j;
			continue;
		}

		if c == '/' && next == Some('*') {
			let mut j = i + 2;
			loop {
				if j + 1 >= chars.len() {
					return Err(SourceError::UnterminatedComment { offset: start });
				}
				if chars[j].1 == '*' && chars[j + 1].1 == '/' {
					break;
				}
				j += 1;
			}
			scanned.comments.push(start..offset_at(j + 2));
			i = j + 2;
			continue;
		}

		if c == '"' {
			let is_text_block = next == Some('"') && chars.get(i + 2).map(|(_, c)| *c) == Some('"');
			let j = if is_text_block {
				scan_text_block(&chars, i + 3).ok_or(SourceError::UnterminatedLiteral { offset: start })?
			} else {
				scan_quoted(&chars, i + 1, '"').ok_or(SourceError::UnterminatedLiteral { offset: start })?
			};
			scanned.tokens.push(Token { kind: TokenKind::Literal, start, end: offset_at(j) });
			i = j;
			continue;
		}

		if c == '\'' {
			let j = scan_quoted(&chars, i + 1, '\'')
				.ok_or(SourceError::UnterminatedLiteral { offset: start })?;
			scanned.tokens.push(Token { kind: TokenKind::Literal, start, end: offset_at(j) });
			i = j;
			continue;
		}

		if is_ident_start(c) {
			let mut j = i + 1;
			while j < chars.len() && is_ident_part(chars[j].1) {
				j += 1;
			}
			scanned.tokens.push(Token { kind: TokenKind::Ident, start, end: offset_at(j) });
			i = j;
			continue;
		}

		if c.is_ascii_digit() {
			let mut j = i + 1;
			while j < chars.len() && (is_ident_part(chars[j].1) || chars[j].1 == '.') {
				j += 1;
			}
			scanned.tokens.push(Token { kind: TokenKind::Number, start, end: offset_at(j) });
			i = j;
			continue;
		}

		scanned.tokens.push(Token { kind: TokenKind::Punct, start, end: offset_at(i + 1) });
		i += 1;
	}

	Ok(scanned)
}

/// Index just past the closing quote; a newline ends an unterminated literal
fn scan_quoted(chars: &[(usize, char)], mut j: usize, quote: char) -> Option<usize> {
	while j < chars.len() {
		match chars[j].1 {
			'\\' => j += 2,
			'\n' => return None,
			c if c == quote => return Some(j + 1),
			_ => j += 1,
		}
	}
	None
}

fn scan_text_block(chars: &[(usize, char)], mut j: usize) -> Option<usize> {
	while j + 2 < chars.len() {
		if chars[j].1 == '\\' {
			j += 2;
			continue;
		}
		if chars[j].1 == '"' && chars[j + 1].1 == '"' && chars[j + 2].1 == '"' {
			return Some(j + 3);
		}
		j += 1;
	}
	None
}

/// Index of the token closing the bracket opened at `open`
pub fn matching_close(
	scanned: &Scanned, source: &str, open: usize, open_ch: char, close_ch: char,
) -> Result<usize, SourceError> {
	let mut depth = 0usize;
	for index in open..scanned.tokens.len() {
		if scanned.is_punct(source, index, open_ch) {
			depth += 1;
		} else if scanned.is_punct(source, index, close_ch) {
			depth -= 1;
			if depth == 0 {
				return Ok(index);
			}
		}
	}
	Err(SourceError::Unbalanced { delimiter: open_ch, offset: scanned.tokens[open].start })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn texts(source: &str) -> Vec<String> {
		let scanned = tokenize(source).unwrap();
		(0..scanned.tokens.len()).map(|i| scanned.text(source, i).to_string()).collect()
	}

	#[test]
	fn test_skips_comments_and_literals() {
		let source = "int /* class X */ a = \"class Y {\"; // class Z\nchar c = '}';";
		assert_eq!(
			texts(source),
			vec!["int", "a", "=", "\"class Y {\"", ";", "char", "c", "=", "'}'", ";"]
		);
		let scanned = tokenize(source).unwrap();
		assert_eq!(scanned.comments.len(), 2);
		assert_eq!(&source[scanned.comments[1].clone()], "// class Z");
	}

	#[test]
	fn test_escaped_quotes() {
		assert_eq!(texts(r#"s = "a\"b";"#), vec!["s", "=", r#""a\"b""#, ";"]);
	}

	#[test]
	fn test_text_block() {
		let source = "String s = \"\"\"\n  { not a brace\n  \"\"\";";
		let tokens = texts(source);
		assert_eq!(tokens.len(), 5);
		assert!(tokens[3].starts_with("\"\"\""));
	}

	#[test]
	fn test_unterminated_comment() {
		assert_eq!(
			tokenize("class A { /* oops").unwrap_err(),
			SourceError::UnterminatedComment { offset: 10 }
		);
	}

	#[test]
	fn test_matching_close() {
		let source = "{ a { b } c }";
		let scanned = tokenize(source).unwrap();
		assert_eq!(matching_close(&scanned, source, 0, '{', '}').unwrap(), 6);
		assert_eq!(matching_close(&scanned, source, 2, '{', '}').unwrap(), 4);
	}
}
