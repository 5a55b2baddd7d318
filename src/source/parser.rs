//! Declaration structure of a source unit
//!
//! Ranges of declarations cover whole lines: they start at the beginning of the
//! line holding the first token (or an attached doc comment) and end after the
//! newline following the last token. Removing a range therefore removes the
//! declaration without leaving blank lines behind.

use super::edit::TextEdit;
use super::scanner::{matching_close, tokenize, Scanned, TokenKind};
use super::SourceError;
use crate::model::{MemberKind, MemberSegment};
use std::collections::BTreeSet;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
	pub name: String,
	pub name_range: Range<usize>,
	pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
	/// Qualified name without a trailing `.*`
	pub name: String,
	pub is_static: bool,
	pub on_demand: bool,
	/// Span of the name as written, `.*` included
	pub name_range: Range<usize>,
	pub range: Range<usize>,
}

impl ImportDecl {
	/// Name as written, `.*` included
	pub fn written_name(&self) -> String {
		if self.on_demand {
			format!("{}.*", self.name)
		} else {
			self.name.clone()
		}
	}

	/// Plain single-type import of `qualified`
	pub fn imports_type(&self, qualified: &str) -> bool {
		!self.is_static && !self.on_demand && self.name == qualified
	}

	/// Simple name brought into scope by a single-type import
	pub fn simple_name(&self) -> Option<&str> {
		if self.on_demand {
			return None;
		}
		self.name.rsplit('.').next()
	}

	pub fn statement(&self) -> String {
		import_statement(&self.written_name(), self.is_static)
	}
}

pub fn import_statement(written_name: &str, is_static: bool) -> String {
	if is_static {
		format!("import static {written_name};")
	} else {
		format!("import {written_name};")
	}
}

/// Range to delete when removing the declaration at `range`
///
/// A declaration that is the last one in its body or unit also takes the
/// blank line in front of it, so no gap is left before the closing brace or
/// the end of the text.
pub fn removal_range(text: &str, range: Range<usize>) -> Range<usize> {
	let rest = text[range.end..].trim_start();
	if !(rest.is_empty() || rest.starts_with('}')) {
		return range;
	}
	let Some(previous) = text[..range.start].strip_suffix('\n') else {
		return range;
	};
	let blank_start = previous.rfind('\n').map(|p| p + 1).unwrap_or(0);
	if blank_start == 0 || !previous[blank_start..].trim().is_empty() {
		return range;
	}
	blank_start..range.end
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
	pub kind: MemberKind,
	/// Empty for initializers
	pub name: String,
	pub name_range: Option<Range<usize>>,
	pub range: Range<usize>,
	/// Text between the braces of a type body
	pub body: Option<Range<usize>>,
	/// Leading whitespace of the declaration's first line
	pub indent: String,
	pub children: Vec<Declaration>,
}

impl Declaration {
	/// Children paired with the occurrence index used in member handles
	pub fn children_with_occurrence(&self) -> Vec<(usize, &Declaration)> {
		with_occurrence(&self.children)
	}

	/// Indentation for a new member of this type body
	pub fn member_indent(&self) -> String {
		if let Some(first) = self.children.first() {
			return first.indent.clone();
		}
		if self.indent.contains(' ') && !self.indent.contains('\t') {
			format!("{}    ", self.indent)
		} else {
			format!("{}\t", self.indent)
		}
	}
}

fn with_occurrence(declarations: &[Declaration]) -> Vec<(usize, &Declaration)> {
	let mut result = Vec::with_capacity(declarations.len());
	for (index, declaration) in declarations.iter().enumerate() {
		let occurrence = declarations[..index]
			.iter()
			.filter(|d| d.kind == declaration.kind && d.name == declaration.name)
			.count();
		result.push((occurrence, declaration));
	}
	result
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStructure {
	pub package: Option<PackageDecl>,
	pub imports: Vec<ImportDecl>,
	pub types: Vec<Declaration>,
	/// Identifiers used outside package and import declarations
	pub references: BTreeSet<String>,
}

impl SourceStructure {
	pub fn types_with_occurrence(&self) -> Vec<(usize, &Declaration)> {
		with_occurrence(&self.types)
	}

	/// Follow a member path from the top-level types down
	pub fn find(&self, path: &[MemberSegment]) -> Option<&Declaration> {
		let mut level: &[Declaration] = &self.types;
		let mut found = None;
		for segment in path {
			let declaration = with_occurrence(level)
				.into_iter()
				.find(|(occurrence, d)| {
					d.kind == segment.kind && d.name == segment.name && *occurrence == segment.occurrence
				})
				.map(|(_, d)| d)?;
			level = &declaration.children;
			found = Some(declaration);
		}
		found
	}

	/// The type named after the unit, or else the first type
	pub fn primary_type(&self, type_name: &str) -> Option<&Declaration> {
		self.types.iter().find(|t| t.name == type_name).or_else(|| self.types.first())
	}

	pub fn package_name(&self) -> &str {
		self.package.as_ref().map(|p| p.name.as_str()).unwrap_or("")
	}

	/// Whether the unit has a single-type or on-demand import covering `qualified`
	pub fn has_import(&self, qualified: &str) -> bool {
		self.imports.iter().any(|i| i.imports_type(qualified))
	}

	/// Whether some single-type import brings `simple_name` into scope
	pub fn imports_simple_name(&self, simple_name: &str) -> bool {
		self.imports.iter().any(|i| !i.is_static && i.simple_name() == Some(simple_name))
	}

	pub fn references_name(&self, name: &str) -> bool {
		self.references.contains(name)
	}

	/// One edit adding `statements` to the import list
	pub fn imports_insertion(&self, text: &str, statements: &[String]) -> Option<TextEdit> {
		if statements.is_empty() {
			return None;
		}
		let mut block = statements.join("\n");
		block.push('\n');

		if let Some(last) = self.imports.last() {
			let offset = last.range.end;
			if !text[..offset].ends_with('\n') {
				block.insert(0, '\n');
			}
			return Some(TextEdit::insert(offset, block));
		}

		if let Some(package) = &self.package {
			let offset = package.range.end;
			let prefix = if text[..offset].ends_with('\n') { "\n" } else { "\n\n" };
			return Some(TextEdit::insert(offset, format!("{prefix}{block}")));
		}

		block.push('\n');
		Some(TextEdit::insert(0, block))
	}

	/// Edit moving the unit to another package; `None` target means the default package
	pub fn package_rewrite(&self, text: &str, target: Option<&str>) -> Option<TextEdit> {
		match (&self.package, target) {
			(Some(package), Some(name)) if package.name == name => None,
			(Some(package), Some(name)) => Some(TextEdit::replace(package.name_range.clone(), name)),
			(Some(package), None) => {
				let mut end = package.range.end;
				// Drop the blank line that separated the declaration from the rest
				if text[end..].starts_with("\r\n") {
					end += 2;
				} else if text[end..].starts_with('\n') {
					end += 1;
				}
				Some(TextEdit::delete(package.range.start..end))
			}
			(None, Some(name)) => Some(TextEdit::insert(0, format!("package {name};\n\n"))),
			(None, None) => None,
		}
	}
}

pub fn parse(text: &str) -> Result<SourceStructure, SourceError> {
	let scanned = tokenize(text)?;
	let mut parser = Parser { text, scanned: &scanned, excluded: Vec::new() };
	let structure = parser.parse_unit()?;
	Ok(structure)
}

struct Parser<'a> {
	text: &'a str,
	scanned: &'a Scanned,
	/// Token index ranges of package and import declarations
	excluded: Vec<Range<usize>>,
}

impl<'a> Parser<'a> {
	fn len(&self) -> usize {
		self.scanned.tokens.len()
	}

	fn is_ident(&self, index: usize, word: &str) -> bool {
		self.scanned.is_ident(self.text, index, word)
	}

	fn is_punct(&self, index: usize, ch: char) -> bool {
		self.scanned.is_punct(self.text, index, ch)
	}

	fn token_text(&self, index: usize) -> &'a str {
		self.scanned.text(self.text, index)
	}

	fn kind(&self, index: usize) -> Option<TokenKind> {
		self.scanned.tokens.get(index).map(|t| t.kind)
	}

	fn parse_unit(&mut self) -> Result<SourceStructure, SourceError> {
		let mut structure = SourceStructure::default();
		let mut index = 0;

		while index < self.len() {
			if self.is_ident(index, "package")
				&& structure.package.is_none()
				&& structure.imports.is_empty()
				&& structure.types.is_empty()
			{
				let (name, name_range, _, _, end) = self.qualified_name(index + 1);
				structure.package = Some(PackageDecl {
					name,
					name_range,
					range: self.line_range(index, end),
				});
				self.excluded.push(index..end + 1);
				index = end + 1;
				continue;
			}

			if self.is_ident(index, "import") {
				let mut start = index + 1;
				let is_static = self.is_ident(start, "static");
				if is_static {
					start += 1;
				}
				let (name, name_range, on_demand, _, end) = self.qualified_name(start);
				structure.imports.push(ImportDecl {
					name,
					is_static,
					on_demand,
					name_range,
					range: self.line_range(index, end),
				});
				self.excluded.push(index..end + 1);
				index = end + 1;
				continue;
			}

			if self.is_punct(index, ';') {
				index += 1;
				continue;
			}

			let floor = if index == 0 { 0 } else { self.scanned.tokens[index - 1].end };
			let (declaration, next) = self.parse_member(index, self.len(), floor)?;
			if let Some(declaration) = declaration {
				if declaration.kind == MemberKind::Type {
					structure.types.push(declaration);
				}
			}
			index = next.max(index + 1);
		}

		for (index, token) in self.scanned.tokens.iter().enumerate() {
			if token.kind != TokenKind::Ident || self.excluded.iter().any(|r| r.contains(&index)) {
				continue;
			}
			structure.references.insert(self.text[token.start..token.end].to_string());
		}

		Ok(structure)
	}

	/// Reads `a.b.c[.*]` up to `;`; returns name, span, on-demand flag, first token, `;` index
	fn qualified_name(&self, start: usize) -> (String, Range<usize>, bool, usize, usize) {
		let mut name = String::new();
		let mut on_demand = false;
		let mut index = start;
		let mut span_end = self.scanned.tokens.get(start).map(|t| t.start).unwrap_or(self.text.len());
		while index < self.len() && !self.is_punct(index, ';') {
			let text = self.token_text(index);
			if text == "*" {
				on_demand = true;
				if name.ends_with('.') {
					name.pop();
				}
			} else {
				name.push_str(text);
			}
			span_end = self.scanned.tokens[index].end;
			index += 1;
		}
		let span_start = self.scanned.tokens.get(start).map(|t| t.start).unwrap_or(span_end);
		let end = index.min(self.len().saturating_sub(1));
		(name, span_start..span_end.max(span_start), on_demand, start, end)
	}

	/// Parse one member starting at token `start`; tokens at `limit` and beyond are out of scope
	fn parse_member(
		&self, start: usize, limit: usize, floor: usize,
	) -> Result<(Option<Declaration>, usize), SourceError> {
		let mut index = start;
		let mut paren = 0usize;
		let mut angle = 0usize;
		let mut type_keyword: Option<usize> = None;
		let mut first_paren: Option<usize> = None;
		let mut first_eq: Option<usize> = None;
		let mut first_comma: Option<usize> = None;
		let mut body: Option<(usize, usize)> = None;
		let mut end = limit.saturating_sub(1).max(start);
		let mut next = limit;

		while index < limit {
			if self.is_punct(index, '@') {
				if self.is_ident(index + 1, "interface") {
					if self.kind(index + 2) != Some(TokenKind::Ident) {
						return Err(self.missing_name("@interface", index));
					}
					if type_keyword.is_none() && first_paren.is_none() && first_eq.is_none() {
						type_keyword = Some(index + 1);
					}
					index += 2;
					continue;
				}
				index = self.skip_annotation(index, limit)?;
				continue;
			}

			if self.is_punct(index, '(') {
				if paren == 0 && first_paren.is_none() && first_eq.is_none() {
					first_paren = Some(index);
				}
				paren += 1;
			} else if self.is_punct(index, ')') {
				paren = paren.saturating_sub(1);
			} else if paren == 0 && first_eq.is_none() && self.is_punct(index, '<') {
				angle += 1;
			} else if paren == 0 && first_eq.is_none() && self.is_punct(index, '>') {
				angle = angle.saturating_sub(1);
			} else if paren == 0 && angle == 0 && first_eq.is_none() && self.is_punct(index, '=') {
				first_eq = Some(index);
			} else if paren == 0
				&& angle == 0
				&& first_eq.is_none()
				&& first_comma.is_none()
				&& self.is_punct(index, ',')
			{
				first_comma = Some(index);
			} else if paren == 0
				&& type_keyword.is_none()
				&& first_paren.is_none()
				&& first_eq.is_none()
				&& self.is_type_keyword(index)
			{
				type_keyword = Some(index);
			} else if paren == 0 && self.is_punct(index, '{') {
				let close = matching_close(self.scanned, self.text, index, '{', '}')?;
				if first_eq.is_some() && type_keyword.is_none() {
					// Array initializer or anonymous class inside a field initializer
					index = close + 1;
					continue;
				}
				body = Some((index, close));
				end = close;
				next = close + 1;
				break;
			} else if paren == 0 && self.is_punct(index, ';') {
				end = index;
				next = index + 1;
				break;
			} else if paren == 0 && self.is_punct(index, '}') {
				end = index.saturating_sub(1).max(start);
				next = index;
				break;
			}
			index += 1;
		}

		let range = self.declaration_range(start, end, floor);
		let indent = self.indent_of(self.scanned.tokens[start].start, floor);

		let declaration = if let Some(keyword) = type_keyword {
			let name_index = keyword + 1;
			if self.kind(name_index) != Some(TokenKind::Ident) {
				return Err(self.missing_name(self.token_text(keyword), keyword));
			}
			let name = self.token_text(name_index).to_string();
			let name_range = Some(self.scanned.tokens[name_index].range());
			let (body_range, children) = match body {
				Some((open, close)) => {
					let is_enum = self.is_ident(keyword, "enum");
					let children = self.parse_body(open, close, is_enum)?;
					(
						Some(self.scanned.tokens[open].end..self.scanned.tokens[close].start),
						children,
					)
				}
				None => (None, Vec::new()),
			};
			Some(Declaration {
				kind: MemberKind::Type,
				name,
				name_range,
				range,
				body: body_range,
				indent,
				children,
			})
		} else if self.is_punct(start, '{')
			|| (self.is_ident(start, "static") && self.is_punct(start + 1, '{'))
		{
			Some(Declaration {
				kind: MemberKind::Initializer,
				name: String::new(),
				name_range: None,
				range,
				body: None,
				indent,
				children: Vec::new(),
			})
		} else if let Some(paren_index) =
			first_paren.filter(|p| first_eq.map_or(true, |eq| *p < eq))
		{
			let name_index = paren_index.checked_sub(1).filter(|i| *i >= start);
			name_index
				.filter(|i| self.kind(*i) == Some(TokenKind::Ident))
				.map(|name_index| Declaration {
					kind: MemberKind::Method,
					name: self.token_text(name_index).to_string(),
					name_range: Some(self.scanned.tokens[name_index].range()),
					range,
					body: None,
					indent,
					children: Vec::new(),
				})
		} else {
			let mut name_index = first_eq.or(first_comma).unwrap_or(end);
			while name_index > start
				&& (self.is_punct(name_index - 1, ']') || self.is_punct(name_index - 1, '['))
			{
				name_index -= 1;
			}
			name_index
				.checked_sub(1)
				.filter(|i| *i >= start && self.kind(*i) == Some(TokenKind::Ident))
				.map(|name_index| Declaration {
					kind: MemberKind::Field,
					name: self.token_text(name_index).to_string(),
					name_range: Some(self.scanned.tokens[name_index].range()),
					range,
					body: None,
					indent,
					children: Vec::new(),
				})
		};

		Ok((declaration, next))
	}

	fn missing_name(&self, keyword: &str, index: usize) -> SourceError {
		SourceError::MissingName { keyword: keyword.to_string(), offset: self.scanned.tokens[index].start }
	}

	fn is_type_keyword(&self, index: usize) -> bool {
		let keyword = ["class", "interface", "enum", "record"]
			.iter()
			.any(|k| self.is_ident(index, k));
		keyword
			&& self.kind(index + 1) == Some(TokenKind::Ident)
			&& !(index > 0 && self.is_punct(index - 1, '.'))
	}

	/// Skip `@Name(.Name)*` and an optional argument list
	fn skip_annotation(&self, at: usize, limit: usize) -> Result<usize, SourceError> {
		let mut index = at + 1;
		while index < limit && self.kind(index) == Some(TokenKind::Ident) {
			index += 1;
			if self.is_punct(index, '.') && self.kind(index + 1) == Some(TokenKind::Ident) {
				index += 1;
			} else {
				break;
			}
		}
		if index < limit && self.is_punct(index, '(') {
			index = matching_close(self.scanned, self.text, index, '(', ')')? + 1;
		}
		Ok(index)
	}

	fn parse_body(
		&self, open: usize, close: usize, is_enum: bool,
	) -> Result<Vec<Declaration>, SourceError> {
		let mut index = open + 1;

		if is_enum {
			// Constants run up to the first top-level ';'
			let mut depth = 0usize;
			let mut constants_end = None;
			let mut cursor = index;
			while cursor < close {
				if self.is_punct(cursor, '(') || self.is_punct(cursor, '{') {
					depth += 1;
				} else if self.is_punct(cursor, ')') || self.is_punct(cursor, '}') {
					depth = depth.saturating_sub(1);
				} else if depth == 0 && self.is_punct(cursor, ';') {
					constants_end = Some(cursor);
					break;
				}
				cursor += 1;
			}
			match constants_end {
				Some(end) => index = end + 1,
				None => return Ok(Vec::new()),
			}
		}

		let mut children = Vec::new();
		while index < close {
			if self.is_punct(index, ';') {
				index += 1;
				continue;
			}
			let floor = self.scanned.tokens[index - 1].end;
			let (declaration, next) = self.parse_member(index, close, floor)?;
			if let Some(declaration) = declaration {
				children.push(declaration);
			}
			index = next.max(index + 1);
		}
		Ok(children)
	}

	fn line_range(&self, first: usize, last: usize) -> Range<usize> {
		let floor = if first == 0 { 0 } else { self.scanned.tokens[first - 1].end };
		self.declaration_range(first, last, floor)
	}

	/// Whole-line range from token `first` to token `last`, with attached doc comments
	fn declaration_range(&self, first: usize, last: usize, floor: usize) -> Range<usize> {
		let text = self.text;
		let mut start = self.scanned.tokens[first].start;

		loop {
			let before = text[floor..start].trim_end_matches([' ', '\t', '\r', '\n']);
			let gap_start = floor + before.len();
			let gap = &text[gap_start..start];
			if gap.matches('\n').count() > 1 {
				break;
			}
			let Some(comment) = self
				.scanned
				.comments
				.iter()
				.find(|c| c.end == gap_start && c.start >= floor)
			else {
				break;
			};
			let comment_line = text[..comment.start].rfind('\n').map(|p| p + 1).unwrap_or(0);
			if comment_line < floor || !text[comment_line..comment.start].trim().is_empty() {
				break;
			}
			start = comment.start;
		}

		let line_start = text[..start].rfind('\n').map(|p| p + 1).unwrap_or(0).max(floor);
		if text[line_start..start].trim().is_empty() {
			start = line_start;
		}

		let mut end = self.scanned.tokens[last].end;
		let rest = &text[end..];
		let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
		let after = &rest[spaces..];
		if after.starts_with("\r\n") {
			end += spaces + 2;
		} else if after.starts_with('\n') {
			end += spaces + 1;
		} else if after.is_empty() {
			end += spaces;
		} else if let Some(comment) =
			self.scanned.comments.iter().find(|c| c.start == end + spaces)
		{
			// Trailing comment on the same line belongs to the declaration
			let comment_rest = &text[comment.end..];
			end = comment.end;
			if comment_rest.starts_with("\r\n") {
				end += 2;
			} else if comment_rest.starts_with('\n') {
				end += 1;
			}
		}

		start..end
	}

	fn indent_of(&self, first_token: usize, floor: usize) -> String {
		let line_start = self.text[..first_token].rfind('\n').map(|p| p + 1).unwrap_or(0).max(floor);
		self.text[line_start..first_token]
			.chars()
			.take_while(|c| *c == ' ' || *c == '\t')
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const UNIT: &str = "package p.q;\n\nimport java.util.List;\nimport static java.lang.Math.max;\nimport a.b.*;\n\n/** Doc for A */\npublic class A extends B<String, Integer> {\n\tprivate int count = 0;\n\tstatic final String[] NAMES = { \"x\", \"y\" };\n\n\tstatic {\n\t\tcount();\n\t}\n\n\t/**\n\t * Runs.\n\t */\n\t@Override\n\tpublic void run(List<String> items) {\n\t\tif (items.isEmpty()) { return; }\n\t}\n\n\tint count() { return max(1, 2); }\n\n\tclass Inner {\n\t\tvoid run() {}\n\t}\n}\n\ninterface Helper {\n\tvoid help();\n}\n";

	#[test]
	fn test_package_and_imports() {
		let structure = parse(UNIT).unwrap();
		let package = structure.package.as_ref().unwrap();
		assert_eq!(package.name, "p.q");
		assert_eq!(&UNIT[package.name_range.clone()], "p.q");
		assert_eq!(&UNIT[package.range.clone()], "package p.q;\n");

		assert_eq!(structure.imports.len(), 3);
		assert_eq!(structure.imports[0].name, "java.util.List");
		assert!(structure.imports[1].is_static);
		assert_eq!(structure.imports[1].name, "java.lang.Math.max");
		assert!(structure.imports[2].on_demand);
		assert_eq!(structure.imports[2].name, "a.b");
		assert_eq!(&UNIT[structure.imports[2].name_range.clone()], "a.b.*");
		assert!(structure.has_import("java.util.List"));
	}

	#[test]
	fn test_members() {
		let structure = parse(UNIT).unwrap();
		assert_eq!(structure.types.len(), 2);
		let a = &structure.types[0];
		assert_eq!(a.name, "A");
		assert!(UNIT[a.range.clone()].starts_with("/** Doc for A */\npublic class A"));

		let kinds: Vec<_> = a.children.iter().map(|c| (c.kind, c.name.as_str())).collect();
		assert_eq!(
			kinds,
			vec![
				(MemberKind::Field, "count"),
				(MemberKind::Field, "NAMES"),
				(MemberKind::Initializer, ""),
				(MemberKind::Method, "run"),
				(MemberKind::Method, "count"),
				(MemberKind::Type, "Inner"),
			]
		);

		let run = &a.children[3];
		let run_text = &UNIT[run.range.clone()];
		assert!(run_text.starts_with("\t/**\n\t * Runs."));
		assert!(run_text.ends_with("\t}\n"));
		assert_eq!(run.indent, "\t");

		let inner = &a.children[5];
		assert_eq!(inner.children.len(), 1);
		assert_eq!(inner.children[0].name, "run");
		assert_eq!(structure.types[1].name, "Helper");
	}

	#[test]
	fn test_find_by_path() {
		let structure = parse(UNIT).unwrap();
		let path = vec![
			MemberSegment { kind: MemberKind::Type, name: "A".into(), occurrence: 0 },
			MemberSegment { kind: MemberKind::Type, name: "Inner".into(), occurrence: 0 },
			MemberSegment { kind: MemberKind::Method, name: "run".into(), occurrence: 0 },
		];
		let found = structure.find(&path).unwrap();
		assert_eq!(found.kind, MemberKind::Method);
		assert_eq!(found.indent, "\t\t");
	}

	#[test]
	fn test_references_exclude_imports() {
		let structure = parse(UNIT).unwrap();
		assert!(structure.references_name("List"));
		assert!(structure.references_name("B"));
		assert!(!structure.references_name("util"));
		assert!(!structure.references_name("Math"));
	}

	#[test]
	fn test_enum_constants_are_skipped() {
		let text = "enum Color {\n\tRED(1), GREEN(2);\n\tprivate final int v;\n\tColor(int v) { this.v = v; }\n}\n";
		let structure = parse(text).unwrap();
		let color = &structure.types[0];
		let names: Vec<_> = color.children.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["v", "Color"]);
	}

	#[test]
	fn test_import_insertion_points() {
		let structure = parse(UNIT).unwrap();
		let edit = structure.imports_insertion(UNIT, &["import x.Y;".to_string()]).unwrap();
		assert_eq!(edit.offset, structure.imports[2].range.end);
		assert_eq!(edit.text, "import x.Y;\n");

		let bare = "package p;\nclass A {}\n";
		let structure = parse(bare).unwrap();
		let edit = structure.imports_insertion(bare, &["import x.Y;".to_string()]).unwrap();
		assert_eq!(edit.offset, 11);
		assert_eq!(edit.text, "\nimport x.Y;\n");
	}

	#[test]
	fn test_package_rewrite() {
		let text = "package p;\n\nclass A {}\n";
		let structure = parse(text).unwrap();
		let rename = structure.package_rewrite(text, Some("other")).unwrap();
		assert_eq!(rename.offset, 8);
		assert_eq!(rename.text, "other");

		let to_default = structure.package_rewrite(text, None).unwrap();
		assert_eq!(to_default.offset, 0);
		assert_eq!(to_default.length, 12);

		assert!(structure.package_rewrite(text, Some("p")).is_none());
	}

	#[test]
	fn test_trailing_comment_belongs_to_field() {
		let text = "class A {\n\tint a; // counter\n\tint b;\n}\n";
		let structure = parse(text).unwrap();
		let a = &structure.types[0].children[0];
		assert_eq!(&text[a.range.clone()], "\tint a; // counter\n");
	}

	#[test]
	fn test_type_keyword_at_end_of_input() {
		for text in ["package p;\nclass", "package p;\nenum", "class A {\n\tinterface\n}\n"] {
			let structure = parse(text).unwrap();
			assert!(structure.types.iter().all(|t| t.children.is_empty()), "{text:?}");
		}
		assert!(parse("package p;\nclass").unwrap().types.is_empty());

		match parse("package p;\n@interface") {
			Err(SourceError::MissingName { keyword, offset }) => {
				assert_eq!(keyword, "@interface");
				assert_eq!(offset, 11);
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn test_unclosed_annotation_arguments() {
		assert!(matches!(parse("package p;\n@Anno("), Err(SourceError::Unbalanced { delimiter: '(', .. })));
	}

	#[test]
	fn test_removal_range_of_last_member() {
		let text = "class A {\n\tint x;\n\n\tint y;\n}\n";
		let structure = parse(text).unwrap();
		let x = structure.types[0].children[0].range.clone();
		let y = structure.types[0].children[1].range.clone();
		assert_eq!(removal_range(text, x.clone()), x);
		assert_eq!(&text[removal_range(text, y)], "\n\tint y;\n");

		let unit = "package p;\n\nclass A {}\n\nclass B {}\n";
		let structure = parse(unit).unwrap();
		assert_eq!(&unit[removal_range(unit, structure.types[1].range.clone())], "\nclass B {}\n");
	}
}
