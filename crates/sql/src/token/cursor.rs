// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

/// Character cursor over the source statement. Tracks the 1-based line
/// and column of the next unread character.
pub(crate) struct Cursor {
	chars: Vec<char>,
	position: usize,
	line: u32,
	column: u32,
}

impl Cursor {
	pub(crate) fn new(input: &str) -> Self {
		Self {
			chars: input.chars().collect(),
			position: 0,
			line: 1,
			column: 1,
		}
	}

	pub(crate) fn peek(&self) -> Option<char> {
		self.chars.get(self.position).copied()
	}

	pub(crate) fn peek_ahead(&self, offset: usize) -> Option<char> {
		self.chars.get(self.position + offset).copied()
	}

	pub(crate) fn advance(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += 1;
		if ch == '\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(ch)
	}

	/// Consume the next character when `predicate` accepts it.
	pub(crate) fn advance_if(&mut self, predicate: impl Fn(char) -> bool) -> Option<char> {
		if self.peek().is_some_and(&predicate) {
			self.advance()
		} else {
			None
		}
	}

	pub(crate) fn is_eof(&self) -> bool {
		self.position >= self.chars.len()
	}

	pub(crate) fn line(&self) -> u32 {
		self.line
	}

	pub(crate) fn column(&self) -> u32 {
		self.column
	}
}
