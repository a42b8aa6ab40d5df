//! Structured diagnostics reported by schema compilers.

use std::fmt;

/// A 1-based line and column within schema text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl SourcePosition {
    /// Computes the position of a byte offset within `source`.
    ///
    /// Offsets past the end clamp to the end of the text, and offsets inside
    /// a multi-byte character resolve to the start of that character.
    #[must_use]
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
        let column = before[line_start..].chars().count() + 1;

        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A compilation failure reported by a [`SchemaCompiler`](crate::SchemaCompiler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiagnostic {
    /// Human-readable description of the problem.
    pub message: String,
    /// Where in the schema text the problem was found, if known.
    pub position: Option<SourcePosition>,
}

impl SchemaDiagnostic {
    /// Creates a diagnostic without a position.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    /// Creates a diagnostic located at a byte offset within `source`.
    #[must_use]
    pub fn at_offset(message: impl Into<String>, source: &str, offset: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(SourcePosition::from_offset(source, offset)),
        }
    }
}

impl fmt::Display for SchemaDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {}", position, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SchemaDiagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_first_byte() {
        let pos = SourcePosition::from_offset("definition user {}", 0);
        assert_eq!(pos, SourcePosition { line: 1, column: 1 });
    }

    #[test]
    fn position_after_newlines() {
        let source = "definition user {}\n\ndefinition org {";
        let offset = source.find("org").expect("org present");
        let pos = SourcePosition::from_offset(source, offset);
        assert_eq!(pos, SourcePosition { line: 3, column: 12 });
    }

    #[test]
    fn position_clamps_past_end() {
        let pos = SourcePosition::from_offset("ab\ncd", 100);
        assert_eq!(pos, SourcePosition { line: 2, column: 3 });
    }

    #[test]
    fn position_counts_characters_not_bytes() {
        let source = "/* é */ x";
        let offset = source.find('x').expect("x present");
        let pos = SourcePosition::from_offset(source, offset);
        assert_eq!(pos.column, 9);
    }

    #[test]
    fn position_inside_multibyte_character() {
        let pos = SourcePosition::from_offset("é", 1);
        assert_eq!(pos, SourcePosition { line: 1, column: 1 });
    }

    #[test]
    fn diagnostic_display_includes_position() {
        let diag = SchemaDiagnostic::at_offset("expected '}'", "a\nb", 2);
        assert_eq!(diag.to_string(), "line 2, column 1: expected '}'");
    }

    #[test]
    fn diagnostic_display_without_position() {
        let diag = SchemaDiagnostic::new("empty schema");
        assert_eq!(diag.to_string(), "empty schema");
    }
}
