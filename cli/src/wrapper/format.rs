//! # Line Formatter
//!
//! File: cli/src/wrapper/format.rs
//! Author: Christi Mahu
//!
//! Normalizes raw process output into the lines stored in an output buffer:
//! text is split on `'\n'`, empty entries are dropped, and the instance prefix
//! is prepended to what remains. Input that is already a sequence of lines is
//! taken element by element without re-splitting.
//!

/// Raw output in either of the two shapes the formatter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutput<'a> {
    /// A chunk of text that may span several lines.
    Text(&'a str),
    /// Lines that have already been split.
    Lines(&'a [String]),
}

impl<'a> From<&'a str> for RawOutput<'a> {
    fn from(text: &'a str) -> Self {
        RawOutput::Text(text)
    }
}

impl<'a> From<&'a String> for RawOutput<'a> {
    fn from(text: &'a String) -> Self {
        RawOutput::Text(text)
    }
}

impl<'a> From<&'a [String]> for RawOutput<'a> {
    fn from(lines: &'a [String]) -> Self {
        RawOutput::Lines(lines)
    }
}

impl<'a> From<&'a Vec<String>> for RawOutput<'a> {
    fn from(lines: &'a Vec<String>) -> Self {
        RawOutput::Lines(lines)
    }
}

/// Turns raw output into filtered, prefixed lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFormatter {
    prefix: String,
}

impl LineFormatter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Formats either shape of raw output.
    pub fn format<'a>(&self, raw: impl Into<RawOutput<'a>>) -> Vec<String> {
        match raw.into() {
            RawOutput::Text(text) => self.format_text(text),
            RawOutput::Lines(lines) => self.format_lines(lines),
        }
    }

    /// Splits `text` on newlines, then filters and prefixes each line.
    pub fn format_text(&self, text: &str) -> Vec<String> {
        self.format_lines(text.split('\n'))
    }

    /// Filters and prefixes each element as-is.
    pub fn format_lines<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| !line.as_ref().is_empty())
            .map(|line| format!("{}{}", self.prefix, line.as_ref()))
            .collect()
    }
}
