// Copyright (c) 2016-2021 Fabian Schuiki

//! Diagnostics and their terminal rendering.

use crate::source::Span;
use std::fmt;

/// Something diagnostics can be reported to.
pub trait DiagEmitter {
    fn emit(&self, diag: DiagBuilder2);
}

impl<'a, T> DiagEmitter for &'a T
where
    T: DiagEmitter + ?Sized,
{
    fn emit(&self, diag: DiagBuilder2) {
        (*self).emit(diag)
    }
}

/// A structured diagnostic message.
///
/// The first `Span` segment is the primary location of the diagnostic. Notes
/// may carry their own location.
#[must_use]
#[derive(Clone, Debug)]
pub struct DiagBuilder2 {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub segments: Vec<DiagSegment>,
}

#[derive(Clone, Debug)]
pub enum DiagSegment {
    Span(Span),
    Note(String, Option<Span>),
}

impl DiagBuilder2 {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> DiagBuilder2 {
        DiagBuilder2 {
            severity,
            code: None,
            message: message.into(),
            segments: Vec::new(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Error, message)
    }

    /// Attach a stable code to the diagnostic, such that tools can identify
    /// it without parsing the message.
    pub fn code(mut self, code: &'static str) -> DiagBuilder2 {
        self.code = Some(code);
        self
    }

    pub fn span(mut self, span: Span) -> DiagBuilder2 {
        self.segments.push(DiagSegment::Span(span));
        self
    }

    pub fn add_note<S: Into<String>>(mut self, message: S) -> DiagBuilder2 {
        self.segments.push(DiagSegment::Note(message.into(), None));
        self
    }

    /// Add a note that points at a location in the source text.
    pub fn add_note_at<S: Into<String>>(mut self, message: S, span: Span) -> DiagBuilder2 {
        self.segments
            .push(DiagSegment::Note(message.into(), Some(span)));
        self
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn get_code(&self) -> Option<&'static str> {
        self.code
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    /// The primary location of the diagnostic, if any.
    pub fn get_span(&self) -> Option<Span> {
        self.segments.iter().find_map(|s| match *s {
            DiagSegment::Span(sp) => Some(sp),
            _ => None,
        })
    }

    pub fn get_notes(&self) -> impl Iterator<Item = (&str, Option<Span>)> {
        self.segments.iter().filter_map(|s| match *s {
            DiagSegment::Note(ref msg, span) => Some((msg.as_str(), span)),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> &'static str {
        match self {
            Severity::Error => "\x1B[31;1m",
            Severity::Warning => "\x1B[33;1m",
            Severity::Note => "\x1B[36;1m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        })
    }
}

const RESET: &str = "\x1B[m";

/// Print the source line `sp` starts on, with the spanned part underlined.
fn write_excerpt(f: &mut fmt::Formatter, sp: Span, color: &str) -> fmt::Result {
    if !sp.is_valid() {
        return Ok(());
    }
    let (line, column, line_start) = sp.begin().line_column();
    let content = sp.source.get_content();
    let text = content[line_start..].lines().next().unwrap_or("");
    writeln!(f, "  --> {}:{}:{}", sp.source.get_path(), line, column)?;
    writeln!(f, "   |")?;
    writeln!(f, "   | {}", text.replace('\t', "    "))?;

    let mut marks = String::new();
    for (i, c) in text.char_indices() {
        let pos = line_start + i;
        let hit = (pos >= sp.begin && pos < sp.end) || (pos == sp.begin && sp.begin == sp.end);
        let mark = if hit { '^' } else { ' ' };
        let repeat = if c == '\t' { 4 } else { 1 };
        marks.extend(std::iter::repeat(mark).take(repeat));
    }
    writeln!(f, "   | {}{}{}", color, marks.trim_end(), RESET)
}

impl fmt::Display for DiagBuilder2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let color = self.severity.color();
        write!(
            f,
            "{}{}:{} \x1B[1m{}{}",
            color, self.severity, RESET, self.message, RESET
        )?;
        if let Some(code) = self.code {
            write!(f, " [{}]", code)?;
        }
        writeln!(f)?;

        for segment in &self.segments {
            match *segment {
                DiagSegment::Span(sp) => write_excerpt(f, sp, color)?,
                DiagSegment::Note(ref message, span) => {
                    writeln!(f, "   = \x1B[1mnote:{} {}", RESET, message)?;
                    if let Some(sp) = span {
                        write_excerpt(f, sp, Severity::Note.color())?;
                    }
                }
            }
        }
        Ok(())
    }
}
