use crate::locator::{locate_method, Located, MethodSpan};
use crate::signature::{parse_signature, SignatureError};

/// Marker text inserted before the targeted body line. The downstream prompt
/// renderer keys on this exact prefix.
pub const MARKER_PREFIX: &str = "//This is line ";

pub fn marker_line(offset: usize) -> String {
    format!("{MARKER_PREFIX}{offset}")
}

/// How an annotation request resolved. Only a malformed signature is an
/// error; everything here travels alongside the (possibly unchanged) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// The marker was inserted before body line `line`.
    Annotated { line: usize },
    /// Marker inserted into the first match; `extra` further declarations
    /// also matched the signature.
    AnnotatedAmbiguous { line: usize, extra: usize },
    /// No declaration's normalized parameter types equal the signature's.
    NoStructuralMatch,
    /// The matched method's body has fewer lines than the requested offset
    /// (or the offset was < 1).
    OffsetOutOfRange { body_lines: usize },
}

impl AnnotateOutcome {
    /// True when the returned text differs from the input.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            AnnotateOutcome::Annotated { .. } | AnnotateOutcome::AnnotatedAmbiguous { .. }
        )
    }

    pub fn status(&self) -> &'static str {
        match self {
            AnnotateOutcome::Annotated { .. } => "annotated",
            AnnotateOutcome::AnnotatedAmbiguous { .. } => "annotated_ambiguous",
            AnnotateOutcome::NoStructuralMatch => "no_match",
            AnnotateOutcome::OffsetOutOfRange { .. } => "offset_out_of_range",
        }
    }
}

/// Terminal value of an annotation request: the full source text (annotated
/// or byte-identical to the input) plus the tagged outcome.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub text: String,
    pub outcome: AnnotateOutcome,
}

/// Number of body lines of a method text: the lines after the one holding the
/// opening brace, up to and including the closing-brace line.
pub fn body_line_count(method_text: &str) -> usize {
    match method_text.find('{') {
        Some(brace) => method_text[brace + 1..].matches('\n').count(),
        None => 0,
    }
}

/// Insert the marker line before the `offset`-th body line of `method_text`.
///
/// Body lines are 1-based, counted from the line immediately after the
/// opening brace. Returns `None` when the offset is 0 or past the last body
/// line; the caller then leaves the source untouched.
fn insert_marker(method_text: &str, offset: usize) -> Option<String> {
    let brace = method_text.find('{')?;
    let body = &method_text[brace + 1..];

    // Segment 0 is the tail of the opening-brace line; body line N is
    // segment N.
    let segments: Vec<&str> = body.split('\n').collect();
    if offset < 1 || offset > segments.len() - 1 {
        return None;
    }

    let mut out = String::with_capacity(method_text.len() + MARKER_PREFIX.len() + 8);
    out.push_str(&method_text[..=brace]);
    out.push_str(&segments[..offset].join("\n"));
    out.push('\n');
    out.push_str(&marker_line(offset));
    out.push('\n');
    out.push_str(&segments[offset..].join("\n"));
    Some(out)
}

/// Replace `span` in `source` with `replacement`; every byte outside the span
/// is carried over unchanged.
pub fn splice(source: &str, span: MethodSpan, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..span.start]);
    out.push_str(replacement);
    out.push_str(&source[span.end + 1..]);
    out
}

/// Top-level operation: find the overload named by `methodsig` in `source`
/// and insert the marker before the `offset`-th line of its body.
///
/// Total apart from signature parsing: a miss at any structural step returns
/// the input text unchanged with the reason tagged in the outcome, so one
/// unresolvable target can never abort a batch.
pub fn annotate_method_at_offset(
    source: &str,
    methodsig: &str,
    offset: usize,
) -> Result<Annotation, SignatureError> {
    let sig = parse_signature(methodsig)?;

    let (span, extra) = match locate_method(source, &sig) {
        Located::Found(span) => (span, 0),
        Located::Ambiguous { chosen, extra } => (chosen, extra),
        Located::NotFound => {
            return Ok(Annotation {
                text: source.to_string(),
                outcome: AnnotateOutcome::NoStructuralMatch,
            });
        }
    };

    let method_text = span.text(source);
    match insert_marker(method_text, offset) {
        Some(annotated) => Ok(Annotation {
            text: splice(source, span, &annotated),
            outcome: if extra > 0 {
                AnnotateOutcome::AnnotatedAmbiguous {
                    line: offset,
                    extra,
                }
            } else {
                AnnotateOutcome::Annotated { line: offset }
            },
        }),
        None => Ok(Annotation {
            text: source.to_string(),
            outcome: AnnotateOutcome::OffsetOutOfRange {
                body_lines: body_line_count(method_text),
            },
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
