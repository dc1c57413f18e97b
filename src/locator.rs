use crate::signature::{normalize_type, strip_generics, MethodSignature};
use regex::Regex;

/// Exact textual extent of one method: header start through the matching
/// closing brace, as inclusive byte offsets into the scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpan {
    pub start: usize,
    pub open_brace: usize,
    pub end: usize,
}

impl MethodSpan {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..=self.end]
    }
}

/// Tagged result of a scan, so callers can tell "nothing to do" apart from
/// "several declarations matched".
///
/// First match in source order always wins; `Ambiguous` reports how many
/// further declarations also matched the signature without changing which one
/// is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(MethodSpan),
    Ambiguous { chosen: MethodSpan, extra: usize },
    NotFound,
}

fn header_regex(name: &str) -> Regex {
    // Optional run of access/modifier keywords, arbitrary declaration tokens
    // (annotations, return type, generics), the literal method name, the
    // parameter list, an optional throws clause, and the opening brace.
    // The character class excludes statement punctuation so the match cannot
    // start inside code; line anchoring keeps the span start on the
    // declaration line.
    let pattern = format!(
        concat!(
            r"(?m)^[ \t]*",
            r"(?:(?:public|protected|private|static|final|synchronized|native|abstract)\s+)*",
            r"[\w$.<>\[\],&?@\s]*?",
            r"\b{name}\s*\(([^)]*)\)\s*",
            r"(?:throws\s+[^{{}};]+)?\{{"
        ),
        name = regex::escape(name)
    );
    Regex::new(&pattern).unwrap()
}

/// Parameter types as declared, name tokens dropped, each normalized.
///
/// Each comma-separated piece is `[annotations/modifiers] Type name`; all but
/// the last whitespace token form the type. A single-token piece is treated
/// as type-only.
fn declared_param_types(raw_param_list: &str) -> Vec<String> {
    let trimmed = raw_param_list.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut types = Vec::new();
    for piece in trimmed.split(',') {
        // Strip generics first so stray `<...>` content cannot masquerade as
        // extra whitespace tokens.
        let piece = strip_generics(piece.trim());
        let tokens: Vec<&str> = piece.split_whitespace().collect();
        match tokens.len() {
            0 => continue,
            1 => types.push(normalize_type(tokens[0])),
            n => types.push(normalize_type(&tokens[..n - 1].join(" "))),
        }
    }
    types
}

/// Walk forward from `open_brace` counting brace depth; the offset where the
/// depth returns to zero is the method's own closing brace.
///
/// Returns `None` when the text ends before the depth closes (truncated or
/// malformed source). Braces inside string/char literals and comments are not
/// distinguished from structural braces (documented best-effort boundary).
pub fn find_matching_brace(source: &str, open_brace: usize) -> Option<usize> {
    let mut depth: i32 = 0;
    for (i, b) in source.bytes().enumerate().skip(open_brace) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}

/// Scan `source` for declarations of `sig`'s method, in textual order, and
/// accept the first whose normalized parameter-type list equals the
/// signature's pairwise and in length. Name equality alone never matches.
///
/// A candidate whose body never closes is skipped entirely; it neither
/// becomes the chosen span nor counts toward ambiguity.
pub fn locate_method(source: &str, sig: &MethodSignature) -> Located {
    let re = header_regex(&sig.name);

    let mut chosen: Option<MethodSpan> = None;
    let mut extra = 0usize;

    for caps in re.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let raw_params = caps.get(1).map(|g| g.as_str()).unwrap_or("");

        if declared_param_types(raw_params) != sig.parameter_types {
            continue;
        }

        // The pattern ends at the opening brace.
        let open_brace = whole.end() - 1;
        let Some(end) = find_matching_brace(source, open_brace) else {
            // Unterminated body: reject this candidate, keep scanning.
            continue;
        };

        if chosen.is_some() {
            extra += 1;
            continue;
        }

        chosen = Some(MethodSpan {
            start: whole.start(),
            open_brace,
            end,
        });
    }

    match (chosen, extra) {
        (Some(span), 0) => Located::Found(span),
        (Some(span), n) => Located::Ambiguous {
            chosen: span,
            extra: n,
        },
        (None, _) => Located::NotFound,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
