use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// The only failure the annotation pipeline surfaces to callers.
///
/// Structural misses (no overload matched, offset past the body) are tagged
/// outcome values, not errors; see `annotator::AnnotateOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed method signature {0:?}: expected name(Type1,Type2,...)")]
    Malformed(String),
}

/// One overload of a method, parsed from a `name(Type1,Type2,...)` string.
///
/// Parameter types are stored normalized (see [`normalize_type`]) so they can
/// be compared against types extracted from a declaration regardless of
/// qualification, generics, annotations, or varargs spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub parameter_types: Vec<String>,
}

fn annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+(\([^)]*\))?\s*").unwrap())
}

fn final_modifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bfinal\b\s*").unwrap())
}

fn generics_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

/// Remove generic argument lists from a type token.
///
/// One enclosing `<...>` pair is stripped per application; deeply nested
/// generics can leave a dangling `>` behind. Carried as a known limitation.
pub(crate) fn strip_generics(s: &str) -> String {
    generics_re().replace_all(s, "").into_owned()
}

/// Canonicalize one parameter-type token as it appears in a declaration or in
/// a signature string.
///
/// In order: varargs `...` becomes `[]`, annotations (`@X`, `@X(...)`) and the
/// `final` modifier are dropped, generic argument lists are stripped, and a
/// dotted qualified name is reduced to its last segment.
///
/// Total and pure; an empty input yields an empty output.
pub fn normalize_type(token: &str) -> String {
    let t = token.trim().replace("...", "[]");
    let t = annotation_re().replace_all(&t, "");
    let t = final_modifier_re().replace_all(&t, "");
    let t = strip_generics(&t);
    let t = t.trim();
    match t.rfind('.') {
        Some(dot) => t[dot + 1..].trim().to_string(),
        None => t.to_string(),
    }
}

/// Parse `name(Type1,Type2,...)` into a [`MethodSignature`].
///
/// Fails with [`SignatureError::Malformed`] when there is no `(` or the last
/// `)` precedes the first `(`. The parameter text is split on commas
/// textually; commas inside generic arguments are not protected (known
/// limitation, same as the comparison side in `locator`).
pub fn parse_signature(sig: &str) -> Result<MethodSignature, SignatureError> {
    let lp = sig.find('(');
    let rp = sig.rfind(')');
    let (Some(lp), Some(rp)) = (lp, rp) else {
        return Err(SignatureError::Malformed(sig.to_string()));
    };
    if rp < lp {
        return Err(SignatureError::Malformed(sig.to_string()));
    }

    let name = sig[..lp].trim().to_string();
    let inside = sig[lp + 1..rp].trim();

    let mut parameter_types = Vec::new();
    if !inside.is_empty() {
        for piece in inside.split(',') {
            parameter_types.push(normalize_type(piece));
        }
    }

    Ok(MethodSignature {
        name,
        parameter_types,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Normalizer laws ───────────────────────────────────────────────────────

    #[test]
    fn normalize_strips_qualification_and_generics() {
        assert_eq!(normalize_type("java.util.List<String>"), "List");
        assert_eq!(normalize_type("java.lang.String"), "String");
        assert_eq!(normalize_type("Map<String,Integer>"), "Map");
    }

    #[test]
    fn normalize_varargs_to_array() {
        assert_eq!(normalize_type("final Foo..."), "Foo[]");
        assert_eq!(normalize_type("java.lang.Object..."), "Object[]");
        assert_eq!(normalize_type("int[]"), "int[]", "arrays pass through");
    }

    #[test]
    fn normalize_drops_annotations_and_modifiers() {
        assert_eq!(normalize_type("@NonNull String"), "String");
        assert_eq!(normalize_type("@Size(max = 10) String"), "String");
        assert_eq!(normalize_type("final int"), "int");
    }

    #[test]
    fn normalize_empty_and_whitespace() {
        assert_eq!(normalize_type(""), "");
        assert_eq!(normalize_type("   "), "");
    }

    // ── Signature parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_typical_signature() {
        let sig = parse_signature("query(MappedStatement,Object,RowBounds)").unwrap();
        assert_eq!(sig.name, "query");
        assert_eq!(
            sig.parameter_types,
            vec!["MappedStatement", "Object", "RowBounds"]
        );
    }

    #[test]
    fn parse_normalizes_each_parameter() {
        let sig = parse_signature("foo(java.lang.String, final int, Bar...)").unwrap();
        assert_eq!(sig.parameter_types, vec!["String", "int", "Bar[]"]);
    }

    #[test]
    fn parse_zero_parameters() {
        let sig = parse_signature("bar()").unwrap();
        assert_eq!(sig.name, "bar");
        assert!(sig.parameter_types.is_empty(), "() means no parameters");
    }

    #[test]
    fn parse_rejects_missing_parens() {
        assert!(matches!(
            parse_signature("justaname"),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            parse_signature("broken)("),
            Err(SignatureError::Malformed(_))
        ));
    }
}
