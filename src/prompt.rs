use crate::annotator::annotate_method_at_offset;
use crate::config::Config;
use crate::source::{read_line_of_class, read_whole_class};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Everything one prompt kit needs to know about its target.
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    /// Fully-qualified name of the class under test.
    pub class: String,
    /// Signature of the focal method, `name(Type1,Type2,...)`.
    pub methodsig: Option<String>,
    /// 1-based line offset into the focal method's body.
    pub offset: Option<usize>,
    /// 1-based line number of the class used for `${lines_to_test}`.
    pub lines: Option<usize>,
    pub only_target_lines: bool,
    pub constraint_text: Option<String>,
}

/// Default templates bundled into the binary; used when the caller supplies
/// no template directory.
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("hits_gen.ftl", include_str!("../prompts/hits_gen.ftl")),
    ("hits_gen_slice.ftl", include_str!("../prompts/hits_gen_slice.ftl")),
    ("hits_repair.ftl", include_str!("../prompts/hits_repair.ftl")),
    ("hits_system_gen.ftl", include_str!("../prompts/hits_system_gen.ftl")),
    (
        "hits_system_repair.ftl",
        include_str!("../prompts/hits_system_repair.ftl"),
    ),
];

/// Assemble a ready-to-render prompt directory at `dest`.
///
/// Templates come from `template_dir` when given (copied recursively),
/// otherwise from the embedded defaults listed in `cfg.prompt.files`. Then
/// every file in `cfg.prompt.inject_into` gets the placeholder map
/// substituted in place; the system-gen template is intentionally left
/// untouched.
///
/// The only hard failure besides I/O is a malformed `methodsig`; structural
/// misses degrade to embedding the unannotated class.
pub fn prepare_prompt_dir(
    project_root: &Path,
    template_dir: Option<&Path>,
    dest: &Path,
    req: &PromptRequest,
    cfg: &Config,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create prompt dir: {}", dest.display()))?;

    match template_dir {
        Some(src) if src.is_dir() => copy_dir(src, dest)?,
        _ => {
            for (name, body) in EMBEDDED_TEMPLATES {
                if !cfg.prompt.files.iter().any(|f| f == name) {
                    continue;
                }
                std::fs::write(dest.join(name), body)
                    .with_context(|| format!("Failed to write template {name}"))?;
            }
        }
    }

    let replace_map = build_replace_map(project_root, req, cfg)?;
    for name in &cfg.prompt.inject_into {
        inject(&dest.join(name), &replace_map)?;
    }

    debug_log!("prompt kit ready at {}", dest.display());
    Ok(dest.to_path_buf())
}

/// Placeholder → value map for one request.
///
/// `${full_fm}`, `${lines_to_test}` and `${only_target_lines}` are always
/// present (possibly empty) so the downstream renderer never sees an
/// unresolved required variable; the rest are set only when supplied.
fn build_replace_map(
    project_root: &Path,
    req: &PromptRequest,
    cfg: &Config,
) -> Result<HashMap<String, String>> {
    let roots = &cfg.source.roots;
    let mut map = HashMap::new();

    let code_line = match req.lines {
        Some(n) => read_line_of_class(project_root, &req.class, n, roots),
        None => String::new(),
    };
    map.insert("${lines_to_test}".to_string(), code_line);
    map.insert(
        "${only_target_lines}".to_string(),
        req.only_target_lines.to_string(),
    );

    let full_code = read_whole_class(project_root, &req.class, roots);
    let annotated = match (&req.methodsig, req.offset) {
        (Some(sig), Some(offset)) if !full_code.is_empty() => {
            let ann = annotate_method_at_offset(&full_code, sig, offset)
                .with_context(|| format!("Bad methodsig for class {}", req.class))?;
            if !ann.outcome.changed() {
                debug_log!(
                    "class {} sig {sig}: {}, emitting unannotated source",
                    req.class,
                    ann.outcome.status()
                );
            }
            ann.text
        }
        _ => full_code,
    };
    map.insert("${full_fm}".to_string(), annotated);

    if let Some(ctext) = &req.constraint_text {
        map.insert("${constraint_text}".to_string(), ctext.clone());
    }
    if let Some(offset) = req.offset {
        map.insert("${offset}".to_string(), offset.to_string());
    }
    if let Some(sig) = &req.methodsig {
        map.insert("${methodsig}".to_string(), sig.clone());
    }

    Ok(map)
}

/// Substitute every map entry in `file`, in place. Missing files are skipped
/// so a trimmed-down template dir keeps working.
fn inject(file: &Path, kv: &HashMap<String, String>) -> Result<()> {
    if !file.exists() {
        return Ok(());
    }
    let mut text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read template: {}", file.display()))?;
    for (key, value) in kv {
        text = text.replace(key.as_str(), value);
    }
    std::fs::write(file, text)
        .with_context(|| format!("Failed to write template: {}", file.display()))?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in std::fs::read_dir(src)
        .with_context(|| format!("Failed to read template dir: {}", src.display()))?
    {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&to)?;
            copy_dir(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)
                .with_context(|| format!("Failed to copy template: {}", from.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with_class() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("src/main/java/com/x");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Calc.java"),
            "public class Calc {\n    public int add(int a, int b) {\n        int s = a + b;\n        return s;\n    }\n}\n",
        )
        .unwrap();
        (tmp, Config::default())
    }

    #[test]
    fn embedded_kit_substitutes_placeholders() {
        let (tmp, cfg) = project_with_class();
        let dest = tmp.path().join("kit");
        let req = PromptRequest {
            class: "com.x.Calc".into(),
            methodsig: Some("add(int,int)".into()),
            offset: Some(2),
            lines: Some(4),
            only_target_lines: true,
            constraint_text: Some("no mocks".into()),
        };

        prepare_prompt_dir(tmp.path(), None, &dest, &req, &cfg).unwrap();

        let gen = std::fs::read_to_string(dest.join("hits_gen.ftl")).unwrap();
        assert!(!gen.contains("${full_fm}"), "placeholder must be substituted");
        assert!(gen.contains("//This is line 2"), "annotated class embedded");
        assert!(gen.contains("return s;"), "lines_to_test resolved from line 4");
        assert!(gen.contains("no mocks"));
        assert!(gen.contains("add(int,int)"));

        let system_gen = std::fs::read_to_string(dest.join("hits_system_gen.ftl")).unwrap();
        assert_eq!(
            system_gen,
            include_str!("../prompts/hits_system_gen.ftl"),
            "system gen template is never injected"
        );
    }

    #[test]
    fn user_template_dir_is_copied_and_injected() {
        let (tmp, cfg) = project_with_class();
        let templates = tmp.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("hits_gen.ftl"), "CLASS:\n${full_fm}\n").unwrap();

        let dest = tmp.path().join("kit");
        let req = PromptRequest {
            class: "com.x.Calc".into(),
            ..Default::default()
        };

        prepare_prompt_dir(tmp.path(), Some(&templates), &dest, &req, &cfg).unwrap();
        let gen = std::fs::read_to_string(dest.join("hits_gen.ftl")).unwrap();
        assert!(gen.starts_with("CLASS:\n"));
        assert!(
            gen.contains("public class Calc"),
            "without methodsig/offset the raw class goes in"
        );
    }

    #[test]
    fn malformed_methodsig_surfaces_as_error() {
        let (tmp, cfg) = project_with_class();
        let req = PromptRequest {
            class: "com.x.Calc".into(),
            methodsig: Some("nonsense".into()),
            offset: Some(1),
            ..Default::default()
        };
        let err = prepare_prompt_dir(tmp.path(), None, &tmp.path().join("kit"), &req, &cfg);
        assert!(err.is_err(), "malformed signature aborts the kit, by contract");
    }

    #[test]
    fn missing_class_still_produces_a_kit() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::default();
        let dest = tmp.path().join("kit");
        let req = PromptRequest {
            class: "no.such.Class".into(),
            methodsig: Some("m()".into()),
            offset: Some(1),
            ..Default::default()
        };
        prepare_prompt_dir(tmp.path(), None, &dest, &req, &cfg).unwrap();
        let gen = std::fs::read_to_string(dest.join("hits_gen.ftl")).unwrap();
        assert!(
            !gen.contains("${full_fm}"),
            "full_fm is always replaced, empty when the class is missing"
        );
    }
}
