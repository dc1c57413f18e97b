use anyhow::{Context, Result};
use glob::Pattern;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Resolve a fully-qualified class name to its `.java` file under the first
/// source root that holds it.
pub fn class_file(project_root: &Path, fqcn: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    if fqcn.trim().is_empty() {
        return None;
    }
    let rel = format!("{}.java", fqcn.replace('.', "/"));
    roots
        .iter()
        .map(|root| project_root.join(root).join(&rel))
        .find(|p| p.is_file())
}

/// Full source text of a class, or `""` when the class cannot be found or
/// read. Best-effort by contract: a missing class must not abort a batch.
pub fn read_whole_class(project_root: &Path, fqcn: &str, roots: &[PathBuf]) -> String {
    match class_file(project_root, fqcn, roots) {
        Some(path) => std::fs::read_to_string(&path).unwrap_or_default(),
        None => String::new(),
    }
}

/// One exact 1-based source line of a class, or `""` when out of range or
/// unresolvable.
pub fn read_line_of_class(project_root: &Path, fqcn: &str, line: usize, roots: &[PathBuf]) -> String {
    if line < 1 {
        return String::new();
    }
    let text = read_whole_class(project_root, fqcn, roots);
    text.lines().nth(line - 1).unwrap_or("").to_string()
}

/// Every FQCN under the source roots, sorted and deduplicated, optionally
/// filtered by a glob-style pattern such as `com.example.*`.
///
/// The walk respects `.gitignore` the same way the rest of the pipeline's
/// file discovery does.
pub fn list_classes(
    project_root: &Path,
    roots: &[PathBuf],
    pattern: Option<&Pattern>,
) -> Result<Vec<String>> {
    let mut out = Vec::new();

    for root in roots {
        let abs_root = project_root.join(root);
        if !abs_root.is_dir() {
            continue;
        }

        let mut ob = OverrideBuilder::new(&abs_root);
        ob.add("**/*.java")
            .context("Failed to build source walk overrides")?;
        let overrides = ob.build()?;

        let walker = WalkBuilder::new(&abs_root)
            .standard_filters(true)
            .overrides(overrides)
            .build();

        for item in walker {
            let dent = match item {
                Ok(d) => d,
                Err(_) => continue,
            };
            if !dent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let abs = dent.into_path();
            let rel = match abs.strip_prefix(&abs_root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let Some(rel_str) = rel.to_str() else { continue };
            let Some(stem) = rel_str.strip_suffix(".java") else {
                continue;
            };

            let fqcn = stem.replace(['/', '\\'], ".");
            if let Some(pat) = pattern {
                if !pat.matches(&fqcn) {
                    continue;
                }
            }
            out.push(fqcn);
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_class(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, body).unwrap();
    }

    #[test]
    fn main_root_shadows_test_root() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![
            PathBuf::from("src/main/java"),
            PathBuf::from("src/test/java"),
        ];
        write_class(tmp.path(), "src/main/java/com/x/A.java", "class A { int m; }");
        write_class(tmp.path(), "src/test/java/com/x/A.java", "class A { int t; }");

        let text = read_whole_class(tmp.path(), "com.x.A", &roots);
        assert!(text.contains("int m"), "src/main/java is probed first");
    }

    #[test]
    fn missing_class_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![PathBuf::from("src/main/java")];
        assert_eq!(read_whole_class(tmp.path(), "no.such.Class", &roots), "");
        assert_eq!(read_line_of_class(tmp.path(), "no.such.Class", 3, &roots), "");
    }

    #[test]
    fn read_line_is_one_based_and_bounded() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![PathBuf::from("src/main/java")];
        write_class(tmp.path(), "src/main/java/B.java", "line one\nline two\n");

        assert_eq!(read_line_of_class(tmp.path(), "B", 2, &roots), "line two");
        assert_eq!(read_line_of_class(tmp.path(), "B", 0, &roots), "");
        assert_eq!(read_line_of_class(tmp.path(), "B", 99, &roots), "");
    }

    #[test]
    fn lists_classes_with_pattern_filter() {
        let tmp = TempDir::new().unwrap();
        let roots = vec![PathBuf::from("src/main/java")];
        write_class(tmp.path(), "src/main/java/com/x/A.java", "class A {}");
        write_class(tmp.path(), "src/main/java/com/y/B.java", "class B {}");
        write_class(tmp.path(), "src/main/java/com/x/notes.txt", "ignored");

        let all = list_classes(tmp.path(), &roots, None).unwrap();
        assert_eq!(all, vec!["com.x.A", "com.y.B"]);

        let pat = Pattern::new("com.x.*").unwrap();
        let filtered = list_classes(tmp.path(), &roots, Some(&pat)).unwrap();
        assert_eq!(filtered, vec!["com.x.A"]);
    }
}
