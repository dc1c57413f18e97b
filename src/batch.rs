use crate::annotator::annotate_method_at_offset;
use crate::config::Config;
use crate::source::read_whole_class;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One (class, method, offset) annotation target from a targets file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchTarget {
    pub class: String,
    pub methodsig: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub class: String,
    pub methodsig: String,
    pub offset: usize,
    /// "annotated" | "annotated_ambiguous" | "no_match" |
    /// "offset_out_of_range" | "bad_signature" | "missing_class" |
    /// "write_failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Repo-relative path of the written annotated class, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub annotated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub targets: Vec<TargetReport>,
}

pub fn load_targets(path: &Path) -> Result<Vec<BatchTarget>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read targets file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Targets file is not a JSON array of targets: {}", path.display()))
}

/// Annotate every target in parallel; annotated classes land under `out_dir`
/// mirroring their package paths. A target that cannot be resolved is
/// recorded and skipped; the batch always runs to completion.
pub fn run_batch(
    project_root: &Path,
    targets: &[BatchTarget],
    out_dir: &Path,
    cfg: &Config,
) -> Result<BatchReport> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir: {}", out_dir.display()))?;

    let bar = ProgressBar::new(targets.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    let reports: Vec<TargetReport> = targets
        .par_iter()
        .map(|target| {
            let report = annotate_target(project_root, target, out_dir, cfg);
            bar.inc(1);
            report
        })
        .collect();

    bar.finish_with_message("done");

    let annotated = reports
        .iter()
        .filter(|r| r.status.starts_with("annotated"))
        .count();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.status.as_str(), "bad_signature" | "missing_class" | "write_failed"))
        .count();

    Ok(BatchReport {
        total: reports.len(),
        annotated,
        unchanged: reports.len() - annotated - failed,
        failed,
        targets: reports,
    })
}

fn annotate_target(
    project_root: &Path,
    target: &BatchTarget,
    out_dir: &Path,
    cfg: &Config,
) -> TargetReport {
    let mut report = TargetReport {
        class: target.class.clone(),
        methodsig: target.methodsig.clone(),
        offset: target.offset,
        status: String::new(),
        detail: None,
        output: None,
    };

    let source = read_whole_class(project_root, &target.class, &cfg.source.roots);
    if source.is_empty() {
        report.status = "missing_class".into();
        return report;
    }

    let annotation = match annotate_method_at_offset(&source, &target.methodsig, target.offset) {
        Ok(a) => a,
        Err(e) => {
            report.status = "bad_signature".into();
            report.detail = Some(e.to_string());
            return report;
        }
    };

    report.status = annotation.outcome.status().into();
    if !annotation.outcome.changed() {
        return report;
    }

    let rel = format!("{}.java", target.class.replace('.', "/"));
    let dest = out_dir.join(&rel);
    let write = dest
        .parent()
        .map(std::fs::create_dir_all)
        .unwrap_or(Ok(()))
        .and_then(|_| std::fs::write(&dest, &annotation.text));

    match write {
        Ok(()) => report.output = Some(rel),
        Err(e) => {
            report.status = "write_failed".into();
            report.detail = Some(e.to_string());
        }
    }

    report
}
