use anyhow::{Context, Result};
use clap::Parser;
use glob::Pattern;
use serde_json::json;
use std::path::PathBuf;
use unitsmith::annotator::annotate_method_at_offset;
use unitsmith::batch::{load_targets, run_batch};
use unitsmith::config::load_config;
use unitsmith::prompt::{prepare_prompt_dir, PromptRequest};
use unitsmith::source::{list_classes, read_whole_class};

#[derive(Debug, Parser)]
#[command(name = "unitsmith")]
#[command(version)]
#[command(about = "Locate a Java method by signature and inject line markers for LLM test generation")]
struct Cli {
    /// Fully-qualified name of the class under test
    #[arg(long)]
    class: Option<String>,

    /// Focal method signature, e.g. "query(MappedStatement,Object,RowBounds)"
    #[arg(long)]
    methodsig: Option<String>,

    /// 1-based line offset into the focal method's body
    #[arg(long)]
    offset: Option<usize>,

    /// 1-based class line number bound to ${lines_to_test}
    #[arg(long)]
    lines: Option<usize>,

    /// Constraint text bound to ${constraint_text}
    #[arg(long)]
    ctext: Option<String>,

    /// Bind ${only_target_lines} to true
    #[arg(long)]
    only_target_lines: bool,

    /// Prepare a prompt directory instead of printing the annotated class
    #[arg(long)]
    prepare: bool,

    /// Template directory to copy into the prompt kit (embedded defaults when omitted)
    #[arg(long, value_name = "DIR")]
    prompt_dir: Option<PathBuf>,

    /// Output directory for --prepare or --targets (defaults under the config output_dir)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// List every class under the configured source roots and exit
    #[arg(long)]
    list_classes: bool,

    /// Glob-style FQCN filter for --list-classes, e.g. "com.example.*"
    #[arg(long, value_name = "PATTERN")]
    pattern: Option<String>,

    /// JSON targets file: [{"class":..., "methodsig":..., "offset":N}, ...]
    #[arg(long, value_name = "FILE")]
    targets: Option<PathBuf>,

    /// Print outcome metadata as JSON instead of the annotated source
    #[arg(long)]
    json: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = match cli.project_root.clone() {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to get current dir")?,
    };
    let cfg = load_config(&project_root);

    if cli.list_classes {
        let pattern = cli
            .pattern
            .as_deref()
            .map(Pattern::new)
            .transpose()
            .context("Invalid --pattern glob")?;
        let classes = list_classes(&project_root, &cfg.source.roots, pattern.as_ref())?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&classes)?);
        } else {
            for c in classes {
                println!("{c}");
            }
        }
        return Ok(());
    }

    if let Some(targets_path) = cli.targets.as_ref() {
        let targets = load_targets(targets_path)?;
        let out_dir = cli
            .out_dir
            .clone()
            .unwrap_or_else(|| project_root.join(&cfg.output_dir).join("annotated"));

        let report = run_batch(&project_root, &targets, &out_dir, &cfg)?;
        std::fs::write(
            out_dir.join("report.json"),
            serde_json::to_vec_pretty(&report)?,
        )?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            eprintln!(
                "{} targets: {} annotated, {} unchanged, {} failed -> {}",
                report.total,
                report.annotated,
                report.unchanged,
                report.failed,
                out_dir.display()
            );
        }
        return Ok(());
    }

    if cli.prepare {
        let class = cli.class.clone().context("Missing --class")?;
        let req = PromptRequest {
            class,
            methodsig: cli.methodsig.clone(),
            offset: cli.offset,
            lines: cli.lines,
            only_target_lines: cli.only_target_lines,
            constraint_text: cli.ctext.clone(),
        };
        let dest = cli
            .out_dir
            .clone()
            .unwrap_or_else(|| project_root.join(&cfg.output_dir).join("prompts"));

        let kit = prepare_prompt_dir(&project_root, cli.prompt_dir.as_deref(), &dest, &req, &cfg)?;
        println!("{}", kit.display());
        return Ok(());
    }

    // ── Single-target annotation ──────────────────────────────────────────
    let class = cli.class.context("Missing --class")?;
    let methodsig = cli.methodsig.context("Missing --methodsig")?;
    let offset = cli.offset.context("Missing --offset")?;

    let source = read_whole_class(&project_root, &class, &cfg.source.roots);
    if source.is_empty() {
        anyhow::bail!(
            "Class {class} not found under {} source roots",
            project_root.display()
        );
    }

    let annotation = annotate_method_at_offset(&source, &methodsig, offset)?;

    if cli.json {
        let meta = json!({
            "class": class,
            "methodsig": methodsig,
            "offset": offset,
            "status": annotation.outcome.status(),
            "changed": annotation.outcome.changed(),
            "totalChars": annotation.text.len(),
        });
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print!("{}", annotation.text);
        if !annotation.outcome.changed() {
            eprintln!("unchanged: {}", annotation.outcome.status());
        }
    }

    Ok(())
}
