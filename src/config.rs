use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where class sources live, relative to the project root. Roots are probed
/// in order; the first one holding the class wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub roots: Vec<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("src/main/java"),
                PathBuf::from("src/test/java"),
            ],
        }
    }
}

/// Which template files make up a prompt kit, and which of them receive
/// placeholder substitution.
///
/// `hits_system_gen.ftl` is deliberately absent from `inject_into`: it
/// carries no placeholders and must reach the renderer untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub files: Vec<String>,
    pub inject_into: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            files: vec![
                "hits_gen.ftl".into(),
                "hits_gen_slice.ftl".into(),
                "hits_repair.ftl".into(),
                "hits_system_gen.ftl".into(),
                "hits_system_repair.ftl".into(),
            ],
            inject_into: vec![
                "hits_gen.ftl".into(),
                "hits_gen_slice.ftl".into(),
                "hits_repair.ftl".into(),
                "hits_system_repair.ftl".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub source: SourceConfig,
    pub prompt: PromptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".unitsmith"),
            source: SourceConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

pub fn load_config(project_root: &Path) -> Config {
    let primary = project_root.join(".unitsmith.json");

    let text = std::fs::read_to_string(&primary);
    let Ok(text) = text else { return Config::default() };

    serde_json::from_str::<Config>(&text).unwrap_or_else(|_| Config::default())
}
