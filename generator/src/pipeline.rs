// pipeline.rs — Generation pipeline and provenance
//
// Runs parse → layout → codegen (→ build files) over one configuration and
// collects every artifact with its default file name.
//
// Preconditions: none.
// Postconditions: returns all requested artifacts plus warnings, or the first
//                 fatal `SchemaError`.
// Failure modes: schema errors from the parser.
// Side effects: none (writing artifacts is the caller's job).

use std::fmt::Write as _;

use crate::build_files::{self, BuildOptions};
use crate::codegen::{self, CodegenOptions, GeneratedCode};
use crate::diag::Diagnostic;
use crate::layout::{self, LayoutTables};
use crate::model::ModelDescriptor;
use crate::parser::{self, SchemaError};

// ── Options and results ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub codegen: CodegenOptions,
    pub build: BuildOptions,
    pub makefile: bool,
    pub build_script: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Header,
    Source,
    Makefile,
    BuildScript,
}

impl ArtifactKind {
    /// File name used unless the caller overrides it (only the source name
    /// is configurable).
    pub fn default_file_name(self) -> &'static str {
        match self {
            ArtifactKind::Header => "model.h",
            ArtifactKind::Source => "model.c",
            ArtifactKind::Makefile => "Makefile",
            ArtifactKind::BuildScript => "build.bat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub contents: String,
}

/// Everything produced from one configuration.
#[derive(Debug)]
pub struct Generation {
    pub model: ModelDescriptor,
    pub layout: LayoutTables,
    pub code: GeneratedCode,
    pub makefile: Option<String>,
    pub build_script: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    /// Artifacts in output order: header, source, makefile, build script.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut out = vec![
            Artifact {
                kind: ArtifactKind::Header,
                contents: self.code.header.clone(),
            },
            Artifact {
                kind: ArtifactKind::Source,
                contents: self.code.source.clone(),
            },
        ];
        if let Some(text) = &self.makefile {
            out.push(Artifact {
                kind: ArtifactKind::Makefile,
                contents: text.clone(),
            });
        }
        if let Some(text) = &self.build_script {
            out.push(Artifact {
                kind: ArtifactKind::BuildScript,
                contents: text.clone(),
            });
        }
        out
    }
}

// ── Entry point ────────────────────────────────────────────────────────────

pub fn generate(config: &str, options: &GenerateOptions) -> Result<Generation, SchemaError> {
    let parsed = parser::parse_config(config)?;
    let model = parsed.model;
    let layout = layout::build_layout(&model);
    let code = codegen::codegen(&model, &layout, &options.codegen);
    let makefile = options
        .makefile
        .then(|| build_files::makefile(&model, &options.build));
    let build_script = options
        .build_script
        .then(|| build_files::build_script(&model, &options.build));

    Ok(Generation {
        model,
        layout,
        code,
        makefile,
        build_script,
        diagnostics: parsed.diagnostics,
    })
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// Identifies the inputs of a generation run.
///
/// `config_hash`: SHA-256 of the raw configuration text.
/// `generator_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub config_hash: [u8; 32],
    pub generator_version: &'static str,
}

impl Provenance {
    /// Hex string of the config hash (64 characters).
    pub fn config_hash_hex(&self) -> String {
        bytes_to_hex(&self.config_hash)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self, model: &ModelDescriptor) -> String {
        let info = serde_json::json!({
            "model": model.name,
            "config_hash": self.config_hash_hex(),
            "generator_version": self.generator_version,
            "channels": {
                "inports": model.inports.len(),
                "outports": model.outports.len(),
                "parameters": model.parameters.len(),
                "signals": model.signals.len(),
            },
        });
        let mut text = serde_json::to_string_pretty(&info).unwrap_or_default();
        text.push('\n');
        text
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

pub fn compute_provenance(config: &str) -> Provenance {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(config.as_bytes());
    let config_hash: [u8; 32] = hasher.finalize().into();

    Provenance {
        config_hash,
        generator_version: env!("CARGO_PKG_VERSION"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"name": "foo", "builder": "b", "baserate": 0.01,
        "inports": ["a.x", "a.y"], "signals": [{"name": "s", "description": 1}]}"#;

    #[test]
    fn default_run_yields_header_and_source() {
        let config = r#"{"name": "foo", "builder": "b", "baserate": 0.01}"#;
        let generation = generate(config, &GenerateOptions::default()).unwrap();
        let kinds: Vec<ArtifactKind> = generation.artifacts().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ArtifactKind::Header, ArtifactKind::Source]);
    }

    #[test]
    fn build_files_on_request() {
        let config = r#"{"name": "foo", "builder": "b", "baserate": 0.01}"#;
        let options = GenerateOptions {
            makefile: true,
            build_script: true,
            ..GenerateOptions::default()
        };
        let generation = generate(config, &options).unwrap();
        let names: Vec<&str> = generation
            .artifacts()
            .iter()
            .map(|a| a.kind.default_file_name())
            .collect();
        assert_eq!(names, vec!["model.h", "model.c", "Makefile", "build.bat"]);
    }

    #[test]
    fn schema_errors_abort_before_any_output() {
        let err = generate(CONFIG, &GenerateOptions::default()).unwrap_err();
        assert_eq!(err.location(), Some("signals[0]"));
    }

    #[test]
    fn provenance_hash_is_stable() {
        let a = compute_provenance("{}");
        let b = compute_provenance("{}");
        assert_eq!(a.config_hash, b.config_hash);
        assert_eq!(
            a.config_hash_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_ne!(compute_provenance("{ }").config_hash, a.config_hash);
    }

    #[test]
    fn build_info_json() {
        let config = r#"{"name": "foo", "builder": "b", "baserate": 0.01, "inports": ["x"]}"#;
        let generation = generate(config, &GenerateOptions::default()).unwrap();
        let text = compute_provenance(config).to_json(&generation.model);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["model"], "foo");
        assert_eq!(value["channels"]["inports"], 1);
        assert_eq!(value["config_hash"].as_str().unwrap().len(), 64);
    }
}
