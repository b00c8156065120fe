use clap::Parser;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use vsmodelgen::build_files::BuildOptions;
use vsmodelgen::codegen::{CodegenOptions, Indent};
use vsmodelgen::pipeline::{self, ArtifactKind, GenerateOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitStage {
    Files,
    Model,
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "vsmodelgen",
    version,
    about = "Generates VeriStand model boilerplate (model.h, model.c) from a JSON interface description"
)]
struct Cli {
    /// Model configuration file, or '-' for stdin
    config: PathBuf,

    /// Output directory
    #[arg(short = 'O', long = "outdir", default_value = ".")]
    outdir: PathBuf,

    /// Source file name
    #[arg(short = 'o', default_value = "model.c")]
    output: String,

    /// Spaces per indent level
    #[arg(short = 'w', long = "indentwidth", default_value_t = 2)]
    indent_width: usize,

    /// Indent with tabs instead of spaces
    #[arg(short = 't', long)]
    tabs: bool,

    /// Overwrite existing files
    #[arg(short = 'f', long)]
    force: bool,

    /// Write all artifacts to stdout instead of files
    #[arg(long)]
    stdout: bool,

    /// Generate model.h (default)
    #[arg(long = "header", overrides_with = "no_header")]
    _header: bool,

    /// Skip model.h
    #[arg(long = "no-header", overrides_with = "_header")]
    no_header: bool,

    /// Generate the source file (default)
    #[arg(long = "src", overrides_with = "no_src")]
    _src: bool,

    /// Skip the source file
    #[arg(long = "no-src", overrides_with = "_src")]
    no_src: bool,

    /// Also generate a Makefile
    #[arg(long)]
    makefile: bool,

    /// Also generate build.bat
    #[arg(long = "build-script")]
    build_script: bool,

    /// C standard used by the makefile
    #[arg(long, default_value = "gnu11")]
    cstd: String,

    /// C++ standard used by the makefile
    #[arg(long, default_value = "gnu++17")]
    cxxstd: String,

    /// Extra include directory for the makefile (repeatable)
    #[arg(short = 'I', long = "include")]
    include: Vec<String>,

    /// Source directory referenced by the makefile
    #[arg(long, default_value = "src")]
    srcdir: String,

    /// Toolchain root used by build.bat
    #[arg(long)]
    toolchain: Option<String>,

    /// Cross compiler prefix
    #[arg(long = "toolchain-prefix", default_value = "x86_64-nilrt-linux-")]
    toolchain_prefix: String,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Files)]
    emit: EmitStage,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn generate_options(&self) -> GenerateOptions {
        let indent = if self.tabs {
            Indent::Tabs
        } else {
            Indent::Spaces(self.indent_width)
        };
        GenerateOptions {
            codegen: CodegenOptions { indent },
            build: BuildOptions {
                c_std: self.cstd.clone(),
                cxx_std: self.cxxstd.clone(),
                include_dirs: self.include.clone(),
                src_dir: self.srcdir.clone(),
                toolchain_dir: self.toolchain.clone(),
                toolchain_prefix: self.toolchain_prefix.clone(),
            },
            makefile: self.makefile,
            build_script: self.build_script,
        }
    }

    fn wants(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Header => !self.no_header,
            ArtifactKind::Source => !self.no_src,
            ArtifactKind::Makefile => self.makefile,
            ArtifactKind::BuildScript => self.build_script,
        }
    }

    fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Source => &self.output,
            other => other.default_file_name(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn read_config(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::debug!("config = {}", cli.config.display());
    log::debug!("outdir = {}", cli.outdir.display());
    log::debug!("emit   = {:?}", cli.emit);

    // ── Read and generate ──
    let config = match read_config(&cli.config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vsmodelgen: error: {}: {}", cli.config.display(), e);
            std::process::exit(2);
        }
    };

    let generation = match pipeline::generate(&config, &cli.generate_options()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("vsmodelgen: {}", e.to_diagnostic());
            std::process::exit(1);
        }
    };

    for diag in &generation.diagnostics {
        log::warn!("{}", diag);
    }

    let model = &generation.model;
    log::debug!(
        "model `{}`: {} inports, {} outports, {} parameters, {} signals",
        model.name,
        model.inports.len(),
        model.outports.len(),
        model.parameters.len(),
        model.signals.len(),
    );

    // ── Non-file stages ──
    match cli.emit {
        EmitStage::Model => {
            match serde_json::to_string_pretty(model) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("vsmodelgen: error: {}", e);
                    std::process::exit(2);
                }
            }
            return;
        }
        EmitStage::BuildInfo => {
            print!("{}", pipeline::compute_provenance(&config).to_json(model));
            return;
        }
        EmitStage::Files => {}
    }

    let artifacts: Vec<_> = generation
        .artifacts()
        .into_iter()
        .filter(|a| cli.wants(a.kind))
        .collect();

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        for artifact in &artifacts {
            if let Err(e) = stdout.write_all(artifact.contents.as_bytes()) {
                eprintln!("vsmodelgen: error: stdout: {}", e);
                std::process::exit(2);
            }
        }
        return;
    }

    // ── Overwrite guard, then write ──
    let targets: Vec<(PathBuf, &str)> = artifacts
        .iter()
        .map(|a| (cli.outdir.join(cli.file_name(a.kind)), a.contents.as_str()))
        .collect();

    let existing: Vec<&PathBuf> = targets
        .iter()
        .map(|(path, _)| path)
        .filter(|path| path.exists())
        .collect();
    if !cli.force && !existing.is_empty() {
        for path in existing {
            eprintln!(
                "vsmodelgen: error: {} already exists (use --force to overwrite)",
                path.display()
            );
        }
        std::process::exit(1);
    }

    if let Err(e) = std::fs::create_dir_all(&cli.outdir) {
        eprintln!("vsmodelgen: error: {}: {}", cli.outdir.display(), e);
        std::process::exit(2);
    }

    for (path, contents) in &targets {
        if let Err(e) = std::fs::write(path, contents) {
            eprintln!("vsmodelgen: error: {}: {}", path.display(), e);
            std::process::exit(2);
        }
        log::info!("wrote {}", path.display());
    }
}
