use am32_release_skip::config::{CliOverrides, EnvValues, ResolvedConfig, SkipConfig};
use am32_release_skip::{output, skip};
use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;

/// Generate the CMake release skip list for AM32 targets.
///
/// Compares the targets declared in `Inc/targets.h` against the firmware
/// images published on a GitHub release and prints the `FILE_NAME` of every
/// local target without an official artifact.
#[derive(Parser, Debug)]
#[command(
    name = "release-skip",
    version,
    about,
    after_help = "Examples:\n  release-skip\n  release-skip --tag v2.19\n  release-skip --targets-file firmware/Inc/targets.h --verbose\n  release-skip --release-url https://api.github.com/repos/am32-firmware/AM32/releases/latest"
)]
struct Cli {
    /// Release tag to compare against (default: v2.20).
    #[arg(long)]
    tag: Option<String>,

    /// Repository publishing the releases, as owner/name.
    #[arg(long)]
    repo: Option<String>,

    /// Full release-metadata endpoint. Overrides --tag and --repo.
    #[arg(long)]
    release_url: Option<String>,

    /// Local targets header (default: Inc/targets.h).
    #[arg(long)]
    targets_file: Option<String>,

    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every remote target and the decision for each local target.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            repo: self.repo.clone(),
            tag: self.tag.clone(),
            release_url: self.release_url.clone(),
            targets_file: self.targets_file.clone(),
        }
    }
}

/// Resolve the layered configuration for this invocation.
fn resolve_config(cli: &Cli) -> Result<ResolvedConfig> {
    let file_config = match &cli.config {
        Some(path) => SkipConfig::load_from(path)?,
        None => SkipConfig::default(),
    };
    Ok(file_config.resolve(&cli.overrides(), EnvValues::from_process()))
}

fn run(cli: &Cli) -> Result<()> {
    output::set_verbose(cli.verbose);

    let config = resolve_config(cli)?;
    if config.is_non_https {
        output::note(&format!(
            "release URL {} is not HTTPS",
            config.release_url
        ));
    }

    let mut stdout = io::stdout();
    skip::run(&config, &mut stdout)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        output::fail("[release-skip] error:", &format!("{e:#}"));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
