//! psarc - read and extract PSARC archives
//!
//! # Usage
//!
//! ```bash
//! # List archive contents
//! psarc archive.psarc
//!
//! # Extract all files to ./output
//! psarc archive.psarc ./output
//!
//! # Extract and convert SNG arrangements to XML
//! psarc -s archive.psarc ./output
//! ```
//!
//! Audio conversion (`-a`) pipes each `.wem`/`.bnk` entry through an
//! external Wwise decoder named by `PSARC_AUDIO_TOOL` (default `wem2ogg`),
//! reading the entry from stdin and expecting OGG on stdout.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitCode, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use psarc_archive::{Archive, ArchiveError, AudioConverter};

/// A tool for reading and extracting PSARC archives.
#[derive(Parser)]
#[command(name = "psarc", version, about = "A tool for reading and extracting PSARC archives")]
struct Cli {
    /// Path to the .psarc file to open
    psarc_path: PathBuf,

    /// Directory to extract files to
    output_dir: Option<PathBuf>,

    /// List files only (don't extract)
    #[arg(short, long)]
    list: bool,

    /// Suppress file listing during extraction
    #[arg(short, long)]
    quiet: bool,

    /// Convert WEM/BNK audio entries to OGG via an external tool
    #[arg(short = 'a', long)]
    convert_audio: bool,

    /// Convert SNG arrangements to XML
    #[arg(short = 's', long)]
    convert_sng: bool,
}

/// Shells out to the configured Wwise decoder, one process per entry.
struct ExternalAudioTool {
    program: String,
}

impl ExternalAudioTool {
    fn from_env() -> Self {
        Self {
            program: std::env::var("PSARC_AUDIO_TOOL").unwrap_or_else(|_| "wem2ogg".to_owned()),
        }
    }
}

impl AudioConverter for ExternalAudioTool {
    fn convert(&self, entry_name: &str, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .arg(entry_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(data)?;

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(output.stdout)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.quiet { "warn" } else { "info" })
            }),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut archive = Archive::new(&cli.psarc_path);
    archive.open()?;

    println!("Archive: {}", cli.psarc_path.display());
    println!("Files: {}", archive.file_count());

    let should_list = cli.list || cli.output_dir.is_none() || !cli.quiet;
    if should_list {
        println!();
        for name in archive.file_list() {
            if let Some(entry) = archive.entry_by_name(&name) {
                println!("  {} ({} bytes)", name, entry.uncompressed_size);
            }
        }
    }

    let Some(output_dir) = cli.output_dir.as_deref() else {
        return Ok(());
    };
    if cli.list {
        return Ok(());
    }

    println!();
    println!("Extracting to: {}", output_dir.display());

    let started = Instant::now();
    let extracted = archive.extract_all(output_dir);
    report_batch(extracted).context("extraction incomplete")?;
    println!(
        "Successfully extracted {} files in {:.2?}",
        archive.file_count(),
        started.elapsed()
    );

    if cli.convert_sng {
        println!("Converting SNG arrangements...");
        report_batch(archive.convert_sng(output_dir)).context("SNG conversion incomplete")?;
    }

    if cli.convert_audio {
        println!("Converting audio...");
        let tool = ExternalAudioTool::from_env();
        report_batch(archive.convert_audio(output_dir, &tool))
            .context("audio conversion incomplete")?;
    }

    Ok(())
}

/// Print the per-entry details of an aggregated failure before bubbling it
/// up as the batch error.
fn report_batch(result: Result<(), ArchiveError>) -> Result<(), ArchiveError> {
    if let Err(ArchiveError::PartialExtraction { failures }) = &result {
        for failure in failures {
            eprintln!("  {}: {}", failure.name, failure.error);
        }
    }
    result
}
