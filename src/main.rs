//! rbgen CLI - incremental Ruby-to-Java source builder
//!
//! Usage: rbgen <COMMAND>
//!
//! Commands:
//!   build      Compile every script under the source root
//!   watch      Watch for changes and rebuild continuously
//!   translate  Translate one script and print its generated classes

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use rbgen::{
    watch, BuildConfig, Builder, ClassBindingTranslator, WatchEvent, WatchOptions,
};

/// rbgen - incremental Ruby-to-Java source builder
#[derive(Parser, Debug)]
#[command(name = "rbgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI (NDJSON)
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile every script under the source root (full build)
    Build {
        /// Project root containing the source and build trees
        #[arg(short, long, default_value = ".")]
        project_root: PathBuf,
    },

    /// Watch for changes and rebuild continuously (incremental build)
    Watch {
        /// Project root containing the source and build trees
        #[arg(short, long, default_value = ".")]
        project_root: PathBuf,
    },

    /// Translate one script and print its generated classes (debugging)
    Translate {
        /// Path to the script, relative to the project root
        file: PathBuf,

        /// Project root containing the source tree
        #[arg(short, long, default_value = ".")]
        project_root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { project_root } => cmd_build(&project_root, cli.json, cli.verbose),
        Commands::Watch { project_root } => cmd_watch(&project_root, cli.json),
        Commands::Translate { file, project_root } => {
            cmd_translate(&file, &project_root, cli.json)
        }
    }
}

fn cmd_build(project_root: &Path, json: bool, verbose: u8) -> Result<()> {
    let config = BuildConfig::load_from_project(project_root)?;

    if !json {
        println!("🔨 rbgen build");
        println!("Source: {}", project_root.join(&config.source_root).display());
        println!("Output: {}", project_root.join(&config.build_root).display());
    }

    let mut builder = Builder::new(project_root, config, ClassBindingTranslator::new());
    let report = builder.full_build()?;

    if json {
        let output = serde_json::json!({
            "event": "build",
            "status": if report.is_success() { "success" } else { "partial" },
            "compiled": report.compiled.len(),
            "written": report.written.len(),
            "failed": report.failed.len(),
            "errors": report.errors,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("\n📊 Build Results:");
        println!(
            "  ✓ Compiled: {} scripts, {} files written",
            report.compiled.len(),
            report.written.len()
        );
        if verbose > 0 {
            for path in &report.written {
                println!("    - {}", path.display());
            }
        }
        if !report.failed.is_empty() {
            println!("  ✗ Failed: {}", report.failed.len());
            for file in &report.failed {
                for diag in builder.sink().for_file(file) {
                    println!("    - {}:{}: {}", diag.file.display(), diag.line, diag.message);
                }
            }
        }
        println!();
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_watch(project_root: &Path, json: bool) -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let config = BuildConfig::load_from_project(project_root)?;

    let options = WatchOptions {
        project_root: project_root.to_path_buf(),
        config,
        json,
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    if !json {
        println!("👀 rbgen watch");
        println!("Project: {}", project_root.display());
        println!("Press Ctrl+C to stop\n");
    }

    watch(options, running, |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            match event {
                WatchEvent::Started { project_root } => {
                    println!("📂 Watching: {}", project_root);
                }
                WatchEvent::FileChanged { path } => {
                    println!("📝 Changed: {}", path);
                }
                WatchEvent::BuildStarted => {
                    println!("🔄 Building...");
                }
                WatchEvent::BuildComplete { compiled, written, failed } => {
                    if failed > 0 {
                        println!(
                            "⚠ Build: {} compiled, {} written, {} failed",
                            compiled, written, failed
                        );
                    } else {
                        println!("✓ Build: {} compiled, {} written", compiled, written);
                    }
                }
                WatchEvent::Error { message } => {
                    eprintln!("✗ Error: {}", message);
                }
                WatchEvent::Shutdown => {
                    println!("\n👋 Shutting down...");
                }
            }
        }
    })?;

    Ok(())
}

fn cmd_translate(file: &Path, project_root: &Path, json: bool) -> Result<()> {
    use rbgen::Translator;

    let config = BuildConfig::load_from_project(project_root)?;
    let source = std::fs::read_to_string(project_root.join(file))?;

    // Outside the source root, fall back to the raw path as the script name
    let script_name = file
        .strip_prefix(&config.source_root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/");

    let translator = ClassBindingTranslator::new();
    let units = translator
        .translate(&source, &script_name)
        .map_err(|failure| anyhow::anyhow!("{}: {}", file.display(), failure))?;

    if json {
        for unit in &units {
            let output = serde_json::json!({
                "event": "class",
                "qualified_name": unit.qualified_name,
                "package": unit.package,
                "file": format!("{}.{}", unit.simple_name(), config.host_extension),
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    } else {
        println!("🔍 {} -> {} classes\n", file.display(), units.len());
        for unit in &units {
            println!("── {} ──", unit.qualified_name);
            println!("{}", unit.source);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_build() {
        let cli = Cli::try_parse_from(["rbgen", "build"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { .. }));
    }

    #[test]
    fn test_cli_parse_build_with_args() {
        let cli = Cli::try_parse_from(["rbgen", "build", "--project-root", "my-app"]).unwrap();

        if let Commands::Build { project_root } = cli.command {
            assert_eq!(project_root, PathBuf::from("my-app"));
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_cli_parse_watch() {
        let cli = Cli::try_parse_from(["rbgen", "watch", "-p", "app"]).unwrap();
        if let Commands::Watch { project_root } = cli.command {
            assert_eq!(project_root, PathBuf::from("app"));
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_parse_translate() {
        let cli = Cli::try_parse_from(["rbgen", "translate", "src/pkg/thing.rb"]).unwrap();
        if let Commands::Translate { file, .. } = cli.command {
            assert_eq!(file, PathBuf::from("src/pkg/thing.rb"));
        } else {
            panic!("Expected Translate command");
        }
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["rbgen", "--json", "build"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["rbgen", "-vv", "build"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
