use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use modula_plugin_db::PluginCatalog;
use modula_plugin_host::FormatRegistry;
use modula_plugin_scanner::DirectoryScanner;

#[derive(Parser, Debug)]
#[command(name = "modula-plugin-scanner")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Restrict scanning to the given formats (default: every registered
    /// format)
    #[arg(long = "format", value_name = "FORMAT")]
    formats: Vec<String>,

    /// Additional locations to scan
    #[arg(long = "path", value_name = "PATH")]
    extra_paths: Vec<PathBuf>,

    /// Probe candidates in a separate process, using this executable as the
    /// probe helper
    #[arg(long)]
    separate: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe a single candidate and print its plugin descriptions as JSON.
    /// Used internally for out-of-process scanning.
    Probe {
        #[arg(long)]
        format: String,
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut registry = FormatRegistry::new();
    registry.add_default_formats();

    if let Some(Command::Probe { format, path }) = args.command {
        let Some(backend) = registry.find_by_name(&format) else {
            bail!("unknown format: {format}");
        };
        let descriptions = backend
            .scan_candidate(&path)
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        println!("{}", serde_json::to_string(&descriptions)?);
        return Ok(());
    }

    let catalog = Arc::new(PluginCatalog::new());
    let format_names: Vec<String> = if args.formats.is_empty() {
        registry.iter().map(|format| format.name().to_owned()).collect()
    } else {
        args.formats.clone()
    };

    for name in &format_names {
        let Some(format) = registry.find_by_name(name) else {
            bail!("unknown format: {name}");
        };
        let mut locations = format.default_search_locations();
        locations.extend(args.extra_paths.iter().cloned());

        let mut scanner =
            DirectoryScanner::new(Arc::clone(&catalog), format, &locations, true, None);
        if args.separate {
            scanner = scanner.with_probe_helper(std::env::current_exe()?);
        }
        while scanner.scan_next_file(args.separate).is_some() {}
        for failure in scanner.failures() {
            eprintln!("warning: {}: {}", failure.path.display(), failure.reason);
        }
    }

    for plugin in catalog.descriptions() {
        println!("{} ({})", plugin.name, plugin.format);
    }
    Ok(())
}
