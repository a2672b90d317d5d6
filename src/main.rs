use clap::{Parser, Subcommand};
use spark::generate::{
    self, DateSource, EXIT_BAD_CONFIGURATION, EXIT_BAD_PARAMETERS, EXIT_GENERATION_FAILED,
    GenerateOptions,
};
use spark::{config, output, types};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spark")]
#[command(about = "Dual-themed static blog generator")]
#[command(long_about = "\
Dual-themed static blog generator

Every page is generated twice, for a bright and a dark theme served from two
hosts, and only files whose bytes changed are rewritten.

Content structure:

  CONTENT_BASE_DIR/
  ├── components/{header,footer,trailer}.html
  ├── themes/bright/main.css       # syntax-highlighting.css optional
  ├── themes/dark/main.css
  ├── series/<id>/                 # title, order, short-description, landing-desc.html
  ├── misc_pages/<id>/             # title, filename, description, content.html
  └── posts/<id>/                  # generate-post marks the post for generation
      ├── title, author, tags, series, written-date
      ├── short-description, long-description, content.html
      └── publish-when-ready, publish-after, updated-at, has-code,
          suggested-next-reading, suggested-prev-reading

Exit codes: 0 ok, 1 bad parameters, 2 bad configuration, 3 generation
failure, 4 another generation holds the lock.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=debug) for more.")]
#[command(version)]
struct Cli {
    /// Site configuration file
    #[arg(long, short, default_value = "spark.conf", global = true)]
    config: PathBuf,

    /// Parse dates in-process instead of running DATE_COMMAND
    #[arg(long, global = true)]
    builtin_dates: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate both themes, writing only changed files
    Generate,
    /// Load and link the content tree without writing pages
    Check {
        /// Also write a JSON inventory of the loaded content
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_BAD_PARAMETERS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging();

    let site_config = match config::load_configuration(&cli.config) {
        Ok(site_config) => site_config,
        Err(e) => {
            error!("{}: {e}", cli.config.display());
            return ExitCode::from(EXIT_BAD_CONFIGURATION);
        }
    };
    let options = GenerateOptions {
        date_source: if cli.builtin_dates {
            DateSource::Builtin
        } else {
            DateSource::External
        },
    };

    match cli.command {
        Command::Generate => {
            println!("==> Generating {}", site_config.html_base_dir.display());
            match generate::generate_site(&site_config, &options) {
                Ok(report) => {
                    output::print_generate_report(&report);
                    println!("==> Generation complete");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("{e}");
                    ExitCode::from(e.exit_code())
                }
            }
        }
        Command::Check { manifest } => {
            println!("==> Checking {}", site_config.content_base_dir.display());
            let (site, summary) = match generate::check_site(&site_config, &options) {
                Ok(loaded) => loaded,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::from(e.exit_code());
                }
            };
            output::print_check_output(&site, &summary);
            if let Some(path) = manifest {
                let inventory = types::ContentManifest::from_site(&site, &site_config, &summary);
                if let Err(e) = write_manifest(&path, &inventory) {
                    error!("{}: {e}", path.display());
                    return ExitCode::from(EXIT_GENERATION_FAILED);
                }
                println!("==> Manifest written to {}", path.display());
            }
            println!("==> Content is valid");
            ExitCode::SUCCESS
        }
    }
}

fn write_manifest(path: &Path, inventory: &types::ContentManifest) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(inventory)?;
    std::fs::write(path, json)?;
    Ok(())
}
