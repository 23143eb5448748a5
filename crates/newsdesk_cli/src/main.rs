//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `newsdesk_core` linkage and inspect the configured article store.
//! - Keep output deterministic for quick local sanity checks.

use clap::{Parser, Subcommand};
use newsdesk_core::{
    init_logging_with_config, report_config_warnings, ArticleService, ArticleServiceError,
    ConnectionHandle, CoreConfig, LoadedConfig, SqliteArticleRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "newsdesk", about = "Inspect the newsdesk article store")]
#[command(version)]
struct Cli {
    /// Database file; overrides NEWSDESK_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling logs at NEWSDESK_LOG_LEVEL
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core health-check reply
    Ping,
    /// Print the core crate version
    Version,
    /// List stored articles, newest first
    List,
    /// Print one article
    Show {
        slug: String,
        /// Print rendered markup instead of the exchange JSON
        #[arg(long)]
        html: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = CoreConfig::from_env();
    start_logging(cli.log_dir.as_deref(), &loaded);

    match cli.command {
        Commands::Ping => println!("newsdesk_core ping={}", newsdesk_core::ping()),
        Commands::Version => println!("newsdesk_core version={}", newsdesk_core::core_version()),
        Commands::List | Commands::Show { .. } => {
            let db_path = cli.db.unwrap_or(loaded.config.db_path);
            let handle = ConnectionHandle::file(db_path);
            if let Err(err) = run_store_command(&handle, &cli.command) {
                eprintln!("error[{}]: {err}", err.code());
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn start_logging(log_dir: Option<&str>, loaded: &LoadedConfig) {
    for warning in &loaded.warnings {
        eprintln!("warning: {warning}");
    }
    let Some(log_dir) = log_dir else {
        return;
    };
    match init_logging_with_config(&loaded.config, log_dir) {
        Ok(()) => report_config_warnings(&loaded.warnings),
        Err(err) => eprintln!("warning: logging disabled: {err}"),
    }
}

fn run_store_command(
    handle: &ConnectionHandle,
    command: &Commands,
) -> Result<(), ArticleServiceError> {
    let service = ArticleService::new(SqliteArticleRepository::try_new(handle)?);
    match command {
        Commands::List => {
            for article in service.list_articles()? {
                println!(
                    "{}\t{}\t{}",
                    article.created_at, article.slug, article.title
                );
            }
        }
        Commands::Show { slug, html: true } => {
            let rendered = service.render_article(slug)?;
            println!("# {}", rendered.title);
            println!("{}", rendered.html);
        }
        Commands::Show { slug, html: false } => {
            let article = service.find_by_slug(slug)?;
            println!("# {}", article.title);
            println!("{}", article.content.to_json_string());
        }
        Commands::Ping | Commands::Version => {}
    }
    Ok(())
}
