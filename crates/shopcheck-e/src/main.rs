use anyhow::{Context, bail};
use clap::{Parser as ClapParser, Subcommand};
use shopcheck_e::{SessionBuilder, capture_screenshot};
use shopcheck_engine::Target;
use shopcheck_engine::config::{ConfigLoader, SuiteConfig};
use shopcheck_table::{ReadOptions, RetryPolicy, TableStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file. Defaults to $SHOPCHECK_CONFIG, then ./shopcheck.yaml,
    /// ./shopcheck.yml and ~/.shopcheck/config.yaml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the data rows of a sheet, one JSON array per line.
    Rows {
        /// Workbook path (defaults to the configured signup workbook)
        #[arg(short, long)]
        workbook: Option<PathBuf>,
        #[arg(short, long)]
        sheet: Option<String>,
        /// Rewrite this column into unique e-mail addresses
        #[arg(long)]
        unique_column: Option<String>,
        /// Rewrite the configured unique column
        #[arg(long, conflicts_with = "unique_column")]
        unique: bool,
        /// Also save the (rewritten) workbook here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Append one row, creating the workbook and sheet when missing.
    Append {
        /// Workbook path (defaults to the configured credentials workbook)
        #[arg(short, long)]
        workbook: Option<PathBuf>,
        #[arg(short, long)]
        sheet: Option<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        header: Vec<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<String>,
    },
    /// Follow a navigation link and check where it leads.
    NavCheck {
        /// Link text as shown in the navigation bar
        #[arg(short, long)]
        link: String,
        /// Text expected in the destination location or content
        #[arg(long)]
        hint: String,
        /// Page to start from (defaults to the configured base URL)
        #[arg(short, long)]
        url: Option<String>,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
        #[arg(long)]
        headless: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };

    match args.command {
        Command::Rows {
            workbook,
            sheet,
            unique_column,
            unique,
            out,
        } => {
            let path = workbook.unwrap_or_else(|| config.data.signup_workbook.clone());
            let sheet = sheet.unwrap_or_else(|| config.data.signup_sheet.clone());
            let options = ReadOptions {
                transform_column: unique_column
                    .or_else(|| unique.then(|| config.data.unique_column.clone())),
                out_path: out,
            };
            let rows = TableStore::new()
                .read_rows(&path, Some(&sheet), &options)
                .await?;
            for row in rows {
                println!("{}", serde_json::to_string(row.values())?);
            }
        }
        Command::Append {
            workbook,
            sheet,
            header,
            values,
        } => {
            if header.len() != values.len() {
                warn!(
                    "{} header column(s) but {} value(s); row stored as given",
                    header.len(),
                    values.len()
                );
            }
            let path = workbook.unwrap_or_else(|| config.data.credentials_workbook.clone());
            let sheet = sheet.unwrap_or_else(|| config.data.credentials_sheet.clone());
            let header: Vec<&str> = header.iter().map(String::as_str).collect();
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            store_for(&config)
                .append_row(&path, &sheet, &header, &values)
                .await?;
        }
        Command::NavCheck {
            link,
            hint,
            url,
            timeout_ms,
            headless,
        } => {
            let verified = nav_check(&config, &link, &hint, url, timeout_ms, headless).await?;
            if !verified {
                bail!("navigation via '{}' was not verified", link);
            }
        }
    }
    Ok(())
}

fn store_for(config: &SuiteConfig) -> TableStore {
    TableStore::with_policy(RetryPolicy {
        max_attempts: config.data.append_attempts,
        delay: Duration::from_millis(config.data.append_retry_delay_ms),
    })
}

async fn nav_check(
    config: &SuiteConfig,
    link: &str,
    hint: &str,
    url: Option<String>,
    timeout_ms: u64,
    headless: bool,
) -> anyhow::Result<bool> {
    let mut resolver = SessionBuilder::from_config(config)
        .headless(headless || config.site.headless)
        .launch()
        .await?;

    let start = match url {
        Some(url) => resolver.open(&url).await.map(|_| ()),
        None => Ok(()),
    };

    let verified = match start {
        Ok(()) => {
            resolver
                .navigate_and_verify(
                    &Target::nav_link(link),
                    hint,
                    Duration::from_millis(timeout_ms),
                )
                .await
        }
        Err(e) => {
            error!("Could not open start page: {}", e);
            false
        }
    };
    if verified {
        info!("'{}' leads to '{}'", link, hint);
    } else {
        error!("'{}' did not lead to '{}'", link, hint);
        capture_screenshot(&mut resolver, &config.reports.screenshot_dir, "nav_check").await;
    }

    if let Err(e) = resolver.into_driver().close().await {
        warn!("{}", e);
    }
    Ok(verified)
}
