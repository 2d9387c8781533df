mod aggregate;
mod config;
mod constants;
mod dashboard;
mod error;
mod filter;
mod rental;
mod report;
mod server;

use clap::{CommandFactory, Parser, Subcommand};
use std::fs::{self, File};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{DEFAULT_CONFIG, DashboardConfig, Overrides, load_config};
use crate::filter::DateRange;
use crate::rental::{date_bounds, load_rentals};
use crate::report::PageOptions;
use chrono::NaiveDate;
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

const APP_ABOUT: &str = "Bike sharing dashboard - rentals by weather, day type and month";
const DEFAULT_OUTPUT_HTML: &str = "dist/index.html";

#[derive(Parser, Debug)]
#[command(name = "bikedash", about = APP_ABOUT)]
struct Args {
    /// TOML-файл с путём к данным, адресом сервера и настройками HTML.
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG,
        global = true
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Запустить дашборд; выбор дат перерисовывает страницу при каждом изменении.
    Serve {
        /// CSV с дневными данными проката.
        #[arg(short = 'd', long = "data", value_name = "PATH")]
        data: Option<PathBuf>,
        /// Адрес, на котором слушать.
        #[arg(short = 'b', long = "bind", value_name = "ADDR")]
        bind: Option<String>,
        /// Не минифицировать HTML (по умолчанию минифицируется).
        #[arg(long = "no-minify-html")]
        no_minify_html: bool,
    },
    /// Сгенерировать HTML-страницу дашборда для одного диапазона дат.
    Render {
        /// CSV с дневными данными проката.
        #[arg(short = 'd', long = "data", value_name = "PATH")]
        data: Option<PathBuf>,
        /// Первый день диапазона (по умолчанию — первый день в данных).
        #[arg(long = "start", value_name = "YYYY-MM-DD")]
        start: Option<NaiveDate>,
        /// Последний день диапазона (по умолчанию — последний день в данных).
        #[arg(long = "end", value_name = "YYYY-MM-DD")]
        end: Option<NaiveDate>,
        /// Куда сохранить HTML.
        #[arg(
            short = 'o',
            long = "output-html",
            value_name = "PATH",
            default_value = DEFAULT_OUTPUT_HTML
        )]
        output_html: PathBuf,
        /// Не минифицировать HTML (по умолчанию минифицируется).
        #[arg(long = "no-minify-html")]
        no_minify_html: bool,
    },
    /// Сгенерировать файлы автодополнения для shell.
    Completions {
        /// Целевой shell.
        #[arg(value_enum)]
        shell: Shell,
        /// Куда сохранить файл (если не указано — stdout).
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn generate_completions(shell: Shell, output: Option<PathBuf>) -> Result<(), String> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
        }
        let mut file = File::create(&path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        generate(shell, &mut cmd, bin_name, &mut file);
    } else {
        let mut stdout = std::io::stdout();
        generate(shell, &mut cmd, bin_name, &mut stdout);
    }
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bikedash=info"));
    let ansi = std::io::stdout().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .compact()
        .init();
}

fn headline(message: &str) {
    tracing::info!(status = "start", "{message}");
}

fn info(message: &str) {
    tracing::info!(status = "info", "{message}");
}

fn success(message: &str) {
    tracing::info!(status = "ok", "{message}");
}

fn error(message: &str) {
    tracing::error!(status = "err", "{message}");
}

fn minify_override(no_minify_html: bool) -> Option<bool> {
    no_minify_html.then_some(false)
}

fn resolve_config(path: &Path, overrides: Overrides) -> Result<DashboardConfig, String> {
    load_config(path, overrides).map_err(|err| err.to_string())
}

fn load_table(data: &Path) -> Result<Vec<rental::RentalRecord>, String> {
    info(&format!("Loading rentals from {}", data.display()));
    let records =
        load_rentals(data).map_err(|err| format!("Failed to load rental data: {err}"))?;
    success(&format!("Loaded {} days", records.len()));
    Ok(records)
}

async fn run_serve(config: &DashboardConfig) -> Result<(), String> {
    let bind = config.bind_addr().map_err(|err| err.to_string())?;
    let records = load_table(&config.data)?;
    let state = server::AppState::new(records, config.minify_html);
    server::serve(state, bind)
        .await
        .map_err(|err| format!("Server error: {err}"))
}

fn run_render(
    config: &DashboardConfig,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output_html: &Path,
) -> Result<(), String> {
    let records = load_table(&config.data)?;
    let bounds = date_bounds(&records);
    let (default_start, default_end) = match bounds {
        Some(bounds) => (bounds.start, bounds.end),
        None => {
            let (Some(start), Some(end)) = (start, end) else {
                return Err("The data file has no rows; pass --start and --end".to_string());
            };
            (start, end)
        }
    };
    let range = DateRange::new(start.unwrap_or(default_start), end.unwrap_or(default_end));
    let view = dashboard::build_view(&records, range)
        .map_err(|err| format!("Failed to build dashboard: {err}"))?;
    let html = report::render_dashboard(
        &view,
        &PageOptions {
            bounds,
            interactive: false,
            minify_html: config.minify_html,
        },
    );
    report::write_html(&html, output_html)
        .map_err(|err| format!("Failed to write {}: {err}", output_html.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command {
        Command::Completions { shell, output } => {
            if let Err(err) = generate_completions(shell, output) {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
            return ExitCode::SUCCESS;
        }
        Command::Serve {
            data,
            bind,
            no_minify_html,
        } => {
            init_logging();
            headline(APP_ABOUT);
            match resolve_config(
                &args.config,
                Overrides {
                    data,
                    bind,
                    minify_html: minify_override(no_minify_html),
                },
            ) {
                Ok(config) => {
                    tracing::info!(
                        mode = "serve",
                        data = %config.data.display(),
                        bind = %config.bind,
                        minify_html = config.minify_html,
                        "Starting dashboard server"
                    );
                    run_serve(&config).await
                }
                Err(err) => Err(err),
            }
        }
        Command::Render {
            data,
            start,
            end,
            output_html,
            no_minify_html,
        } => {
            init_logging();
            headline(APP_ABOUT);
            resolve_config(
                &args.config,
                Overrides {
                    data,
                    bind: None,
                    minify_html: minify_override(no_minify_html),
                },
            )
            .and_then(|config| {
                tracing::info!(
                    mode = "render",
                    data = %config.data.display(),
                    start = ?start,
                    end = ?end,
                    output_html = %output_html.display(),
                    minify_html = config.minify_html,
                    "Rendering HTML dashboard"
                );
                run_render(&config, start, end, &output_html)
            })
            .map(|()| success(&format!("Saved HTML to {}", output_html.display())))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error(&err);
            ExitCode::FAILURE
        }
    }
}
