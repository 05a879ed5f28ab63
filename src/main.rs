use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use docspace_core::api::{DocumentTags, Registration};
use docspace_core::upload::collect_candidates;
use docspace_core::{
    AuthForms, Backend, ChatComposer, Config, Dashboard, DocumentPanel, FileTokenStore,
    HttpBackend, MemoryTokenStore, TokenStore, UploadQueue,
};
use tracing::{info, warn};

mod app;
mod console;
mod handler;
mod input;
mod logging;
mod panes;
mod tui;
mod ui;

use app::App;
use console::ConsoleView;

#[derive(Parser)]
#[command(name = "docspace")]
#[command(about = "Terminal client for Docspace document ingestion, chat, and accounts")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides DOCSPACE_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep the session in memory instead of the data directory
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal UI (default)
    Tui,
    /// Upload files or folders for ingestion
    Ingest {
        /// Files or folders to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask the assistant a question
    Chat {
        /// Message to send
        message: String,
    },
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        department: String,
    },
    /// List stored documents
    Documents,
    /// Store one file with its department and role
    Upload {
        /// File to upload
        file: PathBuf,
        #[arg(long)]
        department: String,
        #[arg(long)]
        role: String,
    },
    /// Delete a stored document by id
    Delete {
        id: i64,
    },
    /// Open a document link, optionally pinning it or adding comments
    View {
        /// Document link, e.g. "document?title=Guide.md"
        url: String,
        /// Toggle the pin
        #[arg(long)]
        pin: bool,
        /// Comment to add (repeatable)
        #[arg(long = "comment")]
        comments: Vec<String>,
    },
    /// Show or update the saved configuration
    Configure {
        /// Backend base URL to save
        #[arg(long)]
        set_api_url: Option<String>,
        /// Delay before post-auth redirects, in milliseconds
        #[arg(long)]
        redirect_delay_ms: Option<u64>,
        /// Default log level (error, warn, info, debug, trace)
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };

    let level = logging::resolve_level(cli.verbose, config.log_level.as_deref());
    let data_dir = Config::data_dir()?;
    let command = cli.command.unwrap_or(Commands::Tui);

    match &command {
        Commands::Tui => logging::init_file(level, &data_dir.join("docspace.log"))?,
        _ => logging::init_stderr(level)?,
    }

    if let Some(e) = config_error {
        warn!("Ignoring unreadable config file: {}", e);
    }

    let store: Arc<dyn TokenStore> = if cli.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        Arc::new(FileTokenStore::in_dir(&data_dir))
    };

    let api_url = config.api_url(cli.api_url.as_deref());
    info!("Using backend at {}", api_url);
    let backend = HttpBackend::new(&api_url).with_session(store.clone());

    let mut view = ConsoleView::new();
    match command {
        Commands::Tui => {
            run_tui(Arc::new(backend), store, &config).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Ingest { paths } => {
            let mut queue = UploadQueue::new();
            let candidates = collect_candidates(&paths);
            if queue.add_files(candidates, &mut view) > 0 {
                queue.submit(&backend, &mut view).await;
            }
        }
        Commands::Chat { message } => {
            let mut composer = ChatComposer::new();
            if !composer.send(&message, &backend, &mut view).await {
                eprintln!("Nothing to send.");
                view.failed = true;
            }
        }
        Commands::Login { email, password } => {
            let mut forms = AuthForms::new(store, config.redirect_delay());
            forms.login(&email, &password, &backend, &mut view).await;
        }
        Commands::Signup {
            full_name,
            email,
            password,
            department,
        } => {
            let mut forms = AuthForms::new(store, config.redirect_delay());
            let registration = Registration {
                full_name,
                email,
                password,
                department,
            };
            forms.signup(&registration, &backend, &mut view).await;
        }
        Commands::Documents => {
            Dashboard::new().refresh(&backend, &mut view).await;
        }
        Commands::Upload {
            file,
            department,
            role,
        } => {
            if !file.is_file() {
                bail!("{} is not a file", file.display());
            }
            let Some(pending) = collect_candidates(std::slice::from_ref(&file)).into_iter().next()
            else {
                bail!("Could not read {}", file.display());
            };
            let tags = DocumentTags { department, role };
            Dashboard::new()
                .upload(&pending, &tags, &backend, &mut view)
                .await;
        }
        Commands::Delete { id } => {
            Dashboard::new().delete(id, &backend, &mut view).await;
        }
        Commands::View { url, pin, comments } => {
            let mut panel = DocumentPanel::open(&url, &mut view);
            panel.load(&backend, &mut view).await;
            if pin {
                panel.toggle_pin(&mut view);
            }
            for comment in &comments {
                panel.add_comment(comment, &mut view);
            }
        }
        Commands::Configure {
            set_api_url,
            redirect_delay_ms,
            log_level,
        } => configure(config, set_api_url, redirect_delay_ms, log_level)?,
    }

    Ok(if view.failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn configure(
    mut config: Config,
    api_url: Option<String>,
    redirect_delay_ms: Option<u64>,
    log_level: Option<String>,
) -> Result<()> {
    let changed = api_url.is_some() || redirect_delay_ms.is_some() || log_level.is_some();
    if let Some(url) = api_url {
        config.api_url = Some(url);
    }
    if let Some(delay) = redirect_delay_ms {
        config.redirect_delay_ms = Some(delay);
    }
    if let Some(level) = log_level {
        config.log_level = Some(level);
    }
    if changed {
        config.save()?;
        println!("Configuration saved.");
    }

    println!("api_url: {}", config.api_url(None));
    println!("redirect_delay_ms: {}", config.redirect_delay().as_millis());
    println!("log_level: {}", config.log_level.as_deref().unwrap_or("info"));
    Ok(())
}

async fn run_tui(backend: Arc<dyn Backend>, store: Arc<dyn TokenStore>, config: &Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(backend, store, config);
    app.start();

    let result = run_loop(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event)?;

        app.poll_requests().await;
        app.run_deferred(Instant::now());
    }
    Ok(())
}
