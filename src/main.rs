//! CLI entry point for the library client.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use library_client::{
    ClickOutcome, ClientConfig, ConfigOverrides, FileBlob, FileTokenStore, HttpLibraryService,
    LOGIN_ROUTE, LibraryScreen, ResourceId, ScreenSnapshot, SortDirection, WorkflowError,
    load_file_config, render,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, SortArg};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so the rendered screen on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_file_config(args.config.as_deref())?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "Loaded config file");
    }
    let cli_overrides = ConfigOverrides {
        api_url: args.api_url.clone(),
        token_path: args.token_path.clone(),
    };
    let config = ClientConfig::resolve(
        loaded.config.as_ref(),
        &ConfigOverrides::from_env(),
        &cli_overrides,
    )?;
    info!(api_url = %config.api_url, token_path = %config.token_path.display(), "Library client starting");

    let service = HttpLibraryService::new(
        &config.api_url,
        config.connect_timeout_secs,
        config.read_timeout_secs,
    )
    .context("Failed to build library service client")?;
    let tokens = FileTokenStore::new(config.token_path.clone());
    let mut screen = LibraryScreen::new(Arc::new(service), Arc::new(tokens));

    let outcome = run(&mut screen, args.command).await;

    if !args.quiet {
        print!("{}", render(&ScreenSnapshot::capture(&screen)));
    }

    if let Err(error) = &outcome
        && let Some(WorkflowError::LoginRequired { .. }) = error.downcast_ref::<WorkflowError>()
    {
        eprintln!("Log in at {LOGIN_ROUTE} and store the token with `library-client login <TOKEN>`");
    }

    outcome
}

async fn run(screen: &mut LibraryScreen, command: Command) -> Result<()> {
    match command {
        Command::Login { token } => {
            let session = screen.login(&token).await?;
            if session.is_guest() {
                bail!("Token stored but the identity service did not accept it");
            }
            let _ = screen.catalog().load().await;
            Ok(())
        }
        Command::Logout => {
            screen.logout()?;
            let _ = screen.catalog().load().await;
            Ok(())
        }
        command => {
            screen.load_page().await;
            run_on_loaded(screen, command).await
        }
    }
}

async fn run_on_loaded(screen: &LibraryScreen, command: Command) -> Result<()> {
    match command {
        Command::List { search, sort } => {
            if let Some(query) = search {
                screen.catalog().search(query);
            }
            if let Some(wanted) = sort {
                let wanted = match wanted {
                    SortArg::Asc => SortDirection::Ascending,
                    SortArg::Desc => SortDirection::Descending,
                };
                // Sorting toggles; at most two presses reach either order.
                while screen.catalog().sort() != wanted {}
            }
            Ok(())
        }
        Command::Upload { file, title } => {
            match screen.gate().click_upload().await {
                ClickOutcome::FormOpened | ClickOutcome::FormAlreadyOpen => {}
                ClickOutcome::LoginRequired => {
                    return Err(WorkflowError::LoginRequired { action: "upload" }.into());
                }
                ClickOutcome::PermissionPrompt => {
                    screen.gate().cancel();
                    bail!("Upload permission required; run `library-client request-permission`");
                }
                other => bail!("Upload could not start: {}", other.as_str()),
            }
            let blob = FileBlob::from_path(&file)
                .await
                .with_context(|| format!("Failed to read '{}'", file.display()))?;
            screen.gate().set_file(blob)?;
            screen.gate().set_title(title)?;
            screen.gate().submit().await?;
            Ok(())
        }
        Command::RequestPermission => match screen.gate().click_upload().await {
            ClickOutcome::PermissionPrompt => {
                screen.gate().request_permission().await?;
                Ok(())
            }
            ClickOutcome::FormOpened => {
                screen.gate().cancel();
                println!("Upload permission already granted");
                Ok(())
            }
            ClickOutcome::LoginRequired => {
                Err(WorkflowError::LoginRequired { action: "request permission" }.into())
            }
            other => bail!("Permission check did not complete: {}", other.as_str()),
        },
        Command::Delete { id } => {
            screen.delete(&ResourceId::from(id)).await?;
            Ok(())
        }
        Command::Whoami => {
            let session = screen.session();
            println!(
                "role: {}, can upload: {}",
                session.role(),
                session.can_upload()
            );
            Ok(())
        }
        Command::Login { .. } | Command::Logout => Ok(()),
    }
}
