/// Lyra Player - headless music player shell
use anyhow::Context;
use clap::Parser;
use lyra_core::{AuthProvider, DataStore, StaticAuth, SystemClock};
use lyra_library::Library;
use lyra_player::{config::PlayerConfig, demo, logging, shell};
use lyra_session::Session;
use lyra_store::{BackendClient, RestAuth, RestStore};
use std::{path::PathBuf, sync::Arc};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "lyra-player")]
#[command(about = "Browse, play, like, and organize songs from a Lyra backend", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./lyra.toml when present)
    #[arg(short, long, env = "LYRA_CONFIG")]
    config: Option<PathBuf>,

    /// Browse without signing in
    #[arg(long)]
    guest: bool,

    /// Run against a built-in offline catalog instead of the backend
    #[arg(long)]
    demo: bool,

    /// Account email (overrides the config file)
    #[arg(short, long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    let (store, auth) = if cli.demo {
        demo_stack(cli.guest).await
    } else {
        backend_stack(&config, &cli).await?
    };

    let library = Library::new(store, auth, Arc::new(SystemClock));
    let mut session = Session::new(library);

    // A failed load leaves empty lists; the shell can `reload`
    if let Err(e) = session.load().await {
        tracing::warn!(error = %e, "Starting with an empty library");
    }

    let mut stdout = std::io::stdout();
    shell::run(&mut session, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    tracing::info!("Goodbye");
    Ok(())
}

async fn demo_stack(guest: bool) -> (Arc<dyn DataStore>, Arc<dyn AuthProvider>) {
    tracing::info!("Using the offline demo catalog");

    let auth: Arc<dyn AuthProvider> = if guest {
        Arc::new(StaticAuth::guest())
    } else {
        Arc::new(StaticAuth::signed_in(demo::user()))
    };
    let store: Arc<dyn DataStore> = Arc::new(demo::store().await);
    (store, auth)
}

async fn backend_stack(
    config: &PlayerConfig,
    cli: &Cli,
) -> anyhow::Result<(Arc<dyn DataStore>, Arc<dyn AuthProvider>)> {
    config.validate()?;

    let client = BackendClient::new(config.backend_config())?;
    tracing::info!(url = %client.url(), "Connecting to backend");

    let auth = RestAuth::new(client.clone());
    if !cli.guest {
        let email = cli
            .email
            .clone()
            .or_else(|| config.account.email.clone())
            .context("no account email: pass --email, set account.email, or use --guest")?;
        let password = config
            .account
            .password
            .clone()
            .context("no account password: set LYRA_ACCOUNT__PASSWORD or use --guest")?;

        auth.sign_in(&email, &password)
            .await
            .with_context(|| format!("sign-in failed for {email}"))?;
    }

    let store: Arc<dyn DataStore> = Arc::new(RestStore::new(client));
    let auth: Arc<dyn AuthProvider> = Arc::new(auth);
    Ok((store, auth))
}
