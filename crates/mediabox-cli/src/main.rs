//! Mediabox CLI — command-line client for the mediabox API.
//!
//! Set MEDIABOX_API_URL and MEDIABOX_CSRF_PATH. Commands that need a session
//! log in first with --identifier/--password or MEDIABOX_IDENTIFIER and
//! MEDIABOX_PASSWORD; the token lives only for the duration of the command.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mediabox_api_client::api::PageQuery;
use mediabox_api_client::{ApiClient, AuthClient, VideoStatusPoller};
use mediabox_cli::{describe_poll_state, init_tracing, print_json, resolve_credentials};
use mediabox_core::constants::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT};
use mediabox_core::models::RegisterPayload;
use mediabox_core::{ClientConfig, ErrorMetadata, OAuthProvider, PendingUpload};

#[derive(Parser)]
#[command(name = "mediabox", about = "Mediabox API CLI")]
struct Cli {
    #[command(flatten)]
    login: LoginArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoginArgs {
    /// Username or email (or MEDIABOX_IDENTIFIER)
    #[arg(long, global = true)]
    identifier: Option<String>,
    /// Password (or MEDIABOX_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the current user
    Login,
    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Date of birth, e.g. 1990-04-01
        #[arg(long)]
        date_of_birth: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: Option<String>,
    },
    /// End the session on the server
    Logout,
    /// Print the authenticated user
    Me,
    /// Upload an image or video
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// Do not wait for video processing to finish
        #[arg(long)]
        no_wait: bool,
    },
    /// List media from the global feed or your own uploads
    List {
        /// Only your own uploads
        #[arg(long)]
        mine: bool,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
    },
    /// Print the OAuth login URL for a provider (google or github)
    OauthUrl {
        provider: OAuthProvider,
    },
}

/// Log in when credentials are available, otherwise try an existing session.
async fn authenticate(auth: &AuthClient, args: &LoginArgs) -> anyhow::Result<()> {
    match resolve_credentials(args.identifier.clone(), args.password.clone())? {
        Some(creds) => auth
            .login(&creds.identifier, &creds.password)
            .await
            .map_err(|e| anyhow::anyhow!("Login failed: {}", e.client_message())),
        None => {
            auth.init().await;
            if !auth.is_authenticated() {
                tracing::warn!("No credentials given; continuing unauthenticated");
            }
            Ok(())
        }
    }
}

async fn upload(api: &ApiClient, path: &std::path::Path, wait: bool) -> anyhow::Result<()> {
    let file = PendingUpload::from_path(path).map_err(|e| anyhow::anyhow!(e.client_message()))?;

    if !wait {
        let outcome = api
            .upload_media(&file)
            .await
            .map_err(|e| anyhow::anyhow!(e.client_message()))?;
        return print_json(&outcome);
    }

    let poller = VideoStatusPoller::new(api.clone());
    let mut updates = poller.subscribe();
    let (outcome, handle) = api
        .upload_and_track(&file, &poller)
        .await
        .map_err(|e| anyhow::anyhow!(e.client_message()))?;
    print_json(&outcome)?;

    if handle.is_none() {
        return Ok(());
    }

    loop {
        let state = updates.borrow_and_update().clone();
        eprintln!("{}", describe_poll_state(&state));
        if let Some(result) = state.into_result() {
            let status = result.map_err(|e| anyhow::anyhow!(e.client_message()))?;
            return print_json(&status);
        }
        updates
            .changed()
            .await
            .context("Video status poller stopped unexpectedly")?;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::OauthUrl { provider } = &cli.command {
        let config = ClientConfig::from_env()?;
        let url = config
            .oauth_login_url(*provider)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        println!("{}", url);
        return Ok(());
    }

    let api = ApiClient::from_env().context(
        "Failed to create API client. Set MEDIABOX_API_URL and MEDIABOX_CSRF_PATH",
    )?;
    let auth = AuthClient::new(api.clone());

    match cli.command {
        Commands::Login => {
            authenticate(&auth, &cli.login).await?;
            print_json(&auth.current_user())?;
        }
        Commands::Signup {
            first_name,
            last_name,
            date_of_birth,
            email,
            username,
        } => {
            let password = cli
                .login
                .password
                .clone()
                .or_else(|| std::env::var(mediabox_cli::PASSWORD_ENV).ok())
                .context("Missing password: pass --password or set MEDIABOX_PASSWORD")?;
            let payload = RegisterPayload {
                first_name,
                last_name,
                date_of_birth,
                email: Some(email),
                username,
                password,
                confirm_password: None,
            };
            auth.signup(payload)
                .await
                .map_err(|e| anyhow::anyhow!(e.client_message()))?;
            print_json(&auth.current_user())?;
        }
        Commands::Logout => {
            authenticate(&auth, &cli.login).await?;
            auth.logout().await;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::Me => {
            authenticate(&auth, &cli.login).await?;
            let user = auth
                .fetch_current_user()
                .await
                .map_err(|e| anyhow::anyhow!(e.client_message()))?;
            print_json(&user)?;
        }
        Commands::Upload { file, no_wait } => {
            authenticate(&auth, &cli.login).await?;
            upload(&api, &file, !no_wait).await?;
        }
        Commands::List { mine, page, limit } => {
            let query = PageQuery { page, limit };
            let items = if mine {
                authenticate(&auth, &cli.login).await?;
                api.list_user_media(query).await
            } else {
                api.list_all_media(query).await
            }
            .map_err(|e| anyhow::anyhow!(e.client_message()))?;
            print_json(&items)?;
        }
        Commands::OauthUrl { .. } => {}
    }

    Ok(())
}
