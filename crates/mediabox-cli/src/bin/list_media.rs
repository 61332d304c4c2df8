use anyhow::Result;
use clap::Parser;
use mediabox_api_client::api::PageQuery;
use mediabox_api_client::{ApiClient, AuthClient, MediaItem};
use mediabox_cli::{init_tracing, resolve_credentials, truncate_string};
use mediabox_core::ErrorMetadata;

#[derive(Parser, Debug)]
#[command(name = "list_media")]
#[command(about = "List media from the global feed or your own uploads")]
struct Args {
    /// List your own uploads instead of the global feed (requires login)
    #[arg(long)]
    mine: bool,

    /// Page number (default: 1)
    #[arg(long, default_value = "1")]
    page: u32,

    /// Items per page (default: 100)
    #[arg(long, default_value = "100")]
    limit: u32,

    /// Username or email for --mine (or MEDIABOX_IDENTIFIER)
    #[arg(long)]
    identifier: Option<String>,

    /// Password for --mine (or MEDIABOX_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let client = ApiClient::from_env()?;
    let query = PageQuery {
        page: args.page,
        limit: args.limit,
    };

    let items = if args.mine {
        let auth = AuthClient::new(client.clone());
        let creds = resolve_credentials(args.identifier.clone(), args.password.clone())?
            .ok_or_else(|| anyhow::anyhow!("--mine requires --identifier or MEDIABOX_IDENTIFIER"))?;
        auth.login(&creds.identifier, &creds.password)
            .await
            .map_err(|e| anyhow::anyhow!("Login failed: {}", e.client_message()))?;
        client.list_user_media(query).await
    } else {
        client.list_all_media(query).await
    }
    .map_err(|e| anyhow::anyhow!(e.client_message()))?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        _ => {
            print_media_table(&items, &args);
        }
    }

    Ok(())
}

fn print_media_table(items: &[MediaItem], args: &Args) {
    println!("\n=== Media List ===\n");

    if args.mine {
        println!("Feed: My uploads");
    } else {
        println!("Feed: Global");
    }

    println!(
        "Page {} ({} items, limit {})",
        args.page,
        items.len(),
        args.limit
    );

    if items.is_empty() {
        println!("\nNo media found.");
        return;
    }

    println!(
        "\n{:<36} {:<6} {:<30} {:>11} {:<50}",
        "ID", "Kind", "Name", "Size (px)", "Source"
    );
    println!("{}", "-".repeat(137));

    for item in items {
        let kind = if item.is_embedded_video() {
            "video"
        } else {
            "image"
        };
        let size = match (item.width, item.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "-".to_string(),
        };
        println!(
            "{:<36} {:<6} {:<30} {:>11} {:<50}",
            truncate_string(&item.id, 36),
            kind,
            truncate_string(item.alt.as_deref().unwrap_or("-"), 30),
            size,
            truncate_string(&item.src, 50)
        );
    }

    if items.len() as u32 >= args.limit {
        println!("\n... (more items may be available, use --page to see more)");
    }

    println!();
}
