use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use deeplibby_core::availability;
use deeplibby_core::search::PresentationContext;
use deeplibby_core::{
    ApiService, ComparisonLoader, LiveRefreshScheduler, RefreshEvent,
    SearchEvent, SearchQueryController,
};
use deeplibby_model::{LibraryId, MediaId};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod context;
mod render;

use context::AppContext;

#[derive(Parser)]
#[command(
    name = "deeplibbyctl",
    version,
    about = "Search library collections and check live availability"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,
    #[command(subcommand)]
    command: Command,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Config file (TOML or JSON); overrides DEEPLIBBY_CONFIG_PATH
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// DeepLibby server base URL
    #[arg(long, global = true, env = "DEEPLIBBY_SERVER_URL")]
    pub server: Option<String>,
    /// Favorites store file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    /// Use the compact-layout debounce
    #[arg(long, global = true)]
    pub compact: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog and print ranked results
    Search { query: String },
    /// Show per-library availability for a media item
    Availability {
        media_id: MediaId,
        /// Which rows to refresh live from the upstream service
        #[arg(long, value_enum, default_value = "favorites")]
        refresh: RefreshArg,
    },
    /// List known libraries
    Libraries {
        /// Case-insensitive name filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Manage favorite libraries
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Titles owned by the left library but not the right one
    Diff(PairArgs),
    /// Titles owned by both libraries
    Intersect(PairArgs),
    /// Titles no other library owns
    Unique { library: LibraryId },
    /// Check a Hardcover want-to-read list against favorite libraries
    WantToRead {
        username: String,
        /// Extra Hardcover filters passed through to the server
        #[arg(long)]
        filters: Option<String>,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Print favorite libraries in order
    List,
    /// Add a library id
    Add { library: LibraryId },
    /// Remove a library id
    Remove { library: LibraryId },
    /// Convert legacy numeric favorites to library ids
    Migrate,
}

#[derive(Args)]
struct PairArgs {
    left: LibraryId,
    right: LibraryId,
    /// Swap left and right before querying
    #[arg(long)]
    flip: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RefreshArg {
    None,
    Favorites,
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::build(&cli.global)?;

    match cli.command {
        Command::Search { query } => {
            search(&ctx, query, cli.global.compact).await
        }
        Command::Availability { media_id, refresh } => {
            show_availability(&ctx, media_id, refresh).await
        }
        Command::Libraries { filter } => {
            let entries = ctx
                .directory()
                .entries(filter.as_deref())
                .await
                .context("failed to list libraries")?;
            render::catalog(&entries);
            Ok(())
        }
        Command::Favorites { action } => favorites(&ctx, action).await,
        Command::Diff(pair) => {
            let loader = ctx.comparison();
            set_pair(&loader, pair);
            render::diff(&loader.diff().await?);
            Ok(())
        }
        Command::Intersect(pair) => {
            let loader = ctx.comparison();
            set_pair(&loader, pair);
            render::intersect(&loader.intersect().await?);
            Ok(())
        }
        Command::Unique { library } => {
            let response = ctx.comparison().unique(&library).await?;
            render::unique(&response);
            Ok(())
        }
        Command::WantToRead { username, filters } => {
            want_to_read(&ctx, &username, filters.as_deref()).await
        }
    }
}

async fn search(ctx: &AppContext, query: String, compact: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = SearchQueryController::new(
        ctx.api.clone(),
        Arc::clone(&ctx.time),
        ctx.config.search.clone(),
    )
    .with_event_sink(tx);
    if compact {
        controller.set_context(PresentationContext::Compact);
    }

    let generation = controller.input(query);
    while let Some(event) = rx.recv().await {
        match event {
            SearchEvent::Results {
                generation: g,
                results,
                ..
            } if g == generation => {
                render::search_results(&results);
                return Ok(());
            }
            SearchEvent::Failed {
                generation: g,
                error,
                ..
            } if g == generation => {
                return Err(error).context("search failed");
            }
            SearchEvent::Cleared => return Ok(()),
            _ => {}
        }
    }
    bail!("search ended without a response")
}

async fn show_availability(
    ctx: &AppContext,
    media_id: MediaId,
    refresh: RefreshArg,
) -> Result<()> {
    let snapshot = ctx
        .snapshot_loader()
        .load(&media_id)
        .await
        .with_context(|| format!("failed to load availability for {media_id}"))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = LiveRefreshScheduler::new(
        ctx.upstream.clone(),
        Arc::clone(&ctx.time),
        ctx.config.refresh.clone(),
        availability::shared(snapshot),
    )
    .with_event_sink(tx);

    let scheduled = match refresh {
        RefreshArg::None => 0,
        RefreshArg::Favorites => scheduler.refresh_favorites().scheduled.len(),
        RefreshArg::All => scheduler
            .refresh_all()
            .iter()
            .map(|plan| plan.scheduled.len())
            .sum(),
    };
    info!(media = %media_id, scheduled, "waiting for live refresh");
    scheduler.drain().await;

    let mut failed = 0usize;
    while let Ok(event) = rx.try_recv() {
        if let RefreshEvent::Failed { library, error } = event {
            warn!(library = %library, error = %error, "row left stale");
            failed += 1;
        }
    }

    let snapshot = scheduler.snapshot().read().clone();
    render::availability(&snapshot);
    if failed > 0 {
        println!("{failed} libraries could not be refreshed");
    }
    Ok(())
}

async fn favorites(ctx: &AppContext, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => {
            let libraries = ctx.directory().favorite_libraries().await?;
            render::libraries(&libraries);
        }
        FavoritesAction::Add { library } => {
            let set = ctx.favorites.add(library.clone()).await?;
            println!("{library} added ({} favorites)", set.len());
        }
        FavoritesAction::Remove { library } => {
            let set = ctx.favorites.remove(&library).await?;
            println!("{library} removed ({} favorites)", set.len());
        }
        FavoritesAction::Migrate => {
            let report = ctx.favorites.migrate().await?;
            render::migration(&report);
        }
    }
    Ok(())
}

fn set_pair(loader: &ComparisonLoader, pair: PairArgs) {
    loader.set_left(Some(pair.left));
    loader.set_right(Some(pair.right));
    if pair.flip {
        loader.flip();
    }
}

async fn want_to_read(
    ctx: &AppContext,
    username: &str,
    filters: Option<&str>,
) -> Result<()> {
    let titles = ctx
        .api
        .search_hardcover(username, filters)
        .await
        .with_context(|| format!("failed to fetch want-to-read for {username}"))?;
    info!(titles = titles.len(), "checking favorites");
    let summaries = ctx.favorites_scan().scan(titles).await?;
    render::scan(&summaries);
    Ok(())
}
