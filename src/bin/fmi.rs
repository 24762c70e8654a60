use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fmi::{
    AlbumArtResolver, AppConfig, ArtworkCache, AvatarSource, CacheNamespace, CardService,
    FmiError, FontBook, JsonFileRegistry, LastFmClient, ReqwestFetcher, UserRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "fmi", version, about = "Render Last.fm \"now playing\" cards")]
struct Cli {
    /// JSON config file. `FMI_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the card for a user's most recent scrobble.
    Render(RenderArgs),
    /// Link a platform user id to a Last.fm username.
    Link(LinkArgs),
    /// Print the primary/secondary palette of an image.
    Palette(PaletteArgs),
    /// Show artwork cache usage.
    CacheStats,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Last.fm username to render directly.
    #[arg(long, conflicts_with = "user_id")]
    user: Option<String>,

    /// Linked platform user id.
    #[arg(long)]
    user_id: Option<String>,

    /// Name shown when `--user-id` has no linked account.
    #[arg(long, default_value = "That user")]
    name: String,

    /// Avatar image URL.
    #[arg(long, conflicts_with = "avatar_file")]
    avatar_url: Option<String>,

    /// Avatar image file.
    #[arg(long)]
    avatar_file: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, default_value = fmi::CARD_FILENAME)]
    out: PathBuf,

    /// Print the font families loaded for text rendering.
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Args, Debug)]
struct LinkArgs {
    user_id: String,
    username: String,
}

#[derive(Args, Debug)]
struct PaletteArgs {
    image: PathBuf,

    /// Number of k-means clusters.
    #[arg(long, default_value_t = fmi::DEFAULT_CLUSTERS)]
    clusters: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(&cfg, args).await,
        Command::Link(args) => cmd_link(&cfg, args),
        Command::Palette(args) => cmd_palette(args),
        Command::CacheStats => cmd_cache_stats(&cfg),
    }
}

fn open_cache(cfg: &AppConfig) -> anyhow::Result<ArtworkCache> {
    Ok(ArtworkCache::open(cfg.cache_root()?, cfg.cache.budgets)?)
}

fn avatar_source(args: &RenderArgs) -> anyhow::Result<AvatarSource> {
    match (&args.avatar_url, &args.avatar_file) {
        (Some(url), _) => Ok(AvatarSource::Url(url.clone())),
        (None, Some(path)) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read avatar '{}'", path.display()))?;
            Ok(AvatarSource::Bytes(bytes))
        }
        (None, None) => anyhow::bail!("one of --avatar-url or --avatar-file is required"),
    }
}

async fn cmd_render(cfg: &AppConfig, args: RenderArgs) -> anyhow::Result<()> {
    let avatar = avatar_source(&args)?;

    let fetcher = Arc::new(ReqwestFetcher::new(&cfg.http.user_agent, cfg.timeout())?);
    let cache = Arc::new(open_cache(cfg)?);
    let resolver = AlbumArtResolver::new(
        fetcher.clone(),
        cache,
        cfg.catalog.clone(),
        cfg.timeout(),
    );
    let scrobbles = LastFmClient::new(fetcher.clone(), cfg.lastfm.clone(), cfg.timeout())?;
    let registry = JsonFileRegistry::open(cfg.registry_path()?)?;

    let fonts = FontBook::load_dir(&cfg.fonts.dir);
    if args.dump_fonts {
        eprintln!("font families ({}):", cfg.fonts.dir.display());
        for family in fonts.family_names() {
            eprintln!("  {family}");
        }
    }

    let service = CardService::new(
        fetcher,
        resolver,
        scrobbles,
        registry,
        Arc::new(fonts),
        cfg.timeout(),
    );

    let rendered = match (&args.user, &args.user_id) {
        (Some(username), _) => service.render_for_username(username, avatar).await,
        (None, Some(user_id)) => service.render_for_user(user_id, &args.name, avatar).await,
        (None, None) => anyhow::bail!("one of --user or --user-id is required"),
    };
    let card = rendered.map_err(user_facing)?;

    write_png(&args.out, &card.png)?;
    eprintln!(
        "wrote {} (artwork: {}, primary {}, secondary {})",
        args.out.display(),
        card.origin,
        card.palette.primary,
        card.palette.secondary
    );
    Ok(())
}

fn cmd_link(cfg: &AppConfig, args: LinkArgs) -> anyhow::Result<()> {
    let registry = JsonFileRegistry::open(cfg.registry_path()?)?;
    registry.link(&args.user_id, &args.username)?;
    eprintln!(
        "linked {} -> {} ({})",
        args.user_id,
        args.username.trim(),
        registry.path().display()
    );
    Ok(())
}

fn cmd_palette(args: PaletteArgs) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(&args.image).with_context(|| format!("read '{}'", args.image.display()))?;
    let palette = fmi::extract_palette(&bytes, args.clusters).map_err(user_facing)?;
    println!("primary   {}", palette.primary.to_hex());
    println!("secondary {}", palette.secondary.to_hex());
    Ok(())
}

fn cmd_cache_stats(cfg: &AppConfig) -> anyhow::Result<()> {
    let cache = open_cache(cfg)?;
    println!("root: {}", cfg.cache_root()?.display());
    for ns in [CacheNamespace::Art, CacheNamespace::Identifier] {
        let stats = cache.stats(ns);
        println!(
            "{ns:<10} entries={:<6} bytes={:<12} budget={}",
            stats.entries, stats.bytes, stats.budget_bytes
        );
    }
    Ok(())
}

/// Log the full failure and keep only the short message for the terminal.
fn user_facing(err: FmiError) -> anyhow::Error {
    anyhow::anyhow!(fmi::report_failure(&err))
}

fn write_png(out: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, png).with_context(|| format!("write png '{}'", out.display()))
}
