use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::Parser;

use mechanicum::app::{AppState, Msg, StorageProgram};
use mechanicum::config::Config;
use mechanicum::logging::init_tracing;
use mechanicum::{AtomExt, GrState, Store};

#[derive(Parser)]
#[command(name = "mechanicum")]
#[command(about = "Copy a file into local and shared storage, then read both copies back")]
struct Cli {
    /// Config file (default: <config dir>/mechanicum/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Private cache directory, overrides storage.cache_dir
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Shared directory, overrides storage.external_dir
    #[arg(long)]
    external_dir: Option<PathBuf>,

    /// How long to wait for each phase
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// File to store
    source: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.cache_dir {
        config.storage.cache_dir = Some(dir);
    }
    if let Some(dir) = cli.external_dir {
        config.storage.external_dir = Some(dir);
    }
    init_tracing(&config.logging)?;

    let program = StorageProgram::from_config(&cli.source, &config.storage);
    tracing::info!(
        source = %program.source().display(),
        cache = %program.cache_dir().display(),
        external = %program.external_dir().display(),
        "starting"
    );
    let store = Store::start(program, AppState::default(), &config.dispatch)?;
    let timeout = Duration::from_secs(cli.timeout_secs);

    store.try_send(Msg::StoreToLocal)?;
    store.try_send(Msg::StoreToExternal)?;
    store
        .state()
        .block_until(|state: &AppState| state.stores_settled(), timeout)
        .context("timed out storing copies")?;

    store.try_send(Msg::ReadFromLocal)?;
    store.try_send(Msg::ReadFromExternal)?;
    let state = store
        .state()
        .block_until(|state: &AppState| state.reads_settled(), timeout)
        .context("timed out reading copies back")?;

    print_slot("stored locally", &state.stored_local, |path| path.display().to_string());
    print_slot("stored externally", &state.stored_external, |path| {
        path.display().to_string()
    });
    print_slot("read locally", &state.read_local, |text| {
        format!("{} bytes", text.len())
    });
    print_slot("read externally", &state.read_external, |text| {
        format!("{} bytes", text.len())
    });

    let failures = state.failures();
    if !failures.is_empty() {
        bail!("{} of 4 operations failed", failures.len());
    }
    Ok(())
}

fn print_slot<V, E: std::fmt::Display>(
    label: &str,
    slot: &Option<GrState<E, V>>,
    describe: impl Fn(&V) -> String,
) {
    match slot {
        None => println!("{label}: not requested"),
        Some(GrState::Loading) => println!("{label}: still loading"),
        Some(GrState::Content { value, update }) => match update.as_ref().and_then(|u| u.failure()) {
            Some(error) => println!("{label}: {} (refresh failed: {error})", describe(value)),
            None => println!("{label}: {}", describe(value)),
        },
        Some(GrState::Failure(error)) => println!("{label}: failed: {error}"),
    }
}
