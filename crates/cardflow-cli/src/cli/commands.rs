use super::print::{
    format_card, format_columns, format_recent, format_settings, format_tags, print_info,
    print_success,
};
use super::setup::{Cli, Commands, SettingsCommands};
use anyhow::{anyhow, bail, Context, Result};
use cardflow::config::{EngineConfig, CONFIG_FILE_NAME};
use cardflow::model::{SortKey, SortOrder};
use cardflow::scan::{ScanOutcome, ScanRequest};
use cardflow::service::fs::FsCardService;
use cardflow::settings::{DisplaySettings, SettingsPatch};
use cardflow::store::fs_backend::FsStateBackend;
use cardflow::CardEngine;
use clap::Parser;
use log::{debug, LevelFilter};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

type Engine = CardEngine<FsCardService, FsStateBackend>;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (mut engine, resume) = init_engine(&cli)?;

    match cli.command {
        Commands::Open { dir } => handle_open(&mut engine, &dir),
        Commands::List {
            search,
            tags,
            sort,
            desc,
            width,
        } => {
            resume_directory(&mut engine, resume)?;
            handle_list(&mut engine, search, tags, sort, desc, width)
        }
        Commands::Tags { all } => {
            resume_directory(&mut engine, resume)?;
            handle_tags(&mut engine, all)
        }
        Commands::Show { path } => {
            resume_directory(&mut engine, resume)?;
            handle_show(&mut engine, &path)
        }
        Commands::New { name } => {
            resume_directory(&mut engine, resume)?;
            handle_new(&mut engine, &name)
        }
        Commands::Rm { path } => {
            resume_directory(&mut engine, resume)?;
            handle_rm(&mut engine, &path)
        }
        Commands::Recent { clear, open } => handle_recent(&mut engine, clear, open),
        Commands::Settings { action } => handle_settings(&mut engine, action),
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.format_timestamp(None).try_init();
}

fn init_engine(cli: &Cli) -> Result<(Engine, Option<ScanRequest>)> {
    let config_file = cli.config.clone().or_else(|| {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        local.exists().then_some(local)
    });
    let mut config =
        EngineConfig::load(config_file.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.state_dir {
        config = config.with_state_dir(dir);
    }
    let state_dir = config.state_dir()?;
    debug!("State directory: {}", state_dir.display());

    let service = FsCardService::new().with_batch_size(config.scan_batch_size);
    let backend = FsStateBackend::new(state_dir);
    Ok(CardEngine::init(service, backend, config))
}

/// Runs `request` on a worker thread and feeds its events to the engine.
fn drive_scan(engine: &mut Engine, request: ScanRequest) -> Result<usize> {
    let (tx, rx) = mpsc::channel();
    let worker = engine.service().spawn_scan(request, tx);

    let mut outcome = ScanOutcome::Stale;
    for event in rx {
        outcome = engine.handle_scan_event(event);
    }
    worker
        .join()
        .map_err(|_| anyhow!("Scan worker panicked"))?;

    match outcome {
        ScanOutcome::Completed { total } => Ok(total),
        ScanOutcome::Failed(error) => bail!("Scan failed: {}", error),
        other => bail!("Scan ended without completing ({:?})", other),
    }
}

fn resume_directory(engine: &mut Engine, resume: Option<ScanRequest>) -> Result<()> {
    let request =
        resume.ok_or_else(|| anyhow!("No directory open. Run `cardflow open <dir>` first"))?;
    drive_scan(engine, request)?;
    Ok(())
}

/// Accepts an indexed path, or a path relative to the open directory with or
/// without the `.md` suffix.
fn resolve_card_path(engine: &Engine, arg: &str) -> String {
    if engine.index().contains(arg) {
        return arg.to_string();
    }
    let Some(dir) = engine.current_dir() else {
        return arg.to_string();
    };
    let joined = Path::new(dir).join(arg).to_string_lossy().to_string();
    let with_suffix = format!("{}.md", joined);
    [joined.clone(), with_suffix]
        .into_iter()
        .find(|p| engine.index().contains(p))
        .unwrap_or(joined)
}

fn handle_open(engine: &mut Engine, dir: &Path) -> Result<()> {
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Cannot open {}", dir.display()))?;
    let dir = dir.to_string_lossy().to_string();

    let request = engine.open_directory(&dir);
    let total = drive_scan(engine, request)?;
    print_success(&format!("Loaded {} cards from {}", total, dir));

    let featured = engine.tag_summary().featured.len();
    if featured > 0 {
        print_info(&format!("{} featured tags, see `cardflow tags`", featured));
    }
    Ok(())
}

fn handle_list(
    engine: &mut Engine,
    search: Option<String>,
    tags: Vec<String>,
    sort: SortKey,
    desc: bool,
    width: Option<u32>,
) -> Result<()> {
    if let Some(search) = search {
        engine.set_search(&search);
    }
    engine.set_selected_tags(tags);
    engine.set_sort_key(sort);
    engine.set_sort_order(if desc { SortOrder::Desc } else { SortOrder::Asc });
    if let Some(width) = width {
        engine.set_viewport_width(width);
    }

    print!("{}", format_columns(engine.layout()));

    if engine.query().is_filtering() {
        let shown = engine.visible_cards().len();
        print_info(&format!("{} of {} cards", shown, engine.index().len()));
    }
    Ok(())
}

fn handle_tags(engine: &mut Engine, all: bool) -> Result<()> {
    engine.set_tags_expanded(all);
    let expanded = engine.tags_expanded();
    print!("{}", format_tags(engine.tag_summary(), expanded));
    Ok(())
}

fn handle_show(engine: &mut Engine, arg: &str) -> Result<()> {
    let path = resolve_card_path(engine, arg);
    engine
        .select_card(&path)
        .with_context(|| format!("Cannot read {}", path))?;
    let card = engine
        .selected_card()
        .cloned()
        .ok_or_else(|| anyhow!("{} is not a card of the open directory", path))?;

    let selection = engine.selection();
    print!(
        "{}",
        format_card(
            &card,
            selection.content().unwrap_or_default(),
            selection.word_count(),
            engine.settings().timezone,
        )
    );
    Ok(())
}

fn handle_new(engine: &mut Engine, name: &str) -> Result<()> {
    let card = engine.create_card(name)?;
    print_success(&format!("Created {}", card.path));
    Ok(())
}

fn handle_rm(engine: &mut Engine, arg: &str) -> Result<()> {
    let path = resolve_card_path(engine, arg);
    if !engine.index().contains(&path) {
        bail!("No card at {}", path);
    }
    engine.delete_card(&path)?;
    print_success(&format!("Deleted {}", path));
    Ok(())
}

fn handle_recent(engine: &mut Engine, clear: bool, open: Option<usize>) -> Result<()> {
    if clear {
        engine.clear_recent();
        print_success("Cleared recent directories");
        return Ok(());
    }
    if let Some(position) = open {
        let request = position
            .checked_sub(1)
            .and_then(|i| engine.open_recent(i))
            .ok_or_else(|| anyhow!("No recent directory at position {}", position))?;
        let dir = request.dir.clone();
        let total = drive_scan(engine, request)?;
        print_success(&format!("Loaded {} cards from {}", total, dir));
        return Ok(());
    }
    print!("{}", format_recent(engine.recent_directories()));
    Ok(())
}

fn handle_settings(engine: &mut Engine, action: Option<SettingsCommands>) -> Result<()> {
    let (settings, reload): (DisplaySettings, Option<ScanRequest>) = match action {
        None => (*engine.settings(), None),
        Some(SettingsCommands::Set { key, value }) => {
            let patch = SettingsPatch::from_key_value(&key, &value).map_err(|e| anyhow!(e))?;
            engine.patch_settings(&patch)
        }
        Some(SettingsCommands::Reset) => engine.reset_settings(),
    };
    print!("{}", format_settings(&settings));

    if let Some(request) = reload {
        let total = drive_scan(engine, request)?;
        print_info(&format!("Rescanned {} cards", total));
    }
    Ok(())
}
