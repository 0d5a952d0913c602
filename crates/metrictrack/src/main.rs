//! `mtrack` - CLI for metrictrack
//!
//! This binary is the user-facing adapter of the tracker: each subcommand
//! gathers input, calls into the library, and renders the resulting view.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use metrictrack::cli::{
    AddCommand, Cli, ClearCommand, Command, ConfigCommand, ExportCommand, ListCommand,
    ReportCommand, SummaryCommand,
};
use metrictrack::report::{FsArtifactSink, FsTemplateSource, PlaceholderEngine};
use metrictrack::transfer::{self, EXPORT_FILE_NAME};
use metrictrack::view::terminal::TerminalRenderer;
use metrictrack::view::{RenderOnChange, Renderer};
use metrictrack::{
    init_logging, CollapseState, Config, Error, MetricRecord, Period, RecordStore,
    ReportGenerator, SqliteStore, ViewModel, ViewOptions,
};

type Store = RecordStore<SqliteStore>;
type Generator = ReportGenerator<FsTemplateSource, PlaceholderEngine, FsArtifactSink>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    if let Err(e) = run(cli).await {
        eprintln!("Ошибка: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    let mut options = config.view_options();
    if cli.flat {
        options.grouped = false;
    }

    match cli.command {
        Command::Add(cmd) => {
            let mut store = open_store(&config)?;
            watch(&mut store, &options);
            handle_add(&mut store, cmd)
        }
        Command::List(cmd) => handle_list(&open_store(&config)?, &options, &cmd),
        Command::Remove(cmd) => {
            let mut store = open_store(&config)?;
            let index = store_index(&store, &options, cmd.position)?;
            watch(&mut store, &options);
            let removed = store.remove_at(index)?;
            eprintln!("Удалено: {}", removed.name);
            Ok(())
        }
        Command::Clear(cmd) => handle_clear(&mut open_store(&config)?, &options, &cmd),
        Command::Report(cmd) => {
            handle_report(&open_store(&config)?, &options, &config, &cmd).await
        }
        Command::Summary(cmd) => {
            handle_summary(&open_store(&config)?, &options, &config, &cmd).await
        }
        Command::Export(cmd) => handle_export(&open_store(&config)?, cmd).await,
        Command::Import(cmd) => {
            let payload = transfer::read_payload(&cmd.file)
                .await
                .with_context(|| format!("не удалось прочитать {}", cmd.file.display()))?;
            let mut store = open_store(&config)?;
            watch(&mut store, &options);
            let count = transfer::import_all(&mut store, &payload, config.import_schema())?;
            eprintln!("Данные успешно загружены! ({count})");
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    let backend = SqliteStore::open(config.database_path())?;
    let store = RecordStore::load(backend, config.storage.key.clone());
    debug!(count = store.len(), key = store.key(), "Store ready");
    Ok(store)
}

/// Re-render the view after every store mutation.
fn watch(store: &mut Store, options: &ViewOptions) {
    store.subscribe(Box::new(RenderOnChange::new(
        TerminalRenderer::new(io::stdout()),
        options.clone(),
        CollapseState::new(),
    )));
}

/// Map a displayed position back to the canonical record index.
fn store_index(store: &Store, options: &ViewOptions, position: usize) -> anyhow::Result<usize> {
    let view = ViewModel::derive(store.records(), options, &CollapseState::new());
    Ok(view
        .store_index(position)
        .ok_or(Error::UnknownPosition(position))?)
}

fn generator(config: &Config) -> Generator {
    ReportGenerator::new(
        FsTemplateSource::new(config.templates_dir()),
        PlaceholderEngine::new(),
        FsArtifactSink::new(config.reports.output_dir.clone()),
    )
    .with_default_template(config.reports.default_template.clone())
    .with_max_name_len(config.reports.max_name_len)
}

fn handle_add(store: &mut Store, cmd: AddCommand) -> anyhow::Result<()> {
    let period = cmd.period.unwrap_or_else(Period::current);
    let mut record = MetricRecord::new(&cmd.name, &cmd.value, period)?;
    if let Some(section) = cmd.section {
        record = record.with_section(section);
    }
    if let Some(template) = cmd.template {
        record = record.with_template(template);
    }
    store.add(record)?;
    Ok(())
}

fn handle_list(store: &Store, options: &ViewOptions, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut collapse = CollapseState::new();
    for section in &cmd.collapse {
        collapse.collapse(section);
    }
    let view = ViewModel::derive(store.records(), options, &collapse);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        TerminalRenderer::new(io::stdout().lock()).render(&view)?;
    }
    Ok(())
}

fn handle_clear(
    store: &mut Store,
    options: &ViewOptions,
    cmd: &ClearCommand,
) -> anyhow::Result<()> {
    if !cmd.yes {
        println!("{}", clear_prompt(store.len()));
        return Ok(());
    }
    watch(store, options);
    store.clear()?;
    Ok(())
}

fn clear_prompt(count: usize) -> String {
    format!("Будут удалены все показатели ({count}).\nДля подтверждения добавьте --yes.")
}

async fn handle_report(
    store: &Store,
    options: &ViewOptions,
    config: &Config,
    cmd: &ReportCommand,
) -> anyhow::Result<()> {
    let index = store_index(store, options, cmd.position)?;
    let record = store.snapshot(&[index])?.into_iter().next();
    let record = record.ok_or(Error::UnknownPosition(cmd.position))?;

    let generator = generator(config);
    let artifact = generator.generate_single(record).await?;
    println!(
        "Отчёт сохранён: {}",
        generator.sink().path_for(&artifact.filename).display()
    );
    Ok(())
}

async fn handle_summary(
    store: &Store,
    options: &ViewOptions,
    config: &Config,
    cmd: &SummaryCommand,
) -> anyhow::Result<()> {
    let indices = cmd
        .positions
        .iter()
        .map(|&position| store_index(store, options, position))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let records = store.snapshot(&indices)?;

    let generator = generator(config);
    let artifact = generator.generate_summary(records).await?;
    println!(
        "Сводный отчёт сохранён: {}",
        generator.sink().path_for(&artifact.filename).display()
    );
    Ok(())
}

async fn handle_export(store: &Store, cmd: ExportCommand) -> anyhow::Result<()> {
    let payload = transfer::export_all(store)?;
    match cmd.output {
        None => println!("{payload}"),
        Some(path) => {
            let path = if path.is_dir() {
                path.join(EXPORT_FILE_NAME)
            } else {
                path
            };
            tokio::fs::write(&path, payload)
                .await
                .with_context(|| format!("не удалось записать {}", path.display()))?;
            eprintln!("Экспортировано в {}", path.display());
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Текущая конфигурация");
                println!("===================");
                println!();
                println!("[storage]");
                println!("  База данных:        {}", config.database_path().display());
                println!("  Ключ:               {}", config.storage.key);
                println!();
                println!("[reports]");
                println!("  Шаблоны:            {}", config.templates_dir().display());
                println!("  Шаблон по умолчанию: {}", config.reports.default_template);
                println!(
                    "  Каталог отчётов:    {}",
                    config.reports.output_dir.display()
                );
                println!("  Длина имени:        {}", config.reports.max_name_len);
                println!();
                println!("[view]");
                println!("  Группировка:        {}", config.view.grouped);
                println!("  Разделы:            {}", config.view.sections.join(", "));
                println!("  Раздел по умолчанию: {}", config.view.fallback_section);
                println!();
                println!("[import]");
                println!(
                    "  Проверять разделы:  {}",
                    config.import.require_sections
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Проверка конфигурации: {}", path.display());
            validate_config(&path);
        }
    }
    Ok(())
}

fn validate_config(path: &Path) {
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => println!("Конфигурация корректна."),
        Err(e) => println!("Ошибка конфигурации: {e}"),
    }
}
