//! CLI smoke entry point.
//!
//! # Responsibility
//! - Assemble a thought service over the configured backend.
//! - Seed sample thoughts and print a deterministic probe of the store.

use log::info;
use serde_json::json;
use std::process::ExitCode;
use thoughts_core::db::open_db;
use thoughts_core::{
    init_from_config, Backend, CoreConfig, MemoryThoughtRepository, QueryParams,
    ServiceError, SqliteThoughtRepository, ThoughtRepository, ThoughtService,
};

fn main() -> ExitCode {
    println!("thoughts_core ping={}", thoughts_core::ping());
    println!("thoughts_core version={}", thoughts_core::core_version());

    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_from_config(&config)?;
    info!(
        "event=cli_start module=cli status=ok backend={}",
        config.backend.as_str()
    );

    match config.backend {
        Backend::Memory => run(MemoryThoughtRepository::new(), &config),
        Backend::Sqlite => {
            let mut conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
            let repo = SqliteThoughtRepository::try_new(&mut conn).map_err(|err| err.to_string())?;
            run(repo, &config)
        }
    }
}

fn run<R: ThoughtRepository>(repo: R, config: &CoreConfig) -> Result<(), String> {
    let mut service = ThoughtService::new(repo).with_policy(config.validation);

    let health = service.health().map_err(describe)?;
    println!("store backend={} version={}", health.backend, health.version);

    let seeded = service.seed_samples().map_err(describe)?;
    println!("seeded={seeded}");

    let mut newest = QueryParams::new();
    newest.insert("sort", "created_at");
    newest.insert("order", "desc");
    newest.insert("limit", "3");
    let page = service.list(&newest).map_err(describe)?;
    let modified = page.items.iter().filter(|thought| thought.is_modified()).count();
    println!("total={} modified={modified}", page.total);
    for thought in &page.items {
        println!(
            "{}",
            serde_json::to_string(thought).map_err(|err| err.to_string())?
        );
    }

    let stats = service.stats().map_err(describe)?;
    println!(
        "stats={}",
        serde_json::to_string(&stats).map_err(|err| err.to_string())?
    );

    // Probe the error envelope with a body that breaks several rules.
    if let Err(err) = service.create(&json!({ "text": "hey", "tags": [] })) {
        println!(
            "rejected={}",
            serde_json::to_string(&err.to_error_body()).map_err(|err| err.to_string())?
        );
    }

    Ok(())
}

fn describe(err: ServiceError) -> String {
    let body = err.to_error_body();
    format!("{} ({}): {err}", body.message, body.code)
}
