//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `cadastro_core` linkage and storage bootstrap from the command line.
//! - Keep output deterministic for quick local sanity checks.
//!
//! # Configuration
//! - `CADASTRO_DB_PATH`: database file; an in-memory database when unset.
//! - `CADASTRO_LOG_DIR`: absolute log directory; logging stays off when unset.
//! - `CADASTRO_LOG_LEVEL`: defaults to `cadastro_core::default_log_level()`.

use cadastro_core::{
    core_version, default_log_level, init_logging, ConnectionProvider, FileConnectionProvider,
    RegistrantRepository, RepoResult, SharedConnectionProvider, SqliteRegistrantRepository,
    TB_NAME,
};
use log::info;
use std::process::ExitCode;

const DB_PATH_ENV: &str = "CADASTRO_DB_PATH";
const LOG_DIR_ENV: &str = "CADASTRO_LOG_DIR";
const LOG_LEVEL_ENV: &str = "CADASTRO_LOG_LEVEL";

fn main() -> ExitCode {
    println!("cadastro_core version={}", core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let result = match std::env::var(DB_PATH_ENV) {
        Ok(path) => FileConnectionProvider::open(&path)
            .map_err(Into::into)
            .and_then(count_rows),
        Err(_) => SharedConnectionProvider::in_memory()
            .map_err(Into::into)
            .and_then(count_rows),
    };

    match result {
        Ok(count) => {
            info!("event=cli_smoke module=cli status=ok rows={count}");
            println!("{TB_NAME} rows={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cadastro smoke check failed ({}): {err}", err.kind().as_str());
            ExitCode::FAILURE
        }
    }
}

fn count_rows<P: ConnectionProvider>(provider: P) -> RepoResult<u64> {
    SqliteRegistrantRepository::try_new(provider)?.count()
}
