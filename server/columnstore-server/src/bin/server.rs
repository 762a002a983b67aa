//! Unix-domain socket server: accepts one connection per client session,
//! each driven by `columnstore_server::session::run_session` against a
//! shared, mutex-guarded engine (spec.md §5: table mutation is
//! single-threaded per table; a whole-engine mutex is the simplest
//! reimplementation that upholds that without a per-table lock table).

use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::Mutex;

use columnstore_core::{Engine, EngineConfig};
use columnstore_server::session::run_session;

fn socket_path() -> PathBuf {
    std::env::var("COLUMNSTORE_SOCKET")
        .unwrap_or_else(|_| "/tmp/columnstore.sock".to_string())
        .into()
}

fn database_home() -> PathBuf {
    std::env::var("DATABASE_HOME_DIRECTORY")
        .unwrap_or_else(|_| "./databases".to_string())
        .into()
}

fn main() -> std::io::Result<()> {
    columnstore_core::logging::init();

    let socket_path = socket_path();
    let home = database_home();
    let config = EngineConfig::builder().database_home_directory(home.to_string_lossy()).build();

    let engine = match columnstore_core::persistence::restore(config.clone(), &home) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::warn!(error = %e, "catalog restore failed; starting with no current database");
            Engine::new(config.clone())
        }
    };
    let engine = Mutex::new(engine);

    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let listener = UnixListener::bind(&socket_path)?;
    tracing::info!(path = %socket_path.display(), "listening");

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        tracing::info!("session opened");
        match run_session(&mut stream, &engine, &config) {
            Ok(true) => {
                tracing::info!("shutdown requested; persisting catalog");
                let guard = engine.lock().unwrap();
                if let Err(e) = columnstore_core::persistence::persist(&guard, &home) {
                    tracing::error!(error = %e, "failed to persist catalog on shutdown");
                    drop(guard);
                    let _ = std::fs::remove_file(&socket_path);
                    std::process::exit(1);
                }
                drop(guard);
                break;
            }
            Ok(false) => tracing::info!("session closed"),
            Err(e) => tracing::warn!(error = %e, "session ended with an I/O error"),
        }
    }

    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}
