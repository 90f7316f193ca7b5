// ABOUTME: Runnable demo: persist a settings cell to disk and restore it on the next run.
// ABOUTME: Run twice (cargo run --example persist) to watch the restore pick up the last state.

use serde_json::json;
use statevault::{FsDriver, PersistOptions, Persistence, SerialTaskQueue, StateCell};

#[tokio::main]
async fn main() -> Result<(), statevault::StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statevault=debug".parse().unwrap()),
        )
        .init();

    let root = std::env::temp_dir().join("statevault-demo");
    let driver = FsDriver::new(&root);
    let queue = SerialTaskQueue::new();

    let persistence = Persistence::open(
        &driver,
        PersistOptions::new()
            .application_name("demo")
            .debug_logging(true),
        queue,
    )
    .await?;

    let settings = StateCell::new("settings", json!({"theme": "light", "runs": 0}));
    let _handle = persistence.attach(&settings);

    println!("restored state: {}", settings.state());

    settings.update(|s| {
        let runs = s["runs"].as_i64().unwrap_or(0);
        s["runs"] = json!(runs + 1);
        s["theme"] = json!(if runs % 2 == 0 { "dark" } else { "light" });
    });

    // Wait out the debounce window, then drain the queue before exit.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    persistence.flush().await;

    println!("persisted to {}", root.display());
    Ok(())
}
