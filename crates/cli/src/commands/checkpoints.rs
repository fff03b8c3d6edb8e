use colored::Colorize;
use rk_core::store::{CheckpointStore, SqliteCheckpointStore};

pub async fn checkpoints(database: &str, thread: &str, json: bool) -> color_eyre::Result<()> {
    let store = SqliteCheckpointStore::open(database)?;
    let trail = store.list(thread).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trail)?);
        return Ok(());
    }

    if trail.is_empty() {
        println!("{}", format!("No checkpoints for {thread}").yellow());
        return Ok(());
    }

    for cp in &trail {
        println!(
            "{:>3}  {:<10}  {}  {}",
            cp.sequence,
            cp.stage.to_string().cyan(),
            cp.created_at.format("%Y-%m-%d %H:%M:%S"),
            cp.id.dimmed()
        );
    }
    Ok(())
}
