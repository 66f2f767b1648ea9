//! Seed command implementation

use crate::cli::SeedArgs;
use crate::output::OutputWriter;
use crate::output_types::SeedOutput;
use crate::progress::{create_progress_bar, finish_error, finish_success};
use crate::storage::{load_seed_file, Storage};
use anyhow::{Context, Result};
use artmap_core::config::BackendKind;

pub async fn execute(args: SeedArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let seed = load_seed_file(&args.path)?;
    let read = seed.artifacts.len() + seed.skipped;

    if seed.skipped > 0 {
        output.warning(format!("Skipped {} invalid artifact(s); see log for details", seed.skipped));
    }

    let pb = create_progress_bar(seed.artifacts.len() as u64, "Inserting artifacts", output.is_json());
    let mut inserted = 0;

    let mut remaining = seed.artifacts;
    let batch_size = args.batch_size.max(1);
    while !remaining.is_empty() {
        let rest = remaining.split_off(batch_size.min(remaining.len()));
        let batch = std::mem::replace(&mut remaining, rest);

        match storage.store.create_many(batch).await {
            Ok(created) => {
                inserted += created.len();
                pb.inc(created.len() as u64);
            }
            Err(err) => {
                finish_error(&pb, "Seeding failed");
                return Err(err).context(format!("Inserted {} artifact(s) before failure", inserted));
            }
        }
    }
    finish_success(&pb, &format!("Inserted {} artifact(s)", inserted));

    let backend = format!("{:?}", storage.backend).to_lowercase();
    if output.is_json() {
        return output.result(SeedOutput { read, inserted, backend });
    }

    output.success(format!("Seeded {} of {} artifact(s) into the {} store", inserted, read, backend));
    if storage.backend == BackendKind::Memory {
        output.info("The in-memory store lasts only for this command; set seed_file to preload it");
    }
    Ok(())
}
