//! Loads a population, runs the demographic simulation over it and saves the survivors.

mod database;
mod telemetry;

use anyhow::Result;
use popsim_core::{RunId, RunnerConfig};
use popsim_world::{Individual, Simulation};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RunnerConfig::load()?;

    telemetry::init_tracing(config.json_logs)?;

    info!("Opening population database at {}", config.database_path);
    let db = database::Database::new(&config.database_path).await?;
    db.migrate().await?;

    if !config.initial_population.is_empty() && db.load_population().await?.is_empty() {
        info!(
            "Seeding database with {} configured individuals",
            config.initial_population.len()
        );
        for record in &config.initial_population {
            db.save_individual(None, record).await?;
        }
    }

    // A malformed record aborts here, before any step runs
    let records = match config.start_from_run {
        Some(run_id) => {
            info!("Starting from survivors of run {}", run_id);
            db.load_run(run_id).await?
        }
        None => db.load_population().await?,
    };
    let initial = records
        .iter()
        .map(Individual::from_record)
        .collect::<popsim_core::Result<Vec<_>>>()?;
    info!("Loaded {} individuals", initial.len());

    let run_id = RunId::new();
    let sim_config = config.simulation.clone();
    let result = tokio::task::spawn_blocking(move || {
        Simulation::new(sim_config, initial).map(|mut sim| sim.run())
    })
    .await??;

    db.record_run(run_id, config.simulation.duration, &result).await?;
    db.save_population(run_id, &result.survivors).await?;
    info!(
        run_id = %run_id,
        survivors = result.survivors.len(),
        final_clock = result.final_clock,
        "Run saved"
    );
    info!("Database now holds {} individual records", db.count_individuals().await?);

    if config.print_survivors {
        for record in &result.survivors {
            println!("Individual {}", Individual::from_record(record)?);
        }
    }

    Ok(())
}
