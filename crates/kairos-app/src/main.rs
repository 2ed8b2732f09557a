mod cli;

use clap::Parser;
use kairos_core::config::{RecurrenceConfig, load_config};
use kairos_core::types::DateRange;
use kairos_db::db::connection::{DbPool, create_pool};
use kairos_db::db::migrate::run_migrations;
use kairos_service::recurrence::tx;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use crate::cli::{Cli, Command, instance_json};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    let config = load_config()?;

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    run_migrations(&config.database.url).await?;
    if cli.command == Command::Migrate {
        return Ok(());
    }

    let pool = create_pool(&config.database).await?;
    run(&pool, config.recurrence, cli.command).await
}

async fn run(pool: &DbPool, recurrence: RecurrenceConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {}
        Command::Expand {
            template_id,
            first,
            last,
        } => {
            let window = DateRange::days(first, last)?;
            for instance in tx::expand_template(pool, recurrence, template_id, window).await? {
                println!("{}", instance_json(&instance));
            }
        }
        Command::UpdateInstance {
            template_id,
            date,
            overrides,
        } => {
            let instance =
                tx::update_instance(pool, recurrence, template_id, date, overrides).await?;
            println!("{}", instance_json(&instance));
        }
        Command::DeleteInstance { template_id, date } => {
            let outcome = tx::delete_instance(pool, recurrence, template_id, date).await?;
            println!("{outcome}");
        }
    }
    Ok(())
}
