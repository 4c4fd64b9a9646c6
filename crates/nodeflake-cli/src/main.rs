//! `nodeflake`: generate and decode Snowflake-style IDs from the shell.
//!
//! ```bash
//! NODE_ID=7 nodeflake generate -n 3
//! nodeflake decode 6823236456859828225
//! ```

mod config;
mod telemetry;

use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, ClockConfig, Command, DecodeConfig, GenerateConfig};
use nodeflake::SnowflakeId;
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    match args.command {
        Command::Generate(args) => generate(&GenerateConfig::try_from(args)?),
        Command::Decode(args) => decode(&DecodeConfig::try_from(args)?),
    }
}

fn generate(config: &GenerateConfig) -> anyhow::Result<()> {
    let generator = config.generator()?;

    tracing::debug!(
        count = config.count,
        node_id = config.node_id,
        epoch_secs = config.clock.epoch.as_secs(),
        "generating"
    );

    let mut out = BufWriter::new(std::io::stdout().lock());
    for n in 0..config.count {
        let id = generator
            .next_id()
            .with_context(|| format!("failed to generate ID {} of {}", n + 1, config.count))?;
        if config.padded {
            writeln!(out, "{}", id.to_padded_string())?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn decode(config: &DecodeConfig) -> anyhow::Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    for id in &config.ids {
        write_decoded(&mut out, id, &config.clock)?;
    }
    out.flush()?;
    Ok(())
}

fn write_decoded(out: &mut impl Write, id: &SnowflakeId, clock: &ClockConfig) -> anyhow::Result<()> {
    let g = clock.granularity;
    let unix_ms = (clock.epoch + id.elapsed(g)).as_millis();

    writeln!(out, "{id}")?;
    writeln!(out, "  timestamp: {}", id.timestamp())?;
    writeln!(out, "  node_id:   {}", id.node_id())?;
    writeln!(out, "  iteration: {}", id.iteration())?;
    writeln!(out, "  unix_ms:   {unix_ms}")?;
    writeln!(
        out,
        "  since epoch: {}s {}m {}h {}d {}w",
        id.seconds(g),
        id.minutes(g),
        id.hours(g),
        id.days(g),
        id.weeks(g)
    )?;
    Ok(())
}
