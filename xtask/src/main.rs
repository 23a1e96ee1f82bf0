// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate JSON Schemas for the on-disk formats.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema { out_dir } => schema(&out_dir),
    }
}

fn schema(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("create schema output dir")?;

    let suite = schema_for!(ctl_core::TestSuite);
    let declaration = schema_for!(ctl_capability::CapabilityDeclaration);
    let config = schema_for!(ctl_config::ToolConfig);

    write_schema(&out_dir.join("test_suite.schema.json"), &suite)?;
    write_schema(&out_dir.join("capability_declaration.schema.json"), &declaration)?;
    write_schema(&out_dir.join("tool_config.schema.json"), &config)?;

    eprintln!("wrote schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let mut s = serde_json::to_string_pretty(schema)?;
    s.push('\n');
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
