//! Lay out a fact list
//!
//! Reads an extracted fact batch, builds the genogram, computes the tree layout
//! and prints the transport document.
//!
//! Usage: `genogram-layout <facts.json> [--subject <fact id>] [--config <file>]`

use anyhow::{bail, Context, Result};
use genogram_domain::{codec, FactBatch, GenogramBuilder, GenogramConfig, TreeLayoutEngine};
use std::fs;

struct Args {
    facts: String,
    subject: Option<u32>,
    config: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut facts = None;
    let mut subject = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--subject" => {
                let raw = args.next().context("--subject needs a fact id")?;
                subject = Some(raw.parse().with_context(|| format!("Bad fact id `{raw}`"))?);
            }
            "--config" => config = Some(args.next().context("--config needs a path")?),
            other if other.starts_with("--") => bail!("Unknown option {other}"),
            other => {
                if facts.replace(other.to_string()).is_some() {
                    bail!("Only one fact file may be given");
                }
            }
        }
    }
    let facts = facts.context(
        "Usage: genogram-layout <facts.json> [--subject <fact id>] [--config <file>]",
    )?;
    Ok(Args {
        facts,
        subject,
        config,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => GenogramConfig::from_json_file(path)?,
        None => GenogramConfig::default(),
    };

    let raw = fs::read_to_string(&args.facts)
        .with_context(|| format!("Failed to read {}", args.facts))?;
    let batch: FactBatch =
        serde_json::from_str(&raw).with_context(|| format!("Invalid fact list {}", args.facts))?;
    let imported = GenogramBuilder::new().build(&batch)?;

    let subject = match args.subject {
        Some(local) => Some(
            imported
                .node(local)
                .with_context(|| format!("Subject {local} is not in the fact list"))?,
        ),
        None => imported.ids.values().next().copied(),
    };

    let engine = TreeLayoutEngine::new(config.layout().clone());
    let layout = engine.layout_for_subject(&imported.graph, subject);
    println!("{}", codec::to_json(&imported.graph, &layout)?);
    Ok(())
}
