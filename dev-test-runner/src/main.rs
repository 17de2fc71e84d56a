//! Round-trips every fixture: decode → encode → decode → compare.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use colored::Colorize;
use serde_json::Value;

use ivm_policy::{PolicyDocument, PolicyList, Validate};

const DEFAULT_PATTERN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/*.json");

fn round_trip_document(document: &PolicyDocument) -> Result<()> {
    let encoded = ivm_policy::encode_policy(document)?;
    let again = ivm_policy::decode_policy(&encoded).context("re-decoding the encoded policy")?;
    ensure!(&again == document, "policy `{}` changed after a round trip", document.id());
    Ok(())
}

fn check(path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Value = serde_json::from_slice(&bytes)?;
    let documents = if raw.get("items").is_some() {
        PolicyList::decode(&raw)?.items
    } else {
        vec![PolicyDocument::decode(&raw)?]
    };
    for document in &documents {
        round_trip_document(document)?;
        if let Err(violations) = document.validate() {
            tracing::info!(id = document.id(), %violations, "fixture carries violations");
        }
    }
    Ok(documents.len())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let pattern = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_PATTERN.to_owned());
    let paths = glob::glob(&pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;
    ensure!(!paths.is_empty(), "no fixtures matched {pattern}");

    let mut failed = 0;
    for path in &paths {
        match check(path) {
            Ok(count) => eprintln!("{} {} ({count} policies)", "✅ pass".green(), path.display()),
            Err(error) => {
                failed += 1;
                eprintln!("{} {}: {error:#}", "❌ fail".red().bold(), path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} fixtures failed", paths.len());
    }
    Ok(())
}
