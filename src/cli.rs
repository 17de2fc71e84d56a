//! Policy CLI: decode → (canonical JSON | validation report | summary)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use ivm_policy::{PolicyDocument, PolicyKind, PolicyList, RolloutInfo, TransformationNode, Validate};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode, validate and inspect Image & Video Manager policies
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// tracing filter directive (e.g. `debug`, `ivm_policy=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode and print the canonical re-encoded policy JSON
    Decode(DecodeOut),
    /// decode and validate, failing when any policy is invalid
    Validate(ValidateOut),
    /// decode and print a per-policy summary
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat each input as a ListPolicies response (`itemKind`, `items`, `totalItems`)
    #[arg(long, default_value_t = false)]
    list: bool,

    /// JSON Pointer to select the policy inside each document (e.g. /data/policy)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is decoded separately.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// emit the upsert request body instead of the stored document
    #[arg(long)]
    as_input: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// treat references to undeclared variables as violations
    #[arg(long)]
    strict_references: bool,

    /// output report file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

/// One decoded policy and where it came from.
struct Decoded {
    source: String,
    document: PolicyDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    source: String,
    id: String,
    kind: String,
    valid: bool,
    violations: IndexMap<String, String>,
    unresolved_references: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Reads every input and applies the pointer and jq selection.
    fn load(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut payloads = Vec::new();
        for source_path in source_paths {
            let source = source_path.to_string_lossy().to_string();
            let text = std::fs::read_to_string(&source_path).with_context(|| format!("failed to read {source}"))?;
            let json_value = serde_json::from_str::<Value>(&text).with_context(|| format!("failed to parse {source}"))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {source}"))?,
            };
            match self.jq_expr.as_deref() {
                None => payloads.push((source, json_value)),
                Some(jq_expr) => {
                    let outputs = crate::jq_exec::apply_filter(jq_expr, &json_value)
                        .with_context(|| format!("failed to apply jq expression to {source}"))?;
                    let many = outputs.len() > 1;
                    for (index, output) in outputs.into_iter().enumerate() {
                        let label = if many { format!("{source}#{index}") } else { source.clone() };
                        payloads.push((label, output));
                    }
                }
            }
        }
        tracing::debug!(payloads = payloads.len(), "loaded inputs");
        Ok(payloads)
    }

    /// Decodes every payload in parallel; list responses expand to their items.
    fn decode_all(&self) -> Result<Vec<Decoded>> {
        let list = self.list;
        let decoded = self
            .load()?
            .into_par_iter()
            .map(|(source, payload)| -> Result<Vec<Decoded>> {
                if list {
                    let response = PolicyList::decode(&payload).with_context(|| format!("failed to decode {source}"))?;
                    Ok(response
                        .items
                        .into_iter()
                        .enumerate()
                        .map(|(index, document)| Decoded { source: format!("{source}#items[{index}]"), document })
                        .collect())
                } else {
                    let document =
                        PolicyDocument::decode(&payload).with_context(|| format!("failed to decode {source}"))?;
                    Ok(vec![Decoded { source, document }])
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(decoded.into_iter().flatten().collect())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_directive(&self) -> Option<&str> {
        self.log.as_deref()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Decode(target) => {
                let decoded = target.input_settings.decode_all()?;
                let encoded = decoded
                    .iter()
                    .map(|entry| {
                        if target.as_input {
                            serde_json::to_value(entry.document.to_input())
                        } else {
                            serde_json::to_value(&entry.document)
                        }
                    })
                    .collect::<serde_json::Result<Vec<_>>>()
                    .context("failed to encode policies")?;
                let out_value = match <[Value; 1]>::try_from(encoded) {
                    Ok([single]) => single,
                    Err(many) => Value::Array(many),
                };
                let out_src = serde_json::to_string_pretty(&out_value)?;
                write_output(target.out.as_deref(), &out_src)
            }
            Command::Validate(target) => {
                let decoded = target.input_settings.decode_all()?;
                let reports = decoded
                    .par_iter()
                    .map(|entry| build_report(entry, target.strict_references))
                    .collect::<Result<Vec<_>>>()?;
                let out_src = match target.format {
                    ReportFormat::Json => serde_json::to_string_pretty(&reports)?,
                    ReportFormat::Text => render_reports(&reports, target.strict_references),
                };
                write_output(target.out.as_deref(), &out_src)?;
                let invalid = reports.iter().filter(|report| !report.valid).count();
                if invalid > 0 {
                    bail!("{invalid} of {} policies failed validation", reports.len());
                }
                Ok(())
            }
            Command::Inspect(target) => {
                for entry in target.input_settings.decode_all()? {
                    println!("{}", render_summary(&entry)?);
                }
                Ok(())
            }
        }
    }
}

fn build_report(entry: &Decoded, strict_references: bool) -> Result<Report> {
    let violations = entry.document.validate().err().map(|errors| errors.into_inner()).unwrap_or_default();
    let unresolved_references = entry
        .document
        .unresolved_references()
        .with_context(|| format!("failed to scan references in {}", entry.source))?;
    let valid = violations.is_empty() && (!strict_references || unresolved_references.is_empty());
    Ok(Report {
        source: entry.source.clone(),
        id: entry.document.id().to_owned(),
        kind: entry.document.kind().to_string(),
        valid,
        violations,
        unresolved_references,
    })
}

fn render_reports(reports: &[Report], strict_references: bool) -> String {
    let mut out = String::new();
    for report in reports {
        let status = if report.valid { "✅ valid".green() } else { "❌ invalid".red().bold() };
        out.push_str(&format!("{status} {} ({} policy `{}`)\n", report.source, report.kind, report.id));
        for (field, message) in &report.violations {
            out.push_str(&format!("    {}: {message}\n", field.yellow()));
        }
        for name in &report.unresolved_references {
            let line = format!("    undeclared variable `{name}`");
            if strict_references {
                out.push_str(&format!("{}\n", line.red()));
            } else {
                out.push_str(&format!("{}\n", line.dimmed()));
            }
        }
    }
    out
}

fn render_summary(entry: &Decoded) -> Result<String> {
    let document = &entry.document;
    let metadata = document.metadata();
    let mut out = format!(
        "{} {}\n  kind: {}\n  version: {} (previous {})\n",
        entry.source.bold(),
        document.id(),
        document.kind(),
        metadata.version,
        metadata.previous_version,
    );
    if let Some(rollout) = &metadata.rollout_info {
        out.push_str(&format!("  rollout: {}\n", render_rollout(rollout)));
    }
    if document.kind() == PolicyKind::Image {
        let pre = document.transformations();
        let post = document.post_breakpoint_transformations();
        out.push_str(&format!(
            "  transformations: {} top-level, {} nodes, depth {}\n",
            pre.len(),
            pre.iter().map(TransformationNode::node_count).sum::<usize>(),
            pre.iter().map(TransformationNode::depth).max().unwrap_or(0),
        ));
        out.push_str(&format!(
            "  post-breakpoint: {} top-level, {} nodes, depth {}\n",
            post.len(),
            post.iter().map(TransformationNode::node_count).sum::<usize>(),
            post.iter().map(TransformationNode::depth).max().unwrap_or(0),
        ));
    }
    let variables: Vec<String> =
        document.variables().iter().map(|variable| format!("{} ({})", variable.name, variable.var_type)).collect();
    out.push_str(&format!("  variables: {}\n", list_or_none(&variables)));
    let unresolved = document
        .unresolved_references()
        .with_context(|| format!("failed to scan references in {}", entry.source))?;
    out.push_str(&format!("  unresolved references: {}", list_or_none(&unresolved)));
    Ok(out)
}

fn render_rollout(rollout: &RolloutInfo) -> String {
    let at = |seconds: i64| {
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| format!("@{seconds}"))
    };
    format!("{} → {} over {}s", at(rollout.start_time), at(rollout.end_time), rollout.rollout_duration)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() { "none".to_owned() } else { items.join(", ") }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{contents}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decoded(raw: &str) -> Decoded {
        let document = PolicyDocument::decode(&serde_json::from_str(raw).unwrap()).unwrap();
        Decoded { source: "fixture".to_owned(), document }
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = CommandLineInterface::try_parse_from([
            "ivm-policy",
            "--log",
            "debug",
            "validate",
            "-i",
            "fixtures/*.json",
            "--format",
            "json",
            "--strict-references",
        ])
        .unwrap();
        assert_eq!(cli.log_directive(), Some("debug"));
        let Command::Validate(target) = &cli.cmd else { panic!("expected validate") };
        assert_eq!(target.format, ReportFormat::Json);
        assert!(target.strict_references);
        assert_eq!(target.input_settings.input, vec!["fixtures/*.json"]);
    }

    #[test]
    fn glob_patterns_resolve() {
        let paths = resolve_file_path_patterns([concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/*.json")]).unwrap();
        assert!(paths.len() >= 4);
        assert!(resolve_file_path_patterns([concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/*.nothing")]).is_err());
    }

    #[test]
    fn strict_references_flip_validity() {
        let entry = decoded(include_str!("../fixtures/post_breakpoint.json"));
        let lenient = build_report(&entry, false).unwrap();
        assert_eq!(lenient.unresolved_references, vec!["MaxDimOld", "MinDim"]);
        assert_eq!(lenient.violations.len(), 1);

        let entry = decoded(include_str!("../fixtures/video.json"));
        assert!(build_report(&entry, true).unwrap().valid);
    }

    #[test]
    fn summary_mentions_rollout_and_counts() {
        let summary = render_summary(&decoded(include_str!("../fixtures/post_breakpoint.json"))).unwrap();
        assert!(summary.contains("2021-12-07 16:20:35 UTC"));
        assert!(summary.contains("3 top-level, 5 nodes, depth 2"));
        assert!(summary.contains("2 top-level, 8 nodes, depth 5"));
        assert!(summary.contains("MaxDimOld, MinDim"));
    }
}
