//! Minimal CLI: decode → normalize → print
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use zero_trim::jobs::{
    Job, JobClient, JobQuery, JobsResponse, Task, DEFAULT_HOST, DEFAULT_SCHEME, DEFAULT_TIMEOUT,
};
use zero_trim::{Normalizer, Record, Report};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode JSON payloads into typed records and print them with empty fields collapsed
#[derive(Parser, Debug)]
#[command(name = "zero-trim", version)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// normalize JSON/NDJSON documents read from files
    Normalize(NormalizeOut),
    /// fetch jobs from the job service and normalize them
    Jobs(JobsOut),
}

/// record type each input document is decoded into
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Job,
    /// job envelope; each job in it is normalized as a record of its own
    JobsResponse,
    Task,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is a document
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// list every collapsed or cleared field on stderr
    #[arg(long)]
    explain: bool,
}

#[derive(clap::Parser, Debug)]
struct NormalizeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum)]
    kind: RecordKind,

    #[command(flatten)]
    output_settings: OutputSettings,
}

#[derive(clap::Parser, Debug)]
struct JobsOut {
    /// job service host (host[:port])
    #[arg(long, env = "ZERO_TRIM_JOBS_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// http or https
    #[arg(long, env = "ZERO_TRIM_JOBS_SCHEME", default_value = DEFAULT_SCHEME)]
    scheme: String,

    /// request timeout in seconds
    #[arg(long, env = "ZERO_TRIM_JOBS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    #[arg(long)]
    limit: Option<u32>,

    #[arg(long)]
    offset: Option<u32>,

    #[arg(long)]
    task_type: Option<String>,

    #[arg(long)]
    issuer: Option<String>,

    /// print the request URL on stderr before fetching
    #[arg(long)]
    print_url: bool,

    #[command(flatten)]
    output_settings: OutputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every input document, tagged with where it came from.
    fn load_documents(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {origin}"))?;

            let parsed = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(ix, line)| {
                        let at = format!("{origin}:{}", ix + 1);
                        serde_json::from_str::<Value>(line)
                            .with_context(|| format!("failed to parse JSON at {at}"))
                            .map(|value| (at, value))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({origin})"))?;
                vec![(origin.clone(), value)]
            };

            for (at, value) in parsed {
                let value = match self.json_pointer.as_deref() {
                    None => value,
                    Some(pointer) => value
                        .pointer(pointer)
                        .cloned()
                        .with_context(|| format!("JSON pointer {pointer} selects nothing in {at}"))?,
                };
                match self.jq_expr.as_deref() {
                    None => documents.push((at, value)),
                    Some(jq_expr) => {
                        let outputs = crate::jq_exec::apply_filter(jq_expr, &value)
                            .with_context(|| format!("failed to apply jq expression to {at}"))?;
                        for (ix, value) in outputs.into_iter().enumerate() {
                            documents.push((format!("{at}#{ix}"), value));
                        }
                    }
                }
            }
        }
        Ok(documents)
    }
}

impl OutputSettings {
    fn emit(&self, rendered: &[String], report: &Report) -> Result<()> {
        if self.explain {
            explain(report);
        }
        let text = rendered.join("\n");
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, text + "\n")
                    .with_context(|| format!("failed to write {}", out.display()))?;
            }
            None => println!("{text}"),
        }
        tracing::info!(
            records = report.records,
            fields = report.fields,
            collapsed = report.collapsed.len(),
            cleared = report.cleared.len(),
            "done"
        );
        Ok(())
    }
}

impl JobsOut {
    fn client(&self) -> JobClient {
        JobClient::new()
            .with_host(&self.host)
            .with_scheme(&self.scheme)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    fn query(&self) -> JobQuery {
        JobQuery {
            limit: self.limit,
            offset: self.offset,
            task_type: self.task_type.clone(),
            issuer: self.issuer.clone(),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Normalize(target) => {
                let documents = target.input_settings.load_documents()?;
                tracing::info!(documents = documents.len(), kind = ?target.kind, "loaded");
                let (rendered, report) = match target.kind {
                    RecordKind::Job => normalize_all::<Job>(documents, |n, job| n.normalize(job))?,
                    RecordKind::JobsResponse => {
                        normalize_all::<JobsResponse>(documents, |n, resp| resp.normalize_each(n))?
                    }
                    RecordKind::Task => normalize_all::<Task>(documents, |n, task| n.normalize(task))?,
                };
                target.output_settings.emit(&rendered, &report)
            }
            Command::Jobs(target) => {
                let client = target.client();
                let query = target.query();
                if target.print_url {
                    eprintln!("{}", client.jobs_url(&query)?);
                }
                let mut response = client.fetch_jobs(&query).context("failed to fetch jobs")?;

                let mut normalizer = Normalizer::new();
                response.normalize_each(&mut normalizer)?;
                let rendered = vec![serde_json::to_string_pretty(&response)?];
                target.output_settings.emit(&rendered, normalizer.report())
            }
        }
    }
}

/// Decode every document as `R`, normalize them in parallel with `step` and
/// render them back to pretty JSON.
fn normalize_all<R>(
    documents: Vec<(String, Value)>,
    step: fn(&mut Normalizer, &mut R) -> zero_trim::Result<()>,
) -> Result<(Vec<String>, Report)>
where
    R: Record + DeserializeOwned + Serialize + Send,
{
    let mut records = documents
        .into_iter()
        .map(|(at, value)| {
            zero_trim::path_de::from_value_with_path::<R>(value)
                .with_context(|| format!("failed to decode {at}"))
        })
        .collect::<Result<Vec<R>>>()?;

    let reports = records
        .par_iter_mut()
        .map(|record| -> zero_trim::Result<Report> {
            let mut normalizer = Normalizer::new();
            step(&mut normalizer, record)?;
            Ok(normalizer.into_report())
        })
        .collect::<zero_trim::Result<Vec<Report>>>()?;

    let mut report = Report::default();
    for part in reports {
        report += part;
    }

    let rendered = records
        .iter()
        .map(serde_json::to_string_pretty)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((rendered, report))
}

fn explain(report: &Report) {
    for path in &report.collapsed {
        eprintln!("{} {}", "collapsed".yellow(), path);
    }
    for path in &report.cleared {
        eprintln!("{} {}", "cleared".cyan(), path.as_str().dimmed());
    }
    eprintln!(
        "{}",
        format!("{} records, {} fields", report.records, report.fields).bold()
    );
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
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

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
