//! Patchwright - patch suggestions and validation for the minilogue xd
//!
//! Validates full patch documents, reconciles raw model replies into accepted
//! suggestions, and renders the catalog and request shapes sent to a model.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use patchwright_adapters::{catalog_store, init_logging, Config};
use patchwright_core::{
    Catalog, CatalogError, PatchValue, Suggestion, ValidationError, ValidationErrorKind,
    ValidationReport,
};
use patchwright_engine::error::ModelError;
use patchwright_engine::{
    ChatRequest, ModelReply, PatchModel, ReconcileError, ReconcileRequest, Reconciler,
    ResponseFormat, SuggestSettings, SuggestionService,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "patchwright",
    about = "Patch suggestion reconciliation and validation for the minilogue xd",
    version
)]
struct Args {
    /// Parameter descriptor (defaults to config, then discovery)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Model name to request or report
    #[arg(long, global = true)]
    model: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate full patch documents (files or directories of *.json)
    Validate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Reconcile a raw model reply into an accepted suggestion
    Reconcile {
        /// The user prompt the reply answers
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        client_request_id: Option<String>,
        /// File holding the raw reply, or `-` for stdin
        response: PathBuf,
    },
    /// Print the prompt catalog
    Catalog {
        /// Controls per group (defaults to config)
        #[arg(long)]
        limit: Option<usize>,
        /// Resolve every alias and fail on cycles or dangling targets
        #[arg(long)]
        check: bool,
    },
    /// Print the chat request that would be sent for a prompt
    ResponseFormat {
        #[arg(long, default_value = "Warm evolving pad")]
        prompt: String,
        /// Show the JSON-mode fallback instead of the strict schema
        #[arg(long)]
        json_object: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load();
    let schema_path = config.resolve_schema_path(args.schema.as_deref())?;
    let store = catalog_store::install(schema_path);
    let catalog = store
        .get()
        .with_context(|| format!("Failed to load catalog from {}", store.path().display()))?;
    let settings = suggest_settings(&config, args.model.as_deref());

    match args.command {
        Command::Validate { paths } => run_validate(&catalog, &paths),
        Command::Reconcile {
            prompt,
            client_request_id,
            response,
        } => run_reconcile(
            &catalog,
            ReconcileRequest {
                prompt: &prompt,
                client_request_id: client_request_id.as_deref(),
                reply_model: args.model.as_deref(),
            },
            &response,
            &settings,
        ),
        Command::Catalog { limit, check } => {
            if check {
                catalog.schema().verify_aliases()?;
                eprintln!(
                    "  + {} parameters in {} groups, all aliases resolve",
                    catalog.schema().parameter_count(),
                    catalog.schema().groups().len()
                );
            }
            let limit = limit.unwrap_or(settings.prompt_subset_limit);
            println!("{}", catalog.controls().build_prompt_catalog(limit));
            Ok(ExitCode::SUCCESS)
        }
        Command::ResponseFormat {
            prompt,
            json_object,
        } => {
            let service = SuggestionService::new(catalog, Offline, settings);
            let prompt = patchwright_engine::llm::check_prompt(
                &prompt,
                service.settings().max_prompt_chars,
            )?;
            let mut request = service.build_request(prompt);
            if json_object {
                request = request.with_response_format(ResponseFormat::json_object());
            }
            print_json(&request)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Config values with CLI overrides applied.
fn suggest_settings(config: &Config, model: Option<&str>) -> SuggestSettings {
    let defaults = SuggestSettings::default();
    SuggestSettings {
        model: model
            .or(config.model.as_deref())
            .map(str::to_string)
            .unwrap_or(defaults.model),
        prompt_subset_limit: config
            .prompt_subset_limit
            .unwrap_or(defaults.prompt_subset_limit),
        max_prompt_chars: config.max_prompt_chars.unwrap_or(defaults.max_prompt_chars),
    }
}

/// Model stand-in for commands that only build requests.
struct Offline;

impl PatchModel for Offline {
    fn complete(&self, _request: &ChatRequest) -> Result<ModelReply, ModelError> {
        Err(ModelError::Transport(
            "no model transport is configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    #[serde(flatten)]
    report: ValidationReport,
}

fn run_validate(catalog: &Catalog, paths: &[PathBuf]) -> Result<ExitCode> {
    let files = collect_json_files(paths)?;
    if files.is_empty() {
        bail!("No .json files found under the given paths");
    }

    let results: Vec<Result<FileReport, CatalogError>> = files
        .par_iter()
        .map(|path| validate_file(catalog, path))
        .collect();

    let mut failed = 0usize;
    for result in results {
        let report = result?;
        if !report.report.valid {
            failed += 1;
        }
        print_json(&report)?;
    }

    tracing::info!(files = files.len(), failed, "validation finished");
    if failed > 0 {
        eprintln!("  ! {} of {} documents failed validation", failed, files.len());
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Explicit files are taken as given; directories contribute every `*.json`
/// beneath them, sorted.
fn collect_json_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
                let is_json = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if entry.file_type().is_file() && is_json {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Unreadable or non-JSON files become failed reports. Only a broken
/// catalog stops the batch.
fn validate_file(catalog: &Catalog, path: &Path) -> Result<FileReport, CatalogError> {
    let parsed = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file: {}", e))
        .and_then(|content| {
            serde_json::from_str::<PatchValue>(&content)
                .map_err(|e| format!("Patch payload is not valid JSON: {}", e))
        });

    let report = match parsed {
        Ok(document) => catalog.validate_document(&document)?.into_report(),
        Err(message) => {
            tracing::debug!(path = %path.display(), error = %message, "unreadable patch document");
            ValidationReport {
                valid: false,
                errors: Some(vec![ValidationError::new(
                    ValidationErrorKind::InvalidPayload,
                    "patch",
                    None,
                    message,
                )]),
            }
        }
    };
    Ok(FileReport {
        path: path.display().to_string(),
        report,
    })
}

/// `request.reply_model` carries an explicit `--model`, which names the
/// model that produced the reply.
fn run_reconcile(
    catalog: &Catalog,
    request: ReconcileRequest<'_>,
    response: &Path,
    settings: &SuggestSettings,
) -> Result<ExitCode> {
    let raw = read_response(response)?;
    match reconcile_reply(catalog, &raw, request, settings)? {
        Ok(suggestion) => {
            print_json(&suggestion)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            print_json(&report)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Accepted suggestion, or the validation report for a rejected one.
fn reconcile_reply(
    catalog: &Catalog,
    raw: &str,
    request: ReconcileRequest<'_>,
    settings: &SuggestSettings,
) -> Result<Result<Suggestion, ValidationReport>> {
    let prompt = patchwright_engine::llm::check_prompt(request.prompt, settings.max_prompt_chars)?;
    let request = ReconcileRequest { prompt, ..request };

    match Reconciler::new(catalog).reconcile(raw, request) {
        Ok(suggestion) => Ok(Ok(suggestion)),
        Err(ReconcileError::Validation { errors, .. }) => Ok(Err(ValidationReport {
            valid: false,
            errors: Some(errors),
        })),
        Err(err) => Err(err.into()),
    }
}

fn read_response(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read reply from stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
