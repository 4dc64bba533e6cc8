use crate::core::column;
use crate::core::formula::{self, FormulaError, Value};
use crate::core::{
    build_mappings, prepare_output_dir, BatchOrchestrator, BatchReport, DocumentReport,
    MappingOutcome, MappingReport, MappingSpec, RawMapping, TransformOutcome,
};
use crate::error::{TransferError, TransferResult};
use crate::job::{parse_job, JobConfig};
use colored::Colorize;
use std::path::PathBuf;

/// Everything `run` accepts on the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub sources: Vec<PathBuf>,
    pub template: Option<PathBuf>,
    pub output: Option<String>,
    pub maps: Vec<String>,
    pub job: Option<PathBuf>,
    pub json: bool,
}

/// A validated batch, ready to run
#[derive(Debug, Clone, PartialEq)]
struct RunPlan {
    template: PathBuf,
    output: String,
    sources: Vec<PathBuf>,
    mappings: Vec<MappingSpec>,
}

/// Merge job file and flags, then validate; nothing on disk is touched
fn plan(options: &RunOptions) -> TransferResult<RunPlan> {
    let job = match &options.job {
        Some(path) => parse_job(path)?,
        None => JobConfig::default(),
    };

    let sources = if options.sources.is_empty() {
        job.sources
    } else {
        options.sources.clone()
    };
    if sources.is_empty() {
        return Err(TransferError::NoSources);
    }

    let template = options
        .template
        .clone()
        .or(job.template)
        .ok_or(TransferError::NoTemplate)?;
    if !template.is_file() {
        return Err(TransferError::TemplateNotFound { path: template });
    }

    let raw: Vec<RawMapping> = if options.maps.is_empty() {
        job.mappings
    } else {
        options.maps.iter().map(|m| RawMapping::parse_cli(m)).collect()
    };
    let mappings = build_mappings(&raw)?;

    let output = options
        .output
        .clone()
        .or(job.output)
        .unwrap_or_default();

    Ok(RunPlan {
        template,
        output,
        sources,
        mappings,
    })
}

/// Execute the run command
pub fn run(options: RunOptions) -> TransferResult<()> {
    let plan = plan(&options)?;
    let output_dir = prepare_output_dir(&plan.template, &plan.output)?;

    if !options.json {
        println!("{}", "📋 Cell transfer".bold().green());
        println!("   Template: {}", plan.template.display());
        println!("   Output:   {}", output_dir.display());
        println!(
            "   {} source file(s), {} mapping(s)\n",
            plan.sources.len(),
            plan.mappings.len()
        );
    }

    let batch = BatchOrchestrator::new(&plan.template, &plan.mappings, output_dir);
    let report = batch.run(&plan.sources);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let (succeeded, total) = report.tally();
    if succeeded == 0 {
        return Err(TransferError::BatchFailed { total });
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    for document in &report.documents {
        print_document(document);
    }

    let (succeeded, total) = report.tally();
    let summary = format!(
        "Successfully processed {} out of {} source file(s)",
        succeeded, total
    );
    println!();
    if succeeded == total {
        println!("{}", format!("✅ {}", summary).bold().green());
    } else if succeeded > 0 {
        println!("{}", format!("⚠️  {}", summary).bold().yellow());
    } else {
        println!("{}", format!("❌ {}", summary).bold().red());
    }
}

fn print_document(document: &DocumentReport) {
    println!("{}", document.source.display().to_string().bold());
    for mapping in &document.mappings {
        println!("   {}", describe_mapping(mapping));
    }
    match (&document.output, &document.error) {
        (_, Some(error)) => println!("   {}", format!("❌ {}", error).red()),
        (Some(output), None) => println!(
            "   {}",
            format!(
                "✅ {} of {} mapping(s) written → {}",
                document.mappings_written(),
                document.mappings.len(),
                output.display()
            )
            .green()
        ),
        (None, None) => {}
    }
}

/// One status line for a mapping
fn describe_mapping(mapping: &MappingReport) -> String {
    let route = format!("{} → {}", mapping.from, mapping.to);
    match &mapping.outcome {
        MappingOutcome::Written { value, transform } => match transform {
            TransformOutcome::NotRequested => format!("{}: {}", route, display_value(value)),
            TransformOutcome::Applied { original } => format!(
                "{}: {} ⇒ {}",
                route,
                display_value(original),
                display_value(value)
            ),
            TransformOutcome::FellBack { reason } => format!(
                "{}: {} {}",
                route,
                display_value(value),
                format!("(formula skipped: {})", reason).yellow()
            ),
        },
        MappingOutcome::ReadFailed { reason } => {
            format!("{}: {}", route, format!("read failed: {}", reason).red())
        }
        MappingOutcome::WriteFailed { reason, .. } => {
            format!("{}: {}", route, format!("write failed: {}", reason).red())
        }
    }
}

fn display_value(value: &crate::types::CellValue) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        format!("'{}'", value)
    }
}

/// Interpret a command-line test value the way a spreadsheet cell would hold it
fn parse_x_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Empty;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Value::Float(n);
    }
    match trimmed.to_lowercase().as_str() {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => Value::Text(raw.to_string()),
    }
}

/// Execute the test-formula command
pub fn test_formula(formula: String, x: Option<String>) -> TransferResult<()> {
    let Some(raw) = x else {
        let preview = formula::preview(&formula);
        match preview {
            formula::FormulaPreview::Invalid => {
                println!("{}", preview.to_string().bold().red());
                // Re-run to surface the cause
                let cause = formula::evaluate(&formula, 1)
                    .err()
                    .unwrap_or(FormulaError::Empty);
                return Err(TransferError::Formula {
                    formula,
                    source: cause,
                });
            }
            _ => println!("{}", preview.to_string().bold().green()),
        }
        return Ok(());
    };

    let value = parse_x_value(&raw);
    match formula::evaluate(&formula, value) {
        Ok(result) => {
            println!("{}", format!("X={} -> {}", raw, result).bold().green());
            Ok(())
        }
        Err(source) => {
            println!("{}", "Invalid equation".bold().red());
            Err(TransferError::Formula { formula, source })
        }
    }
}

/// Execute the column command
pub fn column(label: String) -> TransferResult<()> {
    let index = column::resolve(&label)?;
    println!("{} → {}", label.trim().to_uppercase().bold(), index);
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
