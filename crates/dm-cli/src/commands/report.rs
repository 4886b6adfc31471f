//! Report commands: fetch, enrich, then print, export or sync

use anyhow::{Context, Result};
use dm_core::OutputRecord;
use dm_store::ListStore;
use dm_sync::{
    collect_records, export_to_path, resolve_filter, write_csv, write_json, ExportFormat,
    Pipeline, PipelineKind, Reconciler, SinkMapping,
};
use std::io::Write;

use crate::cli::{GlobalArgs, OutputFormat, ReportArgs};
use crate::commands::common::{print_plan, print_summary, print_table, ExitCode};
use crate::context::RuntimeContext;
use crate::progress::BarProgress;

/// Exit status when the run completed but some writes failed
const EXIT_APPLY_FAILURES: i32 = 2;

/// Execute one report pipeline
pub(crate) async fn execute(
    kind: PipelineKind,
    args: &ReportArgs,
    global: &GlobalArgs,
) -> Result<()> {
    let export_format = args
        .out
        .as_deref()
        .map(|path| {
            ExportFormat::from_path(path).with_context(|| {
                format!(
                    "Cannot tell the export format of {}; use a .csv or .json file",
                    path.display()
                )
            })
        })
        .transpose()?;

    let ctx = RuntimeContext::new(global)?;
    let pipeline = kind.pipeline();
    let pipeline_config = kind.config(&ctx.config);

    // --filter > pipelines.<name>.filter > built-in default
    let expression = args
        .filter
        .as_deref()
        .or(pipeline_config.filter.as_deref());
    let filter = resolve_filter(pipeline.as_ref(), expression).context("Invalid filter")?;

    // Resolve the destination before fetching so a bad sink fails fast
    let sink = if args.sync {
        let sink_name = pipeline_config.sink.as_deref().with_context(|| {
            format!(
                "No sink configured for '{}'; set pipelines.{}.sink in dirmirror.yml",
                kind,
                kind.config_key()
            )
        })?;
        let sink_config = ctx.config.get_sink(sink_name, ctx.target.as_deref())?;
        let mapping =
            SinkMapping::from_config(sink_config, pipeline.fields(), pipeline.key_field())?;
        let store = ctx.open_sink(sink_config).await?;
        Some((store, mapping))
    } else {
        None
    };

    let progress = BarProgress::new();
    let records = collect_records(
        pipeline.as_ref(),
        &*ctx.client,
        &filter,
        &ctx.enrich_context(),
        &progress,
    )
    .await
    .with_context(|| format!("Failed to build the {} report", kind))?;

    if let (Some(path), Some(format)) = (&args.out, export_format) {
        export_to_path(path, format, pipeline.fields(), &records)?;
        println!("Wrote {} record(s) to {}", records.len(), path.display());
    } else if sink.is_none() {
        print_records(pipeline.as_ref(), &records, args.output)?;
    }

    match sink {
        Some((store, mapping)) => sync(&*store, mapping, records, args, &progress).await,
        None => Ok(()),
    }
}

fn print_records(
    pipeline: &dyn Pipeline,
    records: &[OutputRecord],
    format: OutputFormat,
) -> Result<()> {
    let stdout = std::io::stdout();
    match format {
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|record| {
                    pipeline
                        .fields()
                        .iter()
                        .map(|f| record.get(f).map(|v| v.render()).unwrap_or_default())
                        .collect()
                })
                .collect();
            print_table(pipeline.fields(), &rows);
            println!("\n{} {} record(s)", records.len(), pipeline.name());
        }
        OutputFormat::Json => write_json(stdout.lock(), records)?,
        OutputFormat::Csv => write_csv(stdout.lock(), pipeline.fields(), records)?,
    }
    stdout.lock().flush()?;
    Ok(())
}

async fn sync(
    store: &dyn ListStore,
    mapping: SinkMapping,
    records: Vec<OutputRecord>,
    args: &ReportArgs,
    progress: &BarProgress,
) -> Result<()> {
    let reconciler = Reconciler::new(store, mapping);
    let destination = store.describe();

    if args.dry_run {
        let planned = reconciler
            .plan(records)
            .await
            .with_context(|| format!("Failed to read {}", destination))?;
        print_plan(&planned);
        return Ok(());
    }

    let summary = reconciler
        .reconcile(records, progress)
        .await
        .with_context(|| format!("Failed to read {}", destination))?;

    if args.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &destination);
    }

    if !summary.is_success() {
        return Err(ExitCode(EXIT_APPLY_FAILURES).into());
    }
    Ok(())
}
