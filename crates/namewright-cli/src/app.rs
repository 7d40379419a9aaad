//! One preview (and optionally apply) pass driven by command-line arguments.
use crate::cli::Cli;
use crate::report;
use crate::state::RenameSession;
use anyhow::{bail, Context, Result};
use namewright_core::model::ApplyOptions;
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on a single plan computation.
const PLAN_TIMEOUT: Duration = Duration::from_secs(600);

/// Scan, preview and optionally apply. Returns a failure exit code when any
/// rename in the batch failed.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let (search, replace) = cli.settings()?;

    let mut session = RenameSession::new();
    session.set_settings(search, replace)?;
    session.scan(cli.paths.clone())?;
    if !session.wait_for_plan(PLAN_TIMEOUT) {
        bail!("Planning did not finish within {}s", PLAN_TIMEOUT.as_secs());
    }

    if !cli.select.is_empty() {
        session.select_only(&cli.select);
    }
    for path in &cli.exclude {
        session.set_selected(path, false);
    }

    info!(
        renames = session.rename_count(),
        selected = session.selected_count(),
        "Preview ready"
    );

    if let Some(path) = &cli.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file: {}", path.display()))?;
        let rows = report::export_csv(&session.plan, &session.selection, BufWriter::new(file))?;
        info!(rows, path = %path.display(), "Preview exported");
    }

    if !cli.apply {
        print_preview(&session, cli.json)?;
        return Ok(ExitCode::SUCCESS);
    }

    if !session.can_apply() {
        print_preview(&session, cli.json)?;
        info!("Nothing selected to rename");
        return Ok(ExitCode::SUCCESS);
    }

    let plan = session.plan.clone();
    let selection = session.selection.clone();
    let results = session.apply(ApplyOptions {
        close_after: cli.close,
    })?;

    if cli.json {
        println!("{}", report::to_json(&plan, &selection, Some(&results))?);
    } else {
        print!("{}", report::render_summary(&results));
    }

    if !cli.close {
        if session.wait_for_plan(PLAN_TIMEOUT) {
            info!(remaining = session.rename_count(), "Re-scanned after apply");
        } else if let Some(err) = &session.last_error {
            warn!(error = %err, "Re-scan after apply failed");
        } else {
            warn!("Re-plan after apply did not finish");
        }
    }

    Ok(if results.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_preview(session: &RenameSession, json: bool) -> Result<()> {
    if json {
        println!("{}", report::to_json(&session.plan, &session.selection, None)?);
    } else if session.rename_count() == 0 {
        println!("No renames proposed");
    } else {
        print!("{}", report::render_preview(&session.plan, &session.selection));
    }
    Ok(())
}
