//! `libinstall install` and `libinstall update` commands

use anyhow::Result;

use crate::cli::{GlobalArgs, InstallArgs};
use libinstall::ops::{install, InstallOptions};
use libinstall::util::diagnostic::{self, Diagnostic};
use libinstall::util::fs::relative_path;

pub fn execute(global: &GlobalArgs, args: InstallArgs) -> Result<()> {
    let ctx = super::global_context(global)?;
    let project = super::load_project(&ctx, global)?;

    let opts = InstallOptions {
        dry_run: args.dry_run,
    };

    let report = install(&project, &opts)?;
    let diff = &report.plan.diff;

    let Some(reconciled) = report.reconciled else {
        for record in &diff.to_remove {
            eprintln!("Would remove {} ({})", record.name, record.version);
        }
        for planned in &diff.to_fetch {
            eprintln!(
                "Would install {} ({}, {})",
                planned.record.name, planned.record.version, planned.reason
            );
        }
        if diff.is_empty() {
            eprintln!("Nothing to install or remove");
        }
        return Ok(());
    };

    for fetched in &reconciled.fetched {
        eprintln!(
            "   Installed {} {} ({}) into {}",
            fetched.name,
            fetched.version,
            fetched.reason,
            relative_path(project.root(), &fetched.path).display()
        );
    }
    for name in &reconciled.removed {
        eprintln!("     Removed {}", name);
    }
    if ctx.is_verbose() {
        for path in &reconciled.pruned {
            eprintln!("      Pruned {}", path);
        }
    }
    for (name, err) in &reconciled.removal_failures {
        let diag = Diagnostic::warning(format!("could not remove library `{}`", name))
            .with_context(err.source.to_string())
            .with_location(relative_path(project.root(), &err.path));
        diagnostic::emit(&diag, ctx.color());
    }

    if diff.is_empty() {
        eprintln!("    Finished {} libraries up to date", reconciled.unchanged.len());
    } else {
        eprintln!(
            "    Finished {} installed, {} removed, {} unchanged",
            reconciled.fetched.len(),
            reconciled.removed.len(),
            reconciled.unchanged.len()
        );
    }

    Ok(())
}
