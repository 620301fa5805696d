//! `libinstall status` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use libinstall::ops::status;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = super::global_context(global)?;
    let project = super::load_project(&ctx, global)?;
    let plan = status(&project)?;

    for record in &plan.diff.to_remove {
        println!("remove     {} {}", record.name, record.version);
    }
    for planned in &plan.diff.to_fetch {
        println!(
            "{:<10} {} {}",
            planned.reason.to_string(),
            planned.record.name,
            planned.record.version
        );
    }
    for record in &plan.diff.unchanged {
        println!("unchanged  {} {}", record.name, record.version);
    }

    if plan.resolution.is_empty() && plan.previous.is_empty() {
        println!("No libraries declared");
    }

    Ok(())
}
