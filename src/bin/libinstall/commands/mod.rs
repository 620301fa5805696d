//! Command implementations

pub mod completions;
pub mod install;
pub mod status;

use anyhow::Result;

use crate::cli::GlobalArgs;
use libinstall::core::Project;
use libinstall::util::GlobalContext;

/// Build the global context from the command-line flags.
pub fn global_context(global: &GlobalArgs) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global.verbose);
    ctx.set_color(!global.no_color);
    Ok(ctx)
}

/// Load the project named by `--manifest-path`, or the nearest one.
pub fn load_project(ctx: &GlobalContext, global: &GlobalArgs) -> Result<Project> {
    let manifest_path = match &global.manifest_path {
        Some(path) => ctx.cwd().join(path),
        None => ctx.find_manifest()?,
    };

    Project::new(&manifest_path, ctx)
}
