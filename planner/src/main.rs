//! Platform snapshot CLI entrypoint.
//!
//! Reads the module inventory, runs one generation pass per requested image,
//! and either prints the plans or realises them on disk.

use camino::Utf8Path;
use clap::Parser;
use platform_snapshot::SnapshotConfig;
use platform_snapshot_planner::cli::Cli;
use platform_snapshot_planner::error::Result;
use platform_snapshot_planner::executor::Executor;
use platform_snapshot_planner::image::ImageFamily;
use platform_snapshot_planner::inventory::{JsonInventory, ModuleSource};
use platform_snapshot_planner::logging;
use platform_snapshot_planner::output::{
    DryRunInfo, plan_text, skipped_message, success_message, write_stderr_line,
};
use platform_snapshot_planner::packager::MakeVars;
use platform_snapshot_planner::pass::generate_from;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if logging::init(cli.verbosity, cli.quiet).is_err() {
        write_stderr_line(&mut stderr, "warning: logger already installed");
    }
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let families = cli.families();

    if cli.dry_run {
        print_dry_run_info(cli, &families, &config, stderr);
        return Ok(());
    }

    let inventory = JsonInventory::new(cli.inventory.clone());
    let executor = Executor::new(cli.out_dir.clone(), cli.source_root.clone());
    let mut vars = MakeVars::new();
    for family in families {
        if let Some(family_vars) = run_family(cli, family, &inventory, &executor, &config, stderr)?
        {
            vars.extend(family_vars);
        }
    }

    if let Some(path) = &cli.make_vars {
        executor.write_make_vars(path, &vars)?;
    }
    Ok(())
}

/// Runs one pass and returns its build variables, or `None` when skipped.
fn run_family(
    cli: &Cli,
    family: ImageFamily,
    inventory: &dyn ModuleSource,
    executor: &Executor,
    config: &SnapshotConfig,
    stderr: &mut dyn Write,
) -> Result<Option<MakeVars>> {
    let policy = family.policy(config);
    let Some(plan) = generate_from(inventory, policy.as_ref(), config, cli.fake)? else {
        if !cli.quiet {
            write_stderr_line(stderr, skipped_message(family, policy.snapshot_version()));
        }
        return Ok(None);
    };

    if cli.execute {
        let report = executor.execute(&plan)?;
        if !cli.quiet {
            write_stderr_line(stderr, success_message(&report));
        }
    } else if !cli.quiet {
        write_stderr_line(stderr, plan_text(&plan, cli.verbosity > 0));
        write_stderr_line(stderr, "");
    }

    Ok(Some(plan.make_vars(executor.out_dir())))
}

/// Loads the configuration file, if any, then applies environment overrides.
fn load_config(path: Option<&Utf8Path>) -> Result<SnapshotConfig> {
    let config = match path {
        Some(path) => SnapshotConfig::load(path)?,
        None => SnapshotConfig::default(),
    };
    Ok(config.with_process_env()?)
}

fn print_dry_run_info(
    cli: &Cli,
    families: &[ImageFamily],
    config: &SnapshotConfig,
    stderr: &mut dyn Write,
) {
    let info = DryRunInfo {
        inventory: cli.inventory(),
        families,
        out_dir: &cli.out_dir,
        source_root: &cli.source_root,
        fake: cli.fake,
        config,
    };
    write_stderr_line(stderr, info.display_text());
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
