//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `famtree_core` linkage.
//! - Run both core components over a snapshot file for quick local checks.
//!
//! Usage: `famtree_cli [snapshot.json [config.json]]`. Set `FAMTREE_LOG_DIR`
//! to an absolute path to enable file logging.

use famtree_core::{assemble, compute_events, init_logging, CoreConfig, LogLevel, Member};
use log::info;
use std::path::Path;
use std::process::ExitCode;

const UPCOMING_WINDOW_DAYS: i64 = 30;

fn main() -> ExitCode {
    println!("famtree_core version={}", famtree_core::core_version());

    if let Ok(log_dir) = std::env::var("FAMTREE_LOG_DIR") {
        if let Err(err) = init_logging(LogLevel::build_default().as_str(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(snapshot_path) = args.first() else {
        return ExitCode::SUCCESS;
    };

    match run(Path::new(snapshot_path), args.get(1).map(Path::new)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(snapshot_path: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => CoreConfig::load(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    let raw = std::fs::read_to_string(snapshot_path)
        .map_err(|err| format!("cannot read `{}`: {err}", snapshot_path.display()))?;
    let members: Vec<Member> = serde_json::from_str(&raw)
        .map_err(|err| format!("invalid snapshot `{}`: {err}", snapshot_path.display()))?;

    let forest = assemble(&members);
    println!(
        "forest members={} groups={} roots={} generations={} warnings={}",
        forest.member_count(),
        forest.group_count(),
        forest.roots.len(),
        forest.depth(),
        forest.warnings.len()
    );
    for warning in &forest.warnings {
        println!("  warning {} member={}", warning.kind(), warning.member_id());
    }

    let reference = chrono::Local::now().naive_local();
    let converter = config.converter.build();
    let schedule = compute_events(&members, reference, &converter, &config.recurrence);
    let upcoming = schedule.within_days(reference.date(), UPCOMING_WINDOW_DAYS);
    println!(
        "events total={} upcoming_{}d={} skipped={}",
        schedule.events.len(),
        UPCOMING_WINDOW_DAYS,
        upcoming.len(),
        schedule.skipped.len()
    );
    for event in upcoming {
        println!(
            "  {} {:?} member={} source={}",
            event.date, event.kind, event.member_id, event.original_label
        );
    }

    info!(
        "event=cli_run module=cli status=ok members={} events={}",
        members.len(),
        schedule.events.len()
    );
    Ok(())
}
