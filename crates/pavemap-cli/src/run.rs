//! `pavemap run`: worker thread + event drain loop.

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::Path;
use std::time::Duration;

use pavemap_core::events::Tick;
use pavemap_core::{
    spawn_mapping, CancelToken, EventQueue, MapperConfig, RunEvent, RunRequest, RunState,
    RunSummary,
};

use crate::logging;
use crate::RunArgs;

pub fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MapperConfig::load(path)?,
        None => MapperConfig::default(),
    };
    if let Some(suffix) = args.suffix {
        config.output_suffix = suffix;
    }

    let output = args
        .out
        .unwrap_or_else(|| config.output_path_for(&args.model));
    let log_path = args
        .log
        .unwrap_or_else(|| config.log_path_for(&args.model, chrono::Local::now()));
    logging::init_file(&log_path, &config.log_filter)?;
    tracing::info!(
        config = ?args.config,
        output_suffix = %config.output_suffix,
        events_per_tick = config.events_per_tick,
        queue_backlog_limit = config.queue_backlog_limit,
        "configuration loaded"
    );

    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel)?;

    let request = RunRequest::new(&args.model, &args.sheet, &output).with_log_path(&log_path);
    // Reject obviously incomplete requests before spawning anything.
    request.validate()?;

    println!(
        "{} {} + {}",
        "Mapping".green().bold(),
        args.model.display(),
        args.sheet.display()
    );
    println!("  {} {}", "log".dimmed(), log_path.display());

    let (sender, queue) = EventQueue::channel(config.events_per_tick, config.queue_backlog_limit);
    let worker = spawn_mapping(request, sender, cancel)
        .map_err(|e| anyhow!("failed to start mapping worker: {e}"))?;
    tracing::debug!(output = %output.display(), "mapping worker started");

    let tick_interval = Duration::from_millis(config.tick_interval_ms.max(1));
    let mut final_state = None;
    loop {
        std::thread::sleep(tick_interval);
        let tick = queue.drain_tick();
        if let Some(state) = render(&tick) {
            final_state = Some(state);
            break;
        }
        if tick.discarded > 0 {
            tracing::debug!(discarded = tick.discarded, "status backlog trimmed");
        }
        if tick.disconnected {
            tracing::warn!("worker channel closed before the run finished");
            break;
        }
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow!("mapping worker panicked"))??;
    tracing::info!(
        state = %summary.state,
        updated_courses = summary.updated_courses,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "mapping finished"
    );
    print_summary(&summary, &log_path);

    match final_state.unwrap_or(summary.state) {
        RunState::Failed => Err(anyhow!("mapping failed (see {})", log_path.display())),
        _ => Ok(()),
    }
}

/// First Ctrl-C requests cancellation; a second one terminates the process.
fn install_interrupt_handler(cancel: &CancelToken) -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::SIGINT;
        use signal_hook::flag;

        let flag = cancel.flag();
        flag::register_conditional_shutdown(SIGINT, 130, flag.clone())
            .map_err(|e| anyhow!("failed to register SIGINT: {e}"))?;
        flag::register(SIGINT, flag).map_err(|e| anyhow!("failed to register SIGINT: {e}"))?;
        tracing::debug!("SIGINT requests cancellation; a second SIGINT exits");
    }
    #[cfg(not(unix))]
    let _ = cancel;
    Ok(())
}

/// Print one tick's events. Returns the terminal state once `Finished` arrives.
fn render(tick: &Tick) -> Option<RunState> {
    let mut finished = None;
    for event in &tick.events {
        match event {
            RunEvent::Status(line) => print_status(line),
            RunEvent::Progress { current, total } => {
                let percent = if *total == 0 {
                    100.0
                } else {
                    *current as f64 * 100.0 / *total as f64
                };
                println!(
                    "  {} {percent:5.1}% ({current}/{total} zones)",
                    "→".cyan()
                );
            }
            RunEvent::Finished { state, .. } => finished = Some(*state),
        }
    }
    if tick.discarded > 0 {
        println!(
            "  {}",
            format!("({} status lines skipped, see log)", tick.discarded).dimmed()
        );
    }
    finished
}

fn print_status(line: &str) {
    if line.starts_with("Error") {
        println!("{}", line.red().bold());
    } else if line.starts_with("Warning") {
        println!("{}", line.yellow());
    } else if line.starts_with("Verification") || line.starts_with("Successfully") {
        println!("{}", line.green());
    } else if line.starts_with("Mapping cancelled") {
        println!("{}", line.yellow().bold());
    } else {
        println!("{line}");
    }
}

fn print_summary(summary: &RunSummary, log_path: &Path) {
    let state = match summary.state {
        RunState::Completed => "completed".green().bold(),
        RunState::Cancelled => "cancelled".yellow().bold(),
        other => other.to_string().red().bold(),
    };
    println!();
    println!(
        "{} {} zone(s) processed, {} course(s) updated in {:.2}s",
        state,
        summary.zones.len(),
        summary.updated_courses,
        summary.elapsed.as_secs_f64()
    );
    for zone in &summary.zones {
        let verdict = if zone.cancelled {
            "cancelled".yellow()
        } else if zone.verification().is_complete() {
            "ok".green()
        } else {
            "incomplete".yellow()
        };
        println!(
            "  {} {:<20} {}/{} matched ({} courses found)",
            verdict, zone.zone, zone.matches, zone.valid_courses, zone.courses_found
        );
    }
    if let Some(out) = &summary.output_path {
        println!("  {} {}", "wrote".green().bold(), out.display());
    }
    println!("  {} {}", "log".dimmed(), log_path.display());
}
