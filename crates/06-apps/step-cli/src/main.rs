//! Command-line harness for the VM step scheduler.
//!
//! `run` binds the scheduler to a demo engine on the native host loop and
//! reports how often it stepped and rendered; while it runs on the wall
//! clock, lines on stdin (`rate 30`, `interp on`, `stop`, `start`, `status`,
//! `quit`) reconfigure it live. `plan` prints what a configuration would
//! subscribe without running anything.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use runtime_native::{HostLoop, Mailbox, Remote, RunOutcome, DEFAULT_REFRESH_HZ};
use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use step_scheduler::{SchedulerConfig, StepMode, StepScheduler, StepTarget, TickInterval};

/// Text rendering helpers used by the CLI commands.
mod render {
    use step_scheduler::{SchedulerConfig, StepMode, StepSource};

    /// One-line description of what `config` subscribes when started.
    pub fn plan(config: &SchedulerConfig) -> String {
        let mode = StepMode::select(config);
        let step = match mode.step_source() {
            StepSource::DisplaySync => "display sync".to_string(),
            StepSource::Timer { interval_ms } => format!("timer every {interval_ms:.2} ms"),
        };
        let interpolation = if mode.has_interpolation() {
            "display sync"
        } else {
            "none"
        };
        format!(
            "mode={} step={step} interpolation={interpolation} tick_interval={:.2} ms",
            mode.label(),
            config.tick_interval_ms()
        )
    }

    /// Summary line printed after a run.
    pub fn run_summary(steps: u64, renders: u64, elapsed_ms: f64) -> String {
        let seconds = elapsed_ms / 1000.0;
        let per_second = |count: u64| {
            if seconds > 0.0 {
                count as f64 / seconds
            } else {
                0.0
            }
        };
        format!(
            "steps={steps} ({:.1}/s) renders={renders} ({:.1}/s) over {elapsed_ms:.0} ms",
            per_second(steps),
            per_second(renders)
        )
    }
}

/// Drive the step scheduler against a demo engine.
#[derive(Parser, Debug)]
#[command(author, version, about = "Exercise the VM step scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and report step and render counts.
    Run {
        /// Target tick rate in Hz; 0 steps once per display refresh.
        #[arg(short, long)]
        rate: Option<f64>,
        /// Render interpolated frames between fixed-rate ticks.
        #[arg(short, long)]
        interpolate: bool,
        /// How long to run, in seconds.
        #[arg(short, long, default_value_t = 2.0)]
        seconds: f64,
        /// Simulated display refresh rate in Hz.
        #[arg(long, default_value_t = DEFAULT_REFRESH_HZ)]
        refresh_hz: f64,
        /// JSON config file, e.g. {"targetRate": 30, "interpolationEnabled": true}.
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Run on a virtual clock instead of sleeping in real time.
        #[arg(long = "virtual")]
        virtual_clock: bool,
    },
    /// Print the subscriptions a configuration would make.
    Plan {
        /// Target tick rate in Hz; 0 steps once per display refresh.
        #[arg(short, long, default_value_t = step_scheduler::DEFAULT_TARGET_RATE)]
        rate: f64,
        /// Render interpolated frames between fixed-rate ticks.
        #[arg(short, long)]
        interpolate: bool,
    },
}

/// Live reconfiguration requests read from stdin.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Control {
    Rate(f64),
    Interpolation(bool),
    Start,
    Stop,
    Status,
    Quit,
}

fn parse_control(line: &str) -> Result<Control, String> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or_else(|| "empty command".to_string())?;
    let arg = words.next();
    match (command, arg) {
        ("rate", Some(value)) => value
            .parse::<f64>()
            .map(Control::Rate)
            .map_err(|_| format!("invalid rate '{value}'")),
        ("interp", Some("on")) => Ok(Control::Interpolation(true)),
        ("interp", Some("off")) => Ok(Control::Interpolation(false)),
        ("start", None) => Ok(Control::Start),
        ("stop", None) => Ok(Control::Stop),
        ("status", None) => Ok(Control::Status),
        ("quit", None) => Ok(Control::Quit),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

/// Engine that integrates a point moving at constant speed.
///
/// `step` advances the simulation by one tick; `render_interpolated` only
/// counts, standing in for drawing between ticks.
#[derive(Default)]
struct DemoEngine {
    steps: u64,
    renders: u64,
    position: f64,
    tick_interval: TickInterval,
}

impl DemoEngine {
    const SPEED: f64 = 1.0;
}

impl StepTarget for DemoEngine {
    fn step(&mut self) {
        self.steps += 1;
        self.position += Self::SPEED * self.tick_interval.get() / 1000.0;
    }

    fn render_interpolated(&mut self) {
        self.renders += 1;
    }

    fn tick_interval(&self) -> TickInterval {
        self.tick_interval.clone()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            rate,
            interpolate,
            seconds,
            refresh_hz,
            config,
            virtual_clock,
        } => {
            let config = resolve_config(config.as_deref(), rate, interpolate)?;
            handle_run(config, seconds, refresh_hz, virtual_clock)?;
        }
        Command::Plan { rate, interpolate } => {
            let config = SchedulerConfig::new(rate, interpolate);
            config.validate()?;
            println!("{}", render::plan(&config));
        }
    }

    Ok(())
}

fn resolve_config(
    path: Option<&Path>,
    rate: Option<f64>,
    interpolate: bool,
) -> Result<SchedulerConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path:?}"))?;
            SchedulerConfig::from_json(&json)
                .with_context(|| format!("failed to parse config {path:?}"))?
        }
        None => SchedulerConfig::default(),
    };
    if let Some(rate) = rate {
        config.target_rate = rate;
    }
    config.interpolation_enabled |= interpolate;
    config.validate()?;
    Ok(config)
}

fn handle_run(
    config: SchedulerConfig,
    seconds: f64,
    refresh_hz: f64,
    virtual_clock: bool,
) -> Result<()> {
    if !(seconds.is_finite() && seconds > 0.0) {
        bail!("--seconds must be a positive number, got {seconds}");
    }
    if !(refresh_hz.is_finite() && refresh_hz > 0.0) {
        bail!("--refresh-hz must be a positive number, got {refresh_hz}");
    }

    let host = if virtual_clock {
        HostLoop::virtual_time(refresh_hz)
    } else {
        HostLoop::wall_clock(refresh_hz)
    };
    let engine = Rc::new(RefCell::new(DemoEngine::default()));
    let mut scheduler =
        StepScheduler::new(Rc::clone(&engine), host.clone(), host.clone(), config)?;

    let mailbox = Mailbox::new();
    if !virtual_clock {
        spawn_stdin_reader(mailbox.remote());
    }

    println!("{}", render::plan(&config));
    scheduler.start();

    let started_ms = host.now_ms();
    let wall_start = Instant::now();
    let outcome = host.run_for(&mailbox, Duration::from_secs_f64(seconds), |control| {
        apply_control(&mut scheduler, control)
    });
    scheduler.stop();

    if outcome == RunOutcome::Interrupted {
        info!("run interrupted after {:?}", wall_start.elapsed());
    }
    let engine = engine.borrow();
    println!(
        "{}",
        render::run_summary(engine.steps, engine.renders, host.now_ms() - started_ms)
    );
    println!("position={:.3}", engine.position);
    println!("{}", scheduler.snapshot().to_json());
    Ok(())
}

fn apply_control(
    scheduler: &mut StepScheduler<HostLoop, HostLoop>,
    control: Control,
) -> ControlFlow<()> {
    match control {
        Control::Rate(rate) => match scheduler.set_target_rate(rate) {
            Ok(()) => println!("{}", describe(scheduler.mode(), scheduler.tick_interval_ms())),
            Err(err) => warn!("{err}"),
        },
        Control::Interpolation(enabled) => {
            scheduler.set_interpolation(enabled);
            println!("{}", describe(scheduler.mode(), scheduler.tick_interval_ms()));
        }
        Control::Start => scheduler.start(),
        Control::Stop => scheduler.stop(),
        Control::Status => println!("{}", scheduler.snapshot().to_json()),
        Control::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn describe(mode: StepMode, tick_interval_ms: f64) -> String {
    format!("now {mode}, tick interval {tick_interval_ms:.2} ms")
}

fn spawn_stdin_reader(remote: Remote<Control>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_control(&line) {
                Ok(control) => remote.post(control),
                Err(err) => eprintln!("{err}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn plan_render_matches_expectation() {
        assert_snapshot!(
            render::plan(&SchedulerConfig::new(50.0, true)),
            @"mode=fixed+interpolated step=timer every 20.00 ms interpolation=display sync tick_interval=20.00 ms"
        );
        assert_snapshot!(
            render::plan(&SchedulerConfig::DISPLAY_TIED),
            @"mode=display-tied step=display sync interpolation=none tick_interval=16.67 ms"
        );
    }

    #[test]
    fn run_summary_render_matches_expectation() {
        assert_snapshot!(
            render::run_summary(120, 0, 2000.0),
            @"steps=120 (60.0/s) renders=0 (0.0/s) over 2000 ms"
        );
    }

    #[test]
    fn parses_stdin_controls() {
        assert_eq!(parse_control("rate 30"), Ok(Control::Rate(30.0)));
        assert_eq!(parse_control("  interp on "), Ok(Control::Interpolation(true)));
        assert_eq!(parse_control("interp off"), Ok(Control::Interpolation(false)));
        assert_eq!(parse_control("quit"), Ok(Control::Quit));
        assert!(parse_control("rate fast").is_err());
        assert!(parse_control("interp maybe").is_err());
        assert!(parse_control("stop now").is_err());
    }

    #[test]
    fn config_flags_override_file_defaults() {
        let config = resolve_config(None, Some(30.0), true).unwrap();
        assert_eq!(config, SchedulerConfig::new(30.0, true));
        assert!(resolve_config(None, Some(-1.0), false).is_err());
    }

    #[test]
    fn virtual_run_steps_at_target_rate() {
        let host = HostLoop::virtual_time(60.0);
        let engine = Rc::new(RefCell::new(DemoEngine::default()));
        let mut scheduler = StepScheduler::new(
            Rc::clone(&engine),
            host.clone(),
            host.clone(),
            SchedulerConfig::new(50.0, false),
        )
        .unwrap();
        let mailbox = Mailbox::new();
        let remote = mailbox.remote();
        scheduler.start();

        host.run_for(&mailbox, Duration::from_secs(1), |control| {
            apply_control(&mut scheduler, control)
        });
        assert_eq!(engine.borrow().steps, 50);
        assert!((engine.borrow().position - 1.0).abs() < 1e-9);

        remote.post(Control::Quit);
        let outcome = host.run_for(&mailbox, Duration::from_secs(1), |control| {
            apply_control(&mut scheduler, control)
        });
        assert_eq!(outcome, RunOutcome::Interrupted);
    }
}
