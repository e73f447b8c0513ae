mod config;
mod decode;
mod resize;
mod terminal;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};

use camterm_core::display::{Display, HalfBlockDisplay, RampDisplay};
use camterm_core::driver::{FrameDriver, FrameOutcome};
use camterm_core::format::Size;
use camterm_core::source::{FrameSource, TestPattern};

use crate::config::{Cli, SourceSpec};
use crate::decode::FfmpegSource;
use crate::terminal::TerminalGuard;

/// Small enough that slow terminals push back inside the frame budget.
const STDOUT_BUFFER: usize = 16 * 1024;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let source = open_source(&cli)?;
    let terminal_size = terminal::size()?;
    let layout = cli.layout(terminal_size);
    info!(
        "terminal {}x{}, grid {:?}",
        terminal_size.width,
        terminal_size.height,
        layout.cells()
    );

    let guard = TerminalGuard::enter()?;
    let stdout = BufWriter::with_capacity(STDOUT_BUFFER, io::stdout());
    let display: Box<dyn Display> = if cli.ramp {
        Box::new(RampDisplay::new(stdout, layout).mono(cli.mono).gamma(cli.gamma))
    } else {
        Box::new(HalfBlockDisplay::new(stdout, layout, cli.budget()))
    };

    let mut driver = FrameDriver::new(source, display);
    driver.start()?;
    let result = run_frame_loop(&mut driver, cli.max_failures);
    let finished = driver.finish();
    drop(driver);
    drop(guard);

    result?;
    finished?;
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    // The terminal is the picture; stay quiet on it unless asked.
    let default_filter = if log_file.is_some() { "info" } else { "error" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    builder.format_timestamp_micros();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn open_source(cli: &Cli) -> anyhow::Result<Box<dyn FrameSource>> {
    let spec = cli.source();
    if spec == SourceSpec::TestPattern {
        return Ok(Box::new(TestPattern::new(Size::new(320, 240))));
    }
    let options = cli.input_options()?;
    Ok(Box::new(FfmpegSource::spawn(&spec, cli.max_rate, &options)?))
}

fn run_frame_loop<S: FrameSource, D: Display>(
    driver: &mut FrameDriver<S, D>,
    max_failures: u32,
) -> anyhow::Result<()> {
    let mut failures = 0u32;
    loop {
        // Drain input without blocking
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if is_quit(&key) => return Ok(()),
                Event::Resize(cols, rows) => {
                    driver.resize_terminal(Size::new(cols as u32, rows as u32))?
                }
                _ => {}
            }
        }

        match driver.step()? {
            FrameOutcome::Rendered => failures = 0,
            FrameOutcome::Skipped => {
                failures += 1;
                if failures >= max_failures {
                    anyhow::bail!("frame source failed {failures} times in a row");
                }
            }
            FrameOutcome::EndOfStream => {
                warn!("frame source ended");
                return Ok(());
            }
        }
    }
}

/// `q`, Esc, or Ctrl-C (raw mode delivers it as a key).
fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
