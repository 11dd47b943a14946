use crate::combo::{ActiveCombo, Combo};
use crate::consts::{PRESS, RELEASE, REPEAT};
use crate::devices::{DeviceEvent, EventKind, EventSource, RawEvent, Wait};
use crate::exec::Executor;
use crate::idle::{IdleThreshold, IdleTracker};
use crate::names::Names;
use crate::triggers::TriggerTables;
use anyhow::Result;
use colored::{ColoredString, Colorize};
use log::{debug, error, info, trace, warn};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Run the bound actions.
    Execute,
    /// Print every recognized event instead of running anything.
    Monitor,
}

/// The single-threaded wait/dispatch loop. Owns all mutable matching state.
pub(crate) struct Dispatcher<'a, E: Executor> {
    tables: &'a TriggerTables,
    names: Names,
    combo: ActiveCombo,
    idle: IdleTracker,
    executor: E,
    mode: Mode,
}

impl<'a, E: Executor> Dispatcher<'a, E> {
    pub(crate) fn new(tables: &'a TriggerTables, tick: u64, executor: E, mode: Mode) -> Self {
        Self {
            tables,
            names: Names::new(),
            combo: ActiveCombo::default(),
            idle: IdleTracker::new(tick),
            executor,
            mode,
        }
    }

    /// Runs until shutdown is requested or waiting fails.
    pub(crate) fn run(&mut self, source: &mut impl EventSource) -> Result<()> {
        loop {
            let started = Instant::now();
            let wait = source.wait(self.idle.timeout());
            let elapsed = started.elapsed();

            match wait {
                Ok(Wait::Shutdown) => {
                    info!("Exiting");
                    return Ok(());
                }
                Ok(wait) => self.handle_wait(wait, elapsed),
                Err(e) => {
                    error!("Waiting for input failed: {:#}", e);
                    return Err(e);
                }
            }
        }
    }

    /// One loop iteration: `elapsed` is how long the wait blocked.
    pub(crate) fn handle_wait(&mut self, wait: Wait, elapsed: Duration) {
        match wait {
            Wait::Timeout => {
                let threshold = self.idle.tick();
                trace!("Idle for {}", threshold);
                self.on_idle(threshold);
            }
            Wait::Ready(events) => {
                if IdleTracker::is_wake(elapsed) {
                    let threshold = self.idle.reset();
                    self.on_idle(threshold);
                }
                for event in events {
                    self.on_device_event(event);
                }
            }
            Wait::Shutdown => {}
        }
    }

    fn on_device_event(&mut self, event: DeviceEvent) {
        let DeviceEvent { source, event } = event;

        let RawEvent { kind, code, value } = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("read({}): {}", source, e);
                return;
            }
        };

        match kind {
            EventKind::Key => self.on_key(&source, code, value),
            EventKind::Switch => self.on_switch(&source, code, value),
            EventKind::Other => {}
        }
    }

    fn on_key(&mut self, source: &str, code: u16, value: i32) {
        let name = self.names.key(code);
        let completed = match value {
            RELEASE => self.combo.release(name),
            _ => self.combo.press(name),
        };
        let Some(combo) = completed else {
            return;
        };

        if self.mode == Mode::Monitor {
            print_event(source, "keys", &keys_label(&combo));
            return;
        }

        let tables = self.tables;
        if let Some(binding) = tables.match_key(&combo) {
            log_fired("KEY", &combo.to_string(), source, value);
            self.execute(&binding.action);
        }
    }

    fn on_switch(&mut self, source: &str, code: u16, value: i32) {
        let name = self.names.switch(code);

        if self.mode == Mode::Monitor {
            print_event(source, "switch", &format!("{}:{}", name, value));
            return;
        }

        let tables = self.tables;
        if let Some(binding) = tables.match_switch(name, value) {
            log_fired("SWITCH", &format!("{}:{}", name, value), source, value);
            self.execute(&binding.action);
        }
    }

    fn on_idle(&mut self, threshold: IdleThreshold) {
        let tables = self.tables;
        if let Some(binding) = tables.match_idle(threshold) {
            debug!(
                "{} {}: {}",
                "◷".cyan().bold(),
                "IDLE".purple(),
                threshold.to_string().bright_blue()
            );
            self.execute(&binding.action);
        }
    }

    fn execute(&mut self, action: &str) {
        if self.mode == Mode::Monitor {
            return;
        }

        debug!("    exec: {:?}", action);
        if let Err(e) = self.executor.execute(action) {
            error!("{}", e);
        }
    }
}

fn keys_label(combo: &Combo) -> String {
    combo
        .modifiers
        .iter()
        .chain(std::iter::once(&combo.primary))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" + ")
}

fn print_event(source: &str, label: &str, value: &str) {
    println!("{}:", source.bold());
    println!("  {:<9}: {}", label, value.bright_blue());
    println!();
}

fn log_fired(kind: &str, what: &str, source: &str, value: i32) {
    debug!(
        "{} {}: {} [{}]",
        state_arrow(value),
        kind.yellow(),
        what.bright_blue(),
        source.purple(),
    );
}

fn state_arrow(value: i32) -> ColoredString {
    match value {
        PRESS | REPEAT => "↓".green().bold(),
        _ => "↑".red().bold(),
    }
}
