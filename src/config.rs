use crate::consts::{DEFAULT_CONFIG, DEFAULT_TICK_SECS, MAX_LISTENERS};
use crate::error::{Category, ConfigError, LoadIssue};
use crate::triggers::{RawBindings, RawEntry, TriggerTables, parse_seconds};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use toml::Spanned;

const SECTIONS: [&str; 4] = ["global", "keys", "switches", "idle"];

/// `--config` if given, else the per-user file when it exists, else the system one.
pub(crate) fn config_path(arg: Option<PathBuf>) -> PathBuf {
    match arg {
        Some(path) => path,
        None => dirs::config_dir()
            .map(|dir| dir.join("evhook").join("config.toml"))
            .filter(|path| path.exists())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG)),
    }
}

/// A parsed configuration file. Entries that could not be taken are in `issues`.
#[derive(Debug, Default)]
pub(crate) struct Config {
    pub listen: Vec<PathBuf>,
    pub tick: Option<u64>,
    pub bindings: RawBindings,
    pub issues: Vec<LoadIssue>,
}

impl Config {
    /// Configured tick, else the shortest idle timeout, else an hour.
    pub(crate) fn tick_seconds(&self, tables: &TriggerTables) -> u64 {
        self.tick
            .or_else(|| tables.smallest_idle_threshold())
            .unwrap_or(DEFAULT_TICK_SECS)
    }
}

pub(crate) fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = parse(&content).with_context(|| format!("Invalid config {}", path.display()))?;

    debug!("Config: {:#?}", config);

    Ok(config)
}

pub(crate) fn parse(content: &str) -> Result<Config> {
    let sections: Entries = toml::from_str(content)?;
    let mut issues: Vec<LoadIssue> = sections
        .0
        .iter()
        .filter(|(section, _)| !SECTIONS.contains(&section.as_str()))
        .map(|(section, value)| LoadIssue {
            line: line_of(content, value.span()),
            error: ConfigError::UnknownSection(section.clone()),
        })
        .collect();

    let file: ConfigFile = toml::from_str(content)?;
    let (listen, tick) = globals(file.global, content, &mut issues);

    let bindings = RawBindings {
        keys: raw_entries(file.keys, content, &mut issues),
        switches: raw_entries(file.switches, content, &mut issues),
        idle: raw_entries(file.idle, content, &mut issues),
    };

    Ok(Config {
        listen,
        tick,
        bindings,
        issues,
    })
}

pub(crate) fn report_issues(path: &Path, issues: &[LoadIssue]) {
    for issue in issues {
        match issue.line {
            Some(line) => warn!("{} ({}:{})", issue.error, path.display(), line),
            None => warn!("{} ({})", issue.error, path.display()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    global: Entries,
    #[serde(default)]
    keys: Entries,
    #[serde(default)]
    switches: Entries,
    #[serde(default)]
    idle: Entries,
}

/// Key/value pairs of one table, in file order.
#[derive(Debug, Default)]
struct Entries(Vec<(String, Spanned<toml::Value>)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = Entries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entries, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Entries(entries))
    }
}

fn raw_entries(entries: Entries, content: &str, issues: &mut Vec<LoadIssue>) -> Vec<RawEntry> {
    entries
        .0
        .into_iter()
        .filter_map(|(spec, value)| {
            let line = line_of(content, value.span());
            match value.into_inner() {
                toml::Value::String(action) if !action.trim().is_empty() => Some(RawEntry {
                    spec,
                    action,
                    line,
                }),
                _ => {
                    issues.push(LoadIssue {
                        line,
                        error: ConfigError::InvalidCommand(spec),
                    });
                    None
                }
            }
        })
        .collect()
}

fn globals(
    entries: Entries,
    content: &str,
    issues: &mut Vec<LoadIssue>,
) -> (Vec<PathBuf>, Option<u64>) {
    let mut listen = Vec::new();
    let mut tick = None;

    for (option, value) in entries.0 {
        let line = line_of(content, value.span());
        let mut report = |error: ConfigError| issues.push(LoadIssue { line, error });

        match (option.as_str(), value.into_inner()) {
            ("listen", toml::Value::Array(paths)) => {
                for path in paths {
                    match path {
                        toml::Value::String(_) if listen.len() >= MAX_LISTENERS => {
                            report(ConfigError::CapacityExceeded {
                                category: Category::Listener,
                                max: MAX_LISTENERS,
                            })
                        }
                        toml::Value::String(path) => listen.push(PathBuf::from(path)),
                        other => report(ConfigError::InvalidListen(other.to_string())),
                    }
                }
            }
            ("listen", other) => report(ConfigError::InvalidListen(other.to_string())),
            ("tick", value) => {
                tick = match &value {
                    toml::Value::String(spec) => parse_seconds(spec),
                    toml::Value::Integer(seconds) => {
                        u64::try_from(*seconds).ok().filter(|&seconds| seconds > 0)
                    }
                    _ => None,
                };
                if tick.is_none() {
                    report(ConfigError::InvalidTick(match value {
                        toml::Value::String(spec) => spec,
                        other => other.to_string(),
                    }));
                }
            }
            _ => report(ConfigError::UnknownOption(option.clone())),
        }
    }

    (listen, tick)
}

fn line_of(content: &str, span: Range<usize>) -> Option<usize> {
    content
        .get(..span.start)
        .map(|before| before.matches('\n').count() + 1)
}
