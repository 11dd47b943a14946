use crate::combo::Combo;
use crate::consts::{MAX_BINDINGS, MAX_MODIFIERS, RESET};
use crate::error::{Category, ConfigError, LoadIssue};
use crate::idle::IdleThreshold;
use crate::names::modifier_alias;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub spec: String,
    pub action: String,
    pub line: Option<usize>,
}

#[cfg(test)]
impl RawEntry {
    pub(crate) fn new(spec: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            action: action.into(),
            line: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawBindings {
    pub keys: Vec<RawEntry>,
    pub switches: Vec<RawEntry>,
    pub idle: Vec<RawEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyBinding {
    pub combo: Combo,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SwitchBinding {
    pub code: String,
    pub value: i32,
    pub action: String,
}

impl SwitchBinding {
    fn compare(&self, code: &str, value: i32) -> Ordering {
        self.code.as_str().cmp(code).then(self.value.cmp(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IdleBinding {
    pub threshold: IdleThreshold,
    pub action: String,
}

/// Sorted, read-only binding tables. Every lookup is an exact binary search.
#[derive(Debug, Default)]
pub(crate) struct TriggerTables {
    keys: Vec<KeyBinding>,
    switches: Vec<SwitchBinding>,
    idle: Vec<IdleBinding>,
}

impl TriggerTables {
    pub(crate) fn load(raw: &RawBindings) -> (Self, Vec<LoadIssue>) {
        let mut issues = Vec::new();

        let keys = load_category(
            &raw.keys,
            Category::Key,
            &mut issues,
            |entry| {
                Ok(KeyBinding {
                    combo: parse_shortcut(&entry.spec)?,
                    action: entry.action.clone(),
                })
            },
            |a: &KeyBinding, b: &KeyBinding| a.combo.cmp(&b.combo),
        );

        let switches = load_category(
            &raw.switches,
            Category::Switch,
            &mut issues,
            |entry| {
                let (code, value) = parse_switch(&entry.spec)?;
                Ok(SwitchBinding {
                    code,
                    value,
                    action: entry.action.clone(),
                })
            },
            |a: &SwitchBinding, b: &SwitchBinding| a.compare(&b.code, b.value),
        );

        let idle = load_category(
            &raw.idle,
            Category::Idle,
            &mut issues,
            |entry| {
                Ok(IdleBinding {
                    threshold: parse_idle(&entry.spec)?,
                    action: entry.action.clone(),
                })
            },
            |a: &IdleBinding, b: &IdleBinding| a.threshold.cmp(&b.threshold),
        );

        (
            Self {
                keys,
                switches,
                idle,
            },
            issues,
        )
    }

    pub(crate) fn match_key(&self, combo: &Combo) -> Option<&KeyBinding> {
        self.keys
            .binary_search_by(|binding| binding.combo.cmp(combo))
            .ok()
            .map(|index| &self.keys[index])
    }

    pub(crate) fn match_switch(&self, code: &str, value: i32) -> Option<&SwitchBinding> {
        self.switches
            .binary_search_by(|binding| binding.compare(code, value))
            .ok()
            .map(|index| &self.switches[index])
    }

    pub(crate) fn match_idle(&self, threshold: IdleThreshold) -> Option<&IdleBinding> {
        self.idle
            .binary_search_by(|binding| binding.threshold.cmp(&threshold))
            .ok()
            .map(|index| &self.idle[index])
    }

    /// The shortest configured idle timeout, ignoring `RESET`.
    pub(crate) fn smallest_idle_threshold(&self) -> Option<u64> {
        self.idle.iter().find_map(|binding| match binding.threshold {
            IdleThreshold::After(secs) => Some(secs),
            IdleThreshold::Reset => None,
        })
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.idle.len()
    }
}

fn load_category<T>(
    entries: &[RawEntry],
    category: Category,
    issues: &mut Vec<LoadIssue>,
    parse: impl Fn(&RawEntry) -> Result<T, ConfigError>,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Vec<T> {
    let mut table: Vec<T> = Vec::new();

    for entry in entries {
        let loaded = if table.len() >= MAX_BINDINGS {
            Err(ConfigError::CapacityExceeded {
                category,
                max: MAX_BINDINGS,
            })
        } else {
            parse(entry).and_then(|binding| {
                if table.iter().any(|existing| compare(existing, &binding).is_eq()) {
                    Err(ConfigError::Duplicate {
                        category,
                        spec: entry.spec.clone(),
                    })
                } else {
                    Ok(binding)
                }
            })
        };

        match loaded {
            Ok(binding) => table.push(binding),
            Err(error) => issues.push(LoadIssue {
                line: entry.line,
                error,
            }),
        }
    }

    table.sort_by(compare);
    table
}

/// `MOD+MOD+KEY`: the last token is the primary key, the rest become
/// modifier aliases in sorted order.
pub(crate) fn parse_shortcut(spec: &str) -> Result<Combo, ConfigError> {
    let invalid = || ConfigError::InvalidShortcut(spec.to_owned());

    let mut tokens: Vec<String> = spec
        .split('+')
        .map(|token| token.trim().to_ascii_uppercase())
        .collect();
    if tokens.iter().any(String::is_empty) {
        return Err(invalid());
    }

    let primary = tokens.pop().ok_or_else(invalid)?;
    if tokens.len() > MAX_MODIFIERS {
        return Err(ConfigError::TooManyModifiers {
            spec: spec.to_owned(),
            max: MAX_MODIFIERS,
        });
    }

    let combo = Combo::new(
        primary,
        tokens
            .iter()
            .map(|token| modifier_alias(token).to_owned())
            .collect(),
    );

    // Neither repeated aliases nor the primary among the modifiers can ever be held.
    if combo.modifiers.windows(2).any(|pair| pair[0] == pair[1])
        || combo.modifiers.contains(&combo.primary)
    {
        return Err(invalid());
    }

    Ok(combo)
}

pub(crate) fn parse_switch(spec: &str) -> Result<(String, i32), ConfigError> {
    let invalid = || ConfigError::InvalidSwitch(spec.to_owned());

    let (code, value) = spec.split_once(':').ok_or_else(invalid)?;
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(invalid());
    }
    let value = value.trim().parse::<i32>().map_err(|_| invalid())?;

    Ok((code, value))
}

pub(crate) fn parse_idle(spec: &str) -> Result<IdleThreshold, ConfigError> {
    if spec.trim().eq_ignore_ascii_case(RESET) {
        return Ok(IdleThreshold::Reset);
    }

    parse_seconds(spec)
        .map(IdleThreshold::After)
        .ok_or_else(|| ConfigError::InvalidIdle(spec.to_owned()))
}

/// Plain seconds (`90`) or a human duration (`1h30m`, `30min`, `1hour 30min`). Zero is rejected.
pub(crate) fn parse_seconds(spec: &str) -> Option<u64> {
    let spec = spec.trim();
    let seconds = match spec.parse::<u64>() {
        Ok(seconds) => seconds,
        Err(_) => humantime::parse_duration(spec).ok()?.as_secs(),
    };

    (seconds > 0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn combo(primary: &str, modifiers: &[&str]) -> Combo {
        Combo::new(primary, modifiers.iter().map(|m| m.to_string()).collect())
    }

    fn load(raw: &RawBindings) -> TriggerTables {
        let (tables, issues) = TriggerTables::load(raw);
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
        tables
    }

    #[test]
    fn test_parse_shortcut() {
        assert_eq!(parse_shortcut("POWER").unwrap(), combo("POWER", &[]));
        assert_eq!(
            parse_shortcut(" LEFTCTRL + LEFTALT + T ").unwrap(),
            combo("T", &["ALT", "CTRL"])
        );
        assert_eq!(
            parse_shortcut("ctrl+shift+f1").unwrap(),
            combo("F1", &["CTRL", "SHIFT"])
        );
    }

    #[test]
    fn test_parse_shortcut_errors() {
        assert!(matches!(
            parse_shortcut("CTRL++T"),
            Err(ConfigError::InvalidShortcut(_))
        ));
        assert!(matches!(
            parse_shortcut(""),
            Err(ConfigError::InvalidShortcut(_))
        ));
        assert!(matches!(
            parse_shortcut("LEFTCTRL+RIGHTCTRL+T"),
            Err(ConfigError::InvalidShortcut(_))
        ));
        assert!(matches!(
            parse_shortcut("A+A"),
            Err(ConfigError::InvalidShortcut(_))
        ));
        assert!(matches!(
            parse_shortcut("A+B+C+D+E+F"),
            Err(ConfigError::TooManyModifiers { max: 4, .. })
        ));
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("LID:1").unwrap(), ("LID".to_string(), 1));
        assert_eq!(
            parse_switch(" tablet_mode : 0 ").unwrap(),
            ("TABLET_MODE".to_string(), 0)
        );
        assert!(matches!(
            parse_switch("LID"),
            Err(ConfigError::InvalidSwitch(_))
        ));
        assert!(matches!(
            parse_switch("LID:on"),
            Err(ConfigError::InvalidSwitch(_))
        ));
        assert!(matches!(
            parse_switch(":1"),
            Err(ConfigError::InvalidSwitch(_))
        ));
    }

    #[test]
    fn test_parse_idle() {
        assert_eq!(parse_idle("RESET").unwrap(), IdleThreshold::Reset);
        assert_eq!(parse_idle("reset").unwrap(), IdleThreshold::Reset);
        assert_eq!(parse_idle("1h30m").unwrap(), IdleThreshold::After(5400));
        assert_eq!(parse_idle("2m 30s").unwrap(), IdleThreshold::After(150));
        assert_eq!(parse_idle("90").unwrap(), IdleThreshold::After(90));
        assert_eq!(parse_idle("30min").unwrap(), IdleThreshold::After(1800));
        assert_eq!(parse_idle("2hours").unwrap(), IdleThreshold::After(7200));
        assert_eq!(
            parse_idle("1hour 30min").unwrap(),
            IdleThreshold::After(5400)
        );
        assert_eq!(parse_idle(" 45s ").unwrap(), IdleThreshold::After(45));
        assert!(matches!(parse_idle("0"), Err(ConfigError::InvalidIdle(_))));
        assert!(matches!(parse_idle("500ms"), Err(ConfigError::InvalidIdle(_))));
        assert!(matches!(parse_idle("0s"), Err(ConfigError::InvalidIdle(_))));
        assert!(matches!(parse_idle("soon"), Err(ConfigError::InvalidIdle(_))));
        assert!(matches!(parse_idle("h"), Err(ConfigError::InvalidIdle(_))));
        assert!(matches!(parse_idle(""), Err(ConfigError::InvalidIdle(_))));
    }

    #[test]
    fn test_key_lookup_is_exact() {
        let tables = load(&RawBindings {
            keys: vec![
                RawEntry::new("LEFTCTRL+LEFTALT+T", "open-terminal"),
                RawEntry::new("POWER", "suspend"),
                RawEntry::new("CTRL+T", "new-tab"),
            ],
            ..Default::default()
        });

        assert_eq!(
            tables.match_key(&combo("T", &["ALT", "CTRL"])).unwrap().action,
            "open-terminal"
        );
        assert_eq!(
            tables.match_key(&combo("T", &["CTRL"])).unwrap().action,
            "new-tab"
        );
        assert_eq!(
            tables.match_key(&combo("POWER", &[])).unwrap().action,
            "suspend"
        );
        assert!(tables.match_key(&combo("T", &[])).is_none());
        assert!(tables.match_key(&combo("T", &["SHIFT"])).is_none());
    }

    #[test]
    fn test_duplicate_combo_keeps_first() {
        let (tables, issues) = TriggerTables::load(&RawBindings {
            keys: vec![
                RawEntry {
                    line: Some(3),
                    ..RawEntry::new("CTRL+ALT+X", "first")
                },
                RawEntry {
                    line: Some(4),
                    ..RawEntry::new("ALT+CTRL+X", "second")
                },
            ],
            ..Default::default()
        });

        assert_eq!(tables.key_count(), 1);
        assert_eq!(
            tables.match_key(&combo("X", &["ALT", "CTRL"])).unwrap().action,
            "first"
        );
        assert_eq!(
            issues,
            vec![LoadIssue {
                line: Some(4),
                error: ConfigError::Duplicate {
                    category: Category::Key,
                    spec: "ALT+CTRL+X".to_string(),
                },
            }]
        );
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let (tables, issues) = TriggerTables::load(&RawBindings {
            keys: vec![RawEntry::new("A++", "x"), RawEntry::new("B", "b")],
            switches: vec![RawEntry::new("LID", "x"), RawEntry::new("LID:1", "lock")],
            idle: vec![RawEntry::new("later", "x"), RawEntry::new("10m", "dim")],
        });

        assert_eq!(issues.len(), 3);
        assert_eq!(tables.key_count(), 1);
        assert_eq!(tables.switch_count(), 1);
        assert_eq!(tables.idle_count(), 1);
    }

    #[test]
    fn test_capacity_exceeded() {
        let keys = (0..MAX_BINDINGS + 2)
            .map(|i| RawEntry::new(format!("F{}", i), format!("cmd {}", i)))
            .collect();
        let (tables, issues) = TriggerTables::load(&RawBindings {
            keys,
            ..Default::default()
        });

        assert_eq!(tables.key_count(), MAX_BINDINGS);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|issue| issue.error
            == ConfigError::CapacityExceeded {
                category: Category::Key,
                max: MAX_BINDINGS,
            }));
        assert!(tables.match_key(&combo("F0", &[])).is_some());
        assert!(tables.match_key(&combo("F64", &[])).is_none());
    }

    #[test]
    fn test_switch_lookup() {
        let tables = load(&RawBindings {
            switches: vec![
                RawEntry::new("LID:1", "lock-screen"),
                RawEntry::new("TABLET_MODE:1", "rotate"),
            ],
            ..Default::default()
        });

        assert_eq!(tables.match_switch("LID", 1).unwrap().action, "lock-screen");
        assert!(tables.match_switch("LID", 0).is_none());
        assert!(tables.match_switch("UNKNOWN", 1).is_none());
    }

    #[test]
    fn test_idle_lookup_is_exact() {
        let tables = load(&RawBindings {
            idle: vec![
                RawEntry::new("2h", "sleep"),
                RawEntry::new("RESET", "wake"),
                RawEntry::new("1h", "dim"),
            ],
            ..Default::default()
        });

        assert_eq!(
            tables.match_idle(IdleThreshold::After(3600)).unwrap().action,
            "dim"
        );
        assert!(tables.match_idle(IdleThreshold::After(3660)).is_none());
        assert_eq!(tables.match_idle(IdleThreshold::Reset).unwrap().action, "wake");
        assert_eq!(tables.smallest_idle_threshold(), Some(3600));
    }

    #[test]
    fn test_no_idle_threshold_without_timeouts() {
        let tables = load(&RawBindings {
            idle: vec![RawEntry::new("RESET", "wake")],
            ..Default::default()
        });
        assert_eq!(tables.smallest_idle_threshold(), None);
    }

    proptest! {
        #[test]
        fn test_modifier_order_does_not_matter(
            modifiers in Just(vec!["LEFTCTRL", "RIGHTALT", "SHIFT", "META"]).prop_shuffle(),
            count in 0usize..=4,
        ) {
            let spec = modifiers[..count]
                .iter()
                .chain(std::iter::once(&"K"))
                .copied()
                .collect::<Vec<_>>()
                .join("+");
            let mut expected: Vec<&str> = modifiers[..count]
                .iter()
                .map(|m| modifier_alias(m))
                .collect();
            expected.sort();

            prop_assert_eq!(parse_shortcut(&spec).unwrap(), combo("K", &expected));
        }
    }
}
