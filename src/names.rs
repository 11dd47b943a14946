use crate::consts::{KEY_CNT, SW_CNT, UNKNOWN};
use evdev::{KeyCode, SwitchCode};

/// Canonical names for key and switch codes, indexed by the raw code.
///
/// Keys lose their `KEY_` prefix (`KEY_LEFTCTRL` is `LEFTCTRL`), buttons keep
/// theirs (`BTN_LEFT`), switches lose `SW_` (`SW_LID` is `LID`).
pub(crate) struct Names {
    keys: Vec<Option<String>>,
    switches: Vec<Option<String>>,
}

impl Names {
    pub(crate) fn new() -> Self {
        Self {
            keys: (0..KEY_CNT).map(|code| key_name(KeyCode::new(code))).collect(),
            switches: (0..SW_CNT).map(|code| switch_name(SwitchCode(code))).collect(),
        }
    }

    pub(crate) fn key(&self, code: u16) -> &str {
        self.keys
            .get(code as usize)
            .and_then(Option::as_deref)
            .unwrap_or(UNKNOWN)
    }

    pub(crate) fn switch(&self, code: u16) -> &str {
        self.switches
            .get(code as usize)
            .and_then(Option::as_deref)
            .unwrap_or(UNKNOWN)
    }
}

fn key_name(key: KeyCode) -> Option<String> {
    let name = format!("{:?}", key);
    match name.strip_prefix("KEY_") {
        Some(stripped) => Some(stripped.to_owned()),
        None if name.starts_with("BTN_") => Some(name),
        None => None,
    }
}

fn switch_name(switch: SwitchCode) -> Option<String> {
    format!("{:?}", switch)
        .strip_prefix("SW_")
        .map(str::to_owned)
}

/// The name a held key contributes to a combo when it acts as a modifier.
/// Left and right variants of the classic modifiers collapse into one alias.
pub(crate) fn modifier_alias(name: &str) -> &str {
    match name {
        "LEFTCTRL" | "RIGHTCTRL" => "CTRL",
        "LEFTALT" | "RIGHTALT" => "ALT",
        "LEFTSHIFT" | "RIGHTSHIFT" => "SHIFT",
        "LEFTMETA" | "RIGHTMETA" => "META",
        _ => name,
    }
}
