use std::time::Duration;

pub(crate) const RELEASE: i32 = 0;
pub(crate) const PRESS: i32 = 1;
pub(crate) const REPEAT: i32 = 2;

/// Most modifiers a single combo can carry.
pub(crate) const MAX_MODIFIERS: usize = 4;
/// Per category cap for key, switch and idle bindings.
pub(crate) const MAX_BINDINGS: usize = 64;
pub(crate) const MAX_LISTENERS: usize = 32;

/// A wait that returns activity after longer than this is treated as a wake from suspend.
pub(crate) const RESET_BURST: Duration = Duration::from_millis(750);
/// Tick granularity when neither `tick` nor any idle threshold is configured.
pub(crate) const DEFAULT_TICK_SECS: u64 = 3600;
/// Back-off before a reader retries a device that failed to read.
pub(crate) const READ_RETRY: Duration = Duration::from_millis(500);

pub(crate) const KEY_CNT: u16 = 0x300;
pub(crate) const SW_CNT: u16 = 0x11;

pub(crate) const UNKNOWN: &str = "UNKNOWN";
pub(crate) const RESET: &str = "RESET";

pub(crate) const DEFAULT_CONFIG: &str = "/etc/evhook.toml";
