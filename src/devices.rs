use crate::consts::{MAX_LISTENERS, READ_RETRY};
use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use evdev::Device as EvDevDevice;
use evdev::{EventType, InputEvent};
use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use udev::Enumerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    Key,
    Switch,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub(crate) fn from_parts(event_type: EventType, code: u16, value: i32) -> Self {
        let kind = match event_type {
            EventType::KEY => EventKind::Key,
            EventType::SWITCH => EventKind::Switch,
            _ => EventKind::Other,
        };
        Self { kind, code, value }
    }
}

impl From<InputEvent> for RawEvent {
    fn from(event: InputEvent) -> Self {
        Self::from_parts(event.event_type(), event.code(), event.value())
    }
}

#[derive(Debug)]
pub(crate) struct DeviceEvent {
    pub source: Arc<str>,
    pub event: io::Result<RawEvent>,
}

#[derive(Debug)]
pub(crate) enum Wait {
    Timeout,
    Ready(Vec<DeviceEvent>),
    Shutdown,
}

pub(crate) trait EventSource {
    /// Waits at most `timeout` for activity. An error ends the loop.
    fn wait(&mut self, timeout: Duration) -> Result<Wait>;
}

pub(crate) struct DeviceSet {
    events: Receiver<DeviceEvent>,
    shutdown: Receiver<()>,
    count: usize,
}

impl DeviceSet {
    /// Opens every path. With `required`, one failure is fatal; otherwise the
    /// device is skipped. Having nothing to listen on is always fatal.
    pub(crate) fn open(paths: &[PathBuf], required: bool, shutdown: Receiver<()>) -> Result<Self> {
        let (tx, rx) = unbounded::<DeviceEvent>();
        let mut count = 0;

        for path in paths {
            let device = match EvDevDevice::open(path) {
                Ok(device) => device,
                Err(e) if required => bail!("open({}): {}", path.display(), e),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            info!(
                "Listening on {} ({})",
                path.display(),
                device.name().unwrap_or("Unknown Device")
            );
            spawn_reader(device, path.display().to_string().into(), tx.clone());
            count += 1;
        }

        if count == 0 {
            bail!("No input devices to listen on");
        }

        Ok(Self {
            events: rx,
            shutdown,
            count,
        })
    }

    pub(crate) fn device_count(&self) -> usize {
        self.count
    }
}

impl EventSource for DeviceSet {
    fn wait(&mut self, timeout: Duration) -> Result<Wait> {
        select! {
            recv(self.shutdown) -> _ => Ok(Wait::Shutdown),
            recv(self.events) -> event => match event {
                Ok(first) => {
                    let mut ready = vec![first];
                    ready.extend(self.events.try_iter());
                    Ok(Wait::Ready(ready))
                }
                Err(_) => Err(anyhow!("All input device readers have stopped")),
            },
            default(timeout) => Ok(Wait::Timeout),
        }
    }
}

fn spawn_reader(mut device: EvDevDevice, source: Arc<str>, tx: Sender<DeviceEvent>) {
    thread::spawn(move || {
        loop {
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        let event = DeviceEvent {
                            source: Arc::clone(&source),
                            event: Ok(event.into()),
                        };
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let event = DeviceEvent {
                        source: Arc::clone(&source),
                        event: Err(e),
                    };
                    if tx.send(event).is_err() {
                        return;
                    }
                    thread::sleep(READ_RETRY);
                }
            }
        }
    });
}

/// All `/dev/input/event*` nodes known to udev, in numeric order.
pub(crate) fn discover() -> Result<Vec<PathBuf>> {
    debug!("Detecting input devices");

    let mut enumerator = Enumerator::new()?;
    enumerator.match_subsystem("input")?;

    let mut paths: Vec<PathBuf> = enumerator
        .scan_devices()?
        .filter_map(|device| device.devnode().map(Path::to_path_buf))
        .filter(|path| event_number(path).is_some())
        .collect();
    paths.sort_by_key(|path| event_number(path));

    if paths.len() > MAX_LISTENERS {
        warn!(
            "Found {} input devices, listening on the first {}",
            paths.len(),
            MAX_LISTENERS
        );
        paths.truncate(MAX_LISTENERS);
    }

    Ok(paths)
}

fn event_number(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("event")?
        .parse()
        .ok()
}

pub(crate) fn list_devices() -> Result<()> {
    for path in discover()? {
        let device = match EvDevDevice::open(&path) {
            Ok(device) => device,
            Err(e) => {
                warn!("open({}): {}", path.display(), e);
                continue;
            }
        };

        println!("{}:", path.display().to_string().bold());
        println!("  name     : {}", device.name().unwrap_or("Unknown Device"));
        println!(
            "  phys     : {}",
            device.physical_path().unwrap_or("no physical path")
        );
        println!("  features : {}", features(&device).bright_blue());
        println!();
    }

    Ok(())
}

fn features(device: &EvDevDevice) -> String {
    device
        .supported_events()
        .iter()
        .map(event_type_name)
        .collect::<Vec<_>>()
        .join(" ")
}

fn event_type_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::SYNCHRONIZATION => "syn",
        EventType::KEY => "keys",
        EventType::RELATIVE => "relative",
        EventType::ABSOLUTE => "absolute",
        EventType::MISC => "reserved",
        EventType::LED => "leds",
        EventType::SOUND => "sound",
        EventType::REPEAT => "repeat",
        EventType::FORCEFEEDBACK => "feedback",
        EventType::SWITCH => "switch",
        _ => "unknown",
    }
}
