use std::path::{Path, PathBuf};

use gesture::KeyEvent;
use libremarkable::evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use nix::{
    sched::{sched_setaffinity, CpuSet},
    unistd::Pid,
};

pub const TEMP_DIR: &'static str = "/tmp/wake-gestures";
pub const TEMP_FILE_TUNABLES: &'static str = "tunables";
pub const TEMP_DIR_PIDS: &'static str = "processes";

/// Relative axis code gesture reports are carried on
pub const REL_GESTURE: u16 = 0x0b;
/// Name of the virtual input device listeners pick reports up from
pub const REPORT_DEVICE_NAME: &'static str = "wake_gesture";

pub fn path_temp_tunables() -> PathBuf {
    let mut path = PathBuf::from(TEMP_DIR);
    path.push(TEMP_FILE_TUNABLES);
    path
}

pub fn path_temp_pids() -> PathBuf {
    let mut path = PathBuf::from(TEMP_DIR);
    path.push(TEMP_DIR_PIDS);
    path
}

pub fn path_temp_pid<P: AsRef<Path>>(filename: P) -> PathBuf {
    let mut path = path_temp_pids();
    path.push(filename);
    path.set_extension("pid");
    path
}

pub fn key_event(event: KeyEvent) -> InputEvent {
    match event {
        KeyEvent::PowerDown => InputEvent::new_now(EventType::KEY, Key::KEY_POWER.code(), 1),
        KeyEvent::PowerUp => InputEvent::new_now(EventType::KEY, Key::KEY_POWER.code(), 0),
        KeyEvent::Sync => InputEvent::new_now(EventType::SYNCHRONIZATION, 0, 0),
    }
}

/// The uinput writer appends the SYN_REPORT itself
pub fn gesture_report_event(code: i32) -> InputEvent {
    InputEvent::new_now(EventType::RELATIVE, REL_GESTURE, code)
}

/// Axes the report device has to advertise, or the input core drops the events
pub fn report_axes() -> AttributeSet<RelativeAxisType> {
    let mut axes = AttributeSet::new();
    axes.insert(RelativeAxisType(REL_GESTURE));
    axes
}

/// Pin the calling thread to a single CPU
pub fn pin_current_thread(cpu: usize) -> nix::Result<()> {
    let mut set = CpuSet::new();
    set.set(cpu)?;
    sched_setaffinity(Pid::from_raw(0), &set)
}
