//! Parser for wake gesture tunables files
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use gesture::{GestureConfig, ResumePolicy, ScreenGeometry};
use tracing::warn;

pub const DEFAULT_TUNABLES_PATH: &'static str = "/opt/etc/wake-gestures.conf";
pub const DEFAULT_DISPLAY_STATE_PATH: &'static str = "/sys/class/graphics/fb0/blank";
pub const DEFAULT_VIBRATOR_PATH: &'static str = "/sys/class/timed_output/vibrator/enable";

/// Where the daemon finds the world outside the touch panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub display_state: PathBuf,
    pub proximity: Option<PathBuf>,
    pub vibrator: Option<PathBuf>,
    pub panel_max_x: i32,
    pub panel_max_y: i32,
}

impl Default for HostPaths {
    fn default() -> Self {
        let reference = ScreenGeometry::default();
        HostPaths {
            display_state: DEFAULT_DISPLAY_STATE_PATH.into(),
            proximity: None,
            vibrator: Some(DEFAULT_VIBRATOR_PATH.into()),
            panel_max_x: reference.max_x,
            panel_max_y: reference.max_y,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tunables {
    pub gesture: GestureConfig,
    pub host: HostPaths,
}

impl Tunables {
    /// Never fails. Bad lines are logged and skipped, bad values clamped.
    /// Keys apply in file order.
    pub fn parse(input: &str) -> Self {
        let mut tunables = Tunables::default();

        for line in input
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#') && !line.is_empty())
        {
            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => {
                    warn!("Ignoring malformed tunables line {line:?}");
                    continue;
                }
            };

            match key {
                "display_state_path" => tunables.host.display_state = value.into(),
                "proximity_path" => tunables.host.proximity = optional_path(value),
                "vibrator_path" => tunables.host.vibrator = optional_path(value),
                _ => {
                    let raw = match value.parse::<i64>() {
                        Ok(raw) => raw,
                        Err(_) => {
                            warn!("Ignoring {key}: {value:?} is not a number");
                            continue;
                        }
                    };
                    tunables.set(key, raw);
                }
            }
        }

        tunables
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Tunables::parse(&std::fs::read_to_string(path)?))
    }

    pub fn geometry(&self) -> ScreenGeometry {
        ScreenGeometry::scaled(self.host.panel_max_x, self.host.panel_max_y)
    }

    fn set(&mut self, key: &str, raw: i64) {
        let gesture = &mut self.gesture;
        match key {
            "sweep2wake" => gesture.set_sweep_wake(raw),
            "sweep2sleep" => gesture.set_sweep_sleep(raw),
            "doubletap2wake" => gesture.set_doubletap_wake(raw),
            "doubletap2sleep" => gesture.set_doubletap_sleep(raw),
            "doubletap2sleep_x" => gesture.set_sleep_tap_x(raw),
            "doubletap2sleep_y" => gesture.set_sleep_tap_y(raw),
            "wake_timeout" => gesture.set_touchwake_timeout(raw),
            "vib_strength" => gesture.set_vibration_strength(raw),
            "wake_gestures" => gesture.set_notification_mode(raw),
            "touchwake_rearm_on_resume" => gesture.set_touchwake_resume(raw),
            "panel_max_x" => {
                self.host.panel_max_x = panel_max(key, raw, ScreenGeometry::default().max_x)
            }
            "panel_max_y" => {
                self.host.panel_max_y = panel_max(key, raw, ScreenGeometry::default().max_y)
            }
            _ => warn!("Ignoring unknown tunable {key}"),
        }
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(value.into())
    }
}

fn panel_max(key: &str, raw: i64, reference: i32) -> i32 {
    match i32::try_from(raw) {
        Ok(max) if max > 0 => max,
        _ => {
            warn!("{key}={raw} out of range, using {reference}");
            reference
        }
    }
}

fn path_or_empty(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}

/// Renders in a form [`Tunables::parse`] reads back unchanged
impl Display for Tunables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gesture = &self.gesture;
        writeln!(f, "sweep2wake={}", gesture.sweep_wake.bits())?;
        writeln!(f, "sweep2sleep={}", gesture.sweep_sleep.bits())?;
        writeln!(f, "doubletap2wake={}", gesture.doubletap_wake as u8)?;
        writeln!(f, "doubletap2sleep={}", gesture.doubletap_sleep as u8)?;
        writeln!(f, "doubletap2sleep_x={}", gesture.sleep_tap_region.max_x)?;
        writeln!(f, "doubletap2sleep_y={}", gesture.sleep_tap_region.max_y)?;
        writeln!(f, "wake_timeout={}", gesture.touchwake_timeout_ms)?;
        writeln!(f, "vib_strength={}", gesture.vibration_strength)?;
        writeln!(f, "wake_gestures={}", gesture.notification_mode as u8)?;
        writeln!(
            f,
            "touchwake_rearm_on_resume={}",
            (gesture.touchwake_resume == ResumePolicy::Rearm) as u8
        )?;

        let host = &self.host;
        writeln!(f, "display_state_path={}", host.display_state.display())?;
        writeln!(f, "proximity_path={}", path_or_empty(&host.proximity))?;
        writeln!(f, "vibrator_path={}", path_or_empty(&host.vibrator))?;
        writeln!(f, "panel_max_x={}", host.panel_max_x)?;
        write!(f, "panel_max_y={}", host.panel_max_y)
    }
}
