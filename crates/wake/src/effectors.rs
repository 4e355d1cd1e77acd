use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use gesture::{Effectors, KeyEvent, KeyInjector, PowerKeySequence};
use libremarkable::{
    evdev::{
        uinput::{VirtualDevice, VirtualDeviceBuilder},
        Device,
    },
    input::InputDevice,
};
use shared::{gesture_report_event, key_event, report_axes, REPORT_DEVICE_NAME};
use tracing::{debug, error, info};
use tunables::HostPaths;

use crate::{error::Error, input::open_device};

/// Power key events written straight into the button device
pub struct EvdevKeys(Device);

impl KeyInjector for EvdevKeys {
    fn emit(&mut self, event: KeyEvent) -> io::Result<()> {
        self.0.send_events(&[key_event(event)])
    }
}

/// Timed output vibrators take the on time in milliseconds
pub fn write_vibrator(path: &Path, strength: u8) -> io::Result<()> {
    std::fs::write(path, strength.to_string())
}

/// Gesture reports get their own device advertising the report axis
pub fn create_report_device() -> io::Result<VirtualDevice> {
    VirtualDeviceBuilder::new()?
        .name(REPORT_DEVICE_NAME)
        .with_relative_axes(&report_axes())?
        .build()
}

pub struct DeviceEffectors {
    power: Arc<PowerKeySequence<EvdevKeys>>,
    reports: VirtualDevice,
    vibrator: Option<PathBuf>,
}

impl DeviceEffectors {
    pub fn open(host: &HostPaths) -> Result<Self, Error> {
        let buttons = open_device(InputDevice::GPIO)?;
        let reports = create_report_device().map_err(|source| Error::ReportDevice {
            name: REPORT_DEVICE_NAME,
            source,
        })?;
        info!("Created {REPORT_DEVICE_NAME} report device");

        Ok(DeviceEffectors {
            power: Arc::new(PowerKeySequence::new(EvdevKeys(buttons))),
            reports,
            vibrator: host.vibrator.clone(),
        })
    }
}

impl Effectors for DeviceEffectors {
    fn vibrate(&mut self, strength: u8) {
        let path = match &self.vibrator {
            Some(path) => path,
            None => return,
        };

        match write_vibrator(path, strength) {
            Ok(()) => (),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No vibrator at {}", path.display())
            }
            Err(err) => error!("Failed to vibrate: {err}"),
        }
    }

    /// The sequence sleeps between key events, so it runs on its own thread
    fn press_power_key(&mut self) {
        let power = self.power.clone();
        std::thread::spawn(move || {
            power.press();
        });
    }

    fn report_gesture(&mut self, code: i32) {
        if let Err(err) = self.reports.emit(&[gesture_report_event(code)]) {
            error!("Failed to report gesture {code}: {err}");
        }
    }
}
