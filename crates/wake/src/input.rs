use libremarkable::{
    epoll,
    evdev::{AbsoluteAxisType, Device, EventType, InputEvent as EvInputEvent, Key},
    input::{scan::SCANNED, InputDevice},
};
use tracing::{error, info};

use std::{any::Any, os::unix::prelude::AsRawFd, thread::JoinHandle};

use crossbeam_channel::{unbounded, SendError, Sender, TryRecvError};
use gesture::TouchEvent;

use crate::{error::Error, worker::WorkerEvent, Command};

const EPOLL_TIMEOUT: i32 = 100;

const ABS_MT_SLOT: u16 = AbsoluteAxisType::ABS_MT_SLOT.0;
const ABS_MT_TRACKING_ID: u16 = AbsoluteAxisType::ABS_MT_TRACKING_ID.0;
const ABS_MT_POSITION_X: u16 = AbsoluteAxisType::ABS_MT_POSITION_X.0;
const ABS_MT_POSITION_Y: u16 = AbsoluteAxisType::ABS_MT_POSITION_Y.0;

pub struct InputHandles {
    pub touch_command: Sender<Command>,
    pub button_command: Sender<Command>,

    pub touch_handle: Option<JoinHandle<()>>,
    pub button_handle: Option<JoinHandle<()>>,
}

impl InputHandles {
    pub fn broadcast(&self, command: Command) -> Result<(), SendError<Command>> {
        self.touch_command.send(command)?;
        self.button_command.send(command)?;
        Ok(())
    }

    pub fn join(&mut self) -> Result<(), Box<dyn Any + Send>> {
        for handle in [self.touch_handle.take(), self.button_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.join()?;
        }
        Ok(())
    }
}

pub fn input_init(event_tx: Sender<WorkerEvent>) -> Result<InputHandles, Error> {
    let (touch_command, touch_handle) =
        input_thread(InputDevice::Multitouch, event_tx.clone(), decode_touch)?;

    let (button_command, button_handle) =
        input_thread(InputDevice::GPIO, event_tx, decode_button)?;

    Ok(InputHandles {
        touch_command,
        button_command,
        touch_handle: Some(touch_handle),
        button_handle: Some(button_handle),
    })
}

pub fn open_device(device_type: InputDevice) -> Result<Device, Error> {
    SCANNED
        .get_device(device_type)
        .map_err(|err| Error::DeviceOpen {
            device: format!("{device_type:?}"),
            reason: err.to_string(),
        })
}

/// Multitouch protocol B updates for the tracked contact
pub fn decode_touch(event: &EvInputEvent) -> Option<WorkerEvent> {
    if event.event_type() != EventType::ABSOLUTE {
        return None;
    }

    let touch = match event.code() {
        ABS_MT_SLOT => TouchEvent::SlotChange,
        ABS_MT_TRACKING_ID if event.value() == -1 => TouchEvent::Lift,
        ABS_MT_POSITION_X => TouchEvent::PositionX(event.value()),
        ABS_MT_POSITION_Y => TouchEvent::PositionY(event.value()),
        _ => return None,
    };

    Some(WorkerEvent::Touch(touch))
}

pub fn decode_button(event: &EvInputEvent) -> Option<WorkerEvent> {
    let pressed = event.event_type() == EventType::KEY
        && event.code() == Key::KEY_POWER.code()
        && event.value() == 1;

    pressed.then(|| WorkerEvent::PowerKeyPressed)
}

pub fn input_thread<F>(
    device_type: InputDevice,
    event_tx: Sender<WorkerEvent>,
    decode: F,
) -> Result<(Sender<Command>, JoinHandle<()>), Error>
where
    F: Fn(&EvInputEvent) -> Option<WorkerEvent> + Send + 'static,
{
    let mut device = open_device(device_type)?;
    let (command_tx, command_rx) = unbounded();

    let mut v = [epoll::Event {
        events: (epoll::Events::EPOLLET | epoll::Events::EPOLLIN | epoll::Events::EPOLLPRI).bits(),
        data: 0,
    }];

    let epfd = epoll::create(false).map_err(Error::Epoll)?;

    epoll::ctl(
        epfd,
        epoll::ControlOptions::EPOLL_CTL_ADD,
        device.as_raw_fd(),
        v[0],
    )
    .map_err(Error::Epoll)?;

    let join_handle = std::thread::spawn(move || {
        info!("Starting {device_type:?} epoll thread");

        'input: loop {
            'command: loop {
                match command_rx.try_recv() {
                    Ok(Command::Stop) => break 'input,
                    Err(TryRecvError::Empty) => break 'command,
                    Err(TryRecvError::Disconnected) => break 'input,
                }
            }

            match epoll::wait(epfd, EPOLL_TIMEOUT, &mut v[..]) {
                Ok(0) => continue,
                Ok(_) => match device.fetch_events() {
                    Ok(events) => {
                        for event in events.filter_map(|ev| decode(&ev)) {
                            if event_tx.send(event).is_err() {
                                info!("Worker gone, stopping {device_type:?} input");
                                break 'input;
                            }
                        }
                    }
                    Err(err) => error!("Failed to read {device_type:?} events: {err}"),
                },
                Err(err) => error!("epoll_wait failed: {err}"),
            }
        }

        if let Err(err) = epoll::close(epfd) {
            error!("Failed to close epoll descriptor: {err}");
        }

        info!("{device_type:?} epoll thread done");
    });

    Ok((command_tx, join_handle))
}
