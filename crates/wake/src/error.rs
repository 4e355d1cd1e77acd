/// Failures of the host side of the daemon
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open {device} input device: {reason}")]
    DeviceOpen { device: String, reason: String },
    #[error("Failed to create the {name} uinput device: {source}")]
    ReportDevice {
        name: &'static str,
        source: std::io::Error,
    },
    #[error("Failed to set up epoll: {0}")]
    Epoll(std::io::Error),
    #[error("Failed to pin thread to CPU {cpu}: {source}")]
    Affinity { cpu: usize, source: nix::Error },
    #[error("Failed to block termination signals: {0}")]
    Signals(nix::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
