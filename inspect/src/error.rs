use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("not connected over Wayland: {0}")]
    WaylandConnect(String),

    #[error("Wayland protocol error: {0}")]
    WaylandDispatch(#[from] wayland_client::DispatchError),

    #[error("not connected over X11: {0}")]
    X11Connect(String),

    #[error("could not detect either Wayland or X")]
    NoDisplay,
}

pub type Result<T, E = InspectError> = std::result::Result<T, E>;
