//! Walk the Wayland registry and describe the announced globals.
//!
//! `wl_seat`, `wl_shm` and `wl_output` are bound at version 1 so their
//! capability, format and geometry events can be recorded; every other
//! global is only listed. Round-trips repeat until one completes without
//! binding anything new.

use crate::error::{InspectError, Result};
use std::fmt;
use wayland_client::protocol::wl_output::{self, WlOutput};
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_seat::{self, WlSeat};
use wayland_client::protocol::wl_shm::{self, WlShm};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};

/// A registry announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: u32,
    pub interface: String,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    pub flags: wl_output::Mode,
    pub width: i32,
    pub height: i32,
    /// mHz
    pub refresh: i32,
}

impl OutputMode {
    pub fn is_current(&self) -> bool {
        self.flags.contains(wl_output::Mode::Current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub global: Global,
    pub x: i32,
    pub y: i32,
    /// mm
    pub physical_width: i32,
    /// mm
    pub physical_height: i32,
    pub subpixel: WEnum<wl_output::Subpixel>,
    pub transform: WEnum<wl_output::Transform>,
    pub make: String,
    pub model: String,
    pub modes: Vec<OutputMode>,
}

impl OutputInfo {
    fn new(global: Global) -> Self {
        Self {
            global,
            x: 0,
            y: 0,
            physical_width: 0,
            physical_height: 0,
            subpixel: WEnum::Value(wl_output::Subpixel::Unknown),
            transform: WEnum::Value(wl_output::Transform::Normal),
            make: String::new(),
            model: String::new(),
            modes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShmInfo {
    pub global: Global,
    pub formats: Vec<WEnum<wl_shm::Format>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatInfo {
    pub global: Global,
    pub capabilities: wl_seat::Capability,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalInfo {
    Output(OutputInfo),
    Shm(ShmInfo),
    Seat(SeatInfo),
    Generic(Global),
}

impl GlobalInfo {
    pub fn global(&self) -> &Global {
        match self {
            Self::Output(o) => &o.global,
            Self::Shm(s) => &s.global,
            Self::Seat(s) => &s.global,
            Self::Generic(g) => g,
        }
    }

    /// The report lines for this global, newline terminated.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GlobalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let global = self.global();
        writeln!(
            f,
            "interface: '{}', version: {}, name: {}",
            global.interface, global.version, global.name
        )?;

        match self {
            Self::Output(output) => describe_output(f, output),
            Self::Shm(shm) => {
                f.write_str("\tformats:")?;
                for format in &shm.formats {
                    write!(f, " {}", format_name(*format))?;
                }
                writeln!(f)
            }
            Self::Seat(seat) => {
                f.write_str("\tcapabilities:")?;
                for (flag, name) in [
                    (wl_seat::Capability::Pointer, "pointer"),
                    (wl_seat::Capability::Keyboard, "keyboard"),
                    (wl_seat::Capability::Touch, "touch"),
                ] {
                    if seat.capabilities.contains(flag) {
                        write!(f, " {}", name)?;
                    }
                }
                writeln!(f)
            }
            Self::Generic(_) => Ok(()),
        }
    }
}

fn describe_output(f: &mut fmt::Formatter<'_>, output: &OutputInfo) -> fmt::Result {
    writeln!(f, "\tx: {}, y: {},", output.x, output.y)?;
    writeln!(
        f,
        "\tphysical_width: {} mm, physical_height: {} mm,",
        output.physical_width, output.physical_height
    )?;
    writeln!(f, "\tmake: '{}', model: '{}',", output.make, output.model)?;
    writeln!(
        f,
        "\tsubpixel_orientation: {}, output_transform: {},",
        subpixel_name(output.subpixel),
        transform_name(output.transform)
    )?;

    for mode in &output.modes {
        writeln!(f, "\tmode:")?;
        writeln!(
            f,
            "\t\twidth: {} px, height: {} px, refresh: {:.0} Hz,",
            mode.width,
            mode.height,
            mode.refresh as f32 / 1000.0
        )?;
        f.write_str("\t\tflags:")?;
        if mode.flags.contains(wl_output::Mode::Current) {
            f.write_str(" current")?;
        }
        if mode.flags.contains(wl_output::Mode::Preferred) {
            f.write_str(" preferred")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn subpixel_name(subpixel: WEnum<wl_output::Subpixel>) -> &'static str {
    use wl_output::Subpixel;
    match subpixel {
        WEnum::Value(Subpixel::Unknown) => "unknown",
        WEnum::Value(Subpixel::None) => "none",
        WEnum::Value(Subpixel::HorizontalRgb) => "horizontal rgb",
        WEnum::Value(Subpixel::HorizontalBgr) => "horizontal bgr",
        WEnum::Value(Subpixel::VerticalRgb) => "vertical rgb",
        WEnum::Value(Subpixel::VerticalBgr) => "vertical bgr",
        other => {
            log::warn!("unknown subpixel orientation {:?}", other);
            "unexpected value"
        }
    }
}

fn transform_name(transform: WEnum<wl_output::Transform>) -> &'static str {
    use wl_output::Transform;
    match transform {
        WEnum::Value(Transform::Normal) => "normal",
        WEnum::Value(Transform::_90) => "90°",
        WEnum::Value(Transform::_180) => "180°",
        WEnum::Value(Transform::_270) => "270°",
        WEnum::Value(Transform::Flipped) => "flipped",
        WEnum::Value(Transform::Flipped90) => "flipped 90°",
        WEnum::Value(Transform::Flipped180) => "flipped 180°",
        WEnum::Value(Transform::Flipped270) => "flipped 270°",
        other => {
            log::warn!("unknown output transform {:?}", other);
            "unexpected value"
        }
    }
}

fn format_name(format: WEnum<wl_shm::Format>) -> String {
    match format {
        WEnum::Value(wl_shm::Format::Argb8888) => "ARGB8888".to_string(),
        WEnum::Value(wl_shm::Format::Xrgb8888) => "XRGB8888".to_string(),
        WEnum::Value(other) => format!("{:?}", other).to_uppercase(),
        WEnum::Unknown(code) => format!("0x{:08x}", code),
    }
}

#[derive(Default)]
struct RegistryState {
    globals: Vec<GlobalInfo>,
    roundtrip_needed: bool,
}

impl RegistryState {
    fn get_mut(&mut self, index: usize) -> Option<&mut GlobalInfo> {
        self.globals.get_mut(index)
    }
}

impl Dispatch<WlRegistry, ()> for RegistryState {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        else {
            return;
        };

        log::debug!("Global {}: {} v{}", name, interface, version);
        let index = state.globals.len();
        let global = Global {
            name,
            interface,
            version,
        };

        let info = match global.interface.as_str() {
            "wl_seat" => {
                registry.bind::<WlSeat, _, _>(name, 1, qh, index);
                GlobalInfo::Seat(SeatInfo {
                    global,
                    capabilities: wl_seat::Capability::empty(),
                })
            }
            "wl_shm" => {
                registry.bind::<WlShm, _, _>(name, 1, qh, index);
                GlobalInfo::Shm(ShmInfo {
                    global,
                    formats: Vec::new(),
                })
            }
            "wl_output" => {
                registry.bind::<WlOutput, _, _>(name, 1, qh, index);
                GlobalInfo::Output(OutputInfo::new(global))
            }
            _ => GlobalInfo::Generic(global),
        };

        if !matches!(info, GlobalInfo::Generic(_)) {
            state.roundtrip_needed = true;
        }
        state.globals.push(info);
    }
}

impl Dispatch<WlSeat, usize> for RegistryState {
    fn event(
        state: &mut Self,
        _proxy: &WlSeat,
        event: wl_seat::Event,
        data: &usize,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities { capabilities } = event
            && let Some(GlobalInfo::Seat(seat)) = state.get_mut(*data)
        {
            seat.capabilities = match capabilities {
                WEnum::Value(caps) => caps,
                WEnum::Unknown(bits) => wl_seat::Capability::from_bits_truncate(bits),
            };
        }
    }
}

impl Dispatch<WlShm, usize> for RegistryState {
    fn event(
        state: &mut Self,
        _proxy: &WlShm,
        event: wl_shm::Event,
        data: &usize,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event
            && let Some(GlobalInfo::Shm(shm)) = state.get_mut(*data)
        {
            shm.formats.push(format);
        }
    }
}

impl Dispatch<WlOutput, usize> for RegistryState {
    fn event(
        state: &mut Self,
        _proxy: &WlOutput,
        event: wl_output::Event,
        data: &usize,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(GlobalInfo::Output(output)) = state.get_mut(*data) else {
            return;
        };

        match event {
            wl_output::Event::Geometry {
                x,
                y,
                physical_width,
                physical_height,
                subpixel,
                make,
                model,
                transform,
            } => {
                output.x = x;
                output.y = y;
                output.physical_width = physical_width;
                output.physical_height = physical_height;
                output.subpixel = subpixel;
                output.make = make;
                output.model = model;
                output.transform = transform;
            }
            wl_output::Event::Mode {
                flags,
                width,
                height,
                refresh,
            } => {
                let flags = match flags {
                    WEnum::Value(flags) => flags,
                    WEnum::Unknown(bits) => wl_output::Mode::from_bits_truncate(bits),
                };
                output.modes.push(OutputMode {
                    flags,
                    width,
                    height,
                    refresh,
                });
            }
            _ => {}
        }
    }
}

/// Whether a connection to the compositor can be opened
pub fn running() -> bool {
    Connection::connect_to_env().is_ok()
}

/// Every global announced by the compositor, in announcement order.
pub fn globals() -> Result<Vec<GlobalInfo>> {
    let conn =
        Connection::connect_to_env().map_err(|e| InspectError::WaylandConnect(e.to_string()))?;
    let mut queue = conn.new_event_queue();
    let qh = queue.handle();
    let _registry = conn.display().get_registry(&qh, ());

    let mut state = RegistryState::default();
    loop {
        state.roundtrip_needed = false;
        queue.roundtrip(&mut state)?;
        if !state.roundtrip_needed {
            break;
        }
    }

    log::debug!("Collected {} globals", state.globals.len());
    Ok(state.globals)
}

/// The formatted report for the current compositor
pub fn info_string() -> Result<String> {
    Ok(globals()?.iter().map(GlobalInfo::describe).collect())
}

pub fn outputs() -> Result<Vec<OutputInfo>> {
    Ok(globals()?
        .into_iter()
        .filter_map(|g| match g {
            GlobalInfo::Output(output) => Some(output),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(name: u32, interface: &str, version: u32) -> Global {
        Global {
            name,
            interface: interface.to_string(),
            version,
        }
    }

    #[test]
    fn test_describe_generic() {
        let info = GlobalInfo::Generic(global(7, "xdg_wm_base", 5));
        assert_eq!(
            info.describe(),
            "interface: 'xdg_wm_base', version: 5, name: 7\n"
        );
    }

    #[test]
    fn test_describe_seat() {
        let info = GlobalInfo::Seat(SeatInfo {
            global: global(3, "wl_seat", 8),
            capabilities: wl_seat::Capability::Pointer | wl_seat::Capability::Keyboard,
        });
        assert_eq!(
            info.describe(),
            "interface: 'wl_seat', version: 8, name: 3\n\tcapabilities: pointer keyboard\n"
        );
    }

    #[test]
    fn test_describe_shm() {
        let info = GlobalInfo::Shm(ShmInfo {
            global: global(2, "wl_shm", 1),
            formats: vec![
                WEnum::Value(wl_shm::Format::Argb8888),
                WEnum::Value(wl_shm::Format::Xrgb8888),
                WEnum::Unknown(0x1234),
            ],
        });
        assert!(
            info.describe()
                .ends_with("\tformats: ARGB8888 XRGB8888 0x00001234\n")
        );
    }

    #[test]
    fn test_describe_output() {
        let mut output = OutputInfo::new(global(9, "wl_output", 4));
        output.physical_width = 600;
        output.physical_height = 340;
        output.subpixel = WEnum::Value(wl_output::Subpixel::HorizontalRgb);
        output.transform = WEnum::Value(wl_output::Transform::_90);
        output.make = "Dell".to_string();
        output.model = "U2720Q".to_string();
        output.modes.push(OutputMode {
            flags: wl_output::Mode::Current | wl_output::Mode::Preferred,
            width: 3840,
            height: 2160,
            refresh: 59997,
        });

        let text = GlobalInfo::Output(output).describe();
        assert!(text.contains("\tphysical_width: 600 mm, physical_height: 340 mm,\n"));
        assert!(text.contains("\tmake: 'Dell', model: 'U2720Q',\n"));
        assert!(text.contains("subpixel_orientation: horizontal rgb, output_transform: 90°,"));
        assert!(text.contains("\t\twidth: 3840 px, height: 2160 px, refresh: 60 Hz,\n"));
        assert!(text.ends_with("\t\tflags: current preferred\n"));
    }

    #[test]
    fn test_display_matches_describe() {
        let info = GlobalInfo::Seat(SeatInfo {
            global: global(4, "wl_seat", 1),
            capabilities: wl_seat::Capability::Touch,
        });
        assert_eq!(format!("{}", info), info.describe());
        assert!(info.to_string().ends_with("\tcapabilities: touch\n"));
    }

    #[test]
    fn test_unexpected_enum_values() {
        assert_eq!(subpixel_name(WEnum::Unknown(42)), "unexpected value");
        assert_eq!(transform_name(WEnum::Unknown(42)), "unexpected value");
    }
}
