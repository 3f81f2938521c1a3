use crate::backend::DisplayBackend;
use common::Monitor;

/// Work out the monitor rectangles for a `width`x`height` virtual screen.
///
/// Uses the multi-monitor extension when it reports at least one usable
/// rectangle, otherwise a single monitor covering the whole screen. Never
/// fails: a missing extension or a failed query is the fallback path.
pub fn update_geometry<B: DisplayBackend + ?Sized>(
    backend: &mut B,
    (width, height): (u32, u32),
    monitor_limit: Option<usize>,
) -> Vec<Monitor> {
    let mut monitors: Vec<Monitor> = backend
        .monitors()
        .unwrap_or_default()
        .into_iter()
        .filter(|m| {
            if !m.is_valid() {
                log::debug!("Ignoring empty monitor {}", m);
            }
            m.is_valid()
        })
        .collect();

    if let Some(limit) = monitor_limit
        && monitors.len() > limit
    {
        log::debug!("Using the first {} of {} monitors", limit, monitors.len());
        monitors.truncate(limit);
    }

    if monitors.is_empty() {
        log::debug!("No multi-monitor information, using the whole screen");
        monitors.push(Monitor::full_screen(
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        ));
    }

    for (i, m) in monitors.iter().enumerate() {
        log::debug!("Monitor {}: {}", i, m);
    }

    monitors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Rgb;
    use common::Result;
    use image::RgbaImage;

    struct FixedMonitors(Option<Vec<Monitor>>);

    impl DisplayBackend for FixedMonitors {
        fn screen_size(&self) -> (u32, u32) {
            (3840, 1080)
        }
        fn monitors(&mut self) -> Option<Vec<Monitor>> {
            self.0.clone()
        }
        fn alloc_color(&mut self, _name: &str) -> Result<Rgb> {
            Ok(Rgb::BLACK)
        }
        fn watch_root(&mut self) -> Result<()> {
            Ok(())
        }
        fn present(&mut self, _buffer: &RgbaImage) -> Result<()> {
            Ok(())
        }
        fn wait_for_reconfigure(&mut self) -> Result<Option<(u32, u32)>> {
            Ok(None)
        }
    }

    #[test]
    fn test_fallback_without_extension() {
        let mut backend = FixedMonitors(None);
        let monitors = update_geometry(&mut backend, (1920, 1080), None);
        assert_eq!(monitors, vec![Monitor::new(0, 0, 1920, 1080)]);
    }

    #[test]
    fn test_fallback_on_empty_list() {
        let mut backend = FixedMonitors(Some(Vec::new()));
        let monitors = update_geometry(&mut backend, (1280, 1024), None);
        assert_eq!(monitors, vec![Monitor::new(0, 0, 1280, 1024)]);
    }

    #[test]
    fn test_extension_monitors_in_order() {
        let reported = vec![
            Monitor::new(1920, 0, 1920, 1080),
            Monitor::new(0, 0, 1920, 1080),
        ];
        let mut backend = FixedMonitors(Some(reported.clone()));
        assert_eq!(update_geometry(&mut backend, (3840, 1080), None), reported);
    }

    #[test]
    fn test_invalid_rectangles_dropped() {
        let mut backend = FixedMonitors(Some(vec![
            Monitor::new(0, 0, 0, 1080),
            Monitor::new(0, 0, 1920, 1080),
        ]));
        let monitors = update_geometry(&mut backend, (1920, 1080), None);
        assert_eq!(monitors, vec![Monitor::new(0, 0, 1920, 1080)]);

        let mut backend = FixedMonitors(Some(vec![Monitor::new(0, 0, 1920, -1)]));
        let monitors = update_geometry(&mut backend, (1920, 1080), None);
        assert_eq!(monitors, vec![Monitor::new(0, 0, 1920, 1080)]);
    }

    #[test]
    fn test_monitor_limit() {
        let reported: Vec<_> = (0..10).map(|i| Monitor::new(i * 100, 0, 100, 100)).collect();
        let mut backend = FixedMonitors(Some(reported.clone()));
        let monitors = update_geometry(&mut backend, (1000, 100), Some(8));
        assert_eq!(monitors, reported[..8]);

        let monitors = update_geometry(&mut backend, (1000, 100), None);
        assert_eq!(monitors.len(), 10);
    }
}
