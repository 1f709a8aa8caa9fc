//! # Watch Face Engine
//!
//! [`WatchFace`] is the single object the host adapter talks to. Each host
//! callback maps onto one method here, and every method runs to completion
//! before the next callback is delivered.
//!
//! ## Responsibilities
//! - **Render loop**: keeps the once-per-second tick running exactly while the
//!   face is visible and interactive
//! - **Weather sync**: feeds listener events and the post-connect catch-up into
//!   [`WeatherSync`]
//! - **Frame building**: turns the current state into a [`FaceFrame`]
//!
//! ## Redraw Coalescing
//! Anything that changes what is on screen calls [`WatchFace::invalidate`],
//! which only sets a flag. The adapter paints when [`WatchFace::take_redraw`]
//! returns true, so a burst of updates between paints costs one paint.

use crate::clock::TimeBasis;
use crate::companion::{CompanionLink, LinkError};
use crate::config::{Config, LayoutConfig};
use crate::format::format_temperature;
use crate::render_loop::{RenderLoop, ScheduledTick, TickOutcome};
use crate::renderer::{Background, FaceFrame, WeatherLine};
use crate::weather::{DataEvent, DataItem, DataMap, UpdateOutcome, WeatherSync};
use crate::{RenderState, WeatherSnapshot};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

/// Screen outline reported with the window insets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenShape {
    Square,
    Round,
}

/// Stage of a touch gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapKind {
    /// Finger down
    Touch,
    /// Gesture turned into something else
    TouchCancel,
    /// Completed tap
    Tap,
}

/// The watch face engine.
pub struct WatchFace<L: CompanionLink> {
    config: Config,
    link: L,
    state: RenderState,
    weather: WeatherSync,
    render_loop: RenderLoop,
    clock: TimeBasis,
    layout: LayoutConfig,
    timezone_registered: bool,
    dirty: bool,
}

impl<L: CompanionLink> WatchFace<L> {
    /// Create a hidden, interactive-mode face.
    pub fn new(config: Config, link: L) -> Self {
        let layout = config.layout.for_shape(config.display.round);
        Self {
            weather: WeatherSync::new(config.face.sync.clone()),
            render_loop: RenderLoop::new(config.face.update_rate_ms),
            clock: TimeBasis::system(),
            state: RenderState::default(),
            timezone_registered: false,
            dirty: true,
            layout,
            config,
            link,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn weather(&self) -> &WeatherSnapshot {
        self.weather.snapshot()
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn clock(&self) -> &TimeBasis {
        &self.clock
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Whether the adapter should keep the timezone-changed receiver registered.
    pub fn timezone_registered(&self) -> bool {
        self.timezone_registered
    }

    /// The tick the adapter should have armed.
    pub fn pending_tick(&self) -> Option<ScheduledTick> {
        self.render_loop.pending()
    }

    /// Request a repaint.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Consume the pending repaint request, if any.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Face shown or hidden.
    pub fn set_visible(&mut self, visible: bool, now_ms: u64) -> Option<ScheduledTick> {
        self.state.visible = visible;

        if visible {
            if let Err(e) = self.link.connect() {
                warn!("companion connect failed: {}", e);
            }
            self.register_timezone();
            // The zone may have changed while hidden.
            self.clock = TimeBasis::system();
        } else {
            self.unregister_timezone();
            if self.link.is_connected() {
                self.link.remove_listener();
                self.link.disconnect();
                info!("companion disconnected");
            }
        }

        self.update_timer(now_ms)
    }

    /// Entered or left ambient mode.
    pub fn set_ambient(&mut self, ambient: bool, now_ms: u64) -> Option<ScheduledTick> {
        if self.state.ambient != ambient {
            self.state.ambient = ambient;
            self.invalidate();
        }
        self.update_timer(now_ms)
    }

    /// Device property: display uses fewer bits per colour in ambient mode.
    pub fn set_low_bit_ambient(&mut self, low_bit: bool) {
        self.state.low_bit_ambient = low_bit;
    }

    /// Window insets arrived; pick the layout for the screen shape.
    pub fn apply_window_insets(&mut self, shape: ScreenShape) {
        self.layout = self.config.layout.for_shape(shape == ScreenShape::Round);
        self.invalidate();
    }

    /// Touch input. Completed taps toggle the background colour.
    pub fn on_tap(&mut self, kind: TapKind) {
        if kind == TapKind::Tap {
            self.state.tap_count = self.state.tap_count.wrapping_add(1);
        }
        self.invalidate();
    }

    /// Host's periodic time tick (once a minute in ambient mode).
    pub fn on_time_tick(&mut self) {
        self.invalidate();
    }

    /// Timezone-changed broadcast.
    pub fn on_timezone_changed(&mut self, id: &str) {
        self.clock.apply_timezone(id);
        self.invalidate();
    }

    /// Interactive tick `id` fired.
    pub fn on_tick(&mut self, id: u64, now_ms: u64) -> Option<ScheduledTick> {
        match self.render_loop.fire(id, self.state.should_tick(), now_ms) {
            TickOutcome::Redraw { next } => {
                self.invalidate();
                next
            }
            TickOutcome::Stale => None,
        }
    }

    /// Companion connection established: listen, then catch up.
    pub fn on_connected(&mut self) {
        if let Err(e) = self.link.add_listener() {
            warn!("could not attach data listener: {}", e);
        }
        match self.link.stored_items() {
            Ok(items) => self.catch_up(&items),
            Err(e) => warn!("failed getting weather info: {}", e),
        }
    }

    pub fn on_connection_suspended(&mut self, cause: i32) {
        debug!("companion connection suspended: {}", cause);
    }

    pub fn on_connection_failed(&mut self, error: &LinkError) {
        debug!("companion connection failed: {}", error);
    }

    /// Listener delivered a batch of change events.
    pub fn on_data_changed(&mut self, events: &[DataEvent]) {
        if self.weather.apply_events(events) {
            self.invalidate();
        }
    }

    /// Apply every stored item, in order.
    pub fn catch_up(&mut self, items: &[DataItem]) {
        info!("syncing {} stored items", items.len());
        for item in items {
            if self.weather.apply_item(item).wants_redraw() {
                self.invalidate();
            }
        }
    }

    /// Apply one weather update directly.
    pub fn apply_update(&mut self, fields: &DataMap) -> UpdateOutcome {
        let outcome = self.weather.apply_update(fields);
        if outcome.wants_redraw() {
            self.invalidate();
        }
        outcome
    }

    /// Engine teardown.
    pub fn destroy(&mut self) {
        self.render_loop.cancel();
        self.unregister_timezone();
    }

    /// Describe what to paint at `now`.
    pub fn frame(&self, now: DateTime<Utc>) -> FaceFrame {
        let ambient = self.state.ambient;
        let time = self.clock.time_text(now, ambient);

        if ambient {
            return FaceFrame {
                background: Background::Black,
                time,
                date: None,
                weather: None,
                crisp_text: self.state.crisp_text(),
            };
        }

        let snapshot = self.weather.snapshot();
        let template = &self.config.face.temperature_format;

        FaceFrame {
            background: if self.state.tap_count % 2 == 0 {
                Background::Primary
            } else {
                Background::Alternate
            },
            time,
            date: Some(self.clock.date_text(now, &self.config.face.date_format)),
            weather: Some(WeatherLine {
                icon: snapshot.icon(),
                high: format_temperature(template, snapshot.high_temperature),
                low: format_temperature(template, snapshot.low_temperature),
            }),
            crisp_text: false,
        }
    }

    fn update_timer(&mut self, now_ms: u64) -> Option<ScheduledTick> {
        self.render_loop
            .set_should_run(self.state.should_tick(), now_ms)
    }

    fn register_timezone(&mut self) {
        if !self.timezone_registered {
            self.timezone_registered = true;
            debug!("timezone receiver registered");
        }
    }

    fn unregister_timezone(&mut self) {
        if self.timezone_registered {
            self.timezone_registered = false;
            debug!("timezone receiver unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{
        DataEventKind, SyncValue, WeatherIcon, CONDITION_KEY, HIGH_TEMP_KEY, LOW_TEMP_KEY,
    };
    use chrono::TimeZone;

    /// Link that records calls and serves canned items.
    #[derive(Default)]
    struct MockLink {
        connected: bool,
        listening: bool,
        connects: usize,
        fail_connect: bool,
        items: Vec<DataItem>,
    }

    impl CompanionLink for MockLink {
        fn connect(&mut self) -> Result<(), LinkError> {
            self.connects += 1;
            if self.fail_connect {
                return Err(LinkError::Connection("no phone".into()));
            }
            self.connected = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn add_listener(&mut self) -> Result<(), LinkError> {
            self.listening = true;
            Ok(())
        }

        fn remove_listener(&mut self) {
            self.listening = false;
        }

        fn stored_items(&mut self) -> Result<Vec<DataItem>, LinkError> {
            Ok(self.items.clone())
        }
    }

    fn weather_item(entries: &[(&str, SyncValue)]) -> DataItem {
        DataItem {
            path: "/weatherinfo".into(),
            data: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn face() -> WatchFace<MockLink> {
        WatchFace::new(Config::default(), MockLink::default())
    }

    #[test]
    fn test_tick_runs_only_visible_and_interactive() {
        let mut face = face();
        assert_eq!(face.pending_tick(), None);

        let tick = face.set_visible(true, 1_000).unwrap();
        assert_eq!(tick.delay_ms, 0);

        assert_eq!(face.set_ambient(true, 1_100), None);
        assert_eq!(face.on_tick(tick.id, 1_100), None);

        let tick = face.set_ambient(false, 1_200).unwrap();
        assert!(face.set_visible(false, 1_300).is_none());
        assert_eq!(face.on_tick(tick.id, 1_300), None);
        assert_eq!(face.pending_tick(), None);
    }

    #[test]
    fn test_tick_reschedules_on_second_boundary() {
        let mut face = face();
        let tick = face.set_visible(true, 5_432).unwrap();
        face.take_redraw();

        let next = face.on_tick(tick.id, 5_432).unwrap();
        assert!(face.take_redraw());
        assert_eq!(next.delay_ms, 568);
        assert_eq!(next.due_ms, 6_000);
        assert_eq!(face.pending_tick(), Some(next));
    }

    #[test]
    fn test_visibility_drives_link_and_timezone() {
        let mut face = face();
        face.set_visible(true, 0);
        face.on_connected();
        assert!(face.link().connected);
        assert!(face.link().listening);
        assert!(face.timezone_registered());

        face.set_visible(true, 10);
        assert_eq!(face.link().connects, 2);

        face.set_visible(false, 20);
        assert!(!face.link().connected);
        assert!(!face.link().listening);
        assert!(!face.timezone_registered());
    }

    #[test]
    fn test_connect_failure_keeps_default_weather() {
        let link = MockLink {
            fail_connect: true,
            ..MockLink::default()
        };
        let mut face = WatchFace::new(Config::default(), link);
        face.set_visible(true, 0);

        assert!(!face.link().connected);
        assert_eq!(*face.weather(), WeatherSnapshot::default());
        assert!(face.pending_tick().is_some());
    }

    #[test]
    fn test_catch_up_after_connect() {
        let link = MockLink {
            items: vec![
                weather_item(&[
                    (HIGH_TEMP_KEY, SyncValue::Float(24.6)),
                    (LOW_TEMP_KEY, SyncValue::Float(13.2)),
                    (CONDITION_KEY, SyncValue::Int(801)),
                ]),
                DataItem {
                    path: "/other".into(),
                    data: DataMap::new(),
                },
            ],
            ..MockLink::default()
        };
        let mut face = WatchFace::new(Config::default(), link);
        face.set_visible(true, 0);
        face.take_redraw();

        face.on_connected();

        assert!(face.take_redraw());
        assert_eq!(face.weather().high_temperature, 24.6);
        assert_eq!(face.weather().icon(), Some(WeatherIcon::LightClouds));
    }

    #[test]
    fn test_data_changed_requests_redraw_only_when_applied() {
        let mut face = face();
        face.take_redraw();

        face.on_data_changed(&[DataEvent {
            kind: DataEventKind::Changed,
            item: weather_item(&[("pressure", SyncValue::Int(1013))]),
        }]);
        assert!(!face.take_redraw());

        face.on_data_changed(&[DataEvent {
            kind: DataEventKind::Changed,
            item: weather_item(&[(LOW_TEMP_KEY, SyncValue::Float(-3.0))]),
        }]);
        assert!(face.take_redraw());
        assert_eq!(face.weather().low_temperature, -3.0);
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let mut face = face();
        face.take_redraw();

        face.on_time_tick();
        face.on_tap(TapKind::Touch);
        face.on_timezone_changed("UTC");

        assert!(face.take_redraw());
        assert!(!face.take_redraw());
    }

    #[test]
    fn test_taps_toggle_background() {
        let mut face = face();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

        face.on_tap(TapKind::Touch);
        face.on_tap(TapKind::TouchCancel);
        assert_eq!(face.state().tap_count, 0);
        assert_eq!(face.frame(now).background, Background::Primary);

        face.on_tap(TapKind::Tap);
        assert_eq!(face.frame(now).background, Background::Alternate);

        face.on_tap(TapKind::Tap);
        assert_eq!(face.frame(now).background, Background::Primary);
    }

    #[test]
    fn test_interactive_frame() {
        let mut face = face();
        face.on_timezone_changed("+02:00");
        face.apply_update(&weather_item(&[
            (HIGH_TEMP_KEY, SyncValue::Float(71.5)),
            (LOW_TEMP_KEY, SyncValue::Float(-0.4)),
            (CONDITION_KEY, SyncValue::Int(511)),
        ])
        .data);

        let now = Utc.with_ymd_and_hms(2025, 7, 4, 7, 3, 9).unwrap();
        let frame = face.frame(now);

        assert_eq!(frame.time, "9:03:09");
        assert_eq!(frame.date.as_deref(), Some("FRI, JUL 4 2025"));
        assert_eq!(
            frame.weather,
            Some(WeatherLine {
                icon: Some(WeatherIcon::Snow),
                high: "72°".into(),
                low: "0°".into(),
            })
        );
        assert!(!frame.crisp_text);
    }

    #[test]
    fn test_ambient_frame() {
        let mut face = face();
        face.on_timezone_changed("UTC");
        face.set_low_bit_ambient(true);
        face.set_ambient(true, 0);

        let now = Utc.with_ymd_and_hms(2025, 7, 4, 7, 3, 9).unwrap();
        let frame = face.frame(now);

        assert_eq!(frame.background, Background::Black);
        assert_eq!(frame.time, "7:03");
        assert_eq!(frame.date, None);
        assert_eq!(frame.weather, None);
        assert!(frame.crisp_text);
    }

    #[test]
    fn test_insets_pick_layout() {
        let mut face = face();
        face.apply_window_insets(ScreenShape::Round);
        assert_eq!(*face.layout(), face.config().layout.round);
        face.apply_window_insets(ScreenShape::Square);
        assert_eq!(*face.layout(), face.config().layout.square);
    }

    #[test]
    fn test_destroy_cancels_tick() {
        let mut face = face();
        let tick = face.set_visible(true, 0).unwrap();
        face.destroy();

        assert_eq!(face.pending_tick(), None);
        assert_eq!(face.on_tick(tick.id, 10), None);
    }
}
