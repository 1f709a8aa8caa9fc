//! # Sunshine Watch Face Core Library
//!
//! This library holds the host-independent core of a digital weather watch face:
//! the once-per-second render loop, the weather state pushed from a paired phone,
//! and a renderer that paints a frame onto any `embedded-graphics` draw target.
//!
//! ## Design Philosophy
//!
//! ### Host as a Collaborator
//! The watch platform owns the surface, the clock broadcasts and the phone link.
//! None of that lives here. An adapter layer forwards host callbacks to
//! [`face::WatchFace`], which is a plain state machine:
//! - **Lifecycle**: visibility, ambient mode, low-bit ambient, insets, taps
//! - **Sync**: data-changed events and the catch-up query after connecting
//! - **Timer**: the adapter arms the single [`render_loop::ScheduledTick`] and
//!   reports back when it fires
//!
//! ### Single-Threaded Model
//! Every callback is delivered serially, so the engine takes `&mut self` and never
//! locks. Redraw requests only set a dirty flag; the adapter paints once per
//! [`face::WatchFace::take_redraw`], no matter how many requests arrived.
//!
//! ### Data Flow
//! 1. **Phone**: pushes `high_temp` / `low_temp` / `weather_id` under `/weatherinfo`
//! 2. **Sync**: [`weather::WeatherSync`] overwrites the fields that are present
//! 3. **Tick**: [`render_loop::RenderLoop`] marks the face dirty every second
//! 4. **Paint**: [`face::WatchFace::frame`] builds a [`renderer::FaceFrame`],
//!    [`renderer::draw_face`] draws it
//!
//! ## Core Types
//! - [`WeatherSnapshot`]: latest weather values received from the phone
//! - [`RenderState`]: display mode flags maintained from host callbacks

pub mod clock;
pub mod companion;
pub mod config;
pub mod face;
pub mod format;
pub mod framebuffer;
pub mod render_loop;
pub mod renderer;
pub mod weather;

/// Latest weather values received from the companion device.
///
/// Fields are overwritten one at a time as updates arrive, so a partial update
/// leaves the other fields at their previous values. Before the first update
/// both temperatures read `0.0` and there is no condition code, which renders
/// as `0°` with no icon.
///
/// # Example
/// ```
/// use sunshine_face_lib::WeatherSnapshot;
/// use sunshine_face_lib::weather::WeatherIcon;
///
/// let snapshot = WeatherSnapshot {
///     high_temperature: 21.6,
///     low_temperature: 12.1,
///     condition_code: Some(500),
/// };
///
/// assert_eq!(snapshot.icon(), Some(WeatherIcon::Rain));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeatherSnapshot {
    /// Forecast high, in the unit the phone sends
    pub high_temperature: f64,
    /// Forecast low, in the unit the phone sends
    pub low_temperature: f64,
    /// Weather provider condition code, if one was received
    pub condition_code: Option<i32>,
}

impl WeatherSnapshot {
    /// Icon for the stored condition code, `None` if unknown or unmapped.
    pub fn icon(&self) -> Option<weather::WeatherIcon> {
        self.condition_code.and_then(weather::icon_for_condition)
    }
}

/// Display mode flags mutated by host lifecycle callbacks.
///
/// # Timer Rule
/// The interactive tick runs only while `visible && !ambient`; see
/// [`RenderState::should_tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Low-power always-on display mode
    pub ambient: bool,
    /// Face currently shown on screen
    pub visible: bool,
    /// Display drops to fewer bits per colour in ambient mode
    pub low_bit_ambient: bool,
    /// Completed tap gestures since the engine started
    pub tap_count: u32,
}

impl RenderState {
    /// Whether the once-per-second tick should be running.
    pub fn should_tick(&self) -> bool {
        self.visible && !self.ambient
    }

    /// Text is drawn without intermediate tones on low-bit ambient displays.
    pub fn crisp_text(&self) -> bool {
        self.ambient && self.low_bit_ambient
    }
}
