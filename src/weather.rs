//! # Weather State Synchronization
//!
//! The phone pushes weather as key/value data items under a fixed path. This
//! module turns those items into the face's [`WeatherSnapshot`] and maps the
//! provider's condition code onto one of the face's icons.
//!
//! ## Update Policy
//!
//! Updates are applied **per field**: an item carrying only `high_temp`
//! replaces the high temperature and leaves the low temperature and condition
//! code alone. An item with none of the recognized keys is logged and dropped
//! without requesting a redraw.
//!
//! ## Condition Codes
//!
//! Codes follow the OpenWeatherMap numbering (2xx storms, 3xx drizzle, 5xx
//! rain, 6xx snow, 7xx atmosphere, 80x clouds). The lookup table is ordered and
//! the first matching range wins. Codes outside the table have no icon.

use crate::WeatherSnapshot;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Data path the phone publishes weather under.
pub const WEATHER_PATH: &str = "/weatherinfo";
/// Forecast high temperature (float).
pub const HIGH_TEMP_KEY: &str = "high_temp";
/// Forecast low temperature (float).
pub const LOW_TEMP_KEY: &str = "low_temp";
/// Weather provider condition code (integer).
pub const CONDITION_KEY: &str = "weather_id";

/// Icon drawn next to the temperatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Clouds,
}

impl WeatherIcon {
    /// Short lowercase name, also used by the ASCII renderer.
    pub fn name(self) -> &'static str {
        match self {
            Self::Storm => "storm",
            Self::LightRain => "light_rain",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Clear => "clear",
            Self::LightClouds => "light_clouds",
            Self::Clouds => "clouds",
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered condition table: inclusive `(low, high, icon)`.
///
/// 761 appears twice; the fog range comes first so 761 resolves to fog.
const CONDITION_TABLE: [(i32, i32, WeatherIcon); 12] = [
    (200, 232, WeatherIcon::Storm),
    (300, 321, WeatherIcon::LightRain),
    (500, 504, WeatherIcon::Rain),
    (511, 511, WeatherIcon::Snow),
    (520, 531, WeatherIcon::Rain),
    (600, 622, WeatherIcon::Snow),
    (701, 761, WeatherIcon::Fog),
    (761, 761, WeatherIcon::Storm),
    (781, 781, WeatherIcon::Storm),
    (800, 800, WeatherIcon::Clear),
    (801, 801, WeatherIcon::LightClouds),
    (802, 804, WeatherIcon::Clouds),
];

/// Map a weather condition code to its icon.
///
/// Returns `None` for codes outside every range; that is not an error, the
/// face simply draws without an icon.
///
/// # Example
/// ```
/// use sunshine_face_lib::weather::{icon_for_condition, WeatherIcon};
///
/// assert_eq!(icon_for_condition(800), Some(WeatherIcon::Clear));
/// assert_eq!(icon_for_condition(805), None);
/// ```
pub fn icon_for_condition(code: i32) -> Option<WeatherIcon> {
    CONDITION_TABLE
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&code))
        .map(|(_, _, icon)| *icon)
}

/// A single value in a synced data map.
///
/// Untagged so that companion JSON (`{"high_temp": 21.5, "weather_id": 500}`)
/// deserializes directly. Integers are tried before floats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SyncValue {
    /// Numeric value as a float; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Integer value; floats are accepted only when integral and in range.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(value) => i32::try_from(*value).ok(),
            Self::Float(value)
                if value.fract() == 0.0
                    && *value >= i32::MIN as f64
                    && *value <= i32::MAX as f64 =>
            {
                Some(*value as i32)
            }
            _ => None,
        }
    }
}

/// Key/value payload of one data item.
pub type DataMap = BTreeMap<String, SyncValue>;

/// A stored item on the sync channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Path the item was published under
    pub path: String,
    /// Item payload
    #[serde(default)]
    pub data: DataMap,
}

/// What happened to a data item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEventKind {
    Changed,
    Deleted,
}

/// An incremental change delivered by the sync listener.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataEvent {
    pub kind: DataEventKind,
    pub item: DataItem,
}

/// Result of offering an update to the synchronizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// At least one recognized key was present; `fields` were written
    Applied { fields: usize },
    /// No recognized key; snapshot untouched
    Ignored,
}

impl UpdateOutcome {
    /// Whether the update should trigger a redraw.
    pub fn wants_redraw(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Data keys and path the synchronizer listens for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncKeys {
    pub path: String,
    pub high_temp: String,
    pub low_temp: String,
    pub condition: String,
}

impl Default for SyncKeys {
    fn default() -> Self {
        Self {
            path: WEATHER_PATH.to_string(),
            high_temp: HIGH_TEMP_KEY.to_string(),
            low_temp: LOW_TEMP_KEY.to_string(),
            condition: CONDITION_KEY.to_string(),
        }
    }
}

/// Holds the latest snapshot and applies incoming updates to it.
#[derive(Clone, Debug, Default)]
pub struct WeatherSync {
    keys: SyncKeys,
    snapshot: WeatherSnapshot,
}

impl WeatherSync {
    pub fn new(keys: SyncKeys) -> Self {
        Self {
            keys,
            snapshot: WeatherSnapshot::default(),
        }
    }

    /// Current best-known weather.
    pub fn snapshot(&self) -> &WeatherSnapshot {
        &self.snapshot
    }

    /// Apply one key/value update with per-field overwrite.
    ///
    /// A recognized key with an unusable value (text for a temperature, a
    /// fractional condition code) is logged and leaves that field alone, but
    /// still counts as a recognized update.
    pub fn apply_update(&mut self, fields: &DataMap) -> UpdateOutcome {
        let high = fields.get(&self.keys.high_temp);
        let low = fields.get(&self.keys.low_temp);
        let condition = fields.get(&self.keys.condition);

        if high.is_none() && low.is_none() && condition.is_none() {
            info!("weather update carried no recognized keys, ignoring");
            return UpdateOutcome::Ignored;
        }

        let mut written = 0;

        if let Some(value) = high {
            match value.as_f64() {
                Some(degrees) => {
                    self.snapshot.high_temperature = degrees;
                    written += 1;
                }
                None => warn!("{} has unusable value {:?}", self.keys.high_temp, value),
            }
        }

        if let Some(value) = low {
            match value.as_f64() {
                Some(degrees) => {
                    self.snapshot.low_temperature = degrees;
                    written += 1;
                }
                None => warn!("{} has unusable value {:?}", self.keys.low_temp, value),
            }
        }

        if let Some(value) = condition {
            match value.as_i32() {
                Some(code) => {
                    self.snapshot.condition_code = Some(code);
                    written += 1;
                    if icon_for_condition(code).is_none() {
                        debug!("condition code {} has no icon", code);
                    }
                }
                None => warn!("{} has unusable value {:?}", self.keys.condition, value),
            }
        }

        info!(
            "weather now high {} low {} code {:?}",
            self.snapshot.high_temperature,
            self.snapshot.low_temperature,
            self.snapshot.condition_code
        );

        UpdateOutcome::Applied { fields: written }
    }

    /// Apply a stored item if it lives under the weather path.
    pub fn apply_item(&mut self, item: &DataItem) -> UpdateOutcome {
        if item.path != self.keys.path {
            debug!("skipping data item at {}", item.path);
            return UpdateOutcome::Ignored;
        }
        self.apply_update(&item.data)
    }

    /// Apply a batch of listener events; only changes on the weather path count.
    ///
    /// Returns true if any event was applied.
    pub fn apply_events(&mut self, events: &[DataEvent]) -> bool {
        let mut applied = false;
        for event in events {
            if event.kind != DataEventKind::Changed {
                debug!("ignoring {:?} event at {}", event.kind, event.item.path);
                continue;
            }
            applied |= self.apply_item(&event.item).wants_redraw();
        }
        applied
    }
}
