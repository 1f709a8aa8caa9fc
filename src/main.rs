//! # Sunshine Watch Face Development Host
//!
//! This binary stands in for the watch platform. It drives the face engine the
//! way the host would: shows the face, connects to a companion (a JSON file of
//! data items), arms the interactive tick with tokio timers and paints each
//! frame as ASCII on stdout and, optionally, as a PPM image.
//!
//! ```text
//! sunshine-face [--weather items.json] [--frames N] [--ppm out.ppm]
//!               [--config watchface-config.toml] [--timezone +02:00]
//!               [--ambient] [--low-bit] [--round]
//! ```


mod logger;

use anyhow::{anyhow, Context};
use chrono::Utc;
use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use sunshine_face_lib::{
    companion::{CompanionLink, FileCompanion},
    config::Config,
    face::{ScreenShape, WatchFace},
    framebuffer::FrameBuffer,
    renderer::{draw_ascii, draw_face},
};

/// Default companion data file
const WEATHER_FILE: &str = "weather-items.json";

/// How often the host ticks the face in ambient mode.
const AMBIENT_TICK: Duration = Duration::from_secs(60);

/// Command line options
#[derive(Debug, PartialEq)]
struct Args {
    weather: PathBuf,
    config: Option<PathBuf>,
    ppm: Option<PathBuf>,
    timezone: Option<String>,
    frames: u32,
    ambient: bool,
    low_bit: bool,
    round: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            weather: PathBuf::from(WEATHER_FILE),
            config: None,
            ppm: None,
            timezone: None,
            frames: 5,
            ambient: false,
            low_bit: false,
            round: false,
        }
    }
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| anyhow!("{} needs a value", arg));
            match arg.as_str() {
                "--weather" => parsed.weather = PathBuf::from(value()?),
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--ppm" => parsed.ppm = Some(PathBuf::from(value()?)),
                "--timezone" => parsed.timezone = Some(value()?),
                "--frames" => {
                    parsed.frames = value()?
                        .parse()
                        .with_context(|| format!("{} expects a number", arg))?
                }
                "--ambient" => parsed.ambient = true,
                "--low-bit" => parsed.low_bit = true,
                "--round" => parsed.round = true,
                other => return Err(anyhow!("unknown argument: {}", other)),
            }
        }

        Ok(parsed)
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Paint the current frame to stdout and, if requested, to an image.
fn paint(face: &WatchFace<FileCompanion>, ppm: Option<&PathBuf>) -> anyhow::Result<()> {
    let frame = face.frame(Utc::now());
    draw_ascii(&frame);

    if let Some(path) = ppm {
        let display = &face.config().display;
        let mut buffer = FrameBuffer::new(display.width, display.height);
        draw_face(&frame, face.layout(), &face.config().palette, &mut buffer)?;
        buffer
            .write_ppm(path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logger::init();

    let args = Args::parse(env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    let mut face = WatchFace::new(config, FileCompanion::new(&args.weather));
    face.set_low_bit_ambient(args.low_bit);
    face.apply_window_insets(if args.round {
        ScreenShape::Round
    } else {
        ScreenShape::Square
    });

    face.set_visible(true, now_ms());
    if face.link().is_connected() {
        face.on_connected();
    } else {
        warn!("no companion data at {}, showing defaults", args.weather.display());
    }

    if let Some(zone) = &args.timezone {
        face.on_timezone_changed(zone);
    }
    if args.ambient {
        face.set_ambient(true, now_ms());
    }

    let mut painted = 0;
    while painted < args.frames {
        if face.take_redraw() {
            paint(&face, args.ppm.as_ref())?;
            painted += 1;
            continue;
        }

        match face.pending_tick() {
            Some(tick) => {
                let wait = tick.due_ms.saturating_sub(now_ms());
                tokio::time::sleep(Duration::from_millis(wait)).await;
                face.on_tick(tick.id, now_ms());
            }
            None => {
                tokio::time::sleep(AMBIENT_TICK).await;
                face.on_time_tick();
            }
        }
    }

    face.set_visible(false, now_ms());
    face.destroy();
    info!("painted {} frames", painted);

    Ok(())
}
