//! # Watch Face Rendering
//!
//! Paints a [`FaceFrame`] onto any `embedded-graphics` draw target, and renders
//! the same frame as text for the development console.
//!
//! ## Screen Layout
//!
//! ```text
//!            9:05:07          <- time, centred on y_offset
//!        FRI, JUL 4 2025      <- date, one time-line height below
//!
//!            ──────           <- 60 px separator, 20 px below centre
//!   [icon]  72°  55°          <- icon top at centre+15, temps at centre+80
//! ```
//!
//! In ambient mode only the `H:MM` line is drawn, on black. Without an icon the
//! temperatures move left to `x_offset + 25`.

use crate::config::{LayoutConfig, PaletteConfig};
use crate::weather::WeatherIcon;
use embedded_graphics::{
    mono_font::{iso_8859_1, MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, Polyline, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};

/// Which background to paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Background {
    /// Ambient mode
    Black,
    /// Interactive, even tap count
    Primary,
    /// Interactive, odd tap count
    Alternate,
}

/// Weather row contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherLine {
    /// Icon for the condition code, if one maps
    pub icon: Option<WeatherIcon>,
    /// Formatted high temperature
    pub high: String,
    /// Formatted low temperature
    pub low: String,
}

/// Everything one paint pass draws.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceFrame {
    pub background: Background,
    /// `H:MM` or `H:MM:SS`
    pub time: String,
    /// Day and date line; interactive only
    pub date: Option<String>,
    /// Weather row; interactive only
    pub weather: Option<WeatherLine>,
    /// Draw text in pure white only (low-bit ambient)
    pub crisp_text: bool,
}

impl FaceFrame {
    pub fn is_ambient(&self) -> bool {
        self.background == Background::Black
    }
}

/// Convert a configured `[r, g, b]` triple.
pub fn rgb(color: [u8; 3]) -> Rgb888 {
    Rgb888::new(color[0], color[1], color[2])
}

/// Largest built-in font whose glyphs are no taller than `pixels`.
pub fn font_for_size(pixels: u32) -> &'static MonoFont<'static> {
    match pixels {
        20.. => &iso_8859_1::FONT_10X20,
        18..=19 => &iso_8859_1::FONT_9X18,
        15..=17 => &iso_8859_1::FONT_9X15,
        13..=14 => &iso_8859_1::FONT_7X13,
        10..=12 => &iso_8859_1::FONT_6X10,
        _ => &iso_8859_1::FONT_5X8,
    }
}

/// Rendered width of `text` in a monospaced font.
pub fn text_width(font: &MonoFont<'_>, text: &str) -> i32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    let advance = font.character_size.width + font.character_spacing;
    (chars * advance - font.character_spacing) as i32
}

/// Draw `frame` into `target` using `layout` positions and `palette` colours.
pub fn draw_face<D>(
    frame: &FaceFrame,
    layout: &LayoutConfig,
    palette: &PaletteConfig,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let bounds = target.bounding_box();
    let center = bounds.center();

    let background = match frame.background {
        Background::Black => Rgb888::BLACK,
        Background::Primary => rgb(palette.background),
        Background::Alternate => rgb(palette.background_alt),
    };
    target.clear(background)?;

    let text_color = if frame.crisp_text {
        Rgb888::WHITE
    } else {
        rgb(palette.text)
    };

    let time_font = font_for_size(layout.text_size);
    Text::with_alignment(
        &frame.time,
        Point::new(center.x, layout.y_offset),
        MonoTextStyle::new(time_font, text_color),
        Alignment::Center,
    )
    .draw(target)?;

    if frame.is_ambient() {
        return Ok(());
    }

    if let Some(date) = &frame.date {
        let time_height = time_font.character_size.height as i32;
        Text::with_alignment(
            date,
            Point::new(center.x, layout.y_offset + time_height),
            MonoTextStyle::new(font_for_size(layout.date_size), text_color),
            Alignment::Center,
        )
        .draw(target)?;
    }

    Line::new(
        Point::new(center.x - 30, center.y + 20),
        Point::new(center.x + 30, center.y + 20),
    )
    .into_styled(PrimitiveStyle::with_stroke(text_color, 1))
    .draw(target)?;

    if let Some(weather) = &frame.weather {
        let temp_font = font_for_size(layout.high_low_size);
        let temp_style = MonoTextStyle::new(temp_font, text_color);
        let baseline = center.y + 80;

        let high_x = match weather.icon {
            Some(icon) => {
                let origin = Point::new(layout.x_offset + 10, center.y + 15);
                draw_icon(icon, origin, layout.icon_size, rgb(palette.icon), target)?;
                origin.x + layout.icon_size as i32 + 5
            }
            None => layout.x_offset + 25,
        };
        let low_x = high_x + text_width(temp_font, &weather.high) + 15;

        Text::new(&weather.high, Point::new(high_x, baseline), temp_style).draw(target)?;
        Text::new(&weather.low, Point::new(low_x, baseline), temp_style).draw(target)?;
    }

    Ok(())
}

/// Draw a weather glyph in the `size`×`size` box at `origin`.
pub fn draw_icon<D>(
    icon: WeatherIcon,
    origin: Point,
    size: u32,
    color: Rgb888,
    target: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let s = size as i32;
    let stroke = PrimitiveStyle::with_stroke(color, 2);
    let at = |dx: i32, dy: i32| origin + Point::new(dx, dy);

    match icon {
        WeatherIcon::Clear => {
            draw_sun(at(s / 2, s / 2), s / 2, color, target)?;
        }
        WeatherIcon::LightClouds => {
            draw_sun(at(s / 3, s / 3), s / 3, color, target)?;
            draw_cloud(at(0, s / 8), s, color, target)?;
        }
        WeatherIcon::Clouds => {
            draw_cloud(origin, s, color, target)?;
        }
        WeatherIcon::LightRain | WeatherIcon::Rain => {
            draw_cloud(origin, s, color, target)?;
            let drops = if icon == WeatherIcon::Rain { 3 } else { 2 };
            for i in 0..drops {
                let x = s / 4 + i * s / 4;
                Line::new(at(x, s * 3 / 4 + 2), at(x - s / 10, s - 1))
                    .into_styled(stroke)
                    .draw(target)?;
            }
        }
        WeatherIcon::Snow => {
            draw_cloud(origin, s, color, target)?;
            for i in 0..3 {
                Circle::with_center(at(s / 4 + i * s / 4, s * 7 / 8), (s / 8).max(2) as u32)
                    .into_styled(PrimitiveStyle::with_fill(color))
                    .draw(target)?;
            }
        }
        WeatherIcon::Storm => {
            draw_cloud(origin, s, color, target)?;
            let bolt = [
                at(s / 2 + s / 10, s * 3 / 4),
                at(s / 2 - s / 10, s * 7 / 8),
                at(s / 2 + s / 10, s * 7 / 8),
                at(s / 2 - s / 10, s - 1),
            ];
            Polyline::new(&bolt).into_styled(stroke).draw(target)?;
        }
        WeatherIcon::Fog => {
            for i in 1..=3 {
                let y = i * s / 4;
                let inset = if i % 2 == 0 { s / 8 } else { 0 };
                Line::new(at(inset, y), at(s - 1 - inset, y))
                    .into_styled(stroke)
                    .draw(target)?;
            }
        }
    }
    Ok(())
}

fn draw_sun<D>(center: Point, diameter: i32, color: Rgb888, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let core = (diameter * 3 / 5).max(2);
    Circle::with_center(center, core as u32)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)?;

    let inner = core / 2 + 2;
    let outer = diameter / 2 + diameter / 6;
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        Line::new(
            center + Point::new(dx * inner, dy * inner),
            center + Point::new(dx * outer, dy * outer),
        )
        .into_styled(PrimitiveStyle::with_stroke(color, 2))
        .draw(target)?;
    }
    Ok(())
}

/// Two overlapping puffs over a flat base, filling the top three quarters of the box.
fn draw_cloud<D>(origin: Point, s: i32, color: Rgb888, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let fill = PrimitiveStyle::with_fill(color);
    Circle::new(origin + Point::new(s / 8, s / 4), (s / 2) as u32)
        .into_styled(fill)
        .draw(target)?;
    Circle::new(origin + Point::new(s * 3 / 8, s / 8), (s * 9 / 16) as u32)
        .into_styled(fill)
        .draw(target)?;
    Rectangle::new(
        origin + Point::new(s / 8, s / 2),
        Size::new((s * 3 / 4) as u32, (s / 4) as u32),
    )
    .into_styled(fill)
    .draw(target)?;
    Ok(())
}

/// Text rendering of a frame for terminals.
pub fn render_ascii(frame: &FaceFrame) -> String {
    const WIDTH: usize = 24;
    let center = |text: &str| format!("{:^width$}", text, width = WIDTH);

    let mut lines = Vec::new();
    if frame.is_ambient() {
        lines.push(center("(ambient)"));
    }
    lines.push(center(&frame.time));

    if let Some(date) = &frame.date {
        lines.push(center(date));
    }
    if !frame.is_ambient() {
        lines.push(center("──────"));
    }
    if let Some(weather) = &frame.weather {
        let row = match weather.icon {
            Some(icon) => format!("[{}] {}  {}", icon, weather.high, weather.low),
            None => format!("{}  {}", weather.high, weather.low),
        };
        lines.push(center(&row));
    }

    lines.join("\n")
}

/// Print a frame to stdout.
pub fn draw_ascii(frame: &FaceFrame) {
    println!("{}\n", render_ascii(frame));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::framebuffer::FrameBuffer;

    fn interactive_frame(icon: Option<WeatherIcon>) -> FaceFrame {
        FaceFrame {
            background: Background::Primary,
            time: "9:05:07".into(),
            date: Some("FRI, JUL 4 2025".into()),
            weather: Some(WeatherLine {
                icon,
                high: "72°".into(),
                low: "55°".into(),
            }),
            crisp_text: false,
        }
    }

    fn ambient_frame() -> FaceFrame {
        FaceFrame {
            background: Background::Black,
            time: "9:05".into(),
            date: None,
            weather: None,
            crisp_text: true,
        }
    }

    #[test]
    fn test_font_for_size() {
        assert_eq!(font_for_size(20).character_size.height, 20);
        assert_eq!(font_for_size(64).character_size.height, 20);
        assert_eq!(font_for_size(18).character_size.height, 18);
        assert_eq!(font_for_size(13).character_size.height, 13);
        assert_eq!(font_for_size(3).character_size.height, 8);
    }

    #[test]
    fn test_text_width() {
        let font = &iso_8859_1::FONT_10X20;
        assert_eq!(text_width(font, ""), 0);
        assert_eq!(text_width(font, "72°"), 30);
    }

    #[test]
    fn test_interactive_frame_draws_background_and_text() {
        let config = Config::default();
        let mut fb = FrameBuffer::new(config.display.width, config.display.height);

        draw_face(
            &interactive_frame(Some(WeatherIcon::Rain)),
            &config.layout.square,
            &config.palette,
            &mut fb,
        )
        .unwrap();

        let background = rgb(config.palette.background);
        let center = fb.bounding_box().center();
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(background));
        // Separator line below centre
        assert_eq!(
            fb.pixel(center + Point::new(0, 20)),
            Some(rgb(config.palette.text))
        );
        assert!(fb.count(background) < 320 * 320);
    }

    #[test]
    fn test_alternate_background() {
        let config = Config::default();
        let mut fb = FrameBuffer::new(64, 64);
        let mut frame = interactive_frame(None);
        frame.background = Background::Alternate;

        draw_face(&frame, &config.layout.square, &config.palette, &mut fb).unwrap();

        assert_eq!(fb.pixel(Point::new(0, 63)), Some(rgb(config.palette.background_alt)));
    }

    #[test]
    fn test_ambient_frame_draws_only_time() {
        let config = Config::default();
        let mut fb = FrameBuffer::new(config.display.width, config.display.height);

        draw_face(&ambient_frame(), &config.layout.square, &config.palette, &mut fb).unwrap();

        let lit = 320 * 320 - fb.count(Rgb888::BLACK);
        assert!(lit > 0, "time text should be drawn");
        // Nothing at the separator or weather row
        for y in 170..320 {
            for x in 0..320 {
                assert_eq!(fb.pixel(Point::new(x, y)), Some(Rgb888::BLACK));
            }
        }
    }

    #[test]
    fn test_icon_drawn_only_when_present() {
        let mut config = Config::default();
        config.palette.icon = [0xFF, 0x00, 0x00];
        let icon_color = rgb(config.palette.icon);

        let mut with_icon = FrameBuffer::new(320, 320);
        draw_face(
            &interactive_frame(Some(WeatherIcon::Clear)),
            &config.layout.square,
            &config.palette,
            &mut with_icon,
        )
        .unwrap();
        assert!(with_icon.count(icon_color) > 0);

        let mut without_icon = FrameBuffer::new(320, 320);
        draw_face(
            &interactive_frame(None),
            &config.layout.square,
            &config.palette,
            &mut without_icon,
        )
        .unwrap();
        assert_eq!(without_icon.count(icon_color), 0);
    }

    #[test]
    fn test_every_icon_draws_inside_its_box() {
        for icon in [
            WeatherIcon::Storm,
            WeatherIcon::LightRain,
            WeatherIcon::Rain,
            WeatherIcon::Snow,
            WeatherIcon::Fog,
            WeatherIcon::Clear,
            WeatherIcon::LightClouds,
            WeatherIcon::Clouds,
        ] {
            let mut fb = FrameBuffer::new(60, 60);
            draw_icon(icon, Point::new(10, 10), 40, Rgb888::WHITE, &mut fb).unwrap();

            assert!(fb.count(Rgb888::WHITE) > 0, "{} drew nothing", icon);
            for i in 0..60 {
                let edges = [
                    Point::new(i, 0),
                    Point::new(0, i),
                    Point::new(i, 59),
                    Point::new(59, i),
                ];
                for edge in edges {
                    assert_eq!(
                        fb.pixel(edge),
                        Some(Rgb888::BLACK),
                        "{} leaked at {:?}",
                        icon,
                        edge
                    );
                }
            }
        }
    }

    #[test]
    fn test_ascii_rendering() {
        let text = render_ascii(&interactive_frame(Some(WeatherIcon::Rain)));
        assert!(text.contains("9:05:07"));
        assert!(text.contains("FRI, JUL 4 2025"));
        assert!(text.contains("[rain] 72°  55°"));

        let text = render_ascii(&ambient_frame());
        assert!(text.contains("9:05"));
        assert!(text.contains("(ambient)"));
        assert!(!text.contains("──"));
    }
}
