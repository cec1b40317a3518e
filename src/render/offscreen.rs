//! Software rasterizer for [`Scene`]s, backed by plotters' bitmap backend.

use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use super::{Primitive, Rgb, Scene};
use crate::error::RenderError;

/// Family name the bundled HUD font is registered under.
const HUD_FONT_FAMILY: &str = "walker-hud";
static HUD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// Registers the bundled font with plotters once per process.
fn ensure_hud_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered = *REGISTERED
        .get_or_init(|| register_font(HUD_FONT_FAMILY, FontStyle::Normal, HUD_FONT).is_ok());
    if registered {
        Ok(())
    } else {
        Err(RenderError::Init("bundled HUD font could not be parsed".to_string()))
    }
}

/// A rendered frame: tightly packed RGB rows, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 3) as usize;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}

/// Reusable RGB target the scene is drawn into.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u8; (width * height * 3) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> RgbFrame {
        RgbFrame {
            width: self.width,
            height: self.height,
            pixels: self.buffer.clone(),
        }
    }

    /// Packs the buffer as 0RGB words, the layout native windows expect.
    pub fn write_argb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.buffer.chunks_exact(3).map(|px| {
            0xFF00_0000 | (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2])
        }));
    }

    pub fn draw(&mut self, scene: &Scene) -> Result<(), RenderError> {
        ensure_hud_font()?;
        let (width, height) = (self.width, self.height);
        let root = BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();

        for primitive in &scene.primitives {
            match primitive {
                Primitive::Fill(color) => {
                    root.fill(&rgb(*color)).map_err(draw_error)?;
                }
                Primitive::Line {
                    from,
                    to,
                    color,
                    width,
                } => {
                    root.draw(&PathElement::new(
                        vec![pixel(*from), pixel(*to)],
                        rgb(*color).stroke_width(*width),
                    ))
                    .map_err(draw_error)?;
                }
                Primitive::Polygon {
                    points,
                    fill,
                    outline,
                    outline_width,
                } => {
                    let pixels: Vec<(i32, i32)> = points.iter().copied().map(pixel).collect();
                    root.draw(&Polygon::new(pixels.clone(), rgb(*fill).filled()))
                        .map_err(draw_error)?;
                    let mut closed = pixels;
                    if let Some(first) = closed.first().copied() {
                        closed.push(first);
                    }
                    root.draw(&PathElement::new(
                        closed,
                        rgb(*outline).stroke_width(*outline_width),
                    ))
                    .map_err(draw_error)?;
                }
                Primitive::Disc {
                    center,
                    radius,
                    fill,
                    outline,
                } => {
                    let center = pixel(*center);
                    let radius = radius.round() as i32;
                    root.draw(&Circle::new(center, radius, rgb(*fill).filled()))
                        .map_err(draw_error)?;
                    if let Some((color, width)) = outline {
                        root.draw(&Circle::new(center, radius, rgb(*color).stroke_width(*width)))
                            .map_err(draw_error)?;
                    }
                }
                Primitive::Text {
                    position,
                    text,
                    size,
                    color,
                } => {
                    root.draw(&Text::new(
                        text.clone(),
                        pixel(*position),
                        (HUD_FONT_FAMILY, f64::from(*size))
                            .into_font()
                            .color(&rgb(*color)),
                    ))
                    .map_err(draw_error)?;
                }
            }
        }

        root.present().map_err(draw_error)
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn pixel(p: [f32; 2]) -> (i32, i32) {
    (p[0].round() as i32, p[1].round() as i32)
}

fn draw_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(err.to_string())
}
