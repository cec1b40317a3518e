//! Rendering for the walker environment.
//!
//! A frame is first captured as a [`Scene`]: an ordered list of screen-space
//! primitives built from the world. Backends only rasterize primitives, so the
//! camera and layout logic is shared (and testable) without a display.

mod clock;
mod offscreen;
#[cfg(feature = "window")]
mod window;

use std::fmt;
use std::str::FromStr;

pub use clock::FrameClock;
pub use offscreen::{FrameBuffer, RgbFrame};
#[cfg(feature = "window")]
pub use window::WindowSurface;

use crate::config::RenderConfig;
use crate::physics::{GROUND_END_X, GROUND_HEIGHT, GROUND_START_X};
use crate::walker::WalkerPartShape;
use crate::world::SimulationWorld;

/// How the environment presents itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Headless, nothing is drawn.
    #[default]
    None,
    /// A native window, redrawn after every step and throttled to the frame rate.
    Human,
    /// An RGB pixel buffer returned from `render`, no window.
    OffscreenBuffer,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::None => "none",
            RenderMode::Human => "human",
            RenderMode::OffscreenBuffer => "rgb_array",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "headless" => Ok(RenderMode::None),
            "human" => Ok(RenderMode::Human),
            "rgb_array" | "offscreen" | "offscreen-buffer" => Ok(RenderMode::OffscreenBuffer),
            other => Err(format!("unknown render mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BACKGROUND: Rgb = Rgb(20, 20, 30);
pub const GROUND_LINE: Rgb = Rgb(0, 255, 200);
pub const GRID_LINE: Rgb = Rgb(40, 40, 60);
pub const LEG_FILLS: [Rgb; 2] = [Rgb(0, 150, 255), Rgb(0, 100, 200)];
pub const LEG_OUTLINE: Rgb = Rgb(200, 200, 255);
pub const TORSO_FILL: Rgb = Rgb(255, 50, 50);
pub const TORSO_OUTLINE: Rgb = Rgb(255, 255, 255);
pub const EYE: Rgb = Rgb(255, 255, 0);
pub const HUD_TEXT: Rgb = Rgb(255, 255, 255);

/// Distance of the orientation marker from the torso centre, in world units.
pub const EYE_OFFSET: f32 = 15.0;
pub const EYE_RADIUS: f32 = 5.0;
const HUD_FONT_SIZE: u32 = 16;

/// A drawable element in screen coordinates (origin top-left, y down).
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Fill(Rgb),
    Line {
        from: [f32; 2],
        to: [f32; 2],
        color: Rgb,
        width: u32,
    },
    Polygon {
        points: Vec<[f32; 2]>,
        fill: Rgb,
        outline: Rgb,
        outline_width: u32,
    },
    Disc {
        center: [f32; 2],
        radius: f32,
        fill: Rgb,
        outline: Option<(Rgb, u32)>,
    },
    Text {
        position: [f32; 2],
        text: String,
        size: u32,
        color: Rgb,
    },
}

/// Horizontal-follow camera: keeps the torso at the centre column, never moves vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    offset_x: f32,
    height: f32,
}

impl Camera {
    pub fn follow(target_x: f32, width: u32, height: u32) -> Self {
        Self {
            offset_x: width as f32 / 2.0 - target_x,
            height: height as f32,
        }
    }

    pub fn to_screen(&self, p: [f32; 2]) -> [f32; 2] {
        [p[0] + self.offset_x, self.height - p[1]]
    }
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<Primitive>,
    pub hud: Vec<String>,
}

impl Scene {
    pub fn capture(world: &SimulationWorld, steps: u32, spawn_x: f32, config: &RenderConfig) -> Self {
        let torso = world.torso_state();
        let camera = Camera::follow(torso.position[0], config.width, config.height);
        let height = config.height as f32;
        let mut primitives = vec![Primitive::Fill(BACKGROUND)];

        let ground_y = camera.to_screen([0.0, GROUND_HEIGHT])[1];
        primitives.push(Primitive::Line {
            from: [camera.to_screen([GROUND_START_X, 0.0])[0], ground_y],
            to: [camera.to_screen([GROUND_END_X, 0.0])[0], ground_y],
            color: GROUND_LINE,
            width: 2,
        });

        let spacing = config.grid_spacing;
        let half_width = config.width as f32 / 2.0;
        let start = (torso.position[0] / spacing).floor() * spacing - half_width;
        let lines = ((config.width as f32 + 2.0 * spacing) / spacing).ceil() as usize;
        for i in 0..lines {
            let x = camera.to_screen([start + i as f32 * spacing, 0.0])[0];
            primitives.push(Primitive::Line {
                from: [x, 0.0],
                to: [x, height],
                color: GRID_LINE,
                width: 1,
            });
        }

        let mut leg_index = 0;
        for part in world.walker().parts() {
            match part.shape {
                WalkerPartShape::Box { .. } => {
                    let points = world
                        .part_world_vertices(part)
                        .into_iter()
                        .map(|v| camera.to_screen(v))
                        .collect();
                    primitives.push(Primitive::Polygon {
                        points,
                        fill: LEG_FILLS[leg_index % LEG_FILLS.len()],
                        outline: LEG_OUTLINE,
                        outline_width: 2,
                    });
                    leg_index += 1;
                }
                WalkerPartShape::Disc { radius } => {
                    let Some(body) = world.body_snapshot(part.handle) else {
                        continue;
                    };
                    primitives.push(Primitive::Disc {
                        center: camera.to_screen(body.position),
                        radius,
                        fill: TORSO_FILL,
                        outline: Some((TORSO_OUTLINE, 2)),
                    });
                }
            }
        }

        let eye = torso.local_to_world([EYE_OFFSET, 0.0]);
        primitives.push(Primitive::Disc {
            center: camera.to_screen(eye),
            radius: EYE_RADIUS,
            fill: EYE,
            outline: None,
        });

        let hud = vec![
            format!("Distance: {:.1}m", torso.position[0] - spawn_x),
            format!("Steps: {steps}"),
        ];
        for (i, line) in hud.iter().enumerate() {
            primitives.push(Primitive::Text {
                position: [10.0, 10.0 + 20.0 * i as f32],
                text: line.clone(),
                size: HUD_FONT_SIZE,
                color: HUD_TEXT,
            });
        }

        Self {
            width: config.width,
            height: config.height,
            primitives,
            hud,
        }
    }

    /// HUD lines joined on one line, used for the window title.
    pub fn hud_line(&self) -> String {
        self.hud.join("  |  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkerConfig;

    fn capture(world: &SimulationWorld) -> Scene {
        let config = WalkerConfig::default();
        Scene::capture(world, 7, config.body.spawn[0], &config.render)
    }

    #[test]
    fn render_mode_parses_known_names() {
        assert_eq!("none".parse::<RenderMode>().unwrap(), RenderMode::None);
        assert_eq!("Human".parse::<RenderMode>().unwrap(), RenderMode::Human);
        assert_eq!(
            "rgb_array".parse::<RenderMode>().unwrap(),
            RenderMode::OffscreenBuffer
        );
        assert!("vr".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::default(), RenderMode::None);
    }

    #[test]
    fn camera_centres_target_and_flips_y() {
        let camera = Camera::follow(200.0, 800, 400);
        assert_eq!(camera.to_screen([200.0, 200.0]), [400.0, 200.0]);
        assert_eq!(camera.to_screen([250.0, 50.0]), [450.0, 350.0]);
    }

    #[test]
    fn scene_draws_in_fixed_order() {
        let world = SimulationWorld::new(&WalkerConfig::default());
        let scene = capture(&world);
        let p = &scene.primitives;
        assert!(matches!(p[0], Primitive::Fill(BACKGROUND)));
        assert!(matches!(p[1], Primitive::Line { color: GROUND_LINE, .. }));

        let polygons: Vec<usize> = p
            .iter()
            .enumerate()
            .filter(|(_, x)| matches!(x, Primitive::Polygon { .. }))
            .map(|(i, _)| i)
            .collect();
        let discs: Vec<usize> = p
            .iter()
            .enumerate()
            .filter(|(_, x)| matches!(x, Primitive::Disc { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(polygons.len(), 2);
        assert_eq!(discs.len(), 2);
        assert!(polygons.iter().all(|i| *i < discs[0]));
        assert!(matches!(p[discs[1]], Primitive::Disc { fill: EYE, .. }));
        assert!(matches!(p.last(), Some(Primitive::Text { .. })));
    }

    #[test]
    fn torso_sits_at_screen_centre() {
        let world = SimulationWorld::new(&WalkerConfig::default());
        let scene = capture(&world);
        let torso = scene
            .primitives
            .iter()
            .find_map(|p| match p {
                Primitive::Disc { center, fill, .. } if *fill == TORSO_FILL => Some(*center),
                _ => None,
            })
            .unwrap();
        assert_eq!(torso, [400.0, 200.0]);
    }

    #[test]
    fn eye_follows_torso_orientation() {
        let mut world = SimulationWorld::new(&WalkerConfig::default());
        world.set_walker_pose([200.0, 200.0], std::f32::consts::FRAC_PI_2);
        let scene = capture(&world);
        let eye = scene
            .primitives
            .iter()
            .find_map(|p| match p {
                Primitive::Disc { center, fill, .. } if *fill == EYE => Some(*center),
                _ => None,
            })
            .unwrap();
        // Rotated a quarter turn the eye points straight up, i.e. smaller screen y.
        assert!((eye[0] - 400.0).abs() < 1e-3);
        assert!((eye[1] - (200.0 - EYE_OFFSET)).abs() < 1e-3);
    }

    #[test]
    fn grid_covers_the_whole_width() {
        let world = SimulationWorld::new(&WalkerConfig::default());
        let scene = capture(&world);
        let xs: Vec<f32> = scene
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Line { from, color, .. } if *color == GRID_LINE => Some(from[0]),
                _ => None,
            })
            .collect();
        assert!(xs.iter().any(|x| *x <= 0.0));
        assert!(xs.iter().any(|x| *x >= 800.0));
    }

    #[test]
    fn hud_reports_distance_from_spawn_and_steps() {
        let world = SimulationWorld::new(&WalkerConfig::default());
        let scene = capture(&world);
        assert_eq!(scene.hud, vec!["Distance: 0.0m".to_string(), "Steps: 7".to_string()]);
        assert_eq!(scene.hud_line(), "Distance: 0.0m  |  Steps: 7");
    }
}
