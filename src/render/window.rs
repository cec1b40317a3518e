//! Native window for the `human` render mode, using minifb.

use minifb::{Key, Window, WindowOptions};

use super::{FrameBuffer, FrameClock, Scene};
use crate::config::RenderConfig;
use crate::error::RenderError;

const TITLE: &str = "Simple Walker";

pub struct WindowSurface {
    window: Window,
    /// 0RGB pixels handed to minifb.
    argb: Vec<u32>,
    frame: FrameBuffer,
    clock: FrameClock,
}

impl WindowSurface {
    pub fn open(config: &RenderConfig) -> Result<Self, RenderError> {
        let window = Window::new(
            TITLE,
            config.width as usize,
            config.height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| RenderError::Init(e.to_string()))?;

        Ok(Self {
            window,
            argb: Vec::with_capacity((config.width * config.height) as usize),
            frame: FrameBuffer::new(config.width, config.height),
            clock: FrameClock::new(config.fps),
        })
    }

    /// Processes pending input and reports whether the user asked to close the window.
    /// Everything other than a close request (window closed, Escape) is discarded.
    pub fn close_requested(&mut self) -> bool {
        self.window.update();
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }

    /// Draws, shows and then waits out the rest of the frame.
    pub fn present(&mut self, scene: &Scene) -> Result<(), RenderError> {
        self.frame.draw(scene)?;
        self.frame.write_argb(&mut self.argb);
        self.window
            .set_title(&format!("{TITLE}  |  {}", scene.hud_line()));
        self.window
            .update_with_buffer(
                &self.argb,
                self.frame.width() as usize,
                self.frame.height() as usize,
            )
            .map_err(|e| RenderError::Draw(e.to_string()))?;
        self.clock.tick();
        Ok(())
    }
}
