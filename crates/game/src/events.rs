//! Window event handling for GameState.

use anyhow::Result;
use winit::event::WindowEvent;
use winit::keyboard::PhysicalKey;

impl crate::GameState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> Result<bool> {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                Ok(true)
            }
            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height)?;
                Ok(false)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if !event.repeat {
                        self.input.process_keyboard(key, event.state);
                    }
                }
                Ok(false)
            }
            WindowEvent::Focused(false) => {
                // Keys released while unfocused never arrive.
                self.input.release_all();
                Ok(false)
            }
            WindowEvent::RedrawRequested => {
                self.redraw()?;
                Ok(!self.running)
            }
            _ => Ok(false),
        }
    }
}
