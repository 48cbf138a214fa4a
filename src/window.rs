// Kiosk window + input.
// Visual effects provided here:
// 1) A (borderless) window that shows the composed frame.
// 2) Key presses as plain key codes, Escape as 27, letters as ASCII.
// 3) Left clicks as one-shot events at the click position.

use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::types::{FrameBuffer, KEY_ESCAPE};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,   // the on-screen window you see
    mouse_was_down: bool,
}

impl Drawer {
    /// Create a window sized to the camera feed.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(config: &WindowConfig, width: usize, height: usize) -> Result<Self> {
        let options = WindowOptions { borderless: config.borderless, ..WindowOptions::default() };
        let mut window =
            Window::new(&config.title, width, height, options).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(config.target_fps);
        Ok(Self { window, mouse_was_down: false })
    }

    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Pump window events without drawing (used when a camera frame was dropped).
    pub fn pump(&mut self) {
        self.window.update();
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Keys that went down since the last update, as key codes.
    pub fn keys_pressed(&self) -> Vec<u32> {
        let shift = self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift);
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(|k| key_code(k, shift))
            .collect()
    }

    /// Position of a left click that started since the last call.
    /// Visual: whatever sits under the cursor reacts once per click.
    pub fn take_click(&mut self) -> Option<(i32, i32)> {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let pressed = down && !self.mouse_was_down;
        self.mouse_was_down = down;
        if !pressed {
            return None;
        }
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0) as i32, y.max(0.0) as i32))
    }
}

/// ASCII-style code for a key; `None` for keys the games never look at.
pub fn key_code(key: Key, shift: bool) -> Option<u32> {
    let letter = |lower: u8| Some((if shift { lower.to_ascii_uppercase() } else { lower }) as u32);
    match key {
        Key::Escape => Some(KEY_ESCAPE),
        Key::Space => Some(' ' as u32),
        Key::Enter => Some('\r' as u32),
        Key::A => letter(b'a'),
        Key::B => letter(b'b'),
        Key::C => letter(b'c'),
        Key::D => letter(b'd'),
        Key::E => letter(b'e'),
        Key::F => letter(b'f'),
        Key::G => letter(b'g'),
        Key::H => letter(b'h'),
        Key::I => letter(b'i'),
        Key::J => letter(b'j'),
        Key::K => letter(b'k'),
        Key::L => letter(b'l'),
        Key::M => letter(b'm'),
        Key::N => letter(b'n'),
        Key::O => letter(b'o'),
        Key::P => letter(b'p'),
        Key::Q => letter(b'q'),
        Key::R => letter(b'r'),
        Key::S => letter(b's'),
        Key::T => letter(b't'),
        Key::U => letter(b'u'),
        Key::V => letter(b'v'),
        Key::W => letter(b'w'),
        Key::X => letter(b'x'),
        Key::Y => letter(b'y'),
        Key::Z => letter(b'z'),
        Key::Key0 => Some('0' as u32),
        Key::Key1 => Some('1' as u32),
        Key::Key2 => Some('2' as u32),
        Key::Key3 => Some('3' as u32),
        Key::Key4 => Some('4' as u32),
        Key::Key5 => Some('5' as u32),
        Key::Key6 => Some('6' as u32),
        Key::Key7 => Some('7' as u32),
        Key::Key8 => Some('8' as u32),
        Key::Key9 => Some('9' as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_follow_shift() {
        assert_eq!(key_code(Key::C, false), Some('c' as u32));
        assert_eq!(key_code(Key::C, true), Some('C' as u32));
        assert_eq!(key_code(Key::Q, true), Some('Q' as u32));
    }

    #[test]
    fn escape_and_unmapped_keys() {
        assert_eq!(key_code(Key::Escape, false), Some(27));
        assert_eq!(key_code(Key::Key7, true), Some('7' as u32));
        assert_eq!(key_code(Key::F1, false), None);
    }
}
