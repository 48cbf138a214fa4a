// Main menu drawn over the live camera image.
// Visual: darkened video, title, three breathing round icons (one per game)
// with their names; clicking an icon starts that game.

use std::rc::Rc;

use crate::compositor::Compositor;
use crate::draw;
use crate::games::GameKind;
use crate::types::{rgb, FrameBuffer, Rect, WHITE};

pub const ICON_RADIUS: i32 = 80;
/// Extra click tolerance around each icon.
const HIT_SLACK: i32 = 10;
const BREATH_AMPLITUDE: f32 = 5.0;

#[derive(Clone, Copy)]
enum Icon {
    Brush,
    Rainbow,
    Bubbles,
}

struct Entry {
    kind: GameKind,
    icon: Icon,
    color: u32,
}

const ENTRIES: [Entry; 3] = [
    Entry { kind: GameKind::AirPainter, icon: Icon::Brush, color: rgb(255, 100, 0) },
    Entry { kind: GameKind::ColorHunter, icon: Icon::Rainbow, color: rgb(255, 200, 0) },
    Entry { kind: GameKind::BubblePop, icon: Icon::Bubbles, color: rgb(0, 180, 255) },
];

pub struct Menu {
    compositor: Rc<Compositor>,
    anim_t: u64,
    icon_centers: Vec<(i32, i32)>,
}

impl Menu {
    pub fn new(compositor: Rc<Compositor>) -> Self {
        Self { compositor, anim_t: 0, icon_centers: Vec::new() }
    }

    /// Icon centres as laid out by the last `draw`.
    pub fn icon_centers(&self) -> &[(i32, i32)] {
        &self.icon_centers
    }

    pub fn draw(&mut self, frame: &mut FrameBuffer) {
        if frame.is_empty() {
            return;
        }
        self.anim_t += 1;
        let c = Rc::clone(&self.compositor);
        let (w, h) = (frame.width as i32, frame.height as i32);

        c.draw_overlay(frame, 0.45, rgb(40, 20, 30));
        c.draw_text(frame, "Rainbow Playground", (w / 2, h / 6), 72, rgb(255, 255, 100), true, true);
        c.draw_text(frame, "Pick a game!", (w / 2, h / 6 + 80), 28, rgb(200, 200, 200), false, true);

        let spacing = w / 4;
        let cy = h / 2 + 10;
        self.icon_centers.clear();
        for (i, entry) in ENTRIES.iter().enumerate() {
            let cx = spacing * (i as i32 + 1);
            self.icon_centers.push((cx, cy));

            let breath = (self.anim_t as f32 * 0.05 + i as f32 * 1.2).sin() * BREATH_AMPLITUDE;
            let r = ICON_RADIUS + breath as i32;

            // Disc at 70% over the video, blended through its own small region.
            if let Some((region, mut roi)) = frame.crop(Rect::new(cx - r - 2, cy - r - 2, 2 * r + 5, 2 * r + 5)) {
                draw::fill_circle(&mut roi, cx - region.x, cy - region.y, r, entry.color);
                frame.blend_region(region, &roi, 0.7);
            }
            draw::stroke_circle(frame, cx, cy, r, WHITE, 3);
            draw_icon(frame, entry.icon, cx, cy, r);

            c.draw_text(frame, entry.kind.title(), (cx, cy + r + 30), 32, WHITE, true, true);
            c.draw_text(frame, "Click to play", (cx, cy + r + 70), 22, rgb(180, 180, 180), false, true);
        }

        c.draw_text(frame, "Click an icon to choose  |  ESC to quit", (w / 2, h - 50), 24, rgb(160, 160, 160), false, true);
    }

    /// Game under a click at (x, y), if any.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<GameKind> {
        let r = ICON_RADIUS + HIT_SLACK;
        self.icon_centers
            .iter()
            .position(|&(cx, cy)| {
                let (dx, dy) = (x - cx, y - cy);
                dx * dx + dy * dy <= r * r
            })
            .and_then(GameKind::from_menu_index)
    }
}

fn draw_icon(frame: &mut FrameBuffer, icon: Icon, cx: i32, cy: i32, r: i32) {
    let s = r / 2;
    match icon {
        Icon::Brush => {
            let tip = (cx + s / 2, cy + s / 2);
            draw::draw_line(frame, cx - s, cy - s, tip.0, tip.1, WHITE, 4);
            draw::fill_circle(frame, tip.0, tip.1, 6, rgb(0, 200, 255));
            draw::fill_circle(frame, cx + s / 4, cy - s / 3, 5, rgb(255, 0, 0));
            draw::fill_circle(frame, cx - s / 3, cy + s / 4, 4, rgb(0, 255, 0));
        }
        Icon::Rainbow => {
            let bands = [rgb(255, 0, 0), rgb(255, 200, 0), rgb(0, 255, 0)];
            for (j, color) in bands.into_iter().enumerate() {
                let ar = s - j as i32 * 8;
                if ar > 5 {
                    draw_upper_arc(frame, cx, cy + 10, ar, color, 3);
                }
            }
        }
        Icon::Bubbles => {
            for (dx, dy, br) in [(-s / 3, -s / 4, s / 2), (s / 4, s / 5, s / 3), (-s / 6, s / 3, s / 4)] {
                draw::stroke_circle(frame, cx + dx, cy + dy, br, WHITE, 2);
                draw::fill_circle(frame, cx + dx - br / 3, cy + dy - br / 3, (br / 4).max(2), WHITE);
            }
        }
    }
}

/// Top half of a circle outline.
fn draw_upper_arc(frame: &mut FrameBuffer, cx: i32, cy: i32, r: i32, color: u32, thickness: i32) {
    let steps = (r * 4).max(8);
    let mut prev = (cx - r, cy);
    for i in 1..=steps {
        let a = std::f32::consts::PI * (1.0 + i as f32 / steps as f32);
        let p = (cx + (r as f32 * a.cos()) as i32, cy + (r as f32 * a.sin()) as i32);
        draw::draw_line(frame, prev.0, prev.1, p.0, p.1, color, thickness);
        prev = p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn_menu() -> Menu {
        let mut menu = Menu::new(Rc::new(Compositor::fallback()));
        menu.draw(&mut FrameBuffer::filled(1280, 720, rgb(90, 90, 90)));
        menu
    }

    #[test]
    fn icons_sit_at_quarter_widths() {
        let menu = drawn_menu();
        assert_eq!(menu.icon_centers(), &[(320, 370), (640, 370), (960, 370)]);
    }

    #[test]
    fn clicks_map_to_games_with_tolerance() {
        let menu = drawn_menu();
        assert_eq!(menu.hit_test(320, 370), Some(GameKind::AirPainter));
        assert_eq!(menu.hit_test(640 + 90, 370), Some(GameKind::ColorHunter));
        assert_eq!(menu.hit_test(960, 370 - 89), Some(GameKind::BubblePop));
        assert_eq!(menu.hit_test(640 + 91, 370), None);
        assert_eq!(menu.hit_test(10, 10), None);
    }

    #[test]
    fn nothing_is_clickable_before_the_first_draw() {
        let menu = Menu::new(Rc::new(Compositor::fallback()));
        assert_eq!(menu.hit_test(320, 370), None);
    }

    #[test]
    fn draw_darkens_the_video() {
        let mut menu = Menu::new(Rc::new(Compositor::fallback()));
        let mut fb = FrameBuffer::filled(1280, 720, rgb(200, 200, 200));
        menu.draw(&mut fb);
        assert_ne!(fb.get(5, 5), Some(rgb(200, 200, 200)));
    }
}
