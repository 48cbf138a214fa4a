//! Color Hunter: show a target colour, the player holds a matching object in
//! the central box for a second, eight rounds, then a star rating.

use std::rc::Rc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Game, GameContext};
use crate::clock::Clock;
use crate::color::{detect_color_ratio, ColorId};
use crate::compositor::Compositor;
use crate::draw;
use crate::fx::{self, Particle, ParticleSystem};
use crate::types::{rgb, FrameBuffer, Rect, WHITE};

pub const TOTAL_ROUNDS: u32 = 8;
/// Share of the detection box that must show the target colour.
pub const MATCH_THRESHOLD: f32 = 0.15;
pub const HOLD_DURATION: Duration = Duration::from_secs(1);
pub const SUCCESS_DELAY: Duration = Duration::from_millis(2500);

const FIREWORK_BURSTS: usize = 3;
const FIREWORK_PARTICLES: usize = 40;

const BAR_COLOR: u32 = rgb(40, 20, 30);
const SCORE_COLOR: u32 = rgb(200, 255, 0);
const STAR_COLOR: u32 = rgb(255, 220, 0);

/// Where a round currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Searching,
    /// Colour has been in the box continuously since `since`.
    Holding { since: Duration },
    /// Round won at `at`; the praise screen shows until the delay passes.
    Success { at: Duration },
    GameOver,
}

pub struct ColorHunter {
    compositor: Rc<Compositor>,
    clock: Rc<dyn Clock>,
    fx: ParticleSystem,
    round: u32,
    score: u32,
    target: ColorId,
    phase: Phase,
    particles: Vec<Particle>,
}

impl ColorHunter {
    pub fn new(ctx: &GameContext) -> Self {
        let mut game = Self {
            compositor: Rc::clone(&ctx.compositor),
            clock: Rc::clone(&ctx.clock),
            fx: ParticleSystem::new(ctx.make_rng()),
            round: 0,
            score: 0,
            target: ColorId::Red,
            phase: Phase::Searching,
            particles: Vec::new(),
        };
        game.start_round(None);
        game
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> ColorId {
        self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the current hold started, if one is in progress.
    pub fn match_start(&self) -> Option<Duration> {
        match self.phase {
            Phase::Holding { since } => Some(since),
            _ => None,
        }
    }

    pub fn success_time(&self) -> Option<Duration> {
        match self.phase {
            Phase::Success { at } => Some(at),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// 1 to 5 stars; never zero, even with no points.
    pub fn star_rating(&self) -> u32 {
        star_rating(self.score)
    }

    /// Central 40% x 40% box the colour is checked in.
    pub fn target_roi(width: usize, height: usize) -> Rect {
        let roi_w = (width as f32 * 0.4) as i32;
        let roi_h = (height as f32 * 0.4) as i32;
        Rect::new((width as i32 - roi_w) / 2, (height as i32 - roi_h) / 2, roi_w, roi_h)
    }

    fn start_round(&mut self, previous: Option<ColorId>) {
        self.round += 1;
        let choices: Vec<ColorId> = ColorId::ALL.into_iter().filter(|&c| Some(c) != previous).collect();
        self.target = choices.choose(self.fx.rng()).copied().unwrap_or(ColorId::Red);
        self.phase = Phase::Searching;
        tracing::debug!(round = self.round, target = self.target.name(), "color hunter round started");
    }

    fn advance_round(&mut self) {
        if self.round >= TOTAL_ROUNDS {
            self.phase = Phase::GameOver;
            tracing::info!(score = self.score, stars = self.star_rating(), "color hunter finished");
            return;
        }
        self.start_round(Some(self.target));
    }

    fn celebrate(&mut self, width: usize, height: usize) {
        let (w, h) = (width as i32, height as i32);
        let color = self.target.display_rgb();
        for _ in 0..FIREWORK_BURSTS {
            let x = self.fx.rng().gen_range(w / 4..=w * 3 / 4);
            let y = self.fx.rng().gen_range(h / 4..=h * 3 / 4);
            let burst = self.fx.spawn_firework(x as f32, y as f32, Some(color), FIREWORK_PARTICLES);
            self.particles.extend(burst);
        }
    }

    /* --- Screens ---
       Visual: top bar with round/score, a big target disc, the dashed box and
       a hold bar that fills while the colour stays in the box. */
    fn draw_round(&self, frame: &mut FrameBuffer, roi: Rect, hold: Option<f32>) {
        let c = &self.compositor;
        let (w, h) = (frame.width as i32, frame.height as i32);

        c.draw_rounded_rect(frame, Rect::new(0, 0, w, 100), BAR_COLOR, 0, None, 0.6);
        c.draw_text(frame, "Color Hunter", (w / 2, 30), 36, WHITE, true, true);
        let progress_text = format!("Round {}/{}", self.round, TOTAL_ROUNDS);
        c.draw_text(frame, &progress_text, (w / 2, 62), 22, rgb(200, 200, 200), false, true);

        let bar_w = 200;
        let progress = (self.round.saturating_sub(1)) as f32 / TOTAL_ROUNDS as f32;
        c.draw_progress_bar(frame, progress, ((w - bar_w) / 2, 85), (bar_w, 12), rgb(80, 80, 80), rgb(0, 200, 255));
        c.draw_text(frame, &format!("Score: {}", self.score), (w - 100, 30), 28, SCORE_COLOR, true, true);

        let target_rgb = self.target.display_rgb();
        let (cx, cy) = (w / 2, h / 2 - 80);
        draw::fill_circle(frame, cx, cy, 60, target_rgb);
        draw::stroke_circle(frame, cx, cy, 63, WHITE, 3);

        let prompt = format!("Find something {}!", self.target.name());
        c.draw_text(frame, &prompt, (w / 2, h / 2 + 10), 44, target_rgb, true, true);
        c.draw_dashed_rect(frame, roi, WHITE, 2, 15);

        if let Some(fill) = hold {
            c.draw_progress_bar(frame, fill, (roi.x, roi.y + roi.h + 10), (roi.w, 16), rgb(80, 80, 80), target_rgb);
        }

        let hint = format!("Put the {} thing inside the box!", self.target.name());
        c.draw_text(frame, &hint, (w / 2, h - 40), 22, rgb(180, 180, 180), false, true);
    }

    fn draw_success(&self, frame: &mut FrameBuffer) {
        let c = &self.compositor;
        let (w, h) = (frame.width as i32, frame.height as i32);
        c.draw_checkmark(frame, (w / 2, h / 2 - 40), 60, rgb(100, 255, 0), 8);
        c.draw_text(frame, "Great job!", (w / 2, h / 2 + 50), 56, SCORE_COLOR, true, true);
        let found = format!("You found {}!", self.target.name());
        c.draw_text(frame, &found, (w / 2, h / 2 + 120), 32, self.target.display_rgb(), true, true);
    }

    fn draw_game_over(&self, frame: &mut FrameBuffer) {
        let c = &self.compositor;
        let (w, h) = (frame.width as i32, frame.height as i32);
        c.draw_overlay(frame, 0.5, rgb(30, 10, 20));
        c.draw_text(frame, "Game over!", (w / 2, h / 3), 56, rgb(100, 255, 255), true, true);
        let score = format!("Score: {} / {}", self.score, TOTAL_ROUNDS);
        c.draw_text(frame, &score, (w / 2, h / 2), 44, WHITE, true, true);

        let stars = self.star_rating() as i32;
        let spacing = 60;
        let start_x = w / 2 - (stars - 1) * spacing / 2;
        for i in 0..stars {
            c.draw_star(frame, (start_x + i * spacing, h / 2 + 80), 22, STAR_COLOR, None);
        }
        c.draw_text(frame, "Press ESC for the menu", (w / 2, h - 60), 24, rgb(160, 160, 160), false, true);
    }
}

/// round(score / rounds * 5), clamped to 1..=5.
pub fn star_rating(score: u32) -> u32 {
    ((score as f32 * 5.0 / TOTAL_ROUNDS as f32 + 0.5) as u32).clamp(1, 5)
}

impl Game for ColorHunter {
    fn on_frame(&mut self, frame: &mut FrameBuffer) {
        if frame.is_empty() {
            return;
        }
        let now = self.clock.now();

        match self.phase {
            Phase::GameOver => {
                self.draw_game_over(frame);
                self.particles = fx::advance_and_draw(frame, std::mem::take(&mut self.particles));
                return;
            }
            Phase::Success { at } => {
                self.draw_success(frame);
                self.particles = fx::advance_and_draw(frame, std::mem::take(&mut self.particles));
                if now.saturating_sub(at) > SUCCESS_DELAY {
                    self.advance_round();
                }
                return;
            }
            Phase::Searching | Phase::Holding { .. } => {}
        }

        let roi = Self::target_roi(frame.width, frame.height);
        let ratio = detect_color_ratio(frame, roi, self.target);

        let mut hold = None;
        if ratio >= MATCH_THRESHOLD {
            let since = match self.phase {
                Phase::Holding { since } => since,
                _ => now,
            };
            let held = now.saturating_sub(since);
            hold = Some((held.as_secs_f32() / HOLD_DURATION.as_secs_f32()).min(1.0));
            if held >= HOLD_DURATION {
                self.score += 1;
                self.phase = Phase::Success { at: now };
                tracing::info!(round = self.round, score = self.score, color = self.target.name(), "color found");
                self.celebrate(frame.width, frame.height);
            } else {
                self.phase = Phase::Holding { since };
            }
        } else {
            self.phase = Phase::Searching;
        }

        self.draw_round(frame, roi, hold);
        self.particles = fx::advance_and_draw(frame, std::mem::take(&mut self.particles));
    }

    fn reset(&mut self) {
        self.round = 0;
        self.score = 0;
        self.particles.clear();
        self.start_round(None);
    }

    fn is_finished(&self) -> bool {
        self.is_game_over()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn game() -> (ColorHunter, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let ctx = GameContext::new(Rc::new(Compositor::fallback()), clock.clone()).with_seed(11);
        (ColorHunter::new(&ctx), clock)
    }

    fn showing(color: ColorId) -> FrameBuffer {
        FrameBuffer::filled(320, 240, color.display_rgb())
    }

    fn nothing() -> FrameBuffer {
        FrameBuffer::filled(320, 240, rgb(128, 128, 128))
    }

    #[test]
    fn star_rating_is_clamped() {
        assert_eq!(star_rating(0), 1);
        assert_eq!(star_rating(1), 1);
        assert_eq!(star_rating(4), 3);
        assert_eq!(star_rating(8), 5);
    }

    #[test]
    fn roi_is_the_central_box() {
        assert_eq!(ColorHunter::target_roi(1280, 720), Rect::new(384, 216, 512, 288));
    }

    #[test]
    fn holding_for_a_second_scores() {
        let (mut g, clock) = game();
        assert_eq!((g.round(), g.score()), (1, 0));
        g.on_frame(&mut showing(g.target()));
        assert_eq!(g.match_start(), Some(Duration::ZERO));
        clock.advance_secs(1.0);
        g.on_frame(&mut showing(g.target()));
        assert_eq!(g.score(), 1);
        assert_eq!(g.success_time(), Some(Duration::from_secs(1)));
        assert!(!g.particles.is_empty());
    }

    #[test]
    fn releasing_early_discards_the_hold() {
        let (mut g, clock) = game();
        g.on_frame(&mut showing(g.target()));
        clock.advance(Duration::from_millis(600));
        g.on_frame(&mut nothing());
        assert_eq!(g.phase(), Phase::Searching);
        assert_eq!(g.match_start(), None);
        clock.advance(Duration::from_millis(600));
        g.on_frame(&mut showing(g.target()));
        assert_eq!(g.match_start(), Some(Duration::from_millis(1200)));
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn success_screen_lasts_past_the_delay_then_rerolls() {
        let (mut g, clock) = game();
        let first = g.target();
        g.on_frame(&mut showing(first));
        clock.advance_secs(1.0);
        g.on_frame(&mut showing(first));
        clock.advance_secs(2.5);
        g.on_frame(&mut nothing());
        assert_eq!(g.round(), 1, "delay is strict");
        clock.advance_secs(0.01);
        g.on_frame(&mut nothing());
        assert_eq!(g.round(), 2);
        assert_ne!(g.target(), first);
        assert_eq!(g.phase(), Phase::Searching);
    }

    #[test]
    fn reset_starts_over() {
        let (mut g, clock) = game();
        g.on_frame(&mut showing(g.target()));
        clock.advance_secs(1.0);
        g.on_frame(&mut showing(g.target()));
        g.reset();
        assert_eq!((g.round(), g.score(), g.phase()), (1, 0, Phase::Searching));
    }
}
