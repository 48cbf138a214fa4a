//! Bubble Pop: bubbles drift up the screen, waving a hand through one pops it.

use std::f32::consts::{PI, TAU};
use std::rc::Rc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Game, GameContext};
use crate::clock::Clock;
use crate::compositor::Compositor;
use crate::draw;
use crate::fx::{self, Particle, ParticleSystem};
use crate::motion::MotionDetector;
use crate::types::{rgb, FrameBuffer, Observation, Rect, CANONICAL_HEIGHT, CANONICAL_WIDTH, WHITE};

pub const MAX_BUBBLES: usize = 7;
pub const INITIAL_BUBBLES: usize = 5;
pub const MIN_RADIUS: i32 = 35;
pub const MAX_RADIUS: i32 = 70;
pub const BASE_SPEED: f32 = 1.5;
/// Added to the base speed for every full 30 s of play.
pub const SPEED_INCREMENT: f32 = 0.1;
pub const SPEED_STEP: Duration = Duration::from_secs(30);
pub const SPAWN_INTERVAL: Duration = Duration::from_millis(1500);

const SWAY_STEP: f32 = 0.03;
const SWAY_AMPLITUDE: f32 = 1.5;
const EDGE_MARGIN: i32 = 20;
const POP_PARTICLES: usize = 25;
const RING_LIFE: i32 = 15;

const MOTION_MIN_AREA: f32 = 2000.0;
const MOTION_THRESHOLD: u8 = 25;

const PALETTE: [u32; 8] = [
    rgb(100, 100, 255),
    rgb(100, 255, 100),
    rgb(255, 100, 100),
    rgb(100, 255, 255),
    rgb(255, 100, 255),
    rgb(255, 255, 100),
    rgb(100, 200, 200),
    rgb(255, 200, 100),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Bubble {
    pub x: f32,
    pub y: f32,
    pub radius: i32,
    pub color: u32,
    /// Rise in px per frame, fixed at spawn.
    pub speed: f32,
    /// Sway phase in radians.
    pub phase: f32,
}

impl Bubble {
    /// Popped by a motion region if the centres are closer than the bubble
    /// radius plus half the region's equivalent-circle radius.
    pub fn is_hit_by(&self, motion: &Observation) -> bool {
        let dx = motion.center.0 as f32 - self.x;
        let dy = motion.center.1 as f32 - self.y;
        let reach = self.radius as f32 + 0.5 * motion_radius(motion.area);
        (dx * dx + dy * dy).sqrt() < reach
    }
}

/// Radius of a circle with the given area.
pub fn motion_radius(area: f32) -> f32 {
    (area.max(0.0) / PI).sqrt()
}

pub struct BubblePop {
    compositor: Rc<Compositor>,
    clock: Rc<dyn Clock>,
    motion: MotionDetector,
    fx: ParticleSystem,
    bubbles: Vec<Bubble>,
    particles: Vec<Particle>,
    score: u32,
    start: Duration,
    last_spawn: Duration,
    frame_count: u64,
    frame_size: (usize, usize),
}

impl BubblePop {
    pub fn new(ctx: &GameContext) -> Self {
        let now = ctx.clock.now();
        let mut game = Self {
            compositor: Rc::clone(&ctx.compositor),
            clock: Rc::clone(&ctx.clock),
            motion: MotionDetector::new(MOTION_MIN_AREA, MOTION_THRESHOLD),
            fx: ParticleSystem::new(ctx.make_rng()),
            bubbles: Vec::with_capacity(MAX_BUBBLES),
            particles: Vec::new(),
            score: 0,
            start: now,
            last_spawn: now,
            frame_count: 0,
            frame_size: (CANONICAL_WIDTH, CANONICAL_HEIGHT),
        };
        game.initial_spawn();
        game
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Base rise speed right now: +0.1 for every full 30 s since the start.
    pub fn current_speed(&self) -> f32 {
        let elapsed = self.clock.now().saturating_sub(self.start);
        let steps = (elapsed.as_secs_f64() / SPEED_STEP.as_secs_f64()).floor() as f32;
        BASE_SPEED + steps * SPEED_INCREMENT
    }

    fn initial_spawn(&mut self) {
        for _ in 0..INITIAL_BUBBLES {
            self.spawn_bubble(true);
        }
    }

    fn random_x(&mut self, radius: i32) -> f32 {
        let lo = radius + EDGE_MARGIN;
        let hi = (self.frame_size.0 as i32 - EDGE_MARGIN - radius).max(lo);
        self.fx.rng().gen_range(lo..=hi) as f32
    }

    /// Add one bubble, either somewhere on screen (`random_y`) or just below
    /// the bottom edge. Refused once `MAX_BUBBLES` are live.
    pub fn spawn_bubble(&mut self, random_y: bool) -> bool {
        if self.bubbles.len() >= MAX_BUBBLES {
            return false;
        }
        let height = self.frame_size.1 as i32;
        let radius = self.fx.rng().gen_range(MIN_RADIUS..=MAX_RADIUS);
        let x = self.random_x(radius);
        let y = if random_y {
            self.fx.rng().gen_range(100..=(height - 100).max(100)) as f32
        } else {
            (height + radius) as f32
        };
        let color = PALETTE.choose(self.fx.rng()).copied().unwrap_or(WHITE);
        let speed = self.current_speed() * self.fx.rng().gen_range(0.8..1.2);
        let phase = self.fx.rng().gen_range(0.0..TAU);
        self.bubbles.push(Bubble { x, y, radius, color, speed, phase });
        true
    }

    /// Rise, sway, and recycle bubbles that left through the top.
    fn move_bubbles(&mut self) {
        let height = self.frame_size.1 as f32;
        for i in 0..self.bubbles.len() {
            let b = &mut self.bubbles[i];
            b.y -= b.speed;
            b.phase += SWAY_STEP;
            b.x += b.phase.sin() * SWAY_AMPLITUDE;
            if b.y < -(b.radius as f32) {
                let radius = b.radius;
                let x = self.random_x(radius);
                let b = &mut self.bubbles[i];
                b.y = height + radius as f32;
                b.x = x;
            }
        }
    }

    /// Pop every bubble touched by a motion region. Each bubble takes the
    /// first region that reaches it and pops at most once; one region may pop
    /// several bubbles. Returns how many popped.
    pub fn pop_touched(&mut self, motions: &[Observation]) -> u32 {
        let mut popped = 0;
        let mut kept = Vec::with_capacity(self.bubbles.len());
        for bubble in std::mem::take(&mut self.bubbles) {
            if !motions.iter().any(|m| bubble.is_hit_by(m)) {
                kept.push(bubble);
                continue;
            }
            popped += 1;
            let burst = self.fx.spawn_firework(bubble.x, bubble.y, Some(bubble.color), POP_PARTICLES);
            self.particles.extend(burst);
            self.particles.push(Particle::ring(bubble.x, bubble.y, bubble.color, bubble.radius, RING_LIFE));
            tracing::trace!(x = bubble.x, y = bubble.y, "bubble popped");
        }
        self.bubbles = kept;
        self.score += popped;
        popped
    }

    /* --- Drawing ---
       Visual: faint white rings where motion was seen, the bubbles, pop
       particles, then the top bar with the pop counter. */
    fn draw(&mut self, frame: &mut FrameBuffer, motions: &[Observation]) {
        let c = &self.compositor;
        let (w, h) = (frame.width as i32, frame.height as i32);

        for m in motions {
            let r = (motion_radius(m.area) * 0.5) as i32;
            draw::stroke_circle(frame, m.center.0, m.center.1, r, WHITE, 1);
        }
        for b in &self.bubbles {
            c.draw_bubble(frame, (b.x as i32, b.y as i32), b.radius, b.color);
        }
        self.particles = fx::advance_and_draw(frame, std::mem::take(&mut self.particles));

        c.draw_rounded_rect(frame, Rect::new(0, 0, w, 70), rgb(40, 20, 30), 0, None, 0.5);
        c.draw_text(frame, "Bubble Pop", (w / 2, 28), 36, WHITE, true, true);
        c.draw_text(frame, &format!("Popped: {}", self.score), (w - 100, 30), 28, rgb(255, 255, 100), true, true);
        c.draw_text(frame, "Wave your hands to pop the bubbles!  ESC = back", (w / 2, h - 30), 20, rgb(180, 180, 180), false, true);
    }
}

impl Game for BubblePop {
    fn on_frame(&mut self, frame: &mut FrameBuffer) {
        if frame.is_empty() {
            return;
        }
        self.frame_size = (frame.width, frame.height);
        self.frame_count += 1;
        let now = self.clock.now();

        let motions = self.motion.detect(frame);
        self.move_bubbles();
        self.pop_touched(&motions);

        if now.saturating_sub(self.last_spawn) > SPAWN_INTERVAL {
            self.spawn_bubble(false);
            self.last_spawn = now;
        }

        self.draw(frame, &motions);
    }

    fn reset(&mut self) {
        let now = self.clock.now();
        self.motion.reset();
        self.bubbles.clear();
        self.particles.clear();
        self.score = 0;
        self.start = now;
        self.last_spawn = now;
        self.frame_count = 0;
        self.initial_spawn();
    }
}
