// FX: point particles with fixed gravity and a linear shrink-out.
// Visual outcomes:
// - Fireworks: a burst of coloured dots flying out and falling.
// - Sparkles: a few slow, tiny dots jittered around a point.
// - Rings: a single outline that widens while it fades (used for bubble pops).
// Particles never interact; games own their particle lists and hand them to
// `advance_and_draw` once per frame.

use crate::draw;
use crate::types::{rgb, FrameBuffer};
use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::TAU;

/// Downward pull added to `vy` every tick.
pub const GRAVITY: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleShape {
    Dot,
    Ring,
}

/// One particle. Visual: a filled dot (or ring) that moves and shrinks away.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32, pub y: f32,        // position in pixels
    pub vx: f32, pub vy: f32,      // velocity in px/tick
    pub color: u32,
    pub radius: i32,
    pub life: i32,                 // remaining ticks
    pub max_life: i32,             // initial ticks (for the shrink)
    pub shape: ParticleShape,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, color: u32, radius: i32, life: i32) -> Self {
        Self { x, y, vx, vy, color, radius, life, max_life: life.max(1), shape: ParticleShape::Dot }
    }

    /// A stationary ring, e.g. where a bubble just popped.
    pub fn ring(x: f32, y: f32, color: u32, radius: i32, life: i32) -> Self {
        Self { shape: ParticleShape::Ring, ..Self::new(x, y, 0.0, 0.0, color, radius, life) }
    }

    /// One tick of kinematics. Rings stay where they were spawned and only age.
    pub fn update(&mut self) {
        if self.shape == ParticleShape::Dot {
            self.x += self.vx;
            self.y += self.vy;
            self.vy += GRAVITY;
        }
        self.life -= 1;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Remaining-life fraction in [0, 1].
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        (self.life as f32 / self.max_life as f32).clamp(0.0, 1.0)
    }

    fn draw(&self, fb: &mut FrameBuffer) {
        let frac = self.life_fraction();
        let (x, y) = (self.x as i32, self.y as i32);
        match self.shape {
            ParticleShape::Dot => {
                let r = ((self.radius as f32 * frac) as i32).max(1);
                draw::fill_circle(fb, x, y, r, self.color);
            }
            ParticleShape::Ring => {
                let r = (self.radius as f32 * (2.0 - frac)) as i32;
                draw::stroke_circle(fb, x, y, r.max(1), self.color, 2);
            }
        }
    }
}

/// Spawns particles; owns the randomness so games stay reproducible under a seed.
pub struct ParticleSystem {
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Burst of `count` particles flying out at 2..8 px/tick in random
    /// directions. Without a colour each particle gets a random bright one.
    pub fn spawn_firework(&mut self, x: f32, y: f32, color: Option<u32>, count: usize) -> Vec<Particle> {
        (0..count)
            .map(|_| {
                let angle = self.rng.gen_range(0.0..TAU);
                let speed = self.rng.gen_range(2.0..8.0);
                let c = color.unwrap_or_else(|| {
                    rgb(
                        self.rng.gen_range(100..=255),
                        self.rng.gen_range(100..=255),
                        self.rng.gen_range(100..=255),
                    )
                });
                let radius = self.rng.gen_range(3..=6);
                let life = self.rng.gen_range(20..=40);
                Particle::new(x, y, angle.cos() * speed, angle.sin() * speed, c, radius, life)
            })
            .collect()
    }

    /// A few slow, small particles jittered ±10 px around (x, y).
    pub fn spawn_sparkle(&mut self, x: f32, y: f32, color: u32, count: usize) -> Vec<Particle> {
        (0..count)
            .map(|_| {
                let angle = self.rng.gen_range(0.0..TAU);
                let speed = self.rng.gen_range(0.5..2.0);
                let jx = self.rng.gen_range(-10..=10) as f32;
                let jy = self.rng.gen_range(-10..=10) as f32;
                let radius = self.rng.gen_range(1..=3);
                let life = self.rng.gen_range(10..=20);
                Particle::new(x + jx, y + jy, angle.cos() * speed, angle.sin() * speed, color, radius, life)
            })
            .collect()
    }

    /// The generator, for game-side placement (bubble positions, round colours).
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Step every particle once, draw the survivors, and return only them.
pub fn advance_and_draw(fb: &mut FrameBuffer, particles: Vec<Particle>) -> Vec<Particle> {
    particles
        .into_iter()
        .filter_map(|mut p| {
            p.update();
            if !p.is_alive() {
                return None;
            }
            p.draw(fb);
            Some(p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BLACK;
    use rand::SeedableRng;

    fn system() -> ParticleSystem {
        ParticleSystem::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn firework_respects_parameter_ranges() {
        let ps = system().spawn_firework(100.0, 100.0, None, 50);
        assert_eq!(ps.len(), 50);
        for p in &ps {
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!((1.999..=8.001).contains(&speed));
            assert!((3..=6).contains(&p.radius));
            assert!((20..=40).contains(&p.life));
            assert_eq!(p.life, p.max_life);
        }
    }

    #[test]
    fn sparkle_is_jittered_and_slow() {
        let ps = system().spawn_sparkle(50.0, 50.0, rgb(255, 255, 200), 20);
        for p in &ps {
            assert!((p.x - 50.0).abs() <= 10.0 && (p.y - 50.0).abs() <= 10.0);
            assert!((p.vx * p.vx + p.vy * p.vy).sqrt() < 2.001);
            assert_eq!(p.color, rgb(255, 255, 200));
        }
    }

    #[test]
    fn life_and_gravity_advance_every_tick() {
        let mut p = Particle::new(0.0, 0.0, 1.0, -2.0, BLACK, 4, 3);
        let vy0 = p.vy;
        p.update();
        assert_eq!(p.life, 2);
        assert!((p.vy - (vy0 + GRAVITY)).abs() < 1e-6);
        assert_eq!((p.x, p.y), (1.0, -2.0));
    }

    #[test]
    fn particle_is_dropped_when_life_hits_zero() {
        let mut fb = FrameBuffer::new(64, 64);
        let ps = vec![
            Particle::new(10.0, 10.0, 0.0, 0.0, rgb(255, 0, 0), 3, 1),
            Particle::new(30.0, 30.0, 0.0, 0.0, rgb(0, 255, 0), 3, 2),
        ];
        let ps = advance_and_draw(&mut fb, ps);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].life, 1);
        assert_eq!(fb.get(30, 30), Some(rgb(0, 255, 0)));
        assert_eq!(fb.get(10, 10), Some(BLACK));
        assert!(advance_and_draw(&mut fb, ps).is_empty());
    }

    #[test]
    fn drawn_size_never_drops_below_one_pixel() {
        let mut fb = FrameBuffer::new(16, 16);
        let p = Particle::new(8.0, 8.0, 0.0, 0.0, rgb(9, 9, 9), 6, 100);
        let ps = advance_and_draw(&mut fb, vec![Particle { life: 2, ..p }]);
        assert_eq!(ps.len(), 1);
        assert_eq!(fb.get(8, 8), Some(rgb(9, 9, 9)));
    }

    #[test]
    fn pop_ring_stays_put_while_it_fades() {
        let mut ring = Particle::ring(40.0, 40.0, rgb(200, 220, 255), 30, 15);
        for _ in 0..14 {
            ring.update();
        }
        assert_eq!((ring.x, ring.y, ring.vy), (40.0, 40.0, 0.0));
        assert_eq!(ring.life, 1);
        assert!(ring.is_alive());
    }
}
