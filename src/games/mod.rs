//! The three mini-games behind one frame/key contract.
//!
//! Every game owns its own state and receives the shared compositor and clock
//! through a [`GameContext`]. The host picks a game with [`GameKind`] and
//! drives it as an [`AnyGame`].

pub mod air_painter;
pub mod bubble_pop;
pub mod color_hunter;

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::Clock;
use crate::compositor::Compositor;
use crate::types::FrameBuffer;

pub use air_painter::AirPainter;
pub use bubble_pop::{Bubble, BubblePop};
pub use color_hunter::{ColorHunter, Phase};

/// Per-game lifecycle as seen by the host shell.
pub trait Game {
    /// Detect, update and draw onto `frame` in place.
    fn on_frame(&mut self, frame: &mut FrameBuffer);

    /// Key codes are ASCII where one exists (`'c' as u32`, 27 for Escape).
    fn on_key(&mut self, _key: u32) {}

    /// Back to the state right after construction.
    fn reset(&mut self);

    fn is_finished(&self) -> bool {
        false
    }
}

/// Everything a game needs from its surroundings.
#[derive(Clone)]
pub struct GameContext {
    pub compositor: Rc<Compositor>,
    pub clock: Rc<dyn Clock>,
    /// Fixed seed for reproducible runs; entropy when `None`.
    pub seed: Option<u64>,
}

impl GameContext {
    pub fn new(compositor: Rc<Compositor>, clock: Rc<dyn Clock>) -> Self {
        Self { compositor, clock, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    AirPainter,
    ColorHunter,
    BubblePop,
}

impl GameKind {
    /// Menu order.
    pub const ALL: [GameKind; 3] = [GameKind::AirPainter, GameKind::ColorHunter, GameKind::BubblePop];

    pub fn from_menu_index(index: usize) -> Option<GameKind> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            GameKind::AirPainter => "Air Painter",
            GameKind::ColorHunter => "Color Hunter",
            GameKind::BubblePop => "Bubble Pop",
        }
    }
}

/// Closed set of games the shell can run.
pub enum AnyGame {
    AirPainter(AirPainter),
    ColorHunter(ColorHunter),
    BubblePop(BubblePop),
}

impl AnyGame {
    pub fn new(kind: GameKind, ctx: &GameContext) -> Self {
        match kind {
            GameKind::AirPainter => AnyGame::AirPainter(AirPainter::new(ctx)),
            GameKind::ColorHunter => AnyGame::ColorHunter(ColorHunter::new(ctx)),
            GameKind::BubblePop => AnyGame::BubblePop(BubblePop::new(ctx)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            AnyGame::AirPainter(_) => GameKind::AirPainter,
            AnyGame::ColorHunter(_) => GameKind::ColorHunter,
            AnyGame::BubblePop(_) => GameKind::BubblePop,
        }
    }

    fn as_game_mut(&mut self) -> &mut dyn Game {
        match self {
            AnyGame::AirPainter(g) => g,
            AnyGame::ColorHunter(g) => g,
            AnyGame::BubblePop(g) => g,
        }
    }

    fn as_game(&self) -> &dyn Game {
        match self {
            AnyGame::AirPainter(g) => g,
            AnyGame::ColorHunter(g) => g,
            AnyGame::BubblePop(g) => g,
        }
    }
}

impl Game for AnyGame {
    fn on_frame(&mut self, frame: &mut FrameBuffer) {
        self.as_game_mut().on_frame(frame)
    }

    fn on_key(&mut self, key: u32) {
        self.as_game_mut().on_key(key)
    }

    fn reset(&mut self) {
        self.as_game_mut().reset()
    }

    fn is_finished(&self) -> bool {
        self.as_game().is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rand::Rng;

    fn ctx() -> GameContext {
        GameContext::new(Rc::new(Compositor::fallback()), Rc::new(ManualClock::new())).with_seed(3)
    }

    #[test]
    fn menu_index_maps_to_games() {
        assert_eq!(GameKind::from_menu_index(0), Some(GameKind::AirPainter));
        assert_eq!(GameKind::from_menu_index(2), Some(GameKind::BubblePop));
        assert_eq!(GameKind::from_menu_index(3), None);
    }

    #[test]
    fn factory_builds_the_requested_variant() {
        let ctx = ctx();
        for kind in GameKind::ALL {
            let game = AnyGame::new(kind, &ctx);
            assert_eq!(game.kind(), kind);
            assert!(!game.is_finished());
        }
    }

    #[test]
    fn seeded_context_repeats_its_rng() {
        let ctx = ctx();
        let a: u64 = ctx.make_rng().r#gen();
        let b: u64 = ctx.make_rng().r#gen();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_frames_are_ignored_by_every_game() {
        let ctx = ctx();
        for kind in GameKind::ALL {
            let mut game = AnyGame::new(kind, &ctx);
            let mut empty = FrameBuffer::new(0, 0);
            game.on_frame(&mut empty);
            assert!(empty.pixels.is_empty());
        }
    }
}
