//! Feature-gated game registry. The host registers every game it was
//! compiled with; a build with a trimmed feature set simply exposes a
//! smaller catalog.

use arcade_core::game_trait::GameId;
use arcade_core::session::GameCatalog;

pub fn build_catalog() -> GameCatalog {
    let mut catalog = GameCatalog::new();
    #[cfg(feature = "catcher")]
    catalog.register(GameId::Catcher, || {
        Box::new(arcade_catcher::TokenCatcher::new())
    });
    #[cfg(feature = "sequence")]
    catalog.register(GameId::Sequence, || {
        Box::new(arcade_sequence::MemorySequence::new())
    });
    #[cfg(feature = "matching")]
    catalog.register(GameId::Matching, || {
        Box::new(arcade_matching::PairMatching::new())
    });
    #[cfg(feature = "clicker")]
    catalog.register(GameId::Clicker, || {
        Box::new(arcade_clicker::TargetClicker::new())
    });
    #[cfg(feature = "fighter")]
    catalog.register(GameId::Fighter, || {
        Box::new(arcade_fighter::WaveFighter::new())
    });
    #[cfg(feature = "racer")]
    catalog.register(GameId::Racer, || Box::new(arcade_racer::LaneRacer::new()));
    #[cfg(feature = "blaster")]
    catalog.register(GameId::Blaster, || {
        Box::new(arcade_blaster::WaveBlaster::new())
    });
    #[cfg(feature = "defense")]
    catalog.register(GameId::Defense, || {
        Box::new(arcade_defense::TowerDefense::new())
    });
    #[cfg(feature = "stacker")]
    catalog.register(GameId::Stacker, || {
        Box::new(arcade_stacker::BlockStacker::new())
    });
    catalog
}
