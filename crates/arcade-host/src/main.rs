use tracing_subscriber::EnvFilter;

use arcade_core::game_trait::GameId;
use arcade_core::session::SessionManager;

use arcade_host::catalog::build_catalog;
use arcade_host::config::HostConfig;
use arcade_host::store::FileStore;
use arcade_host::autoplay;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = HostConfig::load();
    let catalog = build_catalog();
    let available = catalog.ids();
    let mut manager = SessionManager::new(catalog, Box::new(FileStore::new(&config.record_path)));
    manager.on_game_end(|outcome| {
        tracing::info!(
            game = %outcome.game,
            run = %outcome.run,
            score = outcome.score,
            new_best = outcome.new_best,
            earned = outcome.currency_earned,
            "Autoplay run finished"
        );
    });

    // `arcade-host <game>` smokes one game; no argument smokes them all.
    let targets: Vec<GameId> = match std::env::args().nth(1) {
        Some(arg) => match GameId::parse(&arg) {
            Some(id) => vec![id],
            None => {
                eprintln!("unknown game '{arg}'");
                eprintln!(
                    "available: {}",
                    available
                        .iter()
                        .map(|id| id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                std::process::exit(2);
            },
        },
        None => available,
    };

    tracing::info!(games = targets.len(), "Token Arcade host starting");
    for id in targets {
        let ended = autoplay::run(
            &mut manager,
            id,
            config.seed,
            config.max_frames,
            config.frame_dt,
        );
        if !ended {
            tracing::info!(game = %id, "Run stopped at the frame budget");
        }
    }
    tracing::info!(
        currency = manager.record().currency,
        "All runs complete"
    );
}
