#[cfg(test)]
mod tests {
    use crate::engine::config::EngineConfig;
    use crate::engine::search::AlphaBetaEngine;
    use crate::engine::Searcher;
    use crate::logic::board::Position;
    use crate::logic::rules::ChessRules;
    use std::sync::Arc;

    fn run(name: &str, fen: &str, depth: u8) {
        println!("--- Benchmarking {name} ---");
        let config = Arc::new(EngineConfig::default());
        let mut engine = AlphaBetaEngine::new(ChessRules, config);
        let pos = Position::from_fen(fen).unwrap();
        let side = pos.turn;

        let start = std::time::Instant::now();
        let result = engine.search(&pos, depth, side).unwrap();
        let duration = start.elapsed();

        if let Some((mv, stats)) = result {
            println!("{name} depth {depth}: {mv} {stats:?}");
            println!("Time taken: {duration:?}");
            println!("Cache: {:?}, {} entries", engine.tt().stats(), engine.tt().len());
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let nps = (stats.nodes as f64 / duration.as_secs_f64().max(1e-9)) as u64;
            println!("NPS: {nps}");
            assert!(stats.nodes > 0);
        } else {
            panic!("Search returned None");
        }
    }

    #[test]
    fn bench_opening() {
        run("Opening", crate::logic::board::START_FEN, 3);
    }

    #[test]
    fn bench_middlegame() {
        run(
            "Middlegame",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            2,
        );
    }

    #[test]
    fn bench_endgame() {
        run("Endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4);
    }
}
