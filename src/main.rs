use std::io::Read;

use toolgate::decision::EXIT_BLOCK;
use toolgate::engine::{Engine, EngineConfig};
use toolgate::logging;

/// Read one JSON record from stdin, print the decision record to stdout, and
/// exit per the convention: 0 = proceed, 2 = block.
///
/// Config comes from `TOOLGATE_CONFIG` (a JSON file path) when set, stock
/// defaults otherwise. Diagnostics go to stderr only.
fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let config = match std::env::var_os("TOOLGATE_CONFIG") {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str::<EngineConfig>(&content)?
        }
        None => EngineConfig::default(),
    };

    let engine = Engine::new(config)?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let raw: serde_json::Value = match serde_json::from_str(&input) {
        Ok(value) => value,
        Err(e) => {
            // Unparseable input fails open, same as unnormalizable input
            tracing::warn!("failing open on unparseable input: {}", e);
            println!(r#"{{"verdict":"allow"}}"#);
            return Ok(());
        }
    };

    let decision = engine.run(&raw);
    println!("{}", decision.to_wire()?);

    let code = decision.exit_code();
    if code == EXIT_BLOCK {
        std::process::exit(code);
    }

    Ok(())
}
