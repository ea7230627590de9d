use anyhow::Context;
use circlegraph::{run, Config};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    // an optional json config file is the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => Config::default(),
    };

    let report = run(&config)
        .with_context(|| format!("preprocessing {}", config.input.display()))?;

    println!(
        "{} graphs written to {}, {} examples skipped",
        report.processed,
        report.output.display(),
        report.skipped.len()
    );
    Ok(())
}
