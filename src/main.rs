use pokemon_battle_engine::{run, CliOptions};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--battle battle.json] [--type-chart chart.json] \
[--seed SEED] [--config config.json] [--battles N] [--log-json log.json]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut battle_path = PathBuf::from("battle.json");
    let mut type_chart_path = None;
    let mut config_path = None;
    let mut seed = None;
    let mut battles = 1usize;
    let mut log_json = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--battle" => {
                battle_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--battle requires a path (e.g. --battle demos/battle.json)")
                })?;
            }
            "--type-chart" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--type-chart requires a path"))?;
                type_chart_path = Some(PathBuf::from(path));
            }
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = Some(val.parse()?);
            }
            "--battles" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--battles requires a number"))?;
                battles = val.parse()?;
            }
            "--log-json" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--log-json requires a path"))?;
                log_json = Some(PathBuf::from(path));
            }
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        battle_path,
        type_chart_path,
        config_path,
        seed,
        battles,
        log_json,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}
