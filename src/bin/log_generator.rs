use clap::Parser;
use std::{fmt::Write as _, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use solver_results::dialect::Dialect;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct MethodConfig {
    name: String,
    mean: f64,
    std: f64,
    #[serde(default)]
    call: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LogGeneratorConfig {
    method_configs: Vec<MethodConfig>,
    groups: Vec<String>,
    num_instances: usize,
    restarts: usize,
    seed: u64,
    out_path: PathBuf,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config: LogGeneratorConfig =
        serde_json::from_str(&fs::read_to_string(args.config)?)?;
    generate_logs(&config)
}

fn generate_logs(config: &LogGeneratorConfig) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    for MethodConfig {
        name,
        mean,
        std,
        call,
    } in &config.method_configs
    {
        let dialect = Dialect::from_method(name)
            .with_context(|| format!("No log dialect for method {name}"))?;
        let method_dir = config.out_path.join(name);
        fs::create_dir_all(&method_dir)?;
        if let Some(call) = call {
            fs::write(method_dir.join("call.txt"), call)?;
        }
        let distrib = Normal::new(*mean, (*mean * *std).abs())?;
        for group in &config.groups {
            let group_dir = method_dir.join(group);
            fs::create_dir_all(&group_dir)?;
            for i in 0..config.num_instances {
                let log = match dialect {
                    Dialect::Restart => {
                        restart_log(&mut rng, &distrib, config.restarts)?
                    }
                    Dialect::Popstar => format!(
                        "bestsol {}\ncputime {}\n",
                        sample_cost(&mut rng, &distrib),
                        sample_time(&mut rng)
                    ),
                    Dialect::Cmcs => format!(
                        "Solution found: {}\nTime: {}\n",
                        sample_cost(&mut rng, &distrib),
                        sample_time(&mut rng)
                    ),
                };
                write_log(&group_dir, &format!("instance{i}.txt"), &log)?;
            }
        }
    }
    Ok(())
}

fn restart_log(
    rng: &mut ChaCha8Rng,
    distrib: &Normal<f64>,
    restarts: usize,
) -> Result<String> {
    let mut log = String::new();
    let mut cpu_time = sample_time(rng);
    for r in 0..restarts {
        let time = sample_time(rng);
        cpu_time += time;
        writeln!(log, "# RST {r} {} {time}", -sample_cost(rng, distrib))?;
    }
    writeln!(log, "# CPU_TIME {cpu_time}")?;
    Ok(log)
}

fn sample_cost(rng: &mut ChaCha8Rng, distrib: &Normal<f64>) -> f64 {
    distrib.sample(rng).abs().max(1.0).round()
}

fn sample_time(rng: &mut ChaCha8Rng) -> f64 {
    rng.gen_range(0.25..2.0)
}

fn write_log(dir: &Path, name: &str, log: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, log)
        .with_context(|| format!("Failed to write {}", path.display()))
}
