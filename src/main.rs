use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::warn;
use vcsim::sim::config::SimConfig;
use vcsim::sim::hierarchy::{CacheHierarchy, HierarchyMode};
use vcsim::sim::report::{self, ConfigSummary, WorkloadReport};
use vcsim::workload::WorkloadKind;

#[derive(Parser)]
#[command(version, about)]
struct VcsimArgs {
    /// Workload to drive: memory, compute, mixed, streaming, strided, random.
    #[arg(long, default_value = "mixed")]
    workload: String,

    /// Run every workload instead of just --workload.
    #[arg(long)]
    all_workloads: bool,

    /// Optional TOML config file with a [sim] section.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    instructions: Option<u64>,
    #[arg(long)]
    victim_size: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    results_dir: Option<PathBuf>,
}

pub fn main() {
    env_logger::init();
    let argv = VcsimArgs::parse();

    let mut config = SimConfig::load(argv.config.as_deref());
    config.instructions = argv.instructions.unwrap_or(config.instructions);
    config.victim_size = argv.victim_size.unwrap_or(config.victim_size);
    config.seed = argv.seed.unwrap_or(config.seed);
    if let Some(dir) = &argv.results_dir {
        config.results_dir = dir.display().to_string();
    }

    let workloads: Vec<WorkloadKind> = if argv.all_workloads {
        WorkloadKind::all().to_vec()
    } else {
        match WorkloadKind::from_name(&argv.workload) {
            Some(kind) => vec![kind],
            None => {
                eprintln!(
                    "unknown workload '{}'; expected one of: memory, compute, mixed, streaming, strided, random",
                    argv.workload
                );
                std::process::exit(2);
            }
        }
    };

    let results_dir = PathBuf::from(&config.results_dir);
    if let Err(err) = fs::create_dir_all(&results_dir) {
        warn!("cannot create {}: {err}", results_dir.display());
    }

    let mut reports = Vec::new();
    for kind in workloads {
        println!(
            "\n*** workload: {} ({} instructions) ***",
            kind.name(),
            config.instructions
        );
        let addresses = kind.generate(config.instructions, config.seed);

        let mut summaries = Vec::new();
        for mode in [
            HierarchyMode::Baseline,
            HierarchyMode::StaticVictim,
            HierarchyMode::Adaptive,
        ] {
            let mut sim = CacheHierarchy::new(mode, &config);
            for &address in &addresses {
                sim.access_memory(address);
                sim.simulate_instruction();
            }

            report::print_summary(&sim);
            if let Some(controller) = sim.controller() {
                controller.print_history();
                report::print_phase_breakdown(controller.history());
                let path = results_dir.join(format!("adaptations_{}.csv", kind.name()));
                if let Err(err) = controller.export_csv(&path) {
                    warn!("failed to export adaptation history: {err}");
                }
            }
            summaries.push(ConfigSummary::from_hierarchy(&sim));
        }

        report::print_comparison(kind.name(), &summaries);
        reports.push(WorkloadReport {
            workload: kind.name().to_string(),
            configs: summaries,
        });
    }

    let summary_path = results_dir.join("summary.json");
    if let Err(err) = report::write_summary_json(&summary_path, &reports) {
        warn!("failed to write {}: {err}", summary_path.display());
    } else {
        println!("\nsummary written to {}", summary_path.display());
    }
}
