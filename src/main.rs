use approach_sim::{run_batch, SampleStat, SimulationConfig};

fn main() {
    let mut args = std::env::args().skip(1);
    let rate: f64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(0.1);
    let days: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(5);
    let trials: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(10);

    let config = SimulationConfig::new(rate, days);
    let summary = run_batch(&config, trials).expect("invalid configuration");

    let row = |name: &str, stat: SampleStat| {
        println!("{:<24} {:>8.1} ± {:.1}", name, stat.mean, stat.std_error)
    };

    println!(
        "{} trials of {} days at {} arrivals/min",
        trials, days, rate
    );
    row("generated", summary.total_generated);
    row("landed", summary.landed);
    row("diverted (congestion)", summary.diverted_congestion);
    row("diverted (wind)", summary.diverted_wind);
    row("diverted (storm)", summary.diverted_storm);
    row("diverted (closure)", summary.diverted_closure);
    row("escaped to alternate", summary.diverted_to_alternate);
    row("reinsertions", summary.successful_reinsertions);
    row("mean flight minutes", summary.mean_flight_minutes);
}
