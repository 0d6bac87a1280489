/// Reporting and output formatting module
/// Handles all console output; the simulation core never calls into it

use tail_risk_sim::{
    CltRecord, ConvergenceRecord, KsOutcome, MonitoringRecord, SampleStats, SimulationConfig,
    StopReason, TestStatisticRecord,
};

/// Display the simulation setup
pub fn display_header(config: &SimulationConfig, seed: u64) {
    println!("╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║              TAIL PERCENTILE OF OVERLAPPING N-DAY RETURNS                    ║");
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");

    let p = &config.params;
    println!(
        "1-day returns: stable(alpha={}, beta={}, scale={}, location={})",
        p.alpha(),
        p.beta(),
        p.scale(),
        p.location()
    );
    println!(
        "Observations: {} | Window: {} days | Quantile: {:.4} | Seed: {}\n",
        config.num_observations, config.ndays, config.quantile, seed
    );
}

/// Display summary statistics of a percentile sample
pub fn display_sample_stats(title: &str, stats: &SampleStats) {
    println!("=== {} ({} values) ===", title, stats.count);
    println!("  Mean:             {:.4} ± {:.4} (std dev)", stats.mean, stats.std_dev);
    println!("  Minimum:          {:.4}", stats.min);
    println!("  5th Percentile:   {:.4}", stats.percentile_5);
    println!("  25th Percentile:  {:.4}", stats.percentile_25);
    println!("  Median (50th):    {:.4}", stats.percentile_50);
    println!("  75th Percentile:  {:.4}", stats.percentile_75);
    println!("  95th Percentile:  {:.4}", stats.percentile_95);
    println!("  Maximum:          {:.4}\n", stats.max);
}

pub fn display_record(record: &ConvergenceRecord) {
    println!("\n╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                  MONTE CARLO TRIAL SUFFICIENCY: {:<29}║", record.method().to_string());
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");

    match record {
        ConvergenceRecord::Clt(clt) => display_clt(clt),
        ConvergenceRecord::Monitoring(trace) => display_monitoring(trace),
        ConvergenceRecord::TestStatistic(result) => display_test_statistic(result),
    }
}

fn display_clt(record: &CltRecord) {
    println!(
        "{} samples of {} trials each",
        record.means.len(),
        record.trials_per_sample
    );
    for (i, (mean, std_dev)) in record.means.iter().zip(&record.std_devs).enumerate() {
        println!("  Sample {:>4}: mean {:>14.4}  std {:>14.4}", i + 1, mean, std_dev);
    }

    match record.normality() {
        Ok(KsOutcome { statistic, p_value }) => println!(
            "\nNormality of sample means (KS): statistic {:.4}, p-value {:.4}",
            statistic, p_value
        ),
        Err(e) => println!("\nNormality of sample means not available: {}", e),
    }
}

fn display_monitoring(record: &MonitoringRecord) {
    let total = record.running_means.len();
    let step = (total / 20).max(1);

    println!("Running mean of the percentile ({} trials):", total);
    for (trial, mean) in record.trial_axis().zip(&record.running_means) {
        if trial % step == 0 || trial == total {
            println!("  Trial {:>7}: {:.4}", trial, mean);
        }
    }
}

fn display_test_statistic(record: &TestStatisticRecord) {
    println!("{:>10} {:>12} {:>12}", "Trials", "Statistic", "P-value");
    for checkpoint in &record.checkpoints {
        println!(
            "{:>10} {:>12.6} {:>12.6}",
            checkpoint.trials, checkpoint.statistic, checkpoint.p_value
        );
    }

    let verdict = match record.stop_reason {
        StopReason::Converged => "converged",
        StopReason::CapReached => "did not converge (trial cap reached)",
        StopReason::Cancelled => "cancelled",
    };
    println!(
        "\nResult: {} after {} trials per sample ({} percentiles kept)",
        verdict,
        record.trials,
        record.percentiles.len()
    );
}
