//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Customer segmentation CLI using particle swarm optimization on RFM data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Number of cluster centers per particle
    #[arg(short = 'k', long, default_value = "3")]
    pub clusters: usize,

    /// Number of particles in the swarm
    #[arg(short, long, default_value = "30")]
    pub particles: usize,

    /// Number of optimization iterations
    #[arg(short = 'n', long, default_value = "100")]
    pub iterations: usize,

    /// Random seed for reproducible runs (entropy-seeded when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output path for the visualization plot
    #[arg(short, long, default_value = "cluster_plot.png")]
    pub output: String,

    /// Prediction mode: provide R,F,M values as comma-separated string
    /// Example: --predict "30,10,500.0" for Recency=30, Frequency=10, Monetary=500.0
    #[arg(long)]
    pub predict: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse RFM values from the predict string
    /// Expected format: "recency,frequency,monetary"
    pub fn parse_rfm_values(&self) -> crate::Result<Option<(f64, f64, f64)>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let parts: Vec<&str> = predict_str.split(',').collect();
        if parts.len() != 3 {
            anyhow::bail!("Predict values must be in format 'recency,frequency,monetary'");
        }

        let recency: f64 = parts[0]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid recency value: {}", parts[0]))?;
        let frequency: f64 = parts[1]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid frequency value: {}", parts[1]))?;
        let monetary: f64 = parts[2]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid monetary value: {}", parts[2]))?;

        Ok(Some((recency, frequency, monetary)))
    }
}
