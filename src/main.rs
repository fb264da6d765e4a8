//! SwarmForge: Customer Segmentation CLI using particle swarm optimization
//! on RFM analysis
//!
//! This is the main entrypoint that orchestrates data loading, swarm
//! optimization, visualization, and prediction.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use swarmforge::{load_records, report, Args, ParticleSwarm, Swarm};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    if args.verbose {
        println!("SwarmForge - Customer Segmentation using Particle Swarm Optimization");
        println!("====================================================================\n");
    }

    // Check if in prediction mode
    if let Some(rfm_values) = args.parse_rfm_values()? {
        run_prediction_mode(&args, rfm_values)?;
    } else {
        run_full_pipeline(&args)?;
    }

    Ok(())
}

fn build_optimizer(args: &Args) -> ParticleSwarm {
    let mut pso = ParticleSwarm::new(args.clusters)
        .with_particles(args.particles)
        .with_iterations(args.iterations);
    if let Some(seed) = args.seed {
        pso = pso.with_seed(seed);
    }
    pso
}

fn fit_swarm(args: &Args) -> Result<(Vec<swarmforge::RfmRecord>, Swarm)> {
    if args.verbose {
        println!("\nLoading training data from: {}", args.input);
    }
    let customers = load_records(&args.input, None)?;

    if args.verbose {
        println!("Loaded {} customers", customers.len());
        println!(
            "\nRunning swarm: {} particles, {} clusters, {} iterations",
            args.particles, args.clusters, args.iterations
        );
        match args.seed {
            Some(seed) => println!("  Seed: {}", seed),
            None => println!("  Seed: entropy"),
        }
    }

    let swarm = build_optimizer(args).optimize(&customers)?;
    Ok((customers, swarm))
}

/// Run prediction mode for a single customer
fn run_prediction_mode(args: &Args, rfm_values: (f64, f64, f64)) -> Result<()> {
    println!("=== Prediction Mode ===");
    println!(
        "Input RFM values: R={}, F={}, M={}",
        rfm_values.0, rfm_values.1, rfm_values.2
    );

    let start_time = Instant::now();

    let (customers, swarm) = fit_swarm(args)?;

    // Assign the new values to the nearest global-best center
    let cluster = swarm.assign([rfm_values.0, rfm_values.1, rfm_values.2]);

    let elapsed = start_time.elapsed();

    println!("\n✓ Predicted Cluster: {}", cluster);
    println!("  Processing time: {:.2}s", elapsed.as_secs_f64());

    // Show cluster context
    let cluster_sizes = swarm.cluster_sizes(&customers);
    let total_customers = customers.len();
    let cluster_percentage = (cluster_sizes[cluster] as f64 / total_customers as f64) * 100.0;

    println!("\nCluster {} details:", cluster);
    println!(
        "  Size: {} customers ({:.1}% of total)",
        cluster_sizes[cluster], cluster_percentage
    );
    let center = &swarm.best_centers()[cluster];
    println!(
        "  Center: R={:.2}, F={:.2}, M={:.2}",
        center.recency, center.frequency, center.monetary
    );

    Ok(())
}

/// Run full clustering pipeline
fn run_full_pipeline(args: &Args) -> Result<()> {
    println!("=== Full Clustering Pipeline ===\n");

    let start_time = Instant::now();

    // Step 1: Load and process data
    if args.verbose {
        println!("Step 1: Loading and processing data");
        println!("  Input file: {}", args.input);
    }

    let data_start = Instant::now();
    let customers = load_records(&args.input, None)?;
    let data_time = data_start.elapsed();

    println!("✓ Data loaded: {} customers", customers.len());
    if args.verbose {
        println!("  Processing time: {:.2}s", data_time.as_secs_f64());
    }

    // Step 2: Run the swarm
    if args.verbose {
        println!("\nStep 2: Running particle swarm optimization");
        println!("  Number of clusters: {}", args.clusters);
        println!("  Number of particles: {}", args.particles);
        println!("  Iterations: {}", args.iterations);
        match args.seed {
            Some(seed) => println!("  Seed: {}", seed),
            None => println!("  Seed: entropy"),
        }
    }

    let swarm_start = Instant::now();
    let swarm = build_optimizer(args).optimize(&customers)?;
    let swarm_time = swarm_start.elapsed();

    println!("✓ Swarm converged");
    if args.verbose {
        println!("  Optimization time: {:.2}s", swarm_time.as_secs_f64());
        println!("  Global best fitness: {:.2}", swarm.best_fitness);
    }

    // Step 3: Statistics and visualization
    if args.verbose {
        println!("\nStep 3: Generating report");
        println!("  Output file: {}", args.output);
    }

    let report_start = Instant::now();
    report::generate_visualization_report(&customers, &swarm, &args.output)?;
    let report_time = report_start.elapsed();

    println!("\n✓ Visualizations generated");
    if args.verbose {
        println!("  Report time: {:.2}s", report_time.as_secs_f64());
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Main plot saved to: {}", args.output);
    println!(
        "Cluster sizes saved to: {}",
        args.output.replace(".png", "_sizes.png")
    );

    Ok(())
}
