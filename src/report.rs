//! Reporting functions using Plotters for the final swarm state

use plotters::prelude::*;

use crate::data::RfmRecord;
use crate::swarm::Swarm;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, YELLOW, MAGENTA];

fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS.get(cluster).copied().unwrap_or(BLACK)
}

/// Create scatter plot visualization of the segmentation
///
/// Customers are plotted as frequency vs monetary, colored by their nearest
/// global-best center; the centers themselves are overplotted as squares.
///
/// # Arguments
/// * `customers` - RFM records in raw feature space
/// * `swarm` - Final swarm state after optimization
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_cluster_visualization(
    customers: &[RfmRecord],
    swarm: &Swarm,
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title =
        plot_title.unwrap_or("Customer Segmentation: Frequency vs Monetary (Colored by Cluster)");

    let labels = swarm.labels(customers);
    let centers = swarm.best_centers();

    // Bounds cover both customers and centers, with proportional padding.
    let frequency_values = customers.iter().map(|c| c.frequency);
    let monetary_values = customers.iter().map(|c| c.monetary);
    let (freq_min, freq_max) = bounds(frequency_values.chain(centers.iter().map(|c| c.frequency)));
    let (mon_min, mon_max) = bounds(monetary_values.chain(centers.iter().map(|c| c.monetary)));

    let freq_pad = ((freq_max - freq_min) * 0.05).max(1.0);
    let mon_pad = ((mon_max - mon_min) * 0.05).max(1.0);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (freq_min - freq_pad)..(freq_max + freq_pad),
            (mon_min - mon_pad)..(mon_max + mon_pad),
        )?;

    chart
        .configure_mesh()
        .x_desc("Frequency")
        .y_desc("Monetary")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    // Plot data points colored by cluster
    for (customer, &cluster) in customers.iter().zip(labels.iter()) {
        let color = cluster_color(cluster);
        chart.draw_series(std::iter::once(Circle::new(
            (customer.frequency, customer.monetary),
            4,
            color.filled(),
        )))?;
    }

    // Plot the global-best centers as larger squares
    let marker_w = freq_pad * 0.4;
    let marker_h = mon_pad * 0.4;
    for (cluster_id, center) in centers.iter().enumerate() {
        let color = cluster_color(cluster_id);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (center.frequency - marker_w, center.monetary - marker_h),
                    (center.frequency + marker_w, center.monetary + marker_h),
                ],
                color.filled(),
            )))?
            .label(format!("Cluster {} Center", cluster_id))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart.configure_series_labels().draw()?;

    root.present()?;
    println!("Cluster visualization saved to: {}", output_path);

    Ok(())
}

/// Create a simple histogram of cluster sizes
pub fn create_cluster_size_chart(
    customers: &[RfmRecord],
    swarm: &Swarm,
    output_path: &str,
) -> crate::Result<()> {
    let cluster_sizes = swarm.cluster_sizes(customers);
    let max_size = *cluster_sizes.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(swarm.n_clusters() as f64), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    // Draw bars for each cluster
    for (cluster_id, &size) in cluster_sizes.iter().enumerate() {
        let color = cluster_color(cluster_id);
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (cluster_id as f64 - 0.4, 0.0),
                (cluster_id as f64 + 0.4, size as f64),
            ],
            color.filled(),
        )))?;
    }

    root.present()?;
    println!("Cluster size chart saved to: {}", output_path);

    Ok(())
}

/// Print swarm and segmentation statistics to console
pub fn print_swarm_statistics(customers: &[RfmRecord], swarm: &Swarm) {
    println!("\n=== Swarm Statistics ===");
    println!("Number of clusters: {}", swarm.n_clusters());
    println!("Number of particles: {}", swarm.particles.len());
    println!("Total customers: {}", customers.len());
    println!("Global best fitness (SSE): {:.2}", swarm.best_fitness);

    let mut best = f64::INFINITY;
    let mut worst = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for particle in &swarm.particles {
        best = best.min(particle.fitness);
        worst = worst.max(particle.fitness);
        sum += particle.fitness;
    }
    let mean = sum / swarm.particles.len() as f64;
    println!(
        "Particle fitness: best {:.2} | mean {:.2} | worst {:.2}",
        best, mean, worst
    );

    // Basic silhouette score on a sample
    let silhouette_score = swarm.silhouette_sample(customers, 100);
    println!("Silhouette score (sample): {:.3}", silhouette_score);

    let cluster_sizes = swarm.cluster_sizes(customers);
    println!("\nCluster sizes:");
    for (i, &size) in cluster_sizes.iter().enumerate() {
        let percentage = (size as f64 / customers.len().max(1) as f64) * 100.0;
        println!("  Cluster {}: {} customers ({:.1}%)", i, size, percentage);
    }

    // Print the global-best centers in raw RFM space
    println!("\nGlobal best centers:");
    println!("  Cluster | Recency | Frequency | Monetary");
    println!("  --------|---------|-----------|----------");
    for (i, center) in swarm.best_centers().iter().enumerate() {
        println!(
            "  {:7} | {:7.2} | {:9.2} | {:8.2}",
            i, center.recency, center.frequency, center.monetary
        );
    }
}

/// Generate a comprehensive visualization report
pub fn generate_visualization_report(
    customers: &[RfmRecord],
    swarm: &Swarm,
    base_output_path: &str,
) -> crate::Result<()> {
    // Main cluster plot
    create_cluster_visualization(customers, swarm, base_output_path, None)?;

    // Cluster size chart
    let size_chart_path = base_output_path.replace(".png", "_sizes.png");
    create_cluster_size_chart(customers, swarm, &size_chart_path)?;

    // Print statistics
    print_swarm_statistics(customers, swarm);

    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::ParticleSwarm;
    use std::path::Path;
    use tempfile::tempdir;

    fn create_test_data() -> (Vec<RfmRecord>, Swarm) {
        let customers = vec![
            RfmRecord { customer_id: "1".into(), recency: 5.0, frequency: 8.0, monetary: 900.0 },
            RfmRecord { customer_id: "2".into(), recency: 40.0, frequency: 3.0, monetary: 250.0 },
            RfmRecord { customer_id: "3".into(), recency: 120.0, frequency: 1.0, monetary: 20.0 },
            RfmRecord { customer_id: "4".into(), recency: 15.0, frequency: 6.0, monetary: 640.0 },
            RfmRecord { customer_id: "5".into(), recency: 90.0, frequency: 2.0, monetary: 75.0 },
            RfmRecord { customer_id: "6".into(), recency: 2.0, frequency: 9.0, monetary: 1100.0 },
        ];

        let swarm = ParticleSwarm::new(3)
            .with_particles(10)
            .with_iterations(20)
            .with_seed(42)
            .optimize(&customers)
            .unwrap();

        (customers, swarm)
    }

    #[test]
    fn test_create_cluster_visualization() {
        let (customers, swarm) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_plot.png");
        let output_str = output_path.to_str().unwrap();

        let result = create_cluster_visualization(&customers, &swarm, output_str, None);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    fn test_create_cluster_size_chart() {
        let (customers, swarm) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_sizes.png");
        let output_str = output_path.to_str().unwrap();

        let result = create_cluster_size_chart(&customers, &swarm, output_str);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    fn test_generate_visualization_report() {
        let (customers, swarm) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_report.png");
        let output_str = output_path.to_str().unwrap();

        let result = generate_visualization_report(&customers, &swarm, output_str);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
        assert!(temp_dir.path().join("test_report_sizes.png").exists());
    }
}
