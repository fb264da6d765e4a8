//! Particle swarm optimization engine for RFM clustering

use crate::data::RfmRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inertia weight applied to the previous velocity
pub const INERTIA_WEIGHT: f64 = 0.5;
/// Weight of the pull toward a particle's own best position
pub const COGNITIVE_COMPONENT: f64 = 1.5;
/// Weight of the pull toward the swarm's best position
pub const SOCIAL_COMPONENT: f64 = 1.5;

// Upper bounds of the uniform initialization ranges for each RFM dimension.
const RECENCY_SPAN: f64 = 100.0;
const FREQUENCY_SPAN: f64 = 10.0;
const MONETARY_SPAN: f64 = 1000.0;

/// A candidate cluster centroid in RFM space
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCenter {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
}

/// A candidate solution: one full set of cluster centers plus its
/// search velocity and best-found history
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current cluster centers
    pub position: Vec<ClusterCenter>,
    /// Best cluster centers this particle has visited (owned copy,
    /// never an alias of `position`)
    pub best_position: Vec<ClusterCenter>,
    /// One velocity scalar per cluster slot
    pub velocity: Vec<f64>,
    /// Objective value of `position` at its latest evaluation
    pub fitness: f64,
}

/// Particle swarm optimizer configuration.
///
/// # Algorithm
///
/// 1. Initialize particles with uniform random centers and velocities
/// 2. Each iteration, for each particle in order:
///    velocity/position update → fitness → personal best → global best
/// 3. Repeat for the fixed iteration count (no early exit)
///
/// A particle crowned global best mid-sweep steers the remaining particles
/// of that same sweep.
///
/// # Examples
///
/// ```
/// use swarmforge::{ParticleSwarm, RfmRecord};
///
/// let customers = vec![
///     RfmRecord { customer_id: "17850".into(), recency: 10.0, frequency: 2.0, monetary: 50.0 },
///     RfmRecord { customer_id: "13047".into(), recency: 80.0, frequency: 1.0, monetary: 900.0 },
/// ];
///
/// let pso = ParticleSwarm::new(2).with_iterations(20).with_seed(42);
/// let swarm = pso.optimize(&customers).expect("valid configuration");
/// assert!(swarm.best_fitness >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ParticleSwarm {
    /// Number of cluster centers per particle.
    n_clusters: usize,
    /// Swarm size.
    n_particles: usize,
    /// Fixed iteration count.
    n_iterations: usize,
    inertia_weight: f64,
    cognitive: f64,
    social: f64,
    /// Random seed; entropy-seeded when absent.
    seed: Option<u64>,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ParticleSwarm {
    /// Create an optimizer searching for `n_clusters` centers with the
    /// default swarm size (30) and iteration count (100).
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_particles: 30,
            n_iterations: 100,
            inertia_weight: INERTIA_WEIGHT,
            cognitive: COGNITIVE_COMPONENT,
            social: SOCIAL_COMPONENT,
            seed: None,
        }
    }

    /// Set the swarm size.
    #[must_use]
    pub fn with_particles(mut self, n_particles: usize) -> Self {
        self.n_particles = n_particles;
        self
    }

    /// Set the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Set the inertia, cognitive and social coefficients.
    #[must_use]
    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia_weight = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Set the random seed for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the swarm against a fixed customer population.
    ///
    /// The population is read-only for the whole run. An empty population is
    /// allowed (every fitness evaluates to zero); a zero cluster count or an
    /// empty swarm is rejected up front.
    pub fn optimize(&self, customers: &[RfmRecord]) -> crate::Result<Swarm> {
        if self.n_clusters == 0 {
            anyhow::bail!("number of clusters must be at least 1");
        }
        if self.n_particles == 0 {
            anyhow::bail!("swarm must contain at least one particle");
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut particles = self.spawn_particles(&mut rng);

        // The first particle seeds the global best with its starting position.
        let mut best_index = 0;
        particles[0].fitness = evaluate_fitness(&particles[0].position, customers);
        let mut best_fitness = particles[0].fitness;

        for _ in 0..self.n_iterations {
            for idx in 0..particles.len() {
                // Leader recency values read through the handle at update
                // time, so a best replaced earlier in this sweep is already
                // visible here.
                let leader: Vec<f64> = particles[best_index]
                    .position
                    .iter()
                    .map(|center| center.recency)
                    .collect();

                let particle = &mut particles[idx];
                self.advance(particle, &leader, &mut rng);

                particle.fitness = evaluate_fitness(&particle.position, customers);

                if particle.fitness < evaluate_fitness(&particle.best_position, customers) {
                    particle.best_position = particle.position.clone();
                }

                if particle.fitness < best_fitness {
                    best_index = idx;
                    best_fitness = particle.fitness;
                }
            }
        }

        Ok(Swarm {
            particles,
            best_index,
            best_fitness,
        })
    }

    fn spawn_particles(&self, rng: &mut StdRng) -> Vec<Particle> {
        (0..self.n_particles)
            .map(|_| {
                let mut position = Vec::with_capacity(self.n_clusters);
                let mut velocity = Vec::with_capacity(self.n_clusters);
                for _ in 0..self.n_clusters {
                    position.push(ClusterCenter {
                        recency: rng.gen::<f64>() * RECENCY_SPAN,
                        frequency: rng.gen::<f64>() * FREQUENCY_SPAN,
                        monetary: rng.gen::<f64>() * MONETARY_SPAN,
                    });
                    velocity.push(rng.gen::<f64>());
                }
                Particle {
                    best_position: position.clone(),
                    position,
                    velocity,
                    fitness: 0.0,
                }
            })
            .collect()
    }

    /// Advance one particle by one velocity/position step.
    ///
    /// The velocity moves the recency coordinate only; frequency and
    /// monetary of every center keep their initialized values for the
    /// entire run.
    fn advance(&self, particle: &mut Particle, leader: &[f64], rng: &mut StdRng) {
        let slots = particle
            .velocity
            .len()
            .min(particle.position.len())
            .min(leader.len());

        for slot in 0..slots {
            let r1 = rng.gen::<f64>();
            let r2 = rng.gen::<f64>();

            let cognitive = self.cognitive
                * r1
                * (particle.best_position[slot].recency - particle.position[slot].recency);
            let social = self.social * r2 * (leader[slot] - particle.position[slot].recency);

            particle.velocity[slot] =
                self.inertia_weight * particle.velocity[slot] + cognitive + social;
            particle.position[slot].recency += particle.velocity[slot];
        }
    }
}

/// Final swarm state: every particle with its last fitness, plus the
/// global-best handle into the particle vector.
#[derive(Debug)]
pub struct Swarm {
    /// All particles after the final iteration
    pub particles: Vec<Particle>,
    /// Index of the particle that last improved the global best
    pub best_index: usize,
    /// Fitness recorded when the global best was last replaced
    pub best_fitness: f64,
}

impl Swarm {
    /// The global-best particle.
    pub fn best(&self) -> &Particle {
        &self.particles[self.best_index]
    }

    /// Cluster centers of the global-best particle.
    pub fn best_centers(&self) -> &[ClusterCenter] {
        &self.best().position
    }

    /// Number of clusters per particle.
    pub fn n_clusters(&self) -> usize {
        self.best_centers().len()
    }

    /// Assign an RFM triple `[recency, frequency, monetary]` to the nearest
    /// global-best center. Ties go to the lower cluster index.
    pub fn assign(&self, rfm: [f64; 3]) -> usize {
        let mut min_distance = f64::MAX;
        let mut closest_cluster = 0;

        for (cluster_idx, center) in self.best_centers().iter().enumerate() {
            let distance = (rfm[0] - center.recency).powi(2)
                + (rfm[1] - center.frequency).powi(2)
                + (rfm[2] - center.monetary).powi(2);
            if distance < min_distance {
                min_distance = distance;
                closest_cluster = cluster_idx;
            }
        }

        closest_cluster
    }

    /// Cluster assignment for every customer.
    pub fn labels(&self, customers: &[RfmRecord]) -> Vec<usize> {
        customers
            .iter()
            .map(|c| self.assign([c.recency, c.frequency, c.monetary]))
            .collect()
    }

    /// Number of customers assigned to each cluster.
    pub fn cluster_sizes(&self, customers: &[RfmRecord]) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for label in self.labels(customers) {
            sizes[label] += 1;
        }
        sizes
    }

    /// Compute basic silhouette coefficient for a subset of customers (for efficiency)
    pub fn silhouette_sample(&self, customers: &[RfmRecord], sample_size: usize) -> f64 {
        let n_samples = customers.len().min(sample_size);
        if n_samples < 2 {
            return 0.0;
        }

        let k = self.n_clusters();
        let labels: Vec<usize> = customers
            .iter()
            .take(n_samples)
            .map(|c| self.assign([c.recency, c.frequency, c.monetary]))
            .collect();

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let own_label = labels[i];

            // a(i): mean distance to customers in the same cluster
            let mut same_cluster_distances = Vec::new();
            let mut other_cluster_distances: Vec<Vec<f64>> = vec![Vec::new(); k];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }

                let distance = customer_distance(&customers[i], &customers[j]);
                if labels[j] == own_label {
                    same_cluster_distances.push(distance);
                } else {
                    other_cluster_distances[labels[j]].push(distance);
                }
            }

            let a_i = if same_cluster_distances.is_empty() {
                0.0
            } else {
                same_cluster_distances.iter().sum::<f64>() / same_cluster_distances.len() as f64
            };

            // b(i): min mean distance to customers in other clusters
            let b_i = other_cluster_distances
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

/// Score a set of cluster centers against the customer population.
///
/// Returns the sum over all customers of the squared Euclidean distance (in
/// raw, unweighted RFM space) to their nearest center. Lower is better. An
/// empty population scores 0; callers must supply at least one center.
pub fn evaluate_fitness(centers: &[ClusterCenter], customers: &[RfmRecord]) -> f64 {
    let mut fitness = 0.0;

    for customer in customers {
        let mut min_distance = f64::MAX;

        for center in centers {
            let distance = (customer.recency - center.recency).powi(2)
                + (customer.frequency - center.frequency).powi(2)
                + (customer.monetary - center.monetary).powi(2);

            if distance < min_distance {
                min_distance = distance;
            }
        }

        fitness += min_distance;
    }

    fitness
}

/// Euclidean distance between two customers in raw RFM space
fn customer_distance(a: &RfmRecord, b: &RfmRecord) -> f64 {
    ((a.recency - b.recency).powi(2)
        + (a.frequency - b.frequency).powi(2)
        + (a.monetary - b.monetary).powi(2))
    .sqrt()
}
