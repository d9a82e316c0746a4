use crate::graph::GraphError;

/// Tunables shared by the distance orchestrators.
#[derive(Debug, Clone)]
pub struct DistanceConfig {
    /// Worker threads per block.
    pub n_threads: usize,
    /// Search jobs processed per block; threads are joined between blocks.
    pub block_size: usize,
    /// Search cutoff. Unreached targets are reported as exactly this value.
    pub max_distance: f64,
    /// Single genome graphs constructed and held in memory at once.
    pub n_sggs_in_memory: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            n_threads: 1,
            block_size: 50000,
            max_distance: f64::MAX,
            n_sggs_in_memory: 1,
        }
    }
}

impl DistanceConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.n_threads == 0 {
            return Err(GraphError::InvalidConfig("thread count must be at least 1".to_string()));
        }
        if self.block_size == 0 {
            return Err(GraphError::InvalidConfig("block size must be at least 1".to_string()));
        }
        if self.n_sggs_in_memory == 0 {
            return Err(GraphError::InvalidConfig(
                "number of single genome graphs in memory must be at least 1".to_string(),
            ));
        }
        if self.max_distance.is_nan() || self.max_distance <= 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "max distance must be positive, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }
}
