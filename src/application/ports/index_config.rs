use super::DistanceMetric;

/// Where a serverless index is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSpec {
    pub cloud: String,
    pub region: String,
}

impl Default for CloudSpec {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub dimension: u64,
    pub distance_metric: DistanceMetric,
    pub cloud: CloudSpec,
}

impl IndexConfig {
    pub fn new(dimension: u64, cloud: CloudSpec) -> Self {
        Self {
            dimension,
            distance_metric: DistanceMetric::Cosine,
            cloud,
        }
    }
}
