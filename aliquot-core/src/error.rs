use thiserror::Error;

#[derive(Debug, Error)]
pub enum AliquotError {
    #[error("Cannot transfer {required_ul} µL with an effective tip capacity of {capacity_ul} µL")]
    InfeasibleTransfer { required_ul: f64, capacity_ul: f64 },

    #[error("Dilution series must be non-empty, positive, and strictly decreasing")]
    InvalidDilutionSeries,

    #[error("Container '{0}' not found in the declared inventory")]
    ContainerNotFound(String),

    #[error("Liquid level given for container '{0}', which has no level calibration")]
    LevelNotCalibrated(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("An error occurred during logging: {0}")]
    LoggingError(#[from] anyhow::Error),
}
