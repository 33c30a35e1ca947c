//! Observability metrics for session operations
//!
//! Each session keeps a snapshot of its most recent operation. Metrics carry
//! sizes and timings only, never key material or payload bytes.

use serde::{Deserialize, Serialize};

/// Kind of operation a metrics snapshot describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AesEncrypt,
    AesDecrypt,
    RsaEncrypt,
    RsaDecrypt,
    GcmEncrypt,
    GcmDecrypt,
    KeyGenerate,
    KeyRemove,
    KeySet,
}

impl OperationKind {
    /// Whether the operation runs AES rounds (and may use AES-NI / ARMv8 AES)
    pub fn uses_aes(self) -> bool {
        matches!(
            self,
            OperationKind::AesEncrypt
                | OperationKind::AesDecrypt
                | OperationKind::GcmEncrypt
                | OperationKind::GcmDecrypt
        )
    }
}

/// Operation metrics for visibility into session performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMetrics {
    /// Operation measured (None before the first call)
    pub operation: Option<OperationKind>,

    /// Wall time of the operation in microseconds
    pub duration_micros: u64,

    /// Bytes consumed
    pub input_bytes: usize,

    /// Bytes produced (0 on failure)
    pub output_bytes: usize,

    /// Whether the operation succeeded
    pub succeeded: bool,

    /// Whether hardware AES was available for the operation
    pub hardware_accelerated: bool,
}

impl OperationMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        OperationMetrics {
            operation: None,
            duration_micros: 0,
            input_bytes: 0,
            output_bytes: 0,
            succeeded: false,
            hardware_accelerated: false,
        }
    }

    /// Set the operation and its duration
    pub fn with_operation(mut self, kind: OperationKind, time_micros: u64, hw_accel: bool) -> Self {
        self.operation = Some(kind);
        self.duration_micros = time_micros;
        self.hardware_accelerated = hw_accel && kind.uses_aes();
        self
    }

    /// Set input/output sizes
    pub fn with_sizes(mut self, input_bytes: usize, output_bytes: usize) -> Self {
        self.input_bytes = input_bytes;
        self.output_bytes = output_bytes;
        self
    }

    /// Record the outcome
    pub fn with_outcome(mut self, succeeded: bool) -> Self {
        self.succeeded = succeeded;
        if !succeeded {
            self.output_bytes = 0;
        }
        self
    }

    /// Input throughput in bytes per second (None for instantaneous operations)
    pub fn throughput_bytes_per_sec(&self) -> Option<f64> {
        if self.duration_micros == 0 {
            return None;
        }
        Some(self.input_bytes as f64 * 1_000_000.0 / self.duration_micros as f64)
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = OperationMetrics::new();
        assert_eq!(metrics.operation, None);
        assert_eq!(metrics.duration_micros, 0);
        assert!(!metrics.succeeded);
    }

    #[test]
    fn test_builder_chain() {
        let metrics = OperationMetrics::new()
            .with_operation(OperationKind::AesEncrypt, 100, true)
            .with_sizes(1000, 1008)
            .with_outcome(true);

        assert_eq!(metrics.operation, Some(OperationKind::AesEncrypt));
        assert_eq!(metrics.output_bytes, 1008);
        assert!(metrics.hardware_accelerated);
        assert!((metrics.throughput_bytes_per_sec().unwrap() - 10_000_000.0).abs() < 0.01);
    }

    #[test]
    fn test_rsa_never_reports_hardware_aes() {
        let metrics = OperationMetrics::new().with_operation(OperationKind::RsaDecrypt, 5, true);
        assert!(!metrics.hardware_accelerated);
    }

    #[test]
    fn test_failure_clears_output_size() {
        let metrics = OperationMetrics::new()
            .with_operation(OperationKind::GcmDecrypt, 7, false)
            .with_sizes(64, 48)
            .with_outcome(false);
        assert_eq!(metrics.output_bytes, 0);
        assert_eq!(metrics.input_bytes, 64);
    }

    #[test]
    fn test_serializes_with_snake_case_kind() {
        let metrics = OperationMetrics::new().with_operation(OperationKind::KeyGenerate, 1, false);
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"key_generate\""));
    }
}
