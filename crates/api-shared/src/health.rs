use crate::HealthRes;

/// Simple health service shared by the REST server binaries.
///
/// Reports liveness only; it does not touch the patient data file.
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "PMS is alive".into(),
        }
    }
}
