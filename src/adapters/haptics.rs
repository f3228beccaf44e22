use crate::domain::ports::Haptics;
use crate::utils::error::Result;

/// For hosts without a vibration motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn impact(&self) -> Result<()> {
        tracing::trace!("Haptic pulse skipped");
        Ok(())
    }
}
