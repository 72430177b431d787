//! Cryostat driver trait and error types.

use crate::hal::types::{ActuatorCommand, SensorReadings};
use std::time::Duration;
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// `cycle` or `shutdown` called before `init`
    #[error("Driver not initialized")]
    NotInitialized,
}

/// Interface to acquisition and output hardware (or a simulation of it).
///
/// # Lifecycle
///
/// 1. `init()` - once, before the control loop starts
/// 2. `cycle()` - every tick: apply the command, return fresh readings
/// 3. `shutdown()` - once, after the loop ends
pub trait CryoDriver: Send {
    /// Driver identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Driver semantic version.
    fn version(&self) -> &'static str;

    /// Bring up the hardware connection.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Apply `command`, advance by `dt` and return the latest readings.
    ///
    /// Must not block beyond the tick interval.
    fn cycle(&mut self, command: &ActuatorCommand, dt: Duration)
    -> Result<SensorReadings, DriverError>;

    /// De-energise outputs and release the hardware.
    fn shutdown(&mut self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDriver {
        initialized: bool,
    }

    impl CryoDriver for FixedDriver {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self) -> Result<(), DriverError> {
            self.initialized = true;
            Ok(())
        }

        fn cycle(
            &mut self,
            _command: &ActuatorCommand,
            _dt: Duration,
        ) -> Result<SensorReadings, DriverError> {
            if !self.initialized {
                return Err(DriverError::NotInitialized);
            }
            Ok(SensorReadings {
                temperature_k: 295.0,
                current_a: 1.0,
                line_voltage_v: 115.0,
            })
        }

        fn shutdown(&mut self) -> Result<(), DriverError> {
            self.initialized = false;
            Ok(())
        }
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::InitFailed("port busy".to_string());
        assert!(err.to_string().contains("port busy"));
    }

    #[test]
    fn test_driver_lifecycle() {
        let mut driver = FixedDriver { initialized: false };
        let cmd = ActuatorCommand::default();
        assert!(matches!(
            driver.cycle(&cmd, Duration::from_millis(200)),
            Err(DriverError::NotInitialized)
        ));
        driver.init().unwrap();
        let readings = driver.cycle(&cmd, Duration::from_millis(200)).unwrap();
        assert_eq!(readings.temperature_k, 295.0);
        driver.shutdown().unwrap();
        assert_eq!(driver.name(), "fixed");
    }
}
