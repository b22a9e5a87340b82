//! In-memory Axial HAL
//!
//! Simulated stepper, digital and bridge channels for host tests. Each
//! channel shares its state with a [`SimProbe`] that plays the part of the
//! physical world: plugging and unplugging devices, flipping switches,
//! finishing moves, loading bridges and raising hardware errors. Events are published into the same
//! [`EventQueue`](axial_hal::EventQueue) a real binding would use.
//!
//! ```ignore
//! let queue = EventQueue::new();
//! let stepper = SimStepper::new(ChannelHandle(1), &queue, device(100, 0, 0, false));
//! let probe = stepper.probe();
//! // hand `stepper` to the driver, keep `probe` to drive the world
//! ```

mod digital;
mod port;
mod stepper;
mod voltage_ratio;

pub use digital::{InputModel, OutputModel, SimDigitalInput, SimDigitalOutput};
pub use port::{SimChannel, SimModel, SimProbe};
pub use stepper::{SimStepper, StepperCommand, StepperModel};
pub use voltage_ratio::{SimVoltageRatioInput, VoltageRatioModel};

use axial_hal::{AttachedDevice, Bounds, ChannelError};

/// Error code reported for out-of-range arguments
pub const INVALID_ARGUMENT: i32 = 0x15;

/// Identity a simulated device reports on attach
pub fn device(
    serial_number: i32,
    hub_port: u8,
    channel: u8,
    is_hub_port_device: bool,
) -> AttachedDevice {
    AttachedDevice {
        serial_number,
        label: None,
        channel,
        hub_port,
        is_hub_port_device,
    }
}

/// Reject values outside the hardware range
pub(crate) fn check<T: PartialOrd + Copy>(bounds: Bounds<T>, value: T) -> Result<(), ChannelError> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(ChannelError::Hardware {
            code: INVALID_ARGUMENT,
        })
    }
}
