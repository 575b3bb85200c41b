// Serial transport
//
// u-blox 8 UART defaults are 9600 baud 8-N-1 with no flow control; USB CDC
// ports ignore the baud rate.

use anyhow::{Context, Result};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::info;

/// Open `device` for UBX traffic
pub fn open(device: &str, baud: u32) -> Result<SerialStream> {
    let stream = tokio_serial::new(device, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .with_context(|| format!("Failed to open serial device {} at {} baud", device, baud))?;

    info!(device = %device, baud = baud, "Serial port opened");
    Ok(stream)
}
