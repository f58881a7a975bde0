use embedded_hal::digital::{InputPin, OutputPin};

/// Data (DIO) pin of the bus.
///
/// The controller acknowledges each byte by pulling the data line low, so the
/// driver has to release the line for one clock and read it back. HALs that
/// model direction in the type system can implement this on a flex/open-drain
/// pin wrapper.
pub trait DataPin: OutputPin + InputPin {
    /// Stop driving the line so the controller can pull it low.
    fn set_as_input(&mut self) -> Result<(), Self::Error>;

    /// Drive the line again.
    fn set_as_output(&mut self) -> Result<(), Self::Error>;
}
