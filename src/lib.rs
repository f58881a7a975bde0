#![no_std]

mod constants;
mod pins;

pub use constants::*;
pub use pins::DataPin;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use num_traits::ToPrimitive;

/// Driver for a TM1637 wired to a 4-digit display with a colon after the second digit.
///
/// The driver is not thread safe; the two pins and the bus sequence are one
/// resource. Share it behind a mutex if more than one task needs it.
pub struct TM1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
    bit_delay_us: u32,
    powered_on: bool,
    coding: DigitCoding,
    last_ack: bool,
}

impl<CLK, DIO, D, E> TM1637<CLK, DIO, D>
where
    CLK: OutputPin<Error = E>,
    DIO: DataPin<Error = E>,
    D: DelayNs,
{
    /// Takes ownership of the pins. No bus traffic happens until [`open`](Self::open).
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
        Self {
            clk,
            dio,
            delay,
            bit_delay_us: 0,
            powered_on: false,
            coding: DigitCoding::PackedDecimal,
            last_ack: false,
        }
    }

    /// Wait `bit_delay_us` after every pin transition. Zero disables the wait.
    pub fn with_bit_delay_us(mut self, bit_delay_us: u32) -> Self {
        self.bit_delay_us = bit_delay_us;
        self
    }

    pub fn destroy(self) -> (CLK, DIO, D) {
        (self.clk, self.dio, self.delay)
    }

    /// Primes the bus, clears the display and switches it on at `brightness`.
    ///
    /// Both lines are driven high before the data line is switched to output so
    /// the controller never sees a spurious edge.
    pub fn open(&mut self, brightness: u8) -> Result<(), TM1637Error<E>> {
        self.dio.set_high()?;
        self.clk.set_high()?;
        self.dio.set_as_output()?;

        #[cfg(feature = "defmt")]
        defmt::debug!("tm1637: open, brightness {=u8}", brightness);

        self.clear()?;
        self.set_power_state(true)?;
        // brightness only sticks once the display is on
        self.set_brightness(brightness)?;
        Ok(())
    }

    /// Blanks every position and switches the display off.
    pub fn close(&mut self) -> Result<(), TM1637Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("tm1637: close");

        self.clear()?;
        self.set_power_state(false)
    }

    pub fn set_digit_coding(&mut self, coding: DigitCoding) {
        self.coding = coding;
    }

    pub fn digit_coding(&self) -> DigitCoding {
        self.coding
    }

    pub fn is_powered_on(&self) -> bool {
        self.powered_on
    }

    /// Whether the controller acknowledged the most recently transmitted byte.
    pub fn last_ack(&self) -> bool {
        self.last_ack
    }

    /// Shows `value` right aligned on the four digits.
    ///
    /// Negative values get a minus sign left of the most significant digit
    /// when there is room for it. A negative value that fills all four digits
    /// is shown without its sign. `show_colon` lights the colon, which is
    /// wired to the second digit.
    pub fn set_displayed_integer(
        &mut self,
        value: i32,
        show_colon: bool,
    ) -> Result<(), TM1637Error<E>> {
        let magnitude = value.unsigned_abs();
        let last = Position::C4.index();

        if magnitude == 0 {
            self.begin_write(Position::C4)?;
            self.send_data(self.decode_value(0, 0), true)?;
            return Ok(());
        }

        let radix = match self.coding {
            DigitCoding::PackedDecimal => 10,
            DigitCoding::RawByte => 0x100,
        };

        let mut remaining = magnitude;
        let mut digits_sent = 0;
        for i in 0..NUM_DIGITS {
            self.begin_write(Position::from_index(last - i))?;
            let mut segments = self.decode_value(magnitude, i);
            if i == 2 && show_colon {
                segments |= segment::COLON_MASK;
            }
            self.send_data(segments, true)?;

            remaining /= radix;
            if remaining == 0 {
                break;
            }
            digits_sent += 1;
        }

        // digits_sent lags by one once the loop breaks early, so the sign fits
        // after up to three digits and is dropped only when all four are used
        if value < 0 && digits_sent < 3 {
            self.begin_write(Position::from_index(last - (digits_sent + 1)))?;
            self.send_data(segment::MINUS_SIGN, true)?;
        }
        Ok(())
    }

    /// Generic front end to [`set_displayed_integer`](Self::set_displayed_integer).
    pub fn set_displayed_value<T>(&mut self, value: T, show_colon: bool) -> Result<(), TM1637Error<E>>
    where
        T: ToPrimitive,
    {
        let value = value.to_i32().ok_or(TM1637Error::InvalidValue)?;
        self.set_displayed_integer(value, show_colon)
    }

    /// Writes the two hour digits at the left of the display.
    pub fn set_hours(
        &mut self,
        value: u16,
        show_colon: bool,
        prepend_zero: bool,
    ) -> Result<(), TM1637Error<E>> {
        let tens = self.two_digit_tens(value, prepend_zero);
        let mut ones = self.decode_value(value.into(), 0);
        if show_colon {
            ones |= segment::COLON_MASK;
        }

        self.begin_write(Position::C1)?;
        self.send_data(tens, false)?;
        self.send_data(ones, true)?;
        Ok(())
    }

    /// Writes the two minute digits at the right of the display, leaving the hours alone.
    pub fn set_minutes(&mut self, value: u16, prepend_zero: bool) -> Result<(), TM1637Error<E>> {
        let tens = self.two_digit_tens(value, prepend_zero);
        let ones = self.decode_value(value.into(), 0);

        self.begin_write(Position::C3)?;
        self.send_data(tens, false)?;
        self.send_data(ones, true)?;
        Ok(())
    }

    pub fn set_time(
        &mut self,
        hours: u16,
        minutes: u16,
        show_colon: bool,
        prepend_zero: bool,
    ) -> Result<(), TM1637Error<E>> {
        self.set_hours(hours, show_colon, prepend_zero)?;
        self.set_minutes(minutes, prepend_zero)
    }

    /// Lights every segment of every position.
    pub fn test_all_segments(&mut self) -> Result<(), TM1637Error<E>> {
        self.fill(segment::ALL_SEGMENTS)
    }

    pub fn set_blank(&mut self, digit: Digit) -> Result<(), TM1637Error<E>> {
        self.set_segments(digit, segment::BLANK)
    }

    /// Writes a raw segment pattern to one digit.
    pub fn set_segments(&mut self, digit: Digit, segments: u8) -> Result<(), TM1637Error<E>> {
        self.begin_write(digit.into())?;
        self.send_data(segments, true)?;
        Ok(())
    }

    /// Blanks all six display registers.
    pub fn clear(&mut self) -> Result<(), TM1637Error<E>> {
        self.fill(segment::BLANK)
    }

    /// Maps `level` onto the eight hardware steps (`level / 32`).
    ///
    /// The step is combined with the current power state, so while the display
    /// is off the new level is sent with the off command and has no visible
    /// effect until the display is switched on again.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), TM1637Error<E>> {
        let command = u8::from(self.power_command()) | (level / BRIGHTNESS_STEP);

        #[cfg(feature = "defmt")]
        defmt::debug!("tm1637: brightness {=u8} -> {=u8:#x}", level, command);

        self.send_command(DataCommand::WriteData.into(), true)?;
        self.send_command(command, true)?;
        Ok(())
    }

    pub fn set_power_state(&mut self, on: bool) -> Result<(), TM1637Error<E>> {
        self.powered_on = on;

        #[cfg(feature = "defmt")]
        defmt::debug!("tm1637: power {=bool}", on);

        self.send_command(DataCommand::WriteData.into(), true)?;
        self.send_command(self.power_command().into(), true)?;
        Ok(())
    }

    /// Segment pattern for digit `digit` (0 = rightmost) of `value` under the current coding.
    pub fn decode_value(&self, value: u32, digit: u8) -> u8 {
        decode_digit(self.coding, value, digit)
    }

    /// START, one byte, and optionally STOP. Returns whether the byte was acknowledged.
    pub fn send_command(&mut self, command: u8, append_stop: bool) -> Result<bool, TM1637Error<E>> {
        self.send_start()?;
        self.send_data(command, append_stop)
    }

    /// One byte on an already started frame, optionally closing it with STOP.
    pub fn send_data(&mut self, data: u8, append_stop: bool) -> Result<bool, TM1637Error<E>> {
        let ack = self.transmit_byte(data)?;
        if append_stop {
            self.send_stop()?;
        }
        Ok(ack)
    }

    /// Clocks out `value` LSB first and samples the acknowledgement.
    ///
    /// A missing acknowledgement is reported as `Ok(false)`, only pin failures are errors.
    pub fn transmit_byte(&mut self, value: u8) -> Result<bool, TM1637Error<E>> {
        for bit in 0..8 {
            self.clk_low()?;
            self.dio_level(value & (1 << bit) != 0)?;
            self.clk_high()?;
        }

        let ack = self.read_ack()?;
        self.last_ack = ack;

        #[cfg(feature = "defmt")]
        {
            if ack {
                defmt::trace!("tm1637: sent {=u8:#x}", value);
            } else {
                defmt::warn!("tm1637: no ack for {=u8:#x}", value);
            }
        }

        Ok(ack)
    }

    /// Data falls while the clock is high.
    pub fn send_start(&mut self) -> Result<(), TM1637Error<E>> {
        self.dio_level(false)?;
        self.clk_high()
    }

    /// Data rises while the clock is high.
    pub fn send_stop(&mut self) -> Result<(), TM1637Error<E>> {
        self.dio_level(false)?;
        self.clk_high()?;
        self.dio_level(true)
    }

    /// Selects auto-increment writes and addresses `position`, leaving the frame open
    /// for the digit bytes.
    pub fn begin_write(&mut self, position: Position) -> Result<bool, TM1637Error<E>> {
        self.send_command(DataCommand::WriteData.into(), true)?;
        self.send_command(position.into(), false)
    }

    fn fill(&mut self, segments: u8) -> Result<(), TM1637Error<E>> {
        self.begin_write(Position::C1)?;
        for _ in 1..NUM_POSITIONS {
            self.send_data(segments, false)?;
        }
        self.send_data(segments, true)?;
        Ok(())
    }

    fn two_digit_tens(&self, value: u16, prepend_zero: bool) -> u8 {
        let tens = self.decode_value(value.into(), 1);
        if tens == segment::BLANK && prepend_zero {
            self.decode_value(0, 0)
        } else {
            tens
        }
    }

    fn power_command(&self) -> ControlCommand {
        if self.powered_on {
            ControlCommand::DisplayOn
        } else {
            ControlCommand::DisplayOff
        }
    }

    // the line reads low when the controller acknowledges
    fn read_ack(&mut self) -> Result<bool, TM1637Error<E>> {
        self.clk_low()?;
        self.dio.set_as_input()?;
        self.wait();
        self.clk_high()?;
        let released = self.dio.is_high()?;
        self.clk_low()?;
        self.dio_level(true)?;
        self.dio.set_as_output()?;
        self.wait();
        Ok(!released)
    }

    fn dio_level(&mut self, high: bool) -> Result<(), TM1637Error<E>> {
        if high {
            self.dio.set_high()?;
        } else {
            self.dio.set_low()?;
        }
        self.wait();
        Ok(())
    }

    fn clk_low(&mut self) -> Result<(), TM1637Error<E>> {
        self.clk.set_low()?;
        self.wait();
        Ok(())
    }

    fn clk_high(&mut self) -> Result<(), TM1637Error<E>> {
        self.clk.set_high()?;
        self.wait();
        Ok(())
    }

    fn wait(&mut self) {
        if self.bit_delay_us > 0 {
            self.delay.delay_us(self.bit_delay_us);
        }
    }
}

/// Segment pattern for digit `digit` (0 = rightmost, clamped to 3) of `value`.
///
/// In packed decimal coding a zero value always decodes to the `0` glyph and a
/// digit beyond the most significant one decodes to blank. In raw byte coding
/// the selected byte of `value` is returned as is.
pub fn decode_digit(coding: DigitCoding, value: u32, digit: u8) -> u8 {
    let digit = digit.min(NUM_DIGITS - 1);

    match coding {
        DigitCoding::PackedDecimal => {
            if value == 0 {
                return DIGITS_FONT[0];
            }
            let mut remaining = value;
            let mut current = 0;
            for _ in 0..=digit {
                if remaining == 0 {
                    return segment::BLANK;
                }
                current = remaining % 10;
                remaining /= 10;
            }
            DIGITS_FONT[current as usize]
        }
        DigitCoding::RawByte => (value >> (8 * u32::from(digit))) as u8,
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TM1637Error<E> {
    PinError(E),
    InvalidValue,
}

impl<E> From<E> for TM1637Error<E> {
    fn from(error: E) -> Self {
        TM1637Error::PinError(error)
    }
}
