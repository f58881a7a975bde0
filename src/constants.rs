pub const NUM_DIGITS: u8 = 4;
pub const NUM_POSITIONS: u8 = 6;
pub const MAX_BRIGHTNESS: u8 = 0xFF;
pub const BRIGHTNESS_STEP: u8 = 0x20; // 256 input levels / 8 hardware steps
pub const DIGITS_FONT: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

pub mod segment {
    pub const BLANK: u8 = 0x00;
    pub const MINUS_SIGN: u8 = 0x40; // segment g
    pub const COLON_MASK: u8 = 0x80; // bit 7: colon on the second digit
    pub const ALL_SEGMENTS: u8 = 0xFF;
}

/// Data command: selects how the following bytes are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataCommand {
    /// Write display registers, address auto-increments after each byte.
    WriteData,
    ReadKeys,
    /// Write display registers, address stays fixed.
    WriteDataFixedPosition,
    TestMode,
}

impl From<DataCommand> for u8 {
    fn from(command: DataCommand) -> u8 {
        match command {
            DataCommand::WriteData => 0x40,
            DataCommand::ReadKeys => 0x42,
            DataCommand::WriteDataFixedPosition => 0x44,
            DataCommand::TestMode => 0x48,
        }
    }
}

/// Address command for one of the six display registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Position {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
}

impl Position {
    const BASE: u8 = 0xC0;

    /// Position at `index` counted from the leftmost register, saturating at the last one.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Position::C1,
            1 => Position::C2,
            2 => Position::C3,
            3 => Position::C4,
            4 => Position::C5,
            _ => Position::C6,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> u8 {
        Position::BASE + position.index()
    }
}

/// Display control command. The low three bits carry the brightness step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    DisplayOff,
    DisplayOn,
}

impl From<ControlCommand> for u8 {
    fn from(command: ControlCommand) -> u8 {
        match command {
            ControlCommand::DisplayOff => 0x80,
            ControlCommand::DisplayOn => 0x88,
        }
    }
}

/// Logical digit, counting from left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Digit {
    D1,
    D2,
    D3,
    D4,
}

impl From<Digit> for Position {
    fn from(digit: Digit) -> Position {
        Position::from_index(digit as u8)
    }
}

/// How values passed to the display operations are split into digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitCoding {
    /// Base-10 digits looked up in [`DIGITS_FONT`].
    #[default]
    PackedDecimal,
    /// Bytes of the value are sent as raw segment patterns.
    RawByte,
}
