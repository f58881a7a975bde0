#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use tm1637_4digit::{DataPin, TM1637};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Clk(bool),
    Dio(bool),
    DioInput,
    DioOutput,
    DioRead,
    Delay(u32),
}

#[derive(Default)]
struct BusState {
    events: Vec<Event>,
    nack: bool,
}

/// Shared recorder for every pin operation the driver performs.
#[derive(Clone, Default)]
pub struct Bus {
    state: Rc<RefCell<BusState>>,
}

impl Bus {
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn reset(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Make the data line read high in the acknowledge slot.
    pub fn set_nack(&self, nack: bool) {
        self.state.borrow_mut().nack = nack;
    }

    fn push(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }

    /// Replays the recorded edges and returns the bytes of each START..STOP frame.
    ///
    /// Bits are sampled on rising clock edges while the data line is driven.
    /// A frame still open at the end of the log is returned as well.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        let (mut clk, mut dio, mut driving) = (true, true, true);
        let (mut byte, mut bits) = (0u8, 0u8);

        for event in self.events() {
            match event {
                Event::Clk(level) => {
                    if level && !clk && driving {
                        if let Some(frame) = current.as_mut() {
                            if dio {
                                byte |= 1 << bits;
                            }
                            bits += 1;
                            if bits == 8 {
                                frame.push(byte);
                                byte = 0;
                                bits = 0;
                            }
                        }
                    }
                    clk = level;
                }
                Event::Dio(level) => {
                    if clk && driving && dio && !level {
                        if let Some(frame) = current.take() {
                            frames.push(frame);
                        }
                        current = Some(Vec::new());
                        byte = 0;
                        bits = 0;
                    } else if clk && driving && !dio && level {
                        if let Some(frame) = current.take() {
                            frames.push(frame);
                        }
                    }
                    dio = level;
                }
                Event::DioInput => driving = false,
                Event::DioOutput => driving = true,
                Event::DioRead | Event::Delay(_) => {}
            }
        }
        if let Some(frame) = current {
            frames.push(frame);
        }
        frames
    }
}

pub struct MockClk {
    bus: Bus,
}

impl ErrorType for MockClk {
    type Error = ErrorKind;
}

impl OutputPin for MockClk {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::Clk(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::Clk(true));
        Ok(())
    }
}

pub struct MockDio {
    bus: Bus,
}

impl ErrorType for MockDio {
    type Error = ErrorKind;
}

impl OutputPin for MockDio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::Dio(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::Dio(true));
        Ok(())
    }
}

impl InputPin for MockDio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.bus.push(Event::DioRead);
        Ok(self.bus.state.borrow().nack)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl DataPin for MockDio {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::DioInput);
        Ok(())
    }

    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        self.bus.push(Event::DioOutput);
        Ok(())
    }
}

pub struct MockDelay {
    bus: Bus,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.push(Event::Delay(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.bus.push(Event::Delay(us * 1_000));
    }
}

pub type MockDisplay = TM1637<MockClk, MockDio, MockDelay>;

/// Driver on mock pins; nothing has been sent yet.
pub fn display() -> (MockDisplay, Bus) {
    let bus = Bus::default();
    let display = TM1637::new(
        MockClk { bus: bus.clone() },
        MockDio { bus: bus.clone() },
        MockDelay { bus: bus.clone() },
    );
    (display, bus)
}

/// Driver that has been opened at full brightness, with the log cleared.
pub fn opened_display() -> (MockDisplay, Bus) {
    let (mut display, bus) = display();
    display.open(0xFF).unwrap();
    bus.reset();
    (display, bus)
}
