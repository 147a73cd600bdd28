//! defmt-backed renderers for the countdown and clock displays.
//!
//! They stand in for the segment and OLED drivers, logging each new frame.

use core::convert::Infallible;

use centrifuge_core::display::{CLOCK_TEXT_LEN, CountdownReadout};
use centrifuge_core::hal::{SegmentDisplay, TextDisplay};
use heapless::String;

#[derive(Default)]
pub struct LoggedSegments {
    last: Option<u16>,
}

impl SegmentDisplay for LoggedSegments {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        defmt::info!("display:countdown ready");
        Ok(())
    }

    fn show_countdown(&mut self, readout: CountdownReadout) -> Result<(), Infallible> {
        let value = readout.segment_value();
        if self.last != Some(value) {
            self.last = Some(value);
            defmt::info!("display:countdown {=str}", readout.text().as_str());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct LoggedText {
    last: String<CLOCK_TEXT_LEN>,
}

impl TextDisplay for LoggedText {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        defmt::info!("display:clock ready");
        Ok(())
    }

    fn show_text(&mut self, text: &str) -> Result<(), Infallible> {
        if self.last.as_str() != text {
            self.last.clear();
            let _ = self.last.push_str(text);
            defmt::info!("display:clock {=str}", text);
        }
        Ok(())
    }
}
