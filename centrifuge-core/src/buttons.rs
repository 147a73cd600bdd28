//! Speed-button scanner.
//!
//! Each scan takes the pressed level of all four buttons. A released-to-pressed
//! edge is accepted when the same button has not been accepted within the
//! debounce interval; the accepted press lights exactly its own indicator.
//! Only the lowest-numbered edge wins a scan, and any other button held at
//! that moment counts as already pressed. The settle pause after a press is
//! the scanning task's sleep.

use core::ops::Add;
use core::time::Duration;

use crate::config::SPEED_INPUTS;
use crate::motor::SpeedSelection;

/// Levels for the four speed indicators.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndicatorPattern([bool; SPEED_INPUTS]);

impl IndicatorPattern {
    /// All indicators dark.
    pub const DARK: Self = Self([false; SPEED_INPUTS]);

    /// Lights `index` and darkens the rest.
    #[must_use]
    pub fn only(index: usize) -> Self {
        Self(core::array::from_fn(|slot| slot == index))
    }

    #[must_use]
    pub const fn levels(self) -> [bool; SPEED_INPUTS] {
        self.0
    }

    #[must_use]
    pub fn is_lit(self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Indices that are lit.
    pub fn lit(self) -> impl Iterator<Item = usize> {
        self.0
            .into_iter()
            .enumerate()
            .filter_map(|(index, on)| on.then_some(index))
    }
}

/// Accepted button press.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpeedPress {
    pub input: usize,
    pub selection: SpeedSelection,
    pub indicators: IndicatorPattern,
}

#[derive(Clone, Copy, Debug)]
struct InputTrack<TInstant> {
    pressed: bool,
    last_accepted: Option<TInstant>,
}

#[derive(Clone, Debug)]
pub struct ButtonScanner<TInstant> {
    inputs: [InputTrack<TInstant>; SPEED_INPUTS],
    debounce: Duration,
}

impl<TInstant> ButtonScanner<TInstant>
where
    TInstant: Copy + Ord + Add<Duration, Output = TInstant>,
{
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            inputs: [InputTrack {
                pressed: false,
                last_accepted: None,
            }; SPEED_INPUTS],
            debounce,
        }
    }

    /// Processes one sample; returns the first accepted press, if any.
    pub fn scan(&mut self, now: TInstant, pressed: [bool; SPEED_INPUTS]) -> Option<SpeedPress> {
        let mut accepted = None;
        for (index, (track, level)) in self.inputs.iter_mut().zip(pressed).enumerate() {
            if !level || track.pressed || accepted.is_some() {
                track.pressed = level;
                continue;
            }
            // A bounce leaves the level released so a steady press lands later.
            let debounced = track
                .last_accepted
                .is_none_or(|last| now >= last + self.debounce);
            let Some(selection) = SpeedSelection::for_input(index).filter(|_| debounced) else {
                continue;
            };
            track.pressed = true;
            track.last_accepted = Some(now);
            accepted = Some(SpeedPress {
                input: index,
                selection,
                indicators: IndicatorPattern::only(index),
            });
        }
        accepted
    }
}
