use std::fmt;

use crate::error::WireError;
use crate::Float;

/// Control event sent from the display to the simulation.
///
/// On the wire an event is the single byte given by its discriminant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UiEvent {
    #[default]
    Noop = 0,
    CloseWindow = 1,
    AnimationStart = 2,
    AnimationStop = 3,
    TimestepIncrement = 4,
    TimestepDecrement = 5,
    Advance = 6,
}

impl UiEvent {
    /// Time step after this event. Both peers apply it so their `dt` stay equal.
    pub fn scale_dt(self, dt: Float) -> Float {
        match self {
            UiEvent::TimestepIncrement => dt * 2.,
            UiEvent::TimestepDecrement => dt / 2.,
            _ => dt,
        }
    }
}

impl From<UiEvent> for u8 {
    fn from(event: UiEvent) -> u8 {
        event as u8
    }
}

impl TryFrom<u8> for UiEvent {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => UiEvent::Noop,
            1 => UiEvent::CloseWindow,
            2 => UiEvent::AnimationStart,
            3 => UiEvent::AnimationStop,
            4 => UiEvent::TimestepIncrement,
            5 => UiEvent::TimestepDecrement,
            6 => UiEvent::Advance,
            other => return Err(WireError::UnknownEvent(other)),
        })
    }
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
