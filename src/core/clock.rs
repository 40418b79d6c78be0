use std::f64::consts::PI;

use chrono::{Local, Timelike};

/// Wall-clock reading used for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl ClockState {
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            millisecond,
        }
    }

    /// Hour on the 12-hour dial
    pub fn dial_hour(&self) -> u32 {
        self.hour % 12
    }

    pub fn angles(&self) -> HandAngles {
        HandAngles::from_time(self)
    }
}

/// Orientation of a backend's vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAxis {
    /// Y grows downwards (vector library, GPU)
    Down,
    /// Y grows upwards (imaging API)
    Up,
}

impl YAxis {
    fn sign(self) -> f64 {
        match self {
            YAxis::Down => -1.0,
            YAxis::Up => 1.0,
        }
    }
}

/// Base angles of the three indicators, radians clockwise from twelve o'clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    /// Dial angle of the hour: the hour is taken mod 12 first, so 15:00 and
    /// 3:00 both give π/2 rather than 15 × π/6
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl HandAngles {
    pub fn from_time(time: &ClockState) -> Self {
        let second = (time.second as f64 + time.millisecond as f64 / 1000.0) * PI / 30.0;
        let minute = time.minute as f64 * PI / 30.0;
        let hour = time.dial_hour() as f64 * PI / 6.0;

        Self {
            hour,
            minute,
            second,
        }
    }

    pub fn second_hand(&self) -> f64 {
        self.second
    }

    /// Minute hand advanced by the progress of the current minute
    pub fn minute_hand(&self) -> f64 {
        self.minute + self.second / 60.0
    }

    /// Hour hand advanced by the progress of the current hour
    pub fn hour_hand(&self) -> f64 {
        self.hour + self.minute / 12.0
    }
}

/// Unit direction of a hand at `angle` in a space with the given Y axis
pub fn hand_direction(angle: f64, axis: YAxis) -> (f64, f64) {
    (angle.sin(), axis.sign() * angle.cos())
}

/// Source of wall-clock time
pub trait WallClock {
    fn now(&self) -> ClockState;
}

/// Local time from the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl WallClock for LocalClock {
    fn now(&self) -> ClockState {
        let now = Local::now();
        // nanosecond() exceeds 1e9 during a leap second
        let millisecond = (now.nanosecond() / 1_000_000).min(999);
        ClockState::new(now.hour(), now.minute(), now.second(), millisecond)
    }
}

/// Clock frozen at a single reading
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockState);

impl WallClock for FixedClock {
    fn now(&self) -> ClockState {
        self.0
    }
}
