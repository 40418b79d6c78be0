use std::time::{Duration, Instant};

/// How often the measured rate is reported and the window restarted
pub const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Frame-rate meter over a rolling window that restarts once per second
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last_update: Instant,
    frames: u32,
}

impl FpsCounter {
    /// Create counter whose first window starts at `start`
    pub fn new(start: Instant) -> Self {
        Self {
            last_update: start,
            frames: 0,
        }
    }

    /// Frames per second rendered since the window started.
    /// Once the window is older than [`FPS_REPORT_INTERVAL`] the rate is
    /// logged and a new window starts at `now`.
    pub fn sample(&mut self, now: Instant) -> f32 {
        let interval = now.saturating_duration_since(self.last_update);
        let fps = if interval.is_zero() {
            0.0
        } else {
            self.frames as f32 / interval.as_secs_f32()
        };

        if interval > FPS_REPORT_INTERVAL {
            log::info!("fps: {}", format_fps(fps));
            self.last_update = now;
            self.frames = 0;
        }

        fps
    }

    /// Count one presented frame
    pub fn frame_rendered(&mut self) {
        self.frames += 1;
    }

    /// Frames counted in the current window
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

/// Format a rate with two significant digits, the way `printf("%0.2g")` does
pub fn format_fps(fps: f32) -> String {
    let value = fps as f64;
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{value:.1e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..2).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Text shown in the corner of every frame
pub fn fps_label(fps: f32) -> String {
    format!("fps: {}", format_fps(fps))
}
