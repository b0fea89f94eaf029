pub mod responses;

use crate::cli::Args;
use serde::{ Deserialize, Serialize };
use std::time::Duration;

pub const CREATIVITY_MIN: f64 = 0.0;
pub const CREATIVITY_MAX: f64 = 1.0;
pub const MAX_TOKENS_MIN: i64 = 256;
pub const MAX_TOKENS_MAX: i64 = 4096;

pub const DEFAULT_MODEL: &str = "Luminous";

/// Knobs shown in the configuration drawer. None of them change how
/// replies are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub model: String,
    pub creativity: f64,
    pub max_tokens: i64,
    pub web_search: bool,
    pub memory_retention: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            creativity: 0.7,
            max_tokens: 1024,
            web_search: false,
            memory_retention: true,
        }
    }
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        let mut settings = Self {
            model: args.model_name.clone(),
            web_search: args.default_web_search,
            memory_retention: args.default_memory_retention,
            ..Self::default()
        };
        settings.set_creativity(args.default_creativity);
        settings.set_max_tokens(args.default_max_tokens);
        settings
    }

    /// Slider step is 0.1; values outside the range are clamped.
    pub fn set_creativity(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let clamped = value.clamp(CREATIVITY_MIN, CREATIVITY_MAX);
        self.creativity = (clamped * 10.0).round() / 10.0;
    }

    pub fn set_max_tokens(&mut self, value: i64) {
        self.max_tokens = value.clamp(MAX_TOKENS_MIN, MAX_TOKENS_MAX);
    }
}

/// Delays between the steps of a staged exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingDelays {
    pub user_response: Duration,
    pub option_response: Duration,
    pub followup_response: Duration,
}

impl Default for StagingDelays {
    fn default() -> Self {
        Self {
            user_response: Duration::from_millis(500),
            option_response: Duration::from_millis(800),
            followup_response: Duration::from_millis(500),
        }
    }
}

impl StagingDelays {
    pub fn from_args(args: &Args) -> Self {
        Self {
            user_response: Duration::from_millis(args.user_response_delay_ms),
            option_response: Duration::from_millis(args.option_response_delay_ms),
            followup_response: Duration::from_millis(args.followup_response_delay_ms),
        }
    }
}
