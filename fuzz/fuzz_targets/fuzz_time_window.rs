#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quest_types::{TimeWindowConfig, Timestamp};
use quest_verification::TimeWindowVerifier;

#[derive(Debug, Arbitrary)]
struct Input {
    timezone: String,
    start_time: Option<String>,
    end_time: Option<String>,
    days_of_week: Option<Vec<u8>>,
    at_secs: u32,
}

fuzz_target!(|input: Input| {
    let config = TimeWindowConfig {
        enabled: true,
        timezone: input.timezone,
        start_time: input.start_time,
        end_time: input.end_time,
        days_of_week: input.days_of_week,
        ..TimeWindowConfig::default()
    };

    // Bad timezones or times are errors, not panics.
    let _ = TimeWindowVerifier.verify(&config, Timestamp::from_secs(input.at_secs as u64));
});
