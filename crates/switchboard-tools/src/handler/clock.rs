//! Time handler: current time for a named place.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

use switchboard_core::Capability;

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{ToolArgs, ToolOutput};

/// Place names (lower-case) mapped to IANA zones.
const ZONES: &[(&[&str], Tz)] = &[
    (&["india", "new delhi", "delhi", "mumbai", "kolkata", "bangalore", "chennai"], chrono_tz::Asia::Kolkata),
    (&["usa", "us", "america", "new york", "washington", "boston"], chrono_tz::America::New_York),
    (&["los angeles", "california", "san francisco", "seattle"], chrono_tz::America::Los_Angeles),
    (&["chicago", "texas"], chrono_tz::America::Chicago),
    (&["canada", "toronto"], chrono_tz::America::Toronto),
    (&["london", "uk", "england", "britain"], chrono_tz::Europe::London),
    (&["paris", "france"], chrono_tz::Europe::Paris),
    (&["berlin", "germany"], chrono_tz::Europe::Berlin),
    (&["moscow", "russia"], chrono_tz::Europe::Moscow),
    (&["dubai", "uae"], chrono_tz::Asia::Dubai),
    (&["singapore"], chrono_tz::Asia::Singapore),
    (&["china", "beijing", "shanghai"], chrono_tz::Asia::Shanghai),
    (&["tokyo", "japan"], chrono_tz::Asia::Tokyo),
    (&["sydney", "australia"], chrono_tz::Australia::Sydney),
    (&["utc", "gmt"], Tz::UTC),
];

/// Zone for a place name, if known.
pub fn zone_for(location: &str) -> Option<Tz> {
    let key = location.trim().to_lowercase();
    ZONES
        .iter()
        .find(|(names, _)| names.contains(&key.as_str()))
        .map(|(_, tz)| *tz)
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the time at `location` for the instant `now`.
pub fn time_at(location: &str, now: DateTime<Utc>) -> String {
    let trimmed = location.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
        let local = now.with_timezone(&Local);
        return format!("Local Time: {}", local.format("%Y-%m-%d %H:%M:%S"));
    }

    let name = title_case(trimmed);
    match zone_for(trimmed) {
        Some(tz) => format!(
            "Time in {}: {}",
            name,
            now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z")
        ),
        None => {
            tracing::debug!(location = %trimmed, "no zone mapping, using local time");
            let local = now.with_timezone(&Local);
            format!("Time in {}: {} (approx)", name, local.format("%Y-%m-%d %H:%M:%S"))
        }
    }
}

/// Handler for time requests.
pub struct ClockHandler;

#[async_trait]
impl ToolHandler for ClockHandler {
    fn capability(&self) -> Capability {
        Capability::Time
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Time { location } = args else {
            return Err(wrong_args(self.capability(), args));
        };
        Ok(ToolOutput::text(time_at(location, Utc::now())))
    }
}
