//! `get_current_datetime` tool

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use parley_domain::{ProviderError, ToolDefinition, ToolProvider, ToolSpec};

pub const GET_CURRENT_DATETIME: &str = "get_current_datetime";

/// Weekday, day, month, year, hour:minute
pub const DEFAULT_FORMAT: &str = "%A, %d %B %Y, %H:%M";

pub struct DateTimeProvider {
    format: String,
}

impl DateTimeProvider {
    pub fn new() -> Self {
        Self::with_format(DEFAULT_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn tool(&self) -> ToolSpec {
        let format = self.format.clone();
        ToolSpec::from_sync_fn(
            ToolDefinition::new(
                GET_CURRENT_DATETIME,
                "Returns the current date and time. Always use it for questions about today's date, \
                 the time, the weekday or the year; never answer those from memory.",
            ),
            move |_| Ok(render(&Local::now(), &format)),
        )
    }
}

impl Default for DateTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn render<Tz: TimeZone>(now: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(format).to_string()
}

#[async_trait]
impl ToolProvider for DateTimeProvider {
    fn id(&self) -> &str {
        "datetime"
    }

    fn display_name(&self) -> &str {
        "Date and Time"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
        Ok(vec![self.tool()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};
    use parley_domain::ValidatedArguments;

    #[test]
    fn test_render_default_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(render(&at, DEFAULT_FORMAT), "Saturday, 09 March 2024, 14:05");
    }

    #[tokio::test]
    async fn test_tool_reports_current_year() {
        let output = DateTimeProvider::with_format("%Y")
            .tool()
            .invoke(&ValidatedArguments::new())
            .await
            .unwrap();
        let year = Local::now().year();
        // Tolerate a New Year's Eve rollover between the two clock reads
        assert!(output == year.to_string() || output == (year - 1).to_string());
    }
}
