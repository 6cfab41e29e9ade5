//! Built-in tools
//!
//! Each group of tools is a [`ToolProvider`](parley_domain::ToolProvider);
//! [`ToolDiscovery`] merges them into the registry at start-up.
//!
//! ## Providers
//!
//! - `math`: `add`, `subtract`, `multiply`
//! - `tasks`: `add_task`, `list_tasks`, `complete_task`, `delete_task`
//! - `datetime`: `get_current_datetime`
//! - `weather`: `get_current_weather` (needs an OpenWeatherMap API key)

pub mod datetime;
pub mod discovery;
pub mod math;
pub mod tasks;
pub mod weather;

pub use datetime::DateTimeProvider;
pub use discovery::{DiscoveryStats, ToolDiscovery};
pub use math::MathProvider;
pub use tasks::{Task, TaskBook, TaskProvider, TaskStatus};
pub use weather::{WeatherProvider, WeatherSettings};
