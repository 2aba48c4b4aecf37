//! Entity structs for Trawl domain objects.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so the CLI
//! can emit them directly and tests can pin the JSON shape.

mod result;
mod task;

pub use result::{CompanyMetrics, PlatformMetrics, ReviewMetrics, ScrapeResult, SocialMetrics};
pub use task::Task;
