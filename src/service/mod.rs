pub mod anthropic;
pub mod dedup;
pub mod discovery;
pub mod extractor;
pub mod http;
pub mod location;
pub mod query_builder;
pub mod scorer;
pub mod search;
pub mod serp;
pub mod tasks;
pub mod throttle;

pub use anthropic::{AnthropicClient, ScoreClient};
pub use discovery::{DiscoveryRunner, RunReport};
pub use location::LocationFilter;
pub use scorer::{JobScorer, ScoreReport};
pub use search::SearchExecutor;
pub use tasks::{TaskKind, TaskState, TaskTracker};
pub use throttle::Throttle;
