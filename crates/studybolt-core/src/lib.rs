pub mod augment;
pub mod cache;
pub mod completion;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod types;

pub use augment::{augment, context_block, summary_messages};
pub use cache::{cache_key, CacheStore, MemoryCache, RedisCache};
pub use completion::{CompletionProvider, CompletionStream, EventStreamDecoder, MistralAgentClient};
pub use error::{Result, StudyBoltError};
pub use pipeline::{ChatPipeline, ChatStream, PipelineConfig, GENERIC_STREAM_ERROR};
pub use search::{SearchProvider, SerpApiClient, DEFAULT_RESULT_LIMIT};
pub use types::*;
