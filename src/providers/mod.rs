//! Provider 层：上游推理后端的适配器与健康状态板

pub mod mock;
pub mod openai;
pub mod relay;
pub mod status;
pub mod traits;

pub use mock::{MockBehavior, MockProvider};
pub use openai::OpenAiProvider;
pub use relay::RelayProvider;
pub use status::{ProviderHealth, ProviderState, StatusBoard};
pub use traits::{Capability, Provider, RespondOptions};
