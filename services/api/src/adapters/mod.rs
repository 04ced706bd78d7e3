pub mod auth;
pub mod capture;
pub mod category_llm;
pub mod db;
pub mod email;
pub mod expansion_llm;
pub mod kv;
pub mod polish_llm;
pub mod stt;

pub use auth::HostedAuthAdapter;
pub use capture::WsCaptureDevice;
pub use category_llm::OpenAiCategoryAdapter;
pub use db::PgArchiveStore;
pub use email::FormRelayEmailAdapter;
pub use expansion_llm::OpenAiExpansionAdapter;
pub use kv::FileRecipientStore;
pub use polish_llm::OpenAiPolishAdapter;
pub use stt::OpenAiSttAdapter;
