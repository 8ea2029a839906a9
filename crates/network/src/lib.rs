// crates/network/src/lib.rs
//! HTTP plumbing and the Gemini-backed generation provider

mod client;
mod error;
mod gemini;
mod prompts;
pub mod wire;

pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
pub use gemini::{GeminiConfig, GeminiProvider};

#[cfg(test)]
mod tests {
    use super::*;
    use bookstudio_core::GenerationProvider;

    #[test]
    fn test_all_exports_accessible() {
        let client = Client::new().expect("Failed to create client");
        let provider = GeminiProvider::with_client(client, GeminiConfig::default());
        let _: &dyn GenerationProvider = &provider;
    }
}
