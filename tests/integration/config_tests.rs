use serial_test::serial;

use learnpath::config::{Config, LlmProvider};

#[test]
#[serial]
fn test_provider_detected_from_anthropic_env() {
    std::env::remove_var("OPENAI_API_KEY");
    std::env::set_var("ANTHROPIC_API_KEY", "sk-test");

    let config = Config::default();
    assert_eq!(config.llm.provider, LlmProvider::Anthropic);
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));

    std::env::remove_var("ANTHROPIC_API_KEY");
}

#[test]
#[serial]
fn test_scripted_provider_without_keys() {
    std::env::remove_var("ANTHROPIC_API_KEY");
    std::env::remove_var("OPENAI_API_KEY");

    let config = Config::default();
    assert_eq!(config.llm.provider, LlmProvider::Scripted);
    assert!(config.llm.api_key.is_none());
    // Scripted gateway needs no key
    assert!(learnpath::llm::create_gateway(&config).is_ok());
}
