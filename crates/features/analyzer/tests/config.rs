use ksafe_analyzer::{AnalyzerError, SecurityAnalyzer};
use ksafe_domain::config::SecurityConfig;

#[test]
fn url_safety_needs_an_api_key() {
    let mut config = SecurityConfig::default();
    config.url_safety.enabled = true;
    let result = SecurityAnalyzer::from_config(&config);
    assert!(matches!(result, Err(AnalyzerError::Configuration { .. })));

    config.url_safety.api_key = Some(String::new());
    assert!(SecurityAnalyzer::from_config(&config).is_err());

    config.url_safety.api_key = Some("key".into());
    assert!(SecurityAnalyzer::from_config(&config).is_ok());
}

#[test]
fn defaults_build_offline_capable_analyzer() {
    let mut config = SecurityConfig::default();
    config.breach.enabled = false;
    assert!(SecurityAnalyzer::from_config(&config).is_ok());
}
