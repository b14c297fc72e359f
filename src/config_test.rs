use super::*;

// Unique variable names keep these safe under parallel test execution.

#[test]
fn env_parse_reads_value() {
    let key = "__TEST_GESTAO_PARSE_OK_311__";
    unsafe { std::env::set_var(key, " 42 ") };
    assert_eq!(env_parse::<i64>(key, 7), 42);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let key = "__TEST_GESTAO_PARSE_BAD_312__";
    unsafe { std::env::set_var(key, "lots") };
    assert_eq!(env_parse::<u16>(key, 3000), 3000);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_falls_back_when_unset() {
    assert_eq!(env_parse::<i64>("__TEST_GESTAO_SURELY_UNSET_313__", 5), 5);
}

#[test]
fn env_string_drops_blank() {
    let key = "__TEST_GESTAO_STRING_BLANK_314__";
    unsafe { std::env::set_var(key, "   ") };
    assert_eq!(env_string(key), None);
    unsafe { std::env::set_var(key, " https://auth.example.com ") };
    assert_eq!(env_string(key).as_deref(), Some("https://auth.example.com"));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn default_config_values() {
    let config = AppConfig::default();
    assert_eq!(config.port, 3000);
    assert_eq!(config.session_ttl_hours, 168);
    assert_eq!(config.session_sweep_minutes, 60);
    assert_eq!(config.page_size_max, 500);
}
