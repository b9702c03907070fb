use super::*;

#[test]
#[serial_test::serial]
fn default_config_root_honors_vbus_path() {
    std::env::set_var("VBUS_PATH", "/tmp/vbus-test-root");
    assert_eq!(default_config_root(), PathBuf::from("/tmp/vbus-test-root"));
    std::env::remove_var("VBUS_PATH");
}

#[test]
#[serial_test::serial]
fn default_config_root_falls_back_to_home() {
    std::env::remove_var("VBUS_PATH");
    std::env::set_var("HOME", "/tmp/fake-home");
    assert_eq!(default_config_root(), PathBuf::from("/tmp/fake-home/vbus"));
}
