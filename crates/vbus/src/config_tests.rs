use super::*;

#[test]
fn generate_produces_validatable_config() -> anyhow::Result<()> {
    let config = ModuleConfig::generate("my.app", "host1")?;
    assert!(config.validate());
    assert_eq!(config.client.user, "my.app.host1");
    assert_eq!(config.client.permissions.subscribe, vec!["my.app", "my.app.>"]);
    assert_eq!(config.key.private.len(), PASSWORD_LEN);
    Ok(())
}

#[test]
fn generated_password_hash_verifies() -> anyhow::Result<()> {
    let config = ModuleConfig::generate("my.app", "host1")?;
    assert!(bcrypt::verify(&config.key.private, &config.client.password)?);
    Ok(())
}

#[test]
fn reconcile_hostname_rewrites_stale_user() -> anyhow::Result<()> {
    let mut config = ModuleConfig::generate("my.app", "old-host")?;
    config.reconcile_hostname("my.app", "new-host");
    assert_eq!(config.client.user, "my.app.new-host");
    Ok(())
}

#[test]
fn load_or_create_persists_and_reloads() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let first = ModuleConfig::load_or_create(dir.path(), "my.app", "host1", None)?;
    let second = ModuleConfig::load_or_create(dir.path(), "my.app", "host1", None)?;
    assert_eq!(first.client.user, second.client.user);
    assert_eq!(first.key.private, second.key.private);
    Ok(())
}

#[test]
fn load_or_create_resets_invalid_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("my.app.conf");
    std::fs::write(&path, r#"{"vbus": {"url": null}}"#)?;
    let config = ModuleConfig::load_or_create(dir.path(), "my.app", "host1", None)?;
    assert!(config.validate());
    Ok(())
}

#[test]
fn load_or_create_accepts_v2_shape_under_external_credentials() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("my.app.conf");
    std::fs::write(&path, r#"{"vbus": {"url": "nats://hub:8421", "hostname": "hub", "networkIp": null}}"#)?;

    let config = ModuleConfig::load_or_create(dir.path(), "my.app", "host1", Some("/etc/vbus/my.app.creds"))?;

    assert_eq!(config.vbus.url.as_deref(), Some("nats://hub:8421"));
    assert_eq!(config.vbus.hostname.as_deref(), Some("hub"));
    assert!(config.client.user.is_empty(), "v2 config carries no locally-issued client identity");
    Ok(())
}

#[test]
fn load_or_create_creates_v2_default_when_no_file_exists() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = ModuleConfig::load_or_create(dir.path(), "my.app", "host1", Some("/etc/vbus/my.app.creds"))?;
    assert_eq!(config.vbus.url, None);
    assert!(config.client.user.is_empty());
    Ok(())
}

#[test]
fn generate_password_has_expected_length_and_charset() {
    let password = generate_password();
    assert_eq!(password.len(), PASSWORD_LEN);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
}
