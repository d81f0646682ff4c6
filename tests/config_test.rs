//! Configuration loading from serde, variables and secret files.

use preresolver::config::{ConfigLoader, ResolverConfig};
use preresolver::NetError;
use std::fs;
use std::time::Duration;

#[test]
fn test_secrets_override_variables() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app_resolver"), "dns.secret\n").unwrap();
    fs::write(dir.path().join("APP_INSECURE_HTTP"), "true").unwrap();

    let loader = ConfigLoader::new("APP").secrets_dir(dir.path());
    let mut vars = vec![
        ("APP_RESOLVER".to_string(), "dns.env".to_string()),
        ("APP_STARTUP".to_string(), "8s".to_string()),
    ];
    vars.extend(loader.read_secrets().unwrap());
    let config = loader.from_vars(vars).unwrap();

    assert_eq!(config.upstream, "dns.secret");
    assert!(config.insecure_tls);
    assert_eq!(config.startup_window, Duration::from_secs(8));
}

#[test]
fn test_secrets_skip_unrelated_empty_and_dirs() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("OTHER_RESOLVER"), "10.9.9.9").unwrap();
    fs::write(dir.path().join("APP_VERBOSE"), "").unwrap();
    fs::create_dir(dir.path().join("APP_NESTED")).unwrap();

    let secrets = ConfigLoader::new("APP")
        .secrets_dir(dir.path())
        .read_secrets()
        .unwrap();
    assert!(secrets.is_empty());
}

#[test]
fn test_missing_secrets_dir_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = ConfigLoader::new("APP")
        .secrets_dir(dir.path().join("absent"))
        .read_secrets()
        .unwrap();
    assert!(secrets.is_empty());
}

#[test]
fn test_bad_startup_is_config_error() {
    let err = ConfigLoader::new("APP")
        .from_vars([("APP_STARTUP", "soon")])
        .unwrap_err();
    assert!(matches!(err, NetError::InvalidConfig { .. }));
    assert_eq!(err.as_i32(), -1003);
}

#[test]
fn test_deserialize_with_defaults() {
    let config: ResolverConfig =
        serde_json::from_str(r#"{"resolver": "dns.internal", "startup": "10s"}"#).unwrap();
    assert_eq!(config.upstream, "dns.internal");
    assert_eq!(config.startup_window, Duration::from_secs(10));
    assert_eq!(config.bootstrap_address, "127.0.0.11:53");
    assert!(!config.insecure_tls);

    let config: ResolverConfig =
        serde_json::from_str(r#"{"upstream": "10.0.0.5", "startupWindow": 2, "insecureHttp": true}"#)
            .unwrap();
    assert_eq!(config.startup_window, Duration::from_secs(2));
    assert_eq!(config.bootstrap_attempts(), 3);
    assert!(config.insecure_tls);
}

#[test]
fn test_serialize_roundtrip_keeps_duration_text() {
    let config = ResolverConfig::new("dns.internal").with_startup_window(Duration::from_millis(1500));
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["startupWindow"], "1500ms");

    let back: ResolverConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}

#[cfg(unix)]
#[test]
fn test_load_ignores_foreign_non_utf8_variables() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("CFGLOADOK_RESOLVER", "dns.internal");
    std::env::set_var("CFGLOADOK_OTHER_BYTES", "fine");
    std::env::set_var("UNRELATED_NON_UTF8_VALUE", OsStr::from_bytes(&[0xff, 0xfe]));
    std::env::set_var(OsStr::from_bytes(&[b'K', 0xff]), "value");

    let config = ConfigLoader::new("CFGLOADOK")
        .secrets_dir(dir.path())
        .load()
        .unwrap();
    assert_eq!(config.upstream, "dns.internal");
}

#[cfg(unix)]
#[test]
fn test_load_rejects_prefixed_non_utf8_value() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("CFGLOADBAD_RESOLVER", OsStr::from_bytes(&[b'd', 0xff]));

    let err = ConfigLoader::new("CFGLOADBAD")
        .secrets_dir(dir.path())
        .load()
        .unwrap_err();
    match err {
        NetError::InvalidConfig { key, .. } => assert_eq!(key, "CFGLOADBAD_RESOLVER"),
        other => panic!("Unexpected error type: {other:?}"),
    }
}
