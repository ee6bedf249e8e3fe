mod util;

use self_signed_cert::config::{ProjectMetadata, SslDomain};
use self_signed_cert::openssl::ConfigSynthesizer;
use self_signed_cert::{CertError, CertificateGenerator, ToolLocation, ToolPlatform, ToolResolver};
use util::Recorder;

fn acme_metadata() -> ProjectMetadata {
    ProjectMetadata::from_json(
        "package.json",
        r#"{"name":"site","sslDomain":{"country":"US","organization":"Acme"}}"#,
    )
    .unwrap()
}

fn alt_names() -> Vec<String> {
    vec!["example.com".to_string(), "www.example.com".to_string()]
}

#[test]
fn synthesized_config_for_partial_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let options = recorder.options(false, false, false);
    let metadata = acme_metadata();
    let addresses = vec!["10.1.1.1".to_string()];

    let path = ConfigSynthesizer::new(&options, &metadata, &addresses)
        .synthesize("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .unwrap();

    assert_eq!(path, dir.path().join("site.conf"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[dn]\nC = US\nO = Acme\nCN = example.com\n\n[v3_req]"));
    assert!(text.ends_with("[alt_names]\nDNS.1 = example.com\nDNS.2 = www.example.com\n"));
    assert!(!text.contains("10.1.1.1"));

    let warnings = recorder.on("warn");
    assert_eq!(warnings.len(), 4);
    for (warning, field) in warnings.iter().zip(["State", "City", "Department", "Email Address"]) {
        assert!(warning.contains(field), "{warning} should name {field}");
    }
}

#[test]
fn missing_alt_names_use_resolved_addresses() {
    let dir = tempfile::tempdir().unwrap();
    let options = Recorder::default().options(false, true, true);
    let metadata = ProjectMetadata::new("package.json", None);
    let addresses = vec!["127.0.0.1".to_string(), "192.168.0.7".to_string()];

    let path = ConfigSynthesizer::new(&options, &metadata, &addresses)
        .synthesize("local", "localhost", dir.path(), None)
        .unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("[dn]\nCN = localhost\n"));
    assert!(text.ends_with("[alt_names]\nDNS.1 = 127.0.0.1\nDNS.2 = 192.168.0.7\n"));
}

#[test]
fn synthesis_is_repeatable_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let options = Recorder::default().options(false, true, true);
    let metadata = acme_metadata();
    let addresses: Vec<String> = Vec::new();
    let synthesizer = ConfigSynthesizer::new(&options, &metadata, &addresses);

    let conf = dir.path().join("site.conf");
    std::fs::write(&conf, "stale contents that are much longer than anything rendered ".repeat(20)).unwrap();

    synthesizer
        .synthesize("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .unwrap();
    let first = std::fs::read(&conf).unwrap();
    synthesizer
        .synthesize("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .unwrap();
    let second = std::fs::read(&conf).unwrap();

    assert_eq!(first, second);
    assert!(!String::from_utf8(second).unwrap().contains("stale"));
}

#[test]
fn creates_missing_output_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let options = Recorder::default().options(false, true, true);
    let metadata = acme_metadata();

    ConfigSynthesizer::new(&options, &metadata, &Vec::<String>::new())
        .synthesize("site", "example.com", &nested, Some(alt_names().as_slice()))
        .unwrap();

    assert!(nested.join("site.conf").is_file());
}

#[test]
fn unwritable_output_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();
    let options = Recorder::default().options(false, true, true);
    let metadata = acme_metadata();

    let err = ConfigSynthesizer::new(&options, &metadata, &Vec::<String>::new())
        .synthesize("site", "example.com", &blocker.join("sub"), None)
        .unwrap_err();

    assert!(matches!(err, CertError::Io { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn generates_files_with_fake_openssl() {
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = util::write_script(dir.path(), "openssl", util::FAKE_OPENSSL);
    let out = dir.path().join("out");
    let recorder = Recorder::default();

    let generator = CertificateGenerator::new(recorder.options(false, false, false), acme_metadata())
        .with_tool(ToolLocation::Path(tool));
    let artifacts = generator
        .create_self_signed_certificate("site", "example.com", &out, Some(alt_names().as_slice()))
        .await
        .unwrap();

    assert_eq!(artifacts.config, out.join("site.conf"));
    assert!(artifacts.config.is_file());
    assert!(artifacts.key.is_file());
    assert!(artifacts.certificate.is_file());

    let logs = recorder.on("log");
    assert_eq!(logs.first().map(String::as_str), Some("\nCreating self-signed cert for example.com..."));
    assert!(logs.iter().any(|m| m.contains("Generating key file") && m.contains("site.key")));
    assert!(logs.iter().any(|m| m.contains("Generating certificate") && m.contains("site.crt")));
    assert_eq!(logs.last().map(String::as_str), Some("\nCert created successfully!"));
    assert!(recorder.on("error").is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn summarize_reports_a_single_line() {
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = util::write_script(dir.path(), "openssl", util::FAKE_OPENSSL);
    let recorder = Recorder::default();

    CertificateGenerator::new(recorder.options(false, true, true), acme_metadata())
        .with_tool(ToolLocation::Path(tool))
        .create_self_signed_certificate("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .await
        .unwrap();

    assert_eq!(
        recorder.on("log"),
        ["Successfully created self-signed cert for example.com"]
    );
    assert!(recorder.on("warn").is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn failing_tool_reports_through_error_channel() {
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let tool = util::write_script(dir.path(), "openssl", util::FAILING_OPENSSL);
    let recorder = Recorder::default();

    let err = CertificateGenerator::new(recorder.options(false, false, true), acme_metadata())
        .with_tool(ToolLocation::Path(tool))
        .create_self_signed_certificate("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .await
        .unwrap_err();

    match &err {
        CertError::ToolFailed { status, stderr, .. } => {
            assert_eq!(status.code(), Some(3));
            assert!(stderr.contains("unable to load config info"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let errors = recorder.on("error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("unable to load config info"));
    assert!(!recorder.on("log").iter().any(|m| m.contains("successfully")));
}

fn offline_portable_resolver() -> ToolResolver {
    ToolResolver::new(ToolPlatform::Portable).archive_url("http://127.0.0.1:1/openssl.zip")
}

#[cfg(unix)]
#[tokio::test]
async fn output_paths_share_one_tool_cache() {
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let tool_dir = dir.path().join("tools");
    let exe = ToolResolver::cached_executable(&tool_dir);
    std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
    util::write_script(exe.parent().unwrap(), "openssl.exe", util::FAKE_OPENSSL);

    for out in ["certs-a", "certs-b"] {
        let out = dir.path().join(out);
        let recorder = Recorder::default();

        let artifacts = CertificateGenerator::new(recorder.options(false, false, true), acme_metadata())
            .with_resolver(offline_portable_resolver())
            .with_tool_dir(&tool_dir)
            .create_self_signed_certificate("site", "example.com", &out, Some(alt_names().as_slice()))
            .await
            .unwrap();

        assert!(artifacts.certificate.is_file());
        assert!(!recorder.on("log").iter().any(|m| m.contains("Downloading")));
        assert!(!out.join("lib").exists());
        assert!(!out.join("openssl.zip").exists());
    }
}

#[tokio::test]
async fn tool_cache_is_not_placed_in_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("certs");
    let recorder = Recorder::default();

    // No cache next to the test binary, so resolution tries the offline URL.
    let err = CertificateGenerator::new(recorder.options(false, true, true), acme_metadata())
        .with_resolver(offline_portable_resolver())
        .create_self_signed_certificate("site", "example.com", &out, Some(alt_names().as_slice()))
        .await
        .unwrap_err();

    assert!(matches!(err, CertError::Download { .. }));
    assert!(!out.join("lib").exists());
    assert!(!out.join("openssl.zip").exists());
}

#[tokio::test]
async fn missing_tool_is_a_spawn_error() {
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();

    let err = CertificateGenerator::new(recorder.options(false, true, true), acme_metadata())
        .with_tool(ToolLocation::Path(dir.path().join("no-such-openssl")))
        .create_self_signed_certificate("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .await
        .unwrap_err();

    assert!(matches!(err, CertError::Spawn { .. }));
    assert_eq!(recorder.on("error").len(), 1);
    // The config is written before the tool runs.
    assert!(dir.path().join("site.conf").is_file());
}

#[tokio::test]
async fn real_openssl_produces_certificate() {
    if which::which("openssl").is_err() {
        return;
    }
    let _guard = util::spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let metadata = ProjectMetadata::new(
        "package.json",
        Some(SslDomain {
            country: Some("US".into()),
            state: Some("Texas".into()),
            city: Some("Austin".into()),
            organization: Some("Acme".into()),
            department: Some("IT".into()),
            email: Some("ops@example.com".into()),
        }),
    );

    let artifacts = CertificateGenerator::new(recorder.options(false, true, false), metadata)
        .with_tool(ToolLocation::Command("openssl".into()))
        .create_self_signed_certificate("site", "example.com", dir.path(), Some(alt_names().as_slice()))
        .await
        .unwrap();

    let cert = std::fs::read_to_string(&artifacts.certificate).unwrap();
    assert!(cert.contains("BEGIN CERTIFICATE"));
    let key = std::fs::read_to_string(&artifacts.key).unwrap();
    assert!(key.contains("PRIVATE KEY"));
    assert!(recorder.on("warn").is_empty());
}
