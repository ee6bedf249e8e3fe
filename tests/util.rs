#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use self_signed_cert::output::MessageFn;
use self_signed_cert::{GenerationOptions, OutputChannels};

/// Messages captured from the output channels, tagged by channel
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<(&'static str, String)>>>);

impl Recorder {
    pub fn options(&self, debug: bool, summarize: bool, no_warnings: bool) -> GenerationOptions {
        let make = |tag: &'static str| -> MessageFn {
            let seen = Arc::clone(&self.0);
            Arc::new(move |m: &str| seen.lock().unwrap().push((tag, m.to_string())))
        };
        let channels = OutputChannels {
            debug: make("debug"),
            log: make("log"),
            warn: make("warn"),
            error: make("error"),
        };
        GenerationOptions::with_channels(debug, summarize, no_warnings, channels)
    }

    pub fn on(&self, channel: &str) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(tag, _)| *tag == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that write and execute scripts, so no other test forks
/// while a script file is still open for writing.
pub fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Write an executable shell script
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A stand-in for `openssl req` that writes placeholder key and cert files
pub const FAKE_OPENSSL: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -keyout|-out) printf 'placeholder\n' > "$2"; shift ;;
  esac
  shift
done
echo "writing new private key" >&2
"#;

/// A stand-in for `openssl` that always fails
pub const FAILING_OPENSSL: &str = r#"
echo "unable to load config info" >&2
exit 3
"#;
