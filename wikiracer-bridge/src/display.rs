// Launching the viewer in a browser

use crate::error::{BridgeError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Platform default opener and the arguments that precede the url.
fn default_opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}

/// Open `url` with `program` (or the platform opener) without waiting
/// for it to exit.
pub fn open_viewer(url: &str, program: Option<&str>) -> Result<()> {
    let (opener, prefix) = match program {
        Some(program) => (program, &[][..]),
        None => default_opener(),
    };

    debug!("Opening {} with {}", url, opener);
    Command::new(opener)
        .args(prefix)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|source| BridgeError::Display {
            command: opener.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let err = open_viewer("http://127.0.0.1:1/viewer.html", Some("wikiracer-no-such-opener"))
            .unwrap_err();
        match err {
            BridgeError::Display { command, .. } => assert_eq!(command, "wikiracer-no-such-opener"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
