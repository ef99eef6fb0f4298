use std::path::PathBuf;

use {
    anyhow::{Result, bail},
    tracing::debug,
};

const CHROME_NAMES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
];

const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium-browser",
    "/usr/bin/chromium",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// Locate a Chrome/Chromium binary.
///
/// `CHROME_PATH` wins when set; otherwise `$PATH` lookup, then the
/// usual install locations.
pub fn find_chrome() -> Result<PathBuf> {
    find_chrome_with(std::env::var("CHROME_PATH").ok().as_deref())
}

fn find_chrome_with(override_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
        bail!("CHROME_PATH points at {path}, which does not exist");
    }

    for name in CHROME_NAMES {
        if let Ok(p) = which::which(name) {
            debug!(path = %p.display(), "found browser on PATH");
            return Ok(p);
        }
    }

    for candidate in CHROME_PATHS {
        let p = PathBuf::from(candidate);
        if p.exists() {
            debug!(path = %p.display(), "found browser at a known location");
            return Ok(p);
        }
    }

    bail!("could not find Chrome/Chromium; install Google Chrome or set CHROME_PATH")
}
