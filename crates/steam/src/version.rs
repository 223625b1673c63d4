//! Game version probe.
//!
//! The game stores its application version in the managed
//! `Assembly-CSharp.dll`. Literal strings of a .NET assembly live in the
//! user-string heap as UTF-16LE, so the probe decodes every UTF-16 run of
//! printable ASCII and collects the ones shaped like a Unity version
//! (`1.17.1-f2`). Only a single distinct candidate is trusted; anything
//! else is reported so the operator can pin `game_version` instead.

use std::fs;
use std::path::Path;

use crate::SteamError;

/// Shortest run worth inspecting (`1.0.0-f1`).
const MIN_VERSION_LEN: usize = 8;

/// Reads the application version out of a managed assembly.
pub fn read_application_version(assembly: &Path) -> Result<String, SteamError> {
    let data = fs::read(assembly).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SteamError::MissingGameFile(assembly.to_path_buf())
        } else {
            SteamError::Io(format!("failed to read {}: {e}", assembly.display()))
        }
    })?;

    let mut candidates = version_candidates(&data);
    match candidates.len() {
        0 => Err(SteamError::VersionNotFound(assembly.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        _ => Err(SteamError::AmbiguousVersion {
            path: assembly.to_path_buf(),
            candidates,
        }),
    }
}

/// Every distinct version-shaped string in the raw assembly bytes, in file
/// order.
pub fn version_candidates(data: &[u8]) -> Vec<String> {
    let mut found = Vec::new();
    // Strings may start at either byte parity.
    for start in [0usize, 1] {
        let Some(aligned) = data.get(start..) else {
            continue;
        };
        for run in utf16_runs(aligned) {
            if run.len() >= MIN_VERSION_LEN && is_version(&run) && !found.contains(&run) {
                found.push(run);
            }
        }
    }
    found
}

fn utf16_runs(data: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut run = String::new();
    for pair in data.chunks_exact(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi == 0 && (0x20..0x7f).contains(&lo) {
            run.push(lo as char);
        } else if !run.is_empty() {
            runs.push(std::mem::take(&mut run));
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Matches `<major>.<minor>.<patch>-<f|p|b|c><build>`.
fn is_version(s: &str) -> bool {
    let Some((numbers, build)) = s.split_once('-') else {
        return false;
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.len() != 3 || !parts.iter().all(|p| is_digits(p)) {
        return false;
    }

    let mut chars = build.chars();
    matches!(chars.next(), Some('f' | 'p' | 'b' | 'c')) && is_digits(chars.as_str())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
