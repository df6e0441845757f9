use std::path::Path;
use std::process::Command;

use modula_plugin_db::PluginDescription;
use modula_plugin_host::PluginFormat;

/// Probes one candidate in-process. This is also the entrypoint behind the
/// CLI `probe` subcommand that backs out-of-process scanning.
pub fn probe_candidate(
    format: &dyn PluginFormat,
    candidate: &Path,
) -> Result<Vec<PluginDescription>, String> {
    format
        .scan_candidate(candidate)
        .map_err(|err| err.to_string())
}

/// Probes one candidate by spawning a helper process and parsing the JSON
/// descriptions it prints.
///
/// The call blocks for the subprocess round trip. A crash, non-zero exit or
/// unparsable output is reported as the failure reason for this candidate
/// only; the caller keeps scanning.
pub fn probe_with_helper(
    helper: &Path,
    format_name: &str,
    candidate: &Path,
) -> Result<Vec<PluginDescription>, String> {
    let output = Command::new(helper)
        .arg("probe")
        .arg("--format")
        .arg(format_name)
        .arg(candidate)
        .output()
        .map_err(|err| format!("failed to spawn probe helper: {err}"))?;

    if !output.status.success() {
        return Err(match output.status.code() {
            Some(code) => format!("probe helper exited with status {code}"),
            None => "probe helper was killed by a signal".to_string(),
        });
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|err| format!("unreadable probe helper output: {err}"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use modula_plugin_host::InternalPluginFormat;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn in_process_probe_reports_manifest_errors_as_strings() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("broken.modplug");
        fs::write(&manifest, "{").unwrap();
        let format = InternalPluginFormat::new();
        assert!(probe_candidate(&format, &manifest).is_err());
    }

    #[test]
    fn missing_helper_is_a_failure_not_a_panic() {
        let helper = PathBuf::from("/nonexistent/modula-probe-helper");
        let result = probe_with_helper(&helper, "Modula", Path::new("builtin:"));
        assert!(result.is_err());
    }

    #[test]
    fn helper_output_must_be_json() {
        // `true` exits 0 and prints nothing, which is not a JSON array.
        let result = probe_with_helper(Path::new("true"), "Modula", Path::new("builtin:"));
        assert!(result.unwrap_err().contains("unreadable"));
    }

    #[test]
    fn in_process_probe_passes_descriptions_through() {
        let format = InternalPluginFormat::new();
        let direct = format.scan_candidate(Path::new("builtin:")).unwrap();
        let probed = probe_candidate(&format, Path::new("builtin:")).unwrap();
        assert_eq!(probed, direct);
    }
}
