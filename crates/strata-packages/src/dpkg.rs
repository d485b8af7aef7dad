//! Installed-version resolution through `dpkg-query`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{PackageDiffError, PackageDiffResult};
use crate::traits::VersionResolver;
use crate::types::VersionMap;

const QUERY_FORMAT: &str = "-f=${db:Status-Abbrev}\t${Package}\t${Version}\n";

/// [`VersionResolver`] backed by the dpkg database.
///
/// All names are queried in a single `dpkg-query -W` call. dpkg exits with
/// status 1 when some names are unknown; those map to an empty version, as do
/// packages dpkg remembers but which are not installed (removed with their
/// config files left behind, or purged).
#[derive(Clone, Debug)]
pub struct DpkgResolver {
    program: PathBuf,
    admin_dir: Option<PathBuf>,
}

impl Default for DpkgResolver {
    fn default() -> Self {
        Self {
            program: PathBuf::from("dpkg-query"),
            admin_dir: None,
        }
    }
}

impl DpkgResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query a different dpkg database (e.g. the other root of an A/B system).
    pub fn with_admin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.admin_dir = Some(dir.into());
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl VersionResolver for DpkgResolver {
    fn resolve_versions(&self, names: &[String]) -> PackageDiffResult<VersionMap> {
        if names.is_empty() {
            return Ok(VersionMap::new());
        }
        debug!(count = names.len(), "querying dpkg for installed versions");

        let mut cmd = Command::new(&self.program);
        if let Some(dir) = &self.admin_dir {
            cmd.arg(format!("--admindir={}", dir.display()));
        }
        let output = cmd
            .arg("-W")
            .arg(QUERY_FORMAT)
            .arg("--")
            .args(names)
            .output()
            .map_err(|e| {
                PackageDiffError::Resolution(format!(
                    "cannot run {}: {e}",
                    self.program.display()
                ))
            })?;

        interpret_output(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            names,
        )
    }
}

fn interpret_output(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
    names: &[String],
) -> PackageDiffResult<VersionMap> {
    match code {
        Some(0) => {}
        Some(1) => debug!("some packages are not known to dpkg"),
        other => {
            let status = other.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            return Err(PackageDiffError::Resolution(format!(
                "dpkg-query terminated by {status}: {}",
                stderr.trim()
            )));
        }
    }

    let mut installed: HashMap<&str, &str> = HashMap::new();
    for line in stdout.lines() {
        let mut fields = line.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(status), Some(package), Some(version)) => {
                // Multiarch lists a name once per architecture.
                let slot = installed.entry(package).or_insert("");
                if slot.is_empty() && is_installed(status) {
                    *slot = version.trim();
                }
            }
            _ if line.trim().is_empty() => {}
            _ => warn!(line, "ignoring unexpected dpkg-query output"),
        }
    }

    let versions = names
        .iter()
        .map(|name| {
            // `${Package}` never carries the `:arch` qualifier a query may use.
            let base = name.split(':').next().unwrap_or(name);
            let version = installed
                .get(name.as_str())
                .or_else(|| installed.get(base))
                .copied()
                .unwrap_or_default();
            (name.clone(), version.to_string())
        })
        .collect();
    Ok(versions)
}

/// `${db:Status-Abbrev}` is want/status/error; status `n` (not-installed)
/// and `c` (config-files) leave no package on the system.
fn is_installed(status: &str) -> bool {
    !matches!(status.chars().nth(1), None | Some('n') | Some('c'))
}
