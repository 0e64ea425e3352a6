use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Represents a Chrome/Chromium executable.
#[derive(Clone, Debug)]
pub enum Chrome {
    /// A directly executable binary.
    Binary { path: PathBuf },
    /// A Flatpak-installed application.
    Flatpak { app_id: String },
}
impl Chrome {
    pub fn discover() -> Result<Self> {
        // Check for direct executables
        let executables = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
        for exe in executables {
            if let Ok(path) = which::which(exe) {
                tracing::debug!(path = %path.display(), "Discovered Chrome executable");
                return Ok(Self::Binary { path });
            }
        }
        tracing::info!("Chrome executable not found in PATH");
        if let Ok(flatpak) = which::which("flatpak") {
            tracing::trace!(flatpak = %flatpak.display(), "Discovered Flatpak on system; searching installed apps");
            // Check Flatpak installations
            let flatpak_apps = ["com.google.Chrome", "org.chromium.Chromium"];
            for app_id in flatpak_apps {
                if Command::new(&flatpak).args(["info", app_id]).output().is_ok_and(|o| o.status.success()) {
                    return Ok(Self::Flatpak { app_id: app_id.to_string() });
                }
            }
        } else {
            tracing::info!("Flatpak not found; skipping containerized Chrome checks.");
        }
        exn::bail!(ErrorKind::ChromeNotFound);
    }

    /// Uses an explicitly configured executable (a path, or a name looked up
    /// in `PATH`).
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match which::which(path) {
            Ok(path) => Ok(Self::Binary { path }),
            Err(_) => exn::bail!(ErrorKind::ChromeMissing(path.to_path_buf())),
        }
    }

    fn command(&self) -> Command {
        match self {
            Self::Binary { path } => Command::new(path),
            Self::Flatpak { app_id } => {
                let mut command = Command::new("flatpak");
                command.args(["run", "--filesystem=host", app_id]);
                command
            },
        }
    }

    /// Prints the HTML file at `input` to a PDF at `output`.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub(crate) fn execute(&self, input: &Path, output: &Path) -> Result<()> {
        let mut print_to = std::ffi::OsString::from("--print-to-pdf=");
        print_to.push(output);
        let mut url = std::ffi::OsString::from("file://");
        url.push(input);
        let result = self
            .command()
            .args(["--headless", "--disable-gpu", "--no-pdf-header-footer"])
            .arg(print_to)
            .arg(url)
            .output()
            .or_raise(|| ErrorKind::Io)?;
        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            tracing::debug!(code, stderr = %String::from_utf8_lossy(&result.stderr), "Chrome failed");
            exn::bail!(ErrorKind::ChromeFailed(code));
        }
        if !output.is_file() {
            tracing::debug!(stderr = %String::from_utf8_lossy(&result.stderr), "Chrome exited without output");
            exn::bail!(ErrorKind::ChromeFailed(-1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable() {
        let err = Chrome::at("/definitely/not/a/chrome").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ChromeMissing(_)));
    }

    #[test]
    fn test_flatpak_command() {
        let chrome = Chrome::Flatpak { app_id: "org.chromium.Chromium".into() };
        let command = chrome.command();
        assert_eq!(command.get_program(), "flatpak");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["run", "--filesystem=host", "org.chromium.Chromium"]);
    }
}
