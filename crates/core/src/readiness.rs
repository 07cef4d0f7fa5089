//! Filesystem readiness probes shared by the health endpoint and `doctor`.

use std::fs;
use std::path::Path;

use serde::Serialize;

const PROBE_FILE: &str = ".nomorejokes-write-probe";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadinessCheck {
    pub ready: bool,
    pub detail: String,
}

impl ReadinessCheck {
    fn ready(detail: impl Into<String>) -> Self {
        Self { ready: true, detail: detail.into() }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self { ready: false, detail: detail.into() }
    }
}

pub fn check_template(path: &Path) -> ReadinessCheck {
    match fs::read_to_string(path) {
        Ok(_) => ReadinessCheck::ready(format!("template `{}` is readable", path.display())),
        Err(error) => ReadinessCheck::failed(format!(
            "template `{}` is not readable: {error}",
            path.display()
        )),
    }
}

/// Creates the directory if needed and round-trips a probe file.
pub fn check_output_dir(path: &Path) -> ReadinessCheck {
    if let Err(error) = fs::create_dir_all(path) {
        return ReadinessCheck::failed(format!(
            "output directory `{}` cannot be created: {error}",
            path.display()
        ));
    }

    let probe = path.join(PROBE_FILE);
    match fs::write(&probe, b"ok").and_then(|()| fs::remove_file(&probe)) {
        Ok(()) => {
            ReadinessCheck::ready(format!("output directory `{}` is writable", path.display()))
        }
        Err(error) => ReadinessCheck::failed(format!(
            "output directory `{}` is not writable: {error}",
            path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{check_output_dir, check_template};

    #[test]
    fn template_check_reports_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let missing = check_template(&dir.path().join("absent.html"));
        assert!(!missing.ready);

        let present = dir.path().join("article.html");
        fs::write(&present, "{{ title }}").expect("write template");
        assert!(check_template(&present).ready);
    }

    #[test]
    fn output_dir_check_creates_directory_and_leaves_no_probe() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("blog/posts");

        let check = check_output_dir(&output);

        assert!(check.ready, "{}", check.detail);
        assert!(output.is_dir());
        assert_eq!(fs::read_dir(&output).expect("list").count(), 0);
    }

    #[test]
    fn output_dir_under_a_file_is_not_ready() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("write file");

        assert!(!check_output_dir(&blocker.join("blog")).ready);
    }
}
