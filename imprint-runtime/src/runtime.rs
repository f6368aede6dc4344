use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use imprint_core::{EmbeddedFile, Manifest};
use imprint_sync::{reconcile_blocking, ReconcileOptions, ReconcileReport};

use crate::error::RuntimeError;

/// Overrides the destination root. Defaults to the invoking user's home.
pub const BASE_DIR_ENV: &str = "IMPRINT_BASE_DIR";
/// `1`, `true` or `yes` reports changes without writing.
pub const DRY_RUN_ENV: &str = "IMPRINT_DRY_RUN";
/// Positive integer bounding concurrent file units.
pub const MAX_CONCURRENCY_ENV: &str = "IMPRINT_MAX_CONCURRENCY";

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub base_dir: PathBuf,
    pub options: ReconcileOptions,
}

impl RuntimeSettings {
    /// Resolve from the process environment and the user's home directory.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::resolve(|name| std::env::var_os(name), dirs::home_dir())
    }

    /// Resolve from an arbitrary variable lookup; `home` is the fallback
    /// base directory.
    pub fn resolve(
        var: impl Fn(&str) -> Option<OsString>,
        home: Option<PathBuf>,
    ) -> Result<Self, RuntimeError> {
        let base_dir = var(BASE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or(home)
            .ok_or(RuntimeError::BaseDirNotFound(BASE_DIR_ENV))?;

        let dry_run = match var(DRY_RUN_ENV) {
            None => false,
            Some(value) => parse_flag(&value).ok_or(RuntimeError::InvalidSetting {
                name: DRY_RUN_ENV,
                value,
            })?,
        };

        let max_concurrency = match var(MAX_CONCURRENCY_ENV) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or(RuntimeError::InvalidSetting {
                        name: MAX_CONCURRENCY_ENV,
                        value,
                    })?,
            ),
        };

        Ok(RuntimeSettings {
            base_dir,
            options: ReconcileOptions {
                dry_run,
                max_concurrency,
            },
        })
    }
}

/// Entry point of a generated program.
///
/// Exit status: `0` when every file reconciled, `1` when any unit failed,
/// `2` when setup failed and nothing was attempted.
pub fn run(files: &'static [EmbeddedFile]) -> ExitCode {
    init_tracing();

    let settings = match RuntimeSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::from(2);
        }
    };

    match execute(files, &settings) {
        Ok(report) => {
            println!("{}", summary_line(&report, &settings));
            ExitCode::from(exit_status(&report))
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(2)
        }
    }
}

/// Rebuild the manifest from `files`, checking every embedded digest, and
/// reconcile it into the base dir.
pub fn execute(
    files: &[EmbeddedFile],
    settings: &RuntimeSettings,
) -> Result<ReconcileReport, RuntimeError> {
    let manifest = Manifest::from_embedded(files)?;
    tracing::info!(
        "reconciling {} file(s) into {}",
        manifest.len(),
        settings.base_dir.display()
    );
    Ok(reconcile_blocking(
        Arc::new(manifest),
        &settings.base_dir,
        settings.options,
    )?)
}

/// `0` if every unit succeeded, `1` otherwise.
pub fn exit_status(report: &ReconcileReport) -> u8 {
    if report.is_success() {
        0
    } else {
        1
    }
}

fn summary_line(report: &ReconcileReport, settings: &RuntimeSettings) -> String {
    let failed = report.failures().count();
    if settings.options.dry_run {
        format!(
            "[dry-run] {} would be written, {} unchanged, {} failed ({} total) in {}",
            report.would_write(),
            report.unchanged(),
            failed,
            report.len(),
            settings.base_dir.display()
        )
    } else {
        format!(
            "{} written, {} unchanged, {} failed ({} total) in {}",
            report.written(),
            report.unchanged(),
            failed,
            report.len(),
            settings.base_dir.display()
        )
    }
}

fn parse_flag(value: &OsString) -> Option<bool> {
    match value.to_str()?.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Some(false),
        "1" | "true" | "yes" => Some(true),
        _ => None,
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use imprint_core::ManifestError;
    use tempfile::TempDir;

    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    static FILES: &[EmbeddedFile] = &[
        EmbeddedFile {
            identifier: "configGreeting",
            relative_path: "config/greeting",
            content: b"hello",
            digest: HELLO_SHA256,
        },
        EmbeddedFile {
            identifier: "profile",
            relative_path: "profile",
            content: b"hello",
            digest: HELLO_SHA256,
        },
    ];

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn settings(base: &std::path::Path) -> RuntimeSettings {
        RuntimeSettings {
            base_dir: base.to_path_buf(),
            options: ReconcileOptions::default(),
        }
    }

    #[test]
    fn base_dir_prefers_env_over_home() {
        let s = RuntimeSettings::resolve(
            env(&[(BASE_DIR_ENV, "/srv/base")]),
            Some(PathBuf::from("/home/someone")),
        )
        .unwrap();
        assert_eq!(s.base_dir, PathBuf::from("/srv/base"));
        assert_eq!(s.options, ReconcileOptions::default());
    }

    #[test]
    fn empty_base_dir_env_falls_back_to_home() {
        let s = RuntimeSettings::resolve(
            env(&[(BASE_DIR_ENV, "")]),
            Some(PathBuf::from("/home/someone")),
        )
        .unwrap();
        assert_eq!(s.base_dir, PathBuf::from("/home/someone"));
    }

    #[test]
    fn missing_base_dir_is_an_error() {
        let err = RuntimeSettings::resolve(env(&[]), None).unwrap_err();
        assert!(matches!(err, RuntimeError::BaseDirNotFound(_)));
    }

    #[test]
    fn dry_run_and_concurrency_are_parsed() {
        let s = RuntimeSettings::resolve(
            env(&[(DRY_RUN_ENV, "TRUE"), (MAX_CONCURRENCY_ENV, " 8 ")]),
            Some(PathBuf::from("/h")),
        )
        .unwrap();
        assert!(s.options.dry_run);
        assert_eq!(s.options.max_concurrency, Some(8));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        for (name, value) in [
            (DRY_RUN_ENV, "maybe"),
            (MAX_CONCURRENCY_ENV, "0"),
            (MAX_CONCURRENCY_ENV, "many"),
        ] {
            let err = RuntimeSettings::resolve(env(&[(name, value)]), Some(PathBuf::from("/h")))
                .unwrap_err();
            assert!(
                matches!(err, RuntimeError::InvalidSetting { name: n, .. } if n == name),
                "{name}={value}: {err}"
            );
        }
    }

    #[test]
    fn execute_writes_embedded_files_under_base() {
        let base = TempDir::new().unwrap();
        let report = execute(FILES, &settings(base.path())).unwrap();
        assert!(report.is_success());
        assert_eq!(report.written(), 2);
        assert_eq!(
            fs::read(base.path().join(".config").join("greeting")).unwrap(),
            b"hello"
        );
        assert_eq!(fs::read(base.path().join(".profile")).unwrap(), b"hello");
        assert_eq!(exit_status(&report), 0);

        let again = execute(FILES, &settings(base.path())).unwrap();
        assert_eq!(again.unchanged(), 2);
    }

    #[test]
    fn failed_unit_maps_to_exit_code_one() {
        let base = TempDir::new().unwrap();
        fs::write(base.path().join(".config"), b"blocker").unwrap();
        let report = execute(FILES, &settings(base.path())).unwrap();
        assert_eq!(report.failures().count(), 1);
        assert_eq!(exit_status(&report), 1);
        assert_eq!(fs::read(base.path().join(".profile")).unwrap(), b"hello");
    }

    #[test]
    fn corrupt_digest_is_a_setup_error() {
        static BAD: &[EmbeddedFile] = &[EmbeddedFile {
            identifier: "profile",
            relative_path: "profile",
            content: b"hello",
            digest: "not-hex",
        }];
        let base = TempDir::new().unwrap();
        let err = execute(BAD, &settings(base.path())).unwrap_err();
        assert!(matches!(err, RuntimeError::Manifest(_)), "got: {err}");
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn stale_payload_is_a_setup_error() {
        static STALE: &[EmbeddedFile] = &[EmbeddedFile {
            identifier: "profile",
            relative_path: "profile",
            content: b"edited payload",
            digest: HELLO_SHA256,
        }];
        let base = TempDir::new().unwrap();
        for _ in 0..2 {
            let err = execute(STALE, &settings(base.path())).unwrap_err();
            assert!(
                matches!(
                    err,
                    RuntimeError::Manifest(ManifestError::DigestMismatch { .. })
                ),
                "got: {err}"
            );
        }
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn dry_run_summary_mentions_would_write() {
        let base = TempDir::new().unwrap();
        let mut s = settings(base.path());
        s.options.dry_run = true;
        let report = execute(FILES, &s).unwrap();
        let line = summary_line(&report, &s);
        assert!(line.starts_with("[dry-run] 2 would be written"), "got: {line}");
    }
}
