use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rustkube::KubeConfig;

use crate::backup::{Backup, RollbackGuard};
use crate::kubectl::Runner;
use crate::translate;

/// Settings for one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// The explicitly requested target, forwarded to every kubectl call as `--kubeconfig`.
    pub kubeconfig: Option<PathBuf>,
    pub dry_run: bool,
    pub save_backup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Cluster,
    User,
    Context,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Cluster => "cluster",
            EntityKind::User => "user",
            EntityKind::Context => "context",
        })
    }
}

/// An entity that kubectl accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub kind: EntityKind,
    pub name: String,
}

fn invoke(runner: &mut impl Runner, args: &[String]) -> Result<()> {
    println!("{} {}", runner.program(), translate::display_args(args));
    let output = runner.run(args)?;
    if !output.is_empty() {
        println!("{}", String::from_utf8_lossy(&output).trim_end());
    }
    Ok(())
}

fn apply_all(
    config: &KubeConfig,
    options: &ImportOptions,
    runner: &mut impl Runner,
) -> Result<Vec<Applied>> {
    let kubeconfig = options.kubeconfig.as_deref();
    let mut applied = Vec::with_capacity(config.entity_count());

    for (name, cluster) in &config.clusters {
        invoke(runner, &translate::set_cluster(name, cluster, kubeconfig))
            .with_context(|| format!("setting cluster info: {name}"))?;
        applied.push(Applied {
            kind: EntityKind::Cluster,
            name: name.clone(),
        });
    }
    for (name, user) in &config.users {
        invoke(runner, &translate::set_credentials(name, user, kubeconfig))
            .with_context(|| format!("setting credentials: {name}"))?;
        applied.push(Applied {
            kind: EntityKind::User,
            name: name.clone(),
        });
    }
    for (name, context) in &config.contexts {
        invoke(runner, &translate::set_context(name, context, kubeconfig))
            .with_context(|| format!("setting context: {name}"))?;
        applied.push(Applied {
            kind: EntityKind::Context,
            name: name.clone(),
        });
    }

    Ok(applied)
}

/// Applies every entity of `config` to the kubeconfig at `target`.
///
/// The target is captured first and put back as it was if any kubectl call fails. A dry run
/// echoes the calls through `runner` without taking a backup.
pub fn import(
    config: &KubeConfig,
    target: &Path,
    options: &ImportOptions,
    runner: &mut impl Runner,
) -> Result<Vec<Applied>> {
    if options.dry_run {
        return apply_all(config, options, runner);
    }

    let backup = Backup::capture(target)
        .with_context(|| format!("error on backup: {}", target.display()))?;
    if options.save_backup {
        if let Some(copy) = backup.save_copy()? {
            info!("saved a copy of {} to {}", backup.path().display(), copy.display());
        }
    }

    let guard = RollbackGuard::new(backup);
    let applied = apply_all(config, options, runner)?;
    guard.commit();
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    use crate::kubectl::{DryRun, KubectlError};

    use super::*;

    /// Records every call and appends a line to `target`, like kubectl would modify it.
    struct Recorder {
        target: Option<PathBuf>,
        fail_on: Option<&'static str>,
        calls: Vec<Vec<String>>,
    }

    impl Recorder {
        fn new(target: Option<&Path>) -> Self {
            Self {
                target: target.map(Path::to_path_buf),
                fail_on: None,
                calls: Vec::new(),
            }
        }

        fn failing_on(mut self, subcommand: &'static str) -> Self {
            self.fail_on = Some(subcommand);
            self
        }
    }

    impl Runner for Recorder {
        fn program(&self) -> String {
            "kubectl".to_string()
        }

        fn run(&mut self, args: &[String]) -> Result<Vec<u8>, KubectlError> {
            self.calls.push(args.to_vec());
            if let Some(target) = &self.target {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(target)
                    .unwrap();
                writeln!(file, "{}", args.join(" ")).unwrap();
            }
            if self.fail_on == Some(args[1].as_str()) {
                return Err(KubectlError::Failed {
                    program: "kubectl".into(),
                    subcommand: format!("config {}", args[1]),
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                });
            }
            Ok(b"ok\n".to_vec())
        }
    }

    const SOURCE: &str = r#"
clusters:
- name: c1
  cluster: {server: "https://one"}
- name: c2
  cluster: {server: "https://two"}
users:
- name: u1
  user: {token: abc}
contexts:
- name: x1
  context: {cluster: c1, user: u1}
- name: x2
  context: {cluster: c2, user: u1, namespace: ns}
"#;

    fn source() -> KubeConfig {
        KubeConfig::from_slice(SOURCE.as_bytes()).unwrap()
    }

    #[test]
    fn invokes_once_per_entity_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "").unwrap();

        let mut runner = Recorder::new(None);
        let applied = import(&source(), &target, &ImportOptions::default(), &mut runner).unwrap();

        let seen: Vec<_> = runner
            .calls
            .iter()
            .map(|c| (c[1].as_str(), c[2].as_str()))
            .collect();
        assert_eq!(
            seen,
            [
                ("set-cluster", "c1"),
                ("set-cluster", "c2"),
                ("set-credentials", "u1"),
                ("set-context", "x1"),
                ("set-context", "x2"),
            ]
        );
        assert_eq!(applied.len(), 5);
        assert_eq!(applied[2].kind, EntityKind::User);
    }

    #[test]
    fn explicit_target_is_forwarded_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "").unwrap();
        let options = ImportOptions {
            kubeconfig: Some(target.clone()),
            ..Default::default()
        };

        let mut runner = Recorder::new(None);
        import(&source(), &target, &options, &mut runner).unwrap();

        let flag = format!("--kubeconfig={}", target.display());
        assert_eq!(runner.calls.len(), 5);
        assert!(runner.calls.iter().all(|c| c.last() == Some(&flag)));
    }

    #[test]
    fn target_not_forwarded_unless_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");

        let mut runner = Recorder::new(None);
        import(&source(), &target, &ImportOptions::default(), &mut runner).unwrap();

        assert!(runner
            .calls
            .iter()
            .flatten()
            .all(|arg| !arg.starts_with("--kubeconfig")));
    }

    #[test]
    fn failure_restores_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "apiVersion: v1\nkind: Config\n").unwrap();

        let mut runner = Recorder::new(Some(&target)).failing_on("set-credentials");
        let err = import(&source(), &target, &ImportOptions::default(), &mut runner).unwrap_err();

        assert!(format!("{err:#}").contains("setting credentials: u1"));
        // two clusters, then the failing user; contexts never run
        assert_eq!(runner.calls.len(), 3);
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "apiVersion: v1\nkind: Config\n"
        );
    }

    #[test]
    fn failure_removes_target_that_did_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");

        let mut runner = Recorder::new(Some(&target)).failing_on("set-context");
        assert!(import(&source(), &target, &ImportOptions::default(), &mut runner).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn success_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "").unwrap();

        let mut runner = Recorder::new(Some(&target));
        import(&source(), &target, &ImportOptions::default(), &mut runner).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap().lines().count(), 5);
    }

    #[test]
    fn backup_failure_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let mut runner = Recorder::new(None);
        let err = import(&source(), dir.path(), &ImportOptions::default(), &mut runner).unwrap_err();

        assert!(format!("{err:#}").contains("error on backup"));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn dry_run_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        let options = ImportOptions {
            dry_run: true,
            save_backup: true,
            ..Default::default()
        };

        let applied = import(&source(), &target, &options, &mut DryRun::new("kubectl")).unwrap();

        assert_eq!(applied.len(), 5);
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_source_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("config");
        fs::write(&target, "keep").unwrap();

        let mut runner = Recorder::new(Some(&target));
        let applied = import(
            &KubeConfig::default(),
            &target,
            &ImportOptions::default(),
            &mut runner,
        )
        .unwrap();

        assert!(applied.is_empty());
        assert_eq!(fs::read_to_string(&target).unwrap(), "keep");
    }
}
