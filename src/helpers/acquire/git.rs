//! Git checkouts
//!
//! A checkout is cloned once and then left alone: re-running a workflow does
//! not pull, so a rebuild never silently picks up new upstream commits.
//! Pulling is a separate, explicit [`AcquireMode::Update`].

use super::WorkingPayload;
use crate::core::output;
use crate::error::{ProvisionError, Result};
use crate::helpers::internal::cmd::{ProcessRunner, ProcessSpec};
use crate::helpers::internal::fs_utils;
use crate::resolve::PayloadKind;
use std::path::Path;

/// What to do when a checkout already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireMode {
    /// Clone when absent, otherwise use the existing checkout as is.
    #[default]
    CloneIfAbsent,
    /// Clone when absent, otherwise fast-forward it from upstream.
    Update,
}

/// Validate that a URL uses an allowed scheme for git operations.
fn validate_git_url(url: &str) -> Result<()> {
    if url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("git@")
        || url.starts_with("ssh://")
    {
        Ok(())
    } else {
        Err(ProvisionError::InvalidRequest(format!(
            "unsupported git URL scheme: {} (only https://, http://, ssh:// and git@ are supported)",
            url
        )))
    }
}

fn git_failed(repo: &str, reason: String) -> ProvisionError {
    ProvisionError::Fetch {
        url: repo.to_string(),
        reason,
    }
}

fn run_git<R: ProcessRunner + ?Sized>(runner: &R, repo: &str, spec: &ProcessSpec) -> Result<()> {
    let status = runner
        .run(spec)
        .map_err(|e| git_failed(repo, format!("failed to run git: {}", e)))?;
    if !status.success() {
        return Err(git_failed(
            repo,
            format!("`{}` exited with code {:?}", spec, status.code()),
        ));
    }
    Ok(())
}

/// State of the checkout directory before acquiring.
enum Existing {
    Absent,
    Checkout,
}

/// Inspect `dest` without modifying it.
///
/// An existing `.git` directory must have a resolvable HEAD. Anything else at
/// `dest` is an error naming the path; a directory is never deleted here.
fn inspect<R: ProcessRunner + ?Sized>(runner: &R, repo: &str, dest: &Path) -> Result<Existing> {
    if !dest.exists() || is_empty_dir(dest) {
        return Ok(Existing::Absent);
    }
    if !dest.join(".git").exists() {
        return Err(git_failed(
            repo,
            format!(
                "{} exists but is not a git checkout; move it away to clone",
                dest.display()
            ),
        ));
    }

    let verify = ProcessSpec::new("git")
        .arg("-C")
        .arg(dest)
        .args(["rev-parse", "--quiet", "HEAD"]);
    let status = runner.run(&verify).map_err(|e| {
        git_failed(
            repo,
            format!("failed to run git in {}: {}", dest.display(), e),
        )
    })?;
    if !status.success() {
        return Err(git_failed(
            repo,
            format!(
                "checkout at {} is not usable (`{}` exited with code {:?}); \
                 repair or remove it to clone again",
                dest.display(),
                verify,
                status.code()
            ),
        ));
    }
    Ok(Existing::Checkout)
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Obtain a checkout of `repo` at `dest`.
///
/// An existing checkout is left as it is, or fast-forwarded in
/// [`AcquireMode::Update`]. A checkout git cannot read is reported, not
/// replaced.
pub fn acquire_checkout<R: ProcessRunner + ?Sized>(
    runner: &R,
    repo: &str,
    dest: &Path,
    mode: AcquireMode,
) -> Result<WorkingPayload> {
    validate_git_url(repo)?;

    if let Existing::Checkout = inspect(runner, repo, dest)? {
        if mode == AcquireMode::Update {
            output::detail(&format!("git pull --ff-only in {}", dest.display()));
            let pull = ProcessSpec::new("git")
                .arg("-C")
                .arg(dest)
                .args(["pull", "--ff-only"]);
            run_git(runner, repo, &pull)?;
        } else {
            output::detail(&format!("{} already cloned, not updating", dest.display()));
        }
        return Ok(WorkingPayload::new(dest, PayloadKind::Checkout));
    }

    fs_utils::ensure_parent_dir(dest)?;
    output::detail(&format!("git clone {} {}", repo, dest.display()));
    let clone = ProcessSpec::new("git").args(["clone", repo]).arg(dest);
    run_git(runner, repo, &clone)?;

    output::detail(&format!("cloned into {}", dest.display()));
    Ok(WorkingPayload::new(dest, PayloadKind::Checkout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::internal::cmd::ExitStatus;
    use std::cell::RefCell;

    /// Pretends to be git: `clone` creates `<dest>/.git`, `rev-parse` succeeds
    /// unless told otherwise.
    struct FakeGit {
        calls: RefCell<Vec<Vec<String>>>,
        head_resolves: bool,
        clone_exit: i32,
        installed: bool,
    }

    impl FakeGit {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                head_resolves: true,
                clone_exit: 0,
                installed: true,
            }
        }

        fn count(&self, verb: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|args| args.iter().any(|a| a == verb))
                .count()
        }
    }

    impl ProcessRunner for FakeGit {
        fn run(&self, spec: &ProcessSpec) -> std::io::Result<ExitStatus> {
            let args = spec.args_lossy();
            self.calls.borrow_mut().push(args.clone());
            if !self.installed {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "git not found",
                ));
            }
            if args.first().map(String::as_str) == Some("clone") {
                if self.clone_exit == 0 {
                    std::fs::create_dir_all(Path::new(&args[2]).join(".git"))?;
                }
                return Ok(ExitStatus::from_code(self.clone_exit));
            }
            if args.iter().any(|a| a == "rev-parse") {
                return Ok(ExitStatus::from_code(if self.head_resolves { 0 } else { 128 }));
            }
            Ok(ExitStatus::from_code(0))
        }
    }

    const REPO: &str = "https://github.com/datastax/cpp-driver.git";

    #[test]
    fn test_second_acquire_does_not_clone() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("cpp-driver");
        let git = FakeGit::new();

        acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap();
        assert_eq!(git.count("clone"), 1);

        let payload = acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap();
        assert_eq!(git.count("clone"), 1);
        assert_eq!(git.count("pull"), 0);
        assert_eq!(payload.path, dest);
    }

    #[test]
    fn test_update_mode_pulls_existing_checkout() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("cpp-driver");
        std::fs::create_dir_all(dest.join(".git")).unwrap();
        let git = FakeGit::new();

        acquire_checkout(&git, REPO, &dest, AcquireMode::Update).unwrap();
        assert_eq!(git.count("clone"), 0);
        assert_eq!(git.count("pull"), 1);
    }

    /// A checkout with a build tree and local edits.
    fn existing_checkout(root: &Path) -> std::path::PathBuf {
        let dest = root.join("cpp-driver");
        std::fs::create_dir_all(dest.join(".git")).unwrap();
        std::fs::create_dir_all(dest.join("build")).unwrap();
        std::fs::write(dest.join("local-patch.diff"), b"--- a\n+++ b\n").unwrap();
        dest
    }

    #[test]
    fn test_unusable_checkout_is_reported_and_kept() {
        let temp = tempfile::tempdir().unwrap();
        let dest = existing_checkout(temp.path());
        let git = FakeGit {
            head_resolves: false,
            ..FakeGit::new()
        };

        let err = acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap_err();
        match err {
            ProvisionError::Fetch { reason, .. } => {
                assert!(reason.contains(&dest.display().to_string()), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(git.count("clone"), 0);
        assert!(dest.join("local-patch.diff").exists());
        assert!(dest.join("build").is_dir());
    }

    #[test]
    fn test_missing_git_keeps_existing_checkout() {
        let temp = tempfile::tempdir().unwrap();
        let dest = existing_checkout(temp.path());
        let git = FakeGit {
            installed: false,
            ..FakeGit::new()
        };

        let err = acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap_err();
        match err {
            ProvisionError::Fetch { reason, .. } => {
                assert!(reason.contains("git not found"), "{reason}");
                assert!(reason.contains(&dest.display().to_string()), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dest.join(".git").is_dir());
        assert!(dest.join("build").is_dir());
        assert!(dest.join("local-patch.diff").exists());
    }

    #[test]
    fn test_non_checkout_directory_is_not_touched() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("cpp-driver");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("notes.txt"), b"mine").unwrap();
        let git = FakeGit::new();

        let err = acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap_err();
        assert!(matches!(err, ProvisionError::Fetch { .. }));
        assert!(git.calls.borrow().is_empty());
        assert!(dest.join("notes.txt").exists());
    }

    #[test]
    fn test_empty_directory_is_cloned_into() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("cpp-driver");
        std::fs::create_dir_all(&dest).unwrap();
        let git = FakeGit::new();

        acquire_checkout(&git, REPO, &dest, AcquireMode::CloneIfAbsent).unwrap();
        assert_eq!(git.count("clone"), 1);
    }

    #[test]
    fn test_clone_failure_is_fetch_error() {
        let temp = tempfile::tempdir().unwrap();
        let git = FakeGit {
            clone_exit: 128,
            ..FakeGit::new()
        };
        let err = acquire_checkout(
            &git,
            REPO,
            &temp.path().join("cpp-driver"),
            AcquireMode::CloneIfAbsent,
        )
        .unwrap_err();
        match err {
            ProvisionError::Fetch { url, reason } => {
                assert_eq!(url, REPO);
                assert!(reason.contains("128"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let git = FakeGit::new();
        let result = acquire_checkout(
            &git,
            "file:///etc",
            Path::new("/tmp/x"),
            AcquireMode::CloneIfAbsent,
        );
        assert!(matches!(result, Err(ProvisionError::InvalidRequest(_))));
        assert!(git.calls.borrow().is_empty());
    }
}
