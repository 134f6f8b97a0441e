//! git::repository
//!
//! A local working tree and the git operations gitvendor performs on it.
//!
//! # Architecture
//!
//! Commands whose exact argument shape matters (reference resolution, the
//! dirty pipeline, clone/fetch/checkout) are run through the injected
//! [`CommandRunner`]. Read-only inspection that must not spawn a process
//! (is this a working tree? what is HEAD?) uses `git2` in-process.
//!
//! # Error Handling
//!
//! - [`GitError::Command`]: a git subprocess failed
//! - [`GitError::InvalidOid`]: git printed something that is not a commit id
//! - [`GitError::DirtyCheck`]: the untracked listing failed; this is an
//!   environment problem, never a dirty reason
//!
//! # Example
//!
//! ```ignore
//! use gitvendor::git::Repository;
//!
//! let repo = Repository::open_system("/tmp/checkout");
//! let oid = repo.hash_from("origin", "main")?;
//! if repo.dirty()?.is_dirty() {
//!     println!("refusing to overwrite");
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::runner::{argv, CommandFailure, CommandRunner, SystemRunner};
use super::status::{first_failure, DirtyReason, DirtyStatus, INDEX_CHECKS, UNTRACKED_LISTING};
use crate::core::types::{Oid, TypeError};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A git subprocess failed.
    #[error(transparent)]
    Command(#[from] CommandFailure),

    /// Git output was not a full commit id.
    #[error("git returned an invalid commit id: {0}")]
    InvalidOid(#[from] TypeError),

    /// The untracked-file listing itself failed.
    ///
    /// Distinct from [`DirtyReason::Untracked`]: the tooling or the
    /// repository is broken, not merely modified.
    #[error("failure running 'git ls-files -o -d --exclude-standard' at '{path}': {source}")]
    DirtyCheck {
        /// The working tree being inspected
        path: PathBuf,
        /// The failed listing
        source: CommandFailure,
    },

    /// Clone finished but left no working tree behind.
    #[error("failed to clone {uri} into '{path}'")]
    CloneFailed {
        /// The remote that was cloned
        uri: String,
        /// The target working path
        path: PathBuf,
    },

    /// HEAD does not match the commit after checkout.
    #[error("failed to checkout {oid} in '{path}'")]
    CheckoutFailed {
        /// The commit that should be checked out
        oid: Oid,
        /// The working path
        path: PathBuf,
    },

    /// The working tree has no remotes to fetch from.
    #[error("no remote configured in '{path}'")]
    NoRemote {
        /// The working path
        path: PathBuf,
    },

    /// In-process repository inspection failed.
    #[error("cannot read repository at '{path}': {message}")]
    Access {
        /// The working path
        path: PathBuf,
        /// Description from libgit2
        message: String,
    },

    /// Filesystem error preparing the working path.
    #[error("i/o error at '{path}': {source}")]
    Io {
        /// The path being manipulated
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },
}

/// A local working tree.
///
/// The path persists between runs and doubles as a local cache of git
/// objects for its remote.
#[derive(Clone)]
pub struct Repository {
    path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .finish()
    }
}

impl Repository {
    /// Create a repository handle for `path` using `runner` for subprocesses.
    ///
    /// The path need not exist yet.
    pub fn new(path: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            path: path.into(),
            runner,
        }
    }

    /// Create a repository handle that spawns real processes.
    pub fn open_system(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(SystemRunner))
    }

    /// The working path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The runner used for subprocesses.
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    fn git<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Result<String, CommandFailure> {
        let cmd = argv(std::iter::once("git").chain(args));
        self.runner.run(&cmd, &self.path)
    }

    fn open(&self) -> Result<git2::Repository, GitError> {
        git2::Repository::open(&self.path).map_err(|e| GitError::Access {
            path: self.path.clone(),
            message: e.message().to_string(),
        })
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Whether the path is the root of a (non-bare) git working tree.
    ///
    /// Does not search parent directories and does not spawn git.
    pub fn is_git(&self) -> bool {
        match git2::Repository::open(&self.path) {
            Ok(repo) => !repo.is_bare(),
            Err(_) => false,
        }
    }

    /// The commit HEAD points at.
    pub fn head_commit(&self) -> Result<Oid, GitError> {
        let repo = self.open()?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitError::Access {
                path: self.path.clone(),
                message: e.message().to_string(),
            })?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Whether HEAD is exactly `oid`.
    pub fn checked_out(&self, oid: &Oid) -> bool {
        self.head_commit().map(|head| &head == oid).unwrap_or(false)
    }

    /// Whether the object database contains commit `oid`.
    pub fn has_commit(&self, oid: &Oid) -> bool {
        let Ok(repo) = self.open() else {
            return false;
        };
        let found = git2::Oid::from_str(oid.as_str())
            .and_then(|id| repo.find_commit(id))
            .is_ok();
        found
    }

    /// The default remote: "origin" if present, otherwise the first one.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let repo = self.open()?;
        let remotes = repo.remotes().map_err(|e| GitError::Access {
            path: self.path.clone(),
            message: e.message().to_string(),
        })?;

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok(Some("origin".to_string()));
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Names of the configured remotes, empty if the repository cannot be read.
    fn remote_names(&self) -> Vec<String> {
        let Ok(repo) = self.open() else {
            return Vec::new();
        };
        match repo.remotes() {
            Ok(remotes) => remotes.iter().flatten().map(String::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Remote-tracking branch names, grouped by remote.
    ///
    /// Remote names may contain `/`; they are matched against the
    /// configured remotes, longest first.
    pub fn remote_branch_names(&self) -> Result<BTreeMap<String, BTreeSet<String>>, GitError> {
        self.remote_branches_for(self.remote_names())
    }

    fn remote_branches_for(
        &self,
        remotes: Vec<String>,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, GitError> {
        let output = self.git(["branch", "-r", "--no-color"])?;
        let remotes: Vec<&str> = remotes.iter().map(String::as_str).collect();
        Ok(parse_remote_branches(&output, &remotes))
    }

    // =========================================================================
    // Reference Resolution
    // =========================================================================

    /// Resolve `reference` as seen from `remote` to a full commit id.
    ///
    /// A reference that names a branch of `remote` is resolved as
    /// `<remote>/<reference>`, so the remote branch wins over a local branch
    /// or tag of the same name. Annotated tags are peeled to their commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::Command`] if the reference does not resolve to a commit
    /// - [`GitError::InvalidOid`] if git printed anything but a full id
    pub fn hash_from(&self, remote: &str, reference: &str) -> Result<Oid, GitError> {
        let mut remotes = self.remote_names();
        if !remotes.iter().any(|r| r == remote) {
            remotes.push(remote.to_string());
        }
        let branches = self.remote_branches_for(remotes)?;
        let reference = match branches.get(remote) {
            Some(names) if names.contains(reference) => format!("{}/{}", remote, reference),
            _ => reference.to_string(),
        };

        let spec = format!("{}^{{commit}}", reference);
        let output = self.git(["rev-parse", spec.as_str(), "--quiet"])?;
        let oid = Oid::new(output)?;

        debug!(remote, reference = %reference, %oid, "resolved reference");
        Ok(oid)
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Report whether the working tree has local modifications.
    ///
    /// A path that is not a git working tree is reported clean without
    /// running any subprocess. Otherwise the index checks run in order and
    /// the first failure is returned; the untracked listing only runs when
    /// all of them pass.
    ///
    /// # Errors
    ///
    /// Only [`GitError::DirtyCheck`], when the untracked listing cannot run.
    pub fn dirty(&self) -> Result<DirtyStatus, GitError> {
        if !self.is_git() {
            return Ok(DirtyStatus::Clean);
        }

        if let Some(reason) = first_failure(self.runner.as_ref(), &self.path, &INDEX_CHECKS) {
            debug!(path = %self.path.display(), ?reason, "working tree is dirty");
            return Ok(DirtyStatus::Dirty {
                reason,
                path: self.path.clone(),
            });
        }

        let listing = self
            .git(UNTRACKED_LISTING.iter().copied())
            .map_err(|source| GitError::DirtyCheck {
                path: self.path.clone(),
                source,
            })?;

        if listing.trim().is_empty() {
            Ok(DirtyStatus::Clean)
        } else {
            Ok(DirtyStatus::Dirty {
                reason: DirtyReason::Untracked,
                path: self.path.clone(),
            })
        }
    }

    // =========================================================================
    // Mutations (used by the base fetch capability)
    // =========================================================================

    /// Clone `uri` into the working path, which must exist and be empty.
    pub fn clone_from(&self, uri: &str) -> Result<(), GitError> {
        self.git(["clone", uri, ".", "--quiet"])?;
        Ok(())
    }

    /// Fetch from `remote`, optionally including all tags.
    pub fn fetch(&self, remote: &str, tags: bool) -> Result<(), GitError> {
        let mut args = vec!["fetch", remote, "--quiet"];
        if tags {
            args.push("--tags");
        }
        self.git(args)?;
        Ok(())
    }

    /// Check out `reference`, discarding local changes when `force` is set.
    pub fn checkout(&self, reference: &str, force: bool) -> Result<(), GitError> {
        let mut args = vec!["checkout", reference, "--quiet"];
        if force {
            args.push("--force");
        }
        self.git(args)?;
        Ok(())
    }

    /// Discard changes to tracked files.
    pub fn reset_hard(&self) -> Result<(), GitError> {
        self.git(["reset", "--hard", "--quiet"])?;
        Ok(())
    }

    /// Remove untracked and ignored files, including nested repositories.
    pub fn clean(&self) -> Result<(), GitError> {
        self.git(["clean", "-x", "-d", "--force", "--force"])?;
        Ok(())
    }
}

/// Parse `git branch -r` output into branch names per remote.
///
/// Each line is attributed to the longest entry of `remotes` it starts
/// with (as `<remote>/`); lines matching no known remote are split at the
/// first `/`. Symbolic entries (`origin/HEAD -> origin/main`) are skipped.
///
/// ```
/// use gitvendor::git::parse_remote_branches;
///
/// let output = "  origin/HEAD -> origin/main\n  origin/main\n  team/fork/dev\n";
/// let branches = parse_remote_branches(output, &["origin", "team/fork"]);
/// assert!(branches["origin"].contains("main"));
/// assert!(!branches["origin"].contains("HEAD"));
/// assert!(branches["team/fork"].contains("dev"));
/// ```
pub fn parse_remote_branches(
    output: &str,
    remotes: &[&str],
) -> BTreeMap<String, BTreeSet<String>> {
    let mut known: Vec<&str> = remotes.iter().copied().filter(|r| !r.is_empty()).collect();
    known.sort_by_key(|r| std::cmp::Reverse(r.len()));

    let mut branches: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains(" -> ") {
            continue;
        }

        let split = known
            .iter()
            .find_map(|remote| {
                line.strip_prefix(*remote)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .filter(|branch| !branch.is_empty())
                    .map(|branch| (*remote, branch))
            })
            .or_else(|| line.split_once('/'));

        if let Some((remote, branch)) = split {
            if !remote.is_empty() && !branch.is_empty() {
                branches
                    .entry(remote.to_string())
                    .or_default()
                    .insert(branch.to_string());
            }
        }
    }

    branches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every call and answers from a fixed table keyed by subcommand.
    #[derive(Debug, Default)]
    struct FakeGit {
        responses: Vec<(&'static str, Result<&'static str, i32>)>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeGit {
        fn with(responses: Vec<(&'static str, Result<&'static str, i32>)>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn subcommands(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c[1].clone())
                .collect()
        }
    }

    impl CommandRunner for FakeGit {
        fn run(&self, argv: &[String], _cwd: &Path) -> Result<String, CommandFailure> {
            self.calls.lock().unwrap().push(argv.to_vec());
            let response = self
                .responses
                .iter()
                .find(|(sub, _)| argv.get(1).map(String::as_str) == Some(*sub))
                .map(|(_, r)| *r)
                .unwrap_or(Ok(""));
            match response {
                Ok(out) => Ok(out.to_string()),
                Err(code) => Err(CommandFailure {
                    argv: argv.to_vec(),
                    exit_code: Some(code),
                    stderr: "fatal".to_string(),
                }),
            }
        }
    }

    const SHA: &str = "abc123def4567890abc123def4567890abc12345\n";

    fn git_init(dir: &Path) {
        git2::Repository::init(dir).unwrap();
    }

    mod hash_from {
        use super::*;

        #[test]
        fn branch_name_is_qualified_with_remote() {
            let fake = FakeGit::with(vec![
                ("branch", Ok("  origin/main\n  origin/dev\n")),
                ("rev-parse", Ok(SHA)),
            ]);
            let repo = Repository::new("/nonexistent", fake.clone());

            let oid = repo.hash_from("origin", "main").unwrap();
            assert_eq!(oid.as_str(), SHA.trim());

            let calls = fake.calls.lock().unwrap();
            assert_eq!(calls[1], argv(["git", "rev-parse", "origin/main^{commit}", "--quiet"]));
        }

        #[test]
        fn tag_or_sha_passed_through() {
            let fake = FakeGit::with(vec![
                ("branch", Ok("  origin/main\n")),
                ("rev-parse", Ok(SHA)),
            ]);
            let repo = Repository::new("/nonexistent", fake.clone());

            repo.hash_from("origin", "v1.0.0").unwrap();
            let calls = fake.calls.lock().unwrap();
            assert_eq!(calls[1][2], "v1.0.0^{commit}");
        }

        #[test]
        fn branch_of_other_remote_not_rewritten() {
            let fake = FakeGit::with(vec![
                ("branch", Ok("  upstream/main\n")),
                ("rev-parse", Ok(SHA)),
            ]);
            let repo = Repository::new("/nonexistent", fake.clone());

            repo.hash_from("origin", "main").unwrap();
            assert_eq!(fake.calls.lock().unwrap()[1][2], "main^{commit}");
        }

        #[test]
        fn slashed_remote_is_qualified() {
            let fake = FakeGit::with(vec![
                ("branch", Ok("  team/fork/main\n")),
                ("rev-parse", Ok(SHA)),
            ]);
            let repo = Repository::new("/nonexistent", fake.clone());

            repo.hash_from("team/fork", "main").unwrap();
            assert_eq!(fake.calls.lock().unwrap()[1][2], "team/fork/main^{commit}");
        }

        #[test]
        fn unresolvable_is_command_error() {
            let fake = FakeGit::with(vec![("branch", Ok("")), ("rev-parse", Err(1))]);
            let repo = Repository::new("/nonexistent", fake);

            let err = repo.hash_from("origin", "nope").unwrap_err();
            assert!(matches!(err, GitError::Command(CommandFailure { exit_code: Some(1), .. })));
        }

        #[test]
        fn partial_output_rejected() {
            let fake = FakeGit::with(vec![("branch", Ok("")), ("rev-parse", Ok("abc\n"))]);
            let repo = Repository::new("/nonexistent", fake);

            assert!(matches!(
                repo.hash_from("origin", "main"),
                Err(GitError::InvalidOid(_))
            ));
        }
    }

    mod dirty {
        use super::*;

        #[test]
        fn non_repository_is_clean_without_subprocess() {
            let dir = TempDir::new().unwrap();
            let fake = FakeGit::with(vec![]);
            let repo = Repository::new(dir.path(), fake.clone());

            assert_eq!(repo.dirty().unwrap(), DirtyStatus::Clean);
            assert!(fake.calls.lock().unwrap().is_empty());
        }

        #[test]
        fn missing_path_is_clean() {
            let fake = FakeGit::with(vec![]);
            let repo = Repository::new("/definitely/not/here", fake.clone());
            assert!(repo.dirty().unwrap().is_clean());
            assert!(fake.calls.lock().unwrap().is_empty());
        }

        #[test]
        fn unstaged_short_circuits() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let fake = FakeGit::with(vec![("diff-files", Err(1))]);
            let repo = Repository::new(dir.path(), fake.clone());

            let status = repo.dirty().unwrap();
            assert_eq!(status.reason(), Some(DirtyReason::Unstaged));
            assert_eq!(fake.subcommands(), vec!["update-index", "diff-files"]);
        }

        #[test]
        fn uncommitted_reported_after_unstaged_passes() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let fake = FakeGit::with(vec![("diff-index", Err(1))]);
            let repo = Repository::new(dir.path(), fake.clone());

            assert_eq!(repo.dirty().unwrap().reason(), Some(DirtyReason::Uncommitted));
            assert!(!fake.subcommands().contains(&"ls-files".to_string()));
        }

        #[test]
        fn untracked_listing_non_empty() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let fake = FakeGit::with(vec![("ls-files", Ok("new.txt\n"))]);
            let repo = Repository::new(dir.path(), fake.clone());

            assert_eq!(repo.dirty().unwrap().reason(), Some(DirtyReason::Untracked));
            assert_eq!(
                fake.subcommands(),
                vec!["update-index", "diff-files", "diff-index", "ls-files"]
            );
        }

        #[test]
        fn whitespace_listing_is_clean() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let fake = FakeGit::with(vec![("ls-files", Ok("\n  \n"))]);
            let repo = Repository::new(dir.path(), fake);

            assert!(repo.dirty().unwrap().is_clean());
        }

        #[test]
        fn listing_failure_is_fatal() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let fake = FakeGit::with(vec![("ls-files", Err(128))]);
            let repo = Repository::new(dir.path(), fake);

            let err = repo.dirty().unwrap_err();
            assert!(matches!(err, GitError::DirtyCheck { .. }));
            assert!(err.to_string().contains("ls-files"));
        }
    }

    mod mutations {
        use super::*;

        #[test]
        fn argument_shapes() {
            let fake = FakeGit::with(vec![]);
            let repo = Repository::new("/work", fake.clone());

            repo.clone_from("https://example.com/r.git").unwrap();
            repo.fetch("origin", false).unwrap();
            repo.fetch("origin", true).unwrap();
            repo.checkout("abc", true).unwrap();
            repo.reset_hard().unwrap();
            repo.clean().unwrap();

            let calls = fake.calls.lock().unwrap();
            assert_eq!(calls[0], argv(["git", "clone", "https://example.com/r.git", ".", "--quiet"]));
            assert_eq!(calls[1], argv(["git", "fetch", "origin", "--quiet"]));
            assert_eq!(calls[2], argv(["git", "fetch", "origin", "--quiet", "--tags"]));
            assert_eq!(calls[3], argv(["git", "checkout", "abc", "--quiet", "--force"]));
            assert_eq!(calls[4], argv(["git", "reset", "--hard", "--quiet"]));
            assert_eq!(calls[5], argv(["git", "clean", "-x", "-d", "--force", "--force"]));
        }
    }

    mod inspection {
        use super::*;

        #[test]
        fn is_git_does_not_search_parents() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let sub = dir.path().join("sub");
            std::fs::create_dir(&sub).unwrap();

            assert!(Repository::open_system(dir.path()).is_git());
            assert!(!Repository::open_system(&sub).is_git());
        }

        #[test]
        fn unborn_head_is_not_checked_out() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let repo = Repository::open_system(dir.path());
            let oid = Oid::new(SHA).unwrap();

            assert!(repo.head_commit().is_err());
            assert!(!repo.checked_out(&oid));
            assert!(!repo.has_commit(&oid));
        }

        #[test]
        fn default_remote_prefers_origin() {
            let dir = TempDir::new().unwrap();
            let raw = git2::Repository::init(dir.path()).unwrap();
            raw.remote("alpha", "https://example.com/a.git").unwrap();
            let repo = Repository::open_system(dir.path());
            assert_eq!(repo.default_remote().unwrap().as_deref(), Some("alpha"));

            raw.remote("origin", "https://example.com/o.git").unwrap();
            assert_eq!(repo.default_remote().unwrap().as_deref(), Some("origin"));
        }

        #[test]
        fn default_remote_none_when_empty() {
            let dir = TempDir::new().unwrap();
            git_init(dir.path());
            let repo = Repository::open_system(dir.path());
            assert_eq!(repo.default_remote().unwrap(), None);
        }
    }

    mod parse {
        use super::*;

        #[test]
        fn groups_by_remote() {
            let parsed =
                parse_remote_branches("  origin/a\n  origin/feature/x\n  fork/a\n", &["origin"]);
            assert_eq!(parsed.len(), 2);
            assert!(parsed["origin"].contains("feature/x"));
            assert!(parsed["fork"].contains("a"));
        }

        #[test]
        fn slashed_remote_matched_whole() {
            let parsed = parse_remote_branches(
                "  team/fork/main\n  team/other\n  team/fork/feature/x\n",
                &["team", "team/fork"],
            );
            assert_eq!(parsed["team/fork"].len(), 2);
            assert!(parsed["team/fork"].contains("main"));
            assert!(parsed["team/fork"].contains("feature/x"));
            assert!(parsed["team"].contains("other"));
            assert!(!parsed["team"].contains("fork/main"));
        }

        #[test]
        fn empty_output() {
            assert!(parse_remote_branches("", &["origin"]).is_empty());
        }
    }
}
