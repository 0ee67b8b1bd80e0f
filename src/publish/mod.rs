//! Pushing crawl results to a git remote
//!
//! Results are committed from the working directory and force-pushed to the
//! configured branch. Every git invocation is bounded by a timeout. A failed
//! or misconfigured push never fails the run; it is reported as an outcome.

use crate::config::{CrawlMode, RemoteRepoConfig};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default timeout for a single git command in seconds.
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

/// Name of the remote results are pushed to
pub const REMOTE_NAME: &str = "origin";

/// Commit message describing a run
pub fn commit_message(mode: CrawlMode, daily: bool, total_saved: u64) -> String {
    format!(
        "Crawl results: {} mode, daily={}, total={}",
        mode, daily, total_saved
    )
}

/// What happened to the results of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Pushing is switched off
    Disabled,
    /// Pushing is on but cannot be attempted
    Skipped(String),
    Pushed,
    Failed(String),
}

/// Captured result of one git command
#[derive(Debug, Clone)]
struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Runs git inside a working tree
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_path: PathBuf,
    program: String,
    timeout: Duration,
}

impl GitPublisher {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            program: "git".to_string(),
            timeout: Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS),
        }
    }

    /// Uses a different git executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<GitOutput> {
        debug!(args = ?args, "Running git");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.repo_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .with_context(|| format!("git {} timed out", args.join(" ")))?
            .with_context(|| format!("Failed to execute {}", self.program))?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.success {
            bail!("git {} failed: {}", args.join(" "), output.stderr);
        }
        Ok(output.stdout)
    }

    /// Sets the commit identity for this repository only
    pub async fn set_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run_checked(&["config", "user.name", name]).await?;
        self.run_checked(&["config", "user.email", email]).await?;
        info!("Git identity set to {} <{}>", name, email);
        Ok(())
    }

    /// Adds the remote, or points an existing one at `url`
    pub async fn ensure_remote(&self, name: &str, url: &str) -> Result<()> {
        let remotes = self.run_checked(&["remote"]).await?;

        if remotes.split_whitespace().any(|remote| remote == name) {
            self.run_checked(&["remote", "set-url", name, url]).await?;
            info!("Updated remote {} to {}", name, url);
        } else {
            self.run_checked(&["remote", "add", name, url]).await?;
            info!("Added remote {}: {}", name, url);
        }
        Ok(())
    }

    /// Switches to `branch`, creating it when it does not exist
    pub async fn checkout_branch(&self, branch: &str) -> Result<()> {
        let existing = self.run_checked(&["branch", "--list", branch]).await?;

        if existing.is_empty() {
            self.run_checked(&["checkout", "-b", branch]).await?;
            info!("Created branch {}", branch);
        } else {
            self.run_checked(&["checkout", branch]).await?;
            info!("Switched to branch {}", branch);
        }
        Ok(())
    }

    /// Stages the given paths; missing paths are ignored
    pub async fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let existing: Vec<String> = paths
            .iter()
            .filter(|path| self.repo_path.join(path).exists())
            .map(|path| path.display().to_string())
            .collect();

        if existing.is_empty() {
            warn!("Nothing to stage");
            return Ok(());
        }

        let mut args = vec!["add", "--"];
        args.extend(existing.iter().map(String::as_str));
        self.run_checked(&args).await?;
        info!("Staged {}", existing.join(", "));
        Ok(())
    }

    /// Commits staged changes, returning false when there was nothing to commit
    pub async fn commit(&self, message: &str) -> Result<bool> {
        let output = self.run(&["commit", "-m", message]).await?;

        if output.success {
            info!("Committed: {}", message);
            return Ok(true);
        }

        if output.stdout.contains("nothing to commit") || output.stderr.contains("nothing to commit")
        {
            info!("Nothing to commit");
            return Ok(false);
        }

        bail!("git commit failed: {}", output.stderr)
    }

    /// Force-pushes `branch` and sets it as upstream
    pub async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_checked(&["push", "-u", remote, branch, "--force"])
            .await?;
        info!("Pushed to {}/{}", remote, branch);
        Ok(())
    }

    /// Runs the whole publishing sequence
    pub async fn push_results(
        &self,
        config: &RemoteRepoConfig,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<()> {
        info!("Pushing results to {}", config.url);

        if !config.username.is_empty() && !config.email.is_empty() {
            self.set_identity(&config.username, &config.email)
                .await
                .context("Failed to set git identity")?;
        }

        self.ensure_remote(REMOTE_NAME, &config.url)
            .await
            .context("Failed to configure remote")?;
        self.checkout_branch(&config.branch)
            .await
            .context("Failed to check out branch")?;
        self.stage(paths).await.context("Failed to stage results")?;
        self.commit(message).await?;
        self.push(REMOTE_NAME, &config.branch)
            .await
            .context("Failed to push results")?;
        Ok(())
    }
}

/// Publishes results if the configuration asks for it
///
/// # Arguments
///
/// * `config` - Remote repository settings
/// * `repo_path` - Working tree containing the save roots
/// * `paths` - Save roots to stage, relative to `repo_path` or absolute
/// * `message` - Commit message
pub async fn publish_results(
    config: &RemoteRepoConfig,
    repo_path: &Path,
    paths: &[PathBuf],
    message: &str,
) -> PublishOutcome {
    publish_with(&GitPublisher::new(repo_path), config, paths, message).await
}

async fn publish_with(
    publisher: &GitPublisher,
    config: &RemoteRepoConfig,
    paths: &[PathBuf],
    message: &str,
) -> PublishOutcome {
    if !config.enable {
        return PublishOutcome::Disabled;
    }

    if config.url.trim().is_empty() {
        warn!("Remote repository URL not configured, skipping push");
        return PublishOutcome::Skipped("remote url not configured".to_string());
    }

    if config.branch.trim().is_empty() {
        warn!("Remote branch not configured, skipping push");
        return PublishOutcome::Skipped("remote branch not configured".to_string());
    }

    match publisher.push_results(config, paths, message).await {
        Ok(()) => PublishOutcome::Pushed,
        Err(e) => {
            warn!("Failed to push results: {:#}", e);
            PublishOutcome::Failed(format!("{:#}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn remote_config(enable: bool, url: &str) -> RemoteRepoConfig {
        RemoteRepoConfig {
            enable,
            url: url.to_string(),
            ..RemoteRepoConfig::default()
        }
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(
            commit_message(CrawlMode::All, true, 42),
            "Crawl results: all mode, daily=true, total=42"
        );
        assert_eq!(
            commit_message(CrawlMode::Novel, false, 0),
            "Crawl results: novel mode, daily=false, total=0"
        );
    }

    #[tokio::test]
    async fn test_disabled() {
        let outcome = publish_results(
            &remote_config(false, "git@example.com:results.git"),
            Path::new("."),
            &[],
            "msg",
        )
        .await;
        assert_eq!(outcome, PublishOutcome::Disabled);
    }

    #[tokio::test]
    async fn test_missing_url_is_skipped() {
        let outcome = publish_results(&remote_config(true, "  "), Path::new("."), &[], "msg").await;
        assert!(matches!(outcome, PublishOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn test_missing_git_fails_softly() {
        let dir = TempDir::new().unwrap();
        let publisher = GitPublisher::new(dir.path()).with_program("forum-crawler-no-such-git");

        let outcome = publish_with(
            &publisher,
            &remote_config(true, "git@example.com:results.git"),
            &[PathBuf::from("picture")],
            "msg",
        )
        .await;

        match outcome {
            PublishOutcome::Failed(message) => {
                assert!(message.contains("Failed to configure remote"));
                assert!(message.contains("forum-crawler-no-such-git"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
