//! Shared mock infrastructure for unit tests.
//!
//! Every mock records what it was asked to do so tests can assert on call
//! order, and can be told to fail on demand.

#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::io::Write as _;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use platform_deploy::application::ports::{
    ArchiveFetcher, CommandRunner, ComposeDriver, ExecContext, HealthCheck, LocalFs, ObjectStore,
    ProgressReporter, ProvisioningTool, ResourceChecker, ResourceError, UpOptions,
};
use platform_deploy::domain::{BackendConfig, ProbeStatus, RemoteResource, StorageUri};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().expect("mock mutex poisoned")
}

// ── Mock: command runner ──────────────────────────────────────────────────────

/// One recorded process invocation.
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

/// Records invocations; exits non-zero when the first argument is listed in
/// `failing`. Logged runs whose first argument is listed in `interrupted`
/// write some output and then error out as if the process timed out.
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<RunnerCall>>>,
    failing: Vec<String>,
    interrupted: Vec<String>,
}

impl RecordingRunner {
    pub fn failing_on(subcommands: &[&str]) -> Self {
        Self {
            failing: subcommands.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn interrupting(subcommands: &[&str]) -> Self {
        Self {
            interrupted: subcommands.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, program: &str, args: &[&str], ctx: Option<&ExecContext<'_>>) -> Output {
        lock(&self.calls).push(RunnerCall {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            cwd: ctx.and_then(|c| c.cwd.map(Path::to_path_buf)),
            envs: ctx.map(|c| c.envs.to_vec()).unwrap_or_default(),
        });
        let first = args.first().copied().unwrap_or_default();
        if self.failing.iter().any(|f| f == first) {
            err_output(format!("{first} exploded").as_bytes())
        } else {
            ok_output(format!("{first} ok").as_bytes())
        }
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        Ok(self.record(program, args, None))
    }

    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        Ok(self.record(program, args, None))
    }

    async fn run_in(&self, program: &str, args: &[&str], ctx: &ExecContext<'_>) -> Result<Output> {
        Ok(self.record(program, args, Some(ctx)))
    }

    async fn run_logged(
        &self,
        program: &str,
        args: &[&str],
        ctx: &ExecContext<'_>,
        log: &Path,
    ) -> Result<ExitStatus> {
        let out = self.record(program, args, Some(ctx));
        let first = args.first().copied().unwrap_or_default();
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(log)?;
        if self.interrupted.iter().any(|i| i == first) {
            writeln!(f, "{first} partial output")?;
            anyhow::bail!("{program} timed out after 3600s");
        }
        f.write_all(&out.stdout)?;
        f.write_all(&out.stderr)?;
        writeln!(f)?;
        Ok(out.status)
    }
}

// ── Mock: provisioning tool ───────────────────────────────────────────────────

/// Records each protocol step as a string (`init bucket/prefix`,
/// `select dev`, `new dev`, `apply`, `destroy`). Steps named in `failing`
/// return an error.
#[derive(Default)]
pub struct MockTool {
    pub calls: Mutex<Vec<String>>,
    failing: Vec<&'static str>,
}

impl MockTool {
    pub fn failing_on(steps: &[&'static str]) -> Self {
        Self {
            calls: Mutex::default(),
            failing: steps.to_vec(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn step(&self, name: &'static str, detail: String) -> Result<()> {
        lock(&self.calls).push(detail);
        if self.failing.contains(&name) {
            anyhow::bail!("{name} failed");
        }
        Ok(())
    }
}

impl ProvisioningTool for MockTool {
    async fn init(&self, backend: &BackendConfig) -> Result<()> {
        self.step("init", format!("init {}/{}", backend.bucket, backend.prefix))
    }

    async fn workspace_select(&self, name: &str) -> Result<()> {
        self.step("select", format!("select {name}"))
    }

    async fn workspace_new(&self, name: &str) -> Result<()> {
        self.step("new", format!("new {name}"))
    }

    async fn apply(&self) -> Result<()> {
        self.step("apply", "apply".into())
    }

    async fn destroy(&self) -> Result<()> {
        self.step("destroy", "destroy".into())
    }
}

// ── Mock: compose ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockCompose {
    pub ups: Mutex<Vec<(PathBuf, UpOptions)>>,
    pub downs: Mutex<Vec<PathBuf>>,
}

impl ComposeDriver for MockCompose {
    async fn up(&self, compose_file: &Path, opts: UpOptions) -> Result<()> {
        lock(&self.ups).push((compose_file.to_path_buf(), opts));
        Ok(())
    }

    async fn down(&self, compose_file: &Path) -> Result<()> {
        lock(&self.downs).push(compose_file.to_path_buf());
        Ok(())
    }
}

// ── Mock: archive fetcher ─────────────────────────────────────────────────────

/// Records downloads and extractions in order. Operations whose URL or
/// archive path contains a string from `failing` return an error.
#[derive(Default)]
pub struct MockFetcher {
    pub events: Mutex<Vec<String>>,
    failing: Vec<&'static str>,
}

impl MockFetcher {
    pub fn failing_on(needles: &[&'static str]) -> Self {
        Self {
            events: Mutex::default(),
            failing: needles.to_vec(),
        }
    }

    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }

    fn event(&self, kind: &str, subject: &str) -> Result<()> {
        lock(&self.events).push(format!("{kind} {subject}"));
        if let Some(needle) = self.failing.iter().find(|n| subject.contains(*n)) {
            anyhow::bail!("{kind} of {needle} failed");
        }
        Ok(())
    }
}

impl ArchiveFetcher for MockFetcher {
    async fn download(&self, url: &str, _dest: &Path) -> Result<()> {
        self.event("download", url)
    }

    async fn extract(&self, archive: &Path, _dest: &Path) -> Result<()> {
        self.event("extract", &archive.display().to_string())
    }
}

// ── Mock: object store ────────────────────────────────────────────────────────

/// In-memory bucket store keyed by `gs://bucket/path`.
#[derive(Default)]
pub struct MemStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_writes: bool,
}

impl MemStore {
    pub fn with(objects: &[(&str, &str)]) -> Self {
        Self {
            objects: Mutex::new(
                objects
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
                    .collect(),
            ),
            fail_writes: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.objects)
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl ObjectStore for MemStore {
    async fn read(&self, uri: &StorageUri) -> Result<Vec<u8>> {
        lock(&self.objects)
            .get(&uri.to_string())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{uri}: no such object"))
    }

    async fn write(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("403 forbidden");
        }
        lock(&self.objects).insert(uri.to_string(), bytes);
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let root = format!("gs://{bucket}/");
        let mut names: Vec<String> = lock(&self.objects)
            .keys()
            .filter_map(|k| k.strip_prefix(&root))
            .filter(|name| name.starts_with(prefix))
            .map(ToString::to_string)
            .collect();
        names.sort();
        Ok(names)
    }
}

// ── Mock: resource checker ────────────────────────────────────────────────────

/// Answers `Ok` unless the resource's display form is in `answers`.
/// Records each lookup.
#[derive(Default)]
pub struct MockChecker {
    pub lookups: Mutex<Vec<String>>,
    /// Project each scoped lookup was made in, in lookup order.
    pub projects: Mutex<Vec<String>>,
    answers: HashMap<String, ResourceError>,
}

impl MockChecker {
    pub fn rejecting(answers: &[(&str, ResourceError)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }

    pub fn projects(&self) -> Vec<String> {
        lock(&self.projects).clone()
    }

    pub fn count(&self, resource: &str) -> usize {
        lock(&self.lookups).iter().filter(|l| *l == resource).count()
    }
}

impl ResourceChecker for MockChecker {
    async fn check(&self, resource: &RemoteResource) -> Result<(), ResourceError> {
        let key = resource.to_string();
        lock(&self.lookups).push(key.clone());
        if let RemoteResource::Scoped { project, .. } = resource {
            lock(&self.projects).push(project.clone());
        }
        match self.answers.get(&key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ── Mock: health check ────────────────────────────────────────────────────────

/// Live unless the root URL has a canned status.
#[derive(Default)]
pub struct MockHealth {
    pub probed: Mutex<Vec<String>>,
    statuses: HashMap<String, ProbeStatus>,
}

impl MockHealth {
    pub fn with(statuses: &[(&str, ProbeStatus)]) -> Self {
        Self {
            probed: Mutex::default(),
            statuses: statuses
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }
}

impl HealthCheck for MockHealth {
    async fn probe(&self, root_url: &str) -> ProbeStatus {
        lock(&self.probed).push(root_url.to_string());
        self.statuses
            .get(root_url)
            .cloned()
            .unwrap_or(ProbeStatus::Live)
    }
}

// ── Mock: local filesystem ────────────────────────────────────────────────────

/// In-memory filesystem. Records writes and permission changes in order as
/// `write <path> <content>` / `chmod <path> <mode>`.
#[derive(Default)]
pub struct MemFs {
    pub files: Mutex<HashMap<PathBuf, String>>,
    pub dirs: Mutex<Vec<PathBuf>>,
    pub modes: Mutex<HashMap<PathBuf, u32>>,
    pub ops: Mutex<Vec<String>>,
}

impl MemFs {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let fs = Self::default();
        lock(&fs.files).extend(
            files
                .iter()
                .map(|(p, c)| (PathBuf::from(p), (*c).to_string())),
        );
        fs
    }

    pub fn file(&self, path: &str) -> Option<String> {
        lock(&self.files).get(Path::new(path)).cloned()
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        lock(&self.modes).get(Path::new(path)).copied()
    }

    pub fn ops(&self) -> Vec<String> {
        lock(&self.ops).clone()
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path) || lock(&self.dirs).iter().any(|d| d == path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        lock(&self.ops).push(format!("mkdir {}", path.display()));
        lock(&self.dirs).push(path.to_path_buf());
        Ok(())
    }

    fn write(&self, path: &Path, content: String) -> Result<()> {
        lock(&self.ops).push(format!("write {} {content}", path.display()));
        lock(&self.files).insert(path.to_path_buf(), content);
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.file(&path.display().to_string())
            .ok_or_else(|| anyhow::anyhow!("{}: no such file", path.display()))
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        lock(&self.ops).push(format!("chmod {} {mode:o}", path.display()));
        lock(&self.modes).insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.read_to_string(from)?;
        lock(&self.ops).push(format!("copy {} {}", from.display(), to.display()));
        lock(&self.files).insert(to.to_path_buf(), content);
        Ok(())
    }
}

// ── Mock: progress reporter ───────────────────────────────────────────────────

/// Collects every message prefixed with its level.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| m.strip_prefix("warn: ").map(ToString::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        lock(&self.messages).push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        lock(&self.messages).push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        lock(&self.messages).push(format!("warn: {message}"));
    }
}
