//! Scanner - Discover sources under a root and walk them into one model
//!
//! Files are walked sequentially or on a rayon pool, each worker owning its own
//! tree-sitter parser. The shared [`KnowledgeModel`] makes the result independent
//! of the order in which units finish.

use crate::adapter::{default_registry, DialectRegistry};
use crate::classify::{default_classifiers, ClassifierRegistry};
use crate::ignore::IgnoreFilter;
use crate::model::{KnowledgeModel, Snapshot};
use crate::resolver::EntityResolver;
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::walker::{WalkStats, Walker};
use crate::{Error, Result};
use crossbeam::channel::Sender;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tree_sitter::Parser;

/// What to scan and how
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    /// Worker threads; `None` uses rayon's default, `Some(1)` walks sequentially
    pub jobs: Option<usize>,
    /// Extra gitignore-style exclude patterns
    pub excludes: Vec<String>,
    pub ignored_owner_prefixes: Vec<String>,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jobs: None,
            excludes: Vec::new(),
            ignored_owner_prefixes: Vec::new(),
        }
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn sequential(self) -> Self {
        self.with_jobs(Some(1))
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn with_ignored_owners(mut self, prefixes: Vec<String>) -> Self {
        self.ignored_owner_prefixes = prefixes;
        self
    }

    pub fn is_sequential(&self) -> bool {
        self.jobs == Some(1)
    }
}

/// A source file selected for walking
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the scan root, with `/` separators
    pub relative: String,
    pub path: PathBuf,
}

/// Outcome of a completed scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub snapshot: Snapshot,
    /// Units walked successfully
    pub files: usize,
    /// Units that could not be read or parsed
    pub skipped_files: Vec<String>,
    pub walk: WalkStats,
    pub elapsed: Duration,
}

/// Discovers and walks the sources under a root
pub struct Scanner {
    options: ScanOptions,
    dialects: DialectRegistry,
    classifiers: ClassifierRegistry,
    resolver: EntityResolver,
    cancel: CancellationToken,
    progress: Option<Sender<ProgressMessage>>,
}

/// Per-unit outcome
enum UnitOutcome {
    Walked(WalkStats),
    Skipped(String),
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        let resolver = EntityResolver::new().with_ignored_owners(options.ignored_owner_prefixes.clone());
        Self {
            options,
            dialects: default_registry(),
            classifiers: default_classifiers(),
            resolver,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Observe `token`; once cancelled no further unit is started
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, sender: Sender<ProgressMessage>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Source files some dialect handles, sorted by relative path
    pub fn discover(&self) -> Result<Vec<SourceFile>> {
        let root = &self.options.root;
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }
        let filter = IgnoreFilter::new(root, &self.options.excludes);

        let mut files = Vec::new();
        for entry in ignore::WalkBuilder::new(root).require_git(false).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if filter.is_ignored(relative, false) || self.dialects.find_dialect(path).is_none() {
                continue;
            }
            files.push(SourceFile {
                relative: relative_string(relative),
                path: path.to_path_buf(),
            });
        }
        files.sort();
        debug!("Discovered {} source files under {}", files.len(), root.display());
        Ok(files)
    }

    /// Discover and walk every source file.
    ///
    /// On cancellation the partial model is dropped and [`Error::Cancelled`]
    /// is returned.
    pub fn scan(&self) -> Result<ScanReport> {
        let started = Instant::now();
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let files = self.discover()?;
        info!("Scanning {} files under {}", files.len(), self.options.root.display());
        self.send(ProgressMessage::Started {
            phase: ProgressPhase::Walking,
            total: files.len(),
        });

        let model = KnowledgeModel::new();
        let walker = Walker::new(&model, &self.resolver, &self.classifiers);
        let outcomes = self.walk_all(&walker, &files)?;
        // a cancel that lands during the last unit still discards the model
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.send(ProgressMessage::Finished {
            phase: ProgressPhase::Walking,
        });

        let mut walk = WalkStats::default();
        let mut skipped_files = Vec::new();
        let mut walked = 0;
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Walked(stats) => {
                    walk += stats;
                    walked += 1;
                }
                UnitOutcome::Skipped(path) => skipped_files.push(path),
            }
        }

        info!(
            "Scanned {} files: {} nodes, {} edges ({} skipped)",
            walked,
            model.node_count(),
            model.edge_count(),
            skipped_files.len()
        );
        let snapshot = model.snapshot();
        debug_assert!(snapshot.is_closed());
        Ok(ScanReport {
            snapshot,
            files: walked,
            skipped_files,
            walk,
            elapsed: started.elapsed(),
        })
    }

    fn walk_all(&self, walker: &Walker<'_>, files: &[SourceFile]) -> Result<Vec<UnitOutcome>> {
        if self.options.is_sequential() {
            let mut parser = Parser::new();
            return files
                .iter()
                .map(|file| self.walk_file(walker, &mut parser, file))
                .collect();
        }

        let run = || {
            files
                .par_iter()
                .map_init(Parser::new, |parser, file| self.walk_file(walker, parser, file))
                .collect::<Result<Vec<_>>>()
        };
        match self.options.jobs {
            Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!("Failed to build a {}-thread pool, using the global pool: {}", jobs, e);
                    run()
                }
            },
            None => run(),
        }
    }

    fn walk_file(&self, walker: &Walker<'_>, parser: &mut Parser, file: &SourceFile) -> Result<UnitOutcome> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(dialect) = self.dialects.find_dialect(&file.path) else {
            return Ok(self.skip(file, "no dialect"));
        };

        let source = match std::fs::read_to_string(&file.path) {
            Ok(source) => source,
            Err(e) => return Ok(self.skip(file, &e.to_string())),
        };
        let outcome = match walker.walk_source(parser, dialect, &source, &file.relative) {
            Ok(stats) => UnitOutcome::Walked(stats),
            Err(e) => return Ok(self.skip(file, &e.to_string())),
        };

        self.send(ProgressMessage::Progress {
            phase: ProgressPhase::Walking,
            file: Some(file.relative.clone()),
        });
        Ok(outcome)
    }

    fn skip(&self, file: &SourceFile, reason: &str) -> UnitOutcome {
        warn!("Skipping {}: {}", file.relative, reason);
        self.send(ProgressMessage::Skipped(file.relative.clone()));
        self.send(ProgressMessage::Progress {
            phase: ProgressPhase::Walking,
            file: None,
        });
        UnitOutcome::Skipped(file.relative.clone())
    }

    fn send(&self, message: ProgressMessage) {
        if let Some(tx) = &self.progress {
            // The receiver may be gone after an interrupted run
            let _ = tx.send(message);
        }
    }
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;
    use crate::identity::EntityKey;
    use crate::serialize::TurtleWriter;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/main/java/com/acme/OrderService.java",
            br#"
package com.acme;

import com.acme.repo.OrderRepository;

public class OrderService {
    private final OrderRepository repo = new OrderRepository();

    public Order place(long id) {
        Order order = new Order(id);
        java.util.Objects.requireNonNull(order);
        repo.save(order);
        audit(order);
        return order;
    }

    private void audit(Order order) {
        System.out.println(order);
    }
}
"#,
        );
        write(
            root,
            "src/main/java/com/acme/Order.java",
            br#"
package com.acme;

public class Order {
    private final long id;
    public Order(long id) { this.id = id; }
    public long total(int a, int b) { return a + b; }
}
"#,
        );
        write(
            root,
            "src/main/kotlin/com/acme/Billing.kt",
            br#"
package com.acme

class Billing(private val service: OrderService) {
    fun bill(id: Long) {
        val order = service.place(id)
        order.total(1, 2)
    }
}

fun helper() = Billing(OrderService())
"#,
        );
        write(root, "target/generated/Ignored.java", b"class Ignored { void x() { y(); } }");
        write(root, "README.md", b"# not a source file");
        dir
    }

    #[test]
    fn test_discover_skips_noise() {
        let dir = corpus();
        let scanner = Scanner::new(ScanOptions::new(dir.path()));
        let files: Vec<String> = scanner.discover().unwrap().into_iter().map(|f| f.relative).collect();
        assert_eq!(
            files,
            vec![
                "src/main/java/com/acme/Order.java",
                "src/main/java/com/acme/OrderService.java",
                "src/main/kotlin/com/acme/Billing.kt",
            ]
        );
    }

    #[test]
    fn test_user_excludes() {
        let dir = corpus();
        let options = ScanOptions::new(dir.path()).with_excludes(vec!["*.kt".to_string()]);
        let files = Scanner::new(options).discover().unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_scan_builds_model() {
        let dir = corpus();
        let report = Scanner::new(ScanOptions::new(dir.path()).sequential()).scan().unwrap();
        assert_eq!(report.files, 3);
        assert!(report.skipped_files.is_empty());
        assert!(report.snapshot.is_closed());

        let snapshot = &report.snapshot;
        let stats = snapshot.stats();
        assert_eq!(stats.classes, 5);
        assert_eq!(stats.methods, 11);
        assert_eq!(stats.declared, 10);
        assert_eq!(stats.calls, 6);
        assert_eq!(stats.instantiations, 4);
        assert_eq!(stats.low_confidence, 2);
        // field initializer in OrderService
        assert_eq!(stats.unscoped, 1);

        let edge = |source: &str, kind: EdgeKind, target: &str| {
            snapshot.edges.iter().any(|e| {
                e.source.to_key_string() == source && e.kind == kind && e.target.to_key_string() == target
            })
        };
        assert!(edge("method:<unscoped>", EdgeKind::Instantiates, "class:com.acme.repo.OrderRepository"));
        assert!(edge("method:com.acme.OrderService.place(1)", EdgeKind::Calls, "method:com.acme.repo.OrderRepository.save(1)"));
        assert!(edge("method:com.acme.OrderService.place(1)", EdgeKind::Calls, "method:com.acme.OrderService.audit(1)"));
        assert!(edge("method:com.acme.OrderService.audit(1)", EdgeKind::Calls, "method:<unresolved>.println(1)"));
        // Kotlin calls into the Java service resolve to the same node
        assert!(edge("method:com.acme.Billing.bill(1)", EdgeKind::Calls, "method:com.acme.OrderService.place(1)"));
        assert!(edge("method:com.acme.BillingKt.helper(0)", EdgeKind::Instantiates, "class:com.acme.Billing"));
        assert!(snapshot.node(&EntityKey::method("com.acme.Order", "<init>", 1)).is_some_and(|n| n.declared));
    }

    #[test]
    fn test_sequential_and_parallel_output_match() {
        let dir = corpus();
        let writer = TurtleWriter::default();

        let sequential = Scanner::new(ScanOptions::new(dir.path()).sequential()).scan().unwrap();
        let parallel = Scanner::new(ScanOptions::new(dir.path()).with_jobs(Some(4))).scan().unwrap();
        let global = Scanner::new(ScanOptions::new(dir.path())).scan().unwrap();

        let expected = writer.render(&sequential.snapshot);
        assert_eq!(writer.render(&parallel.snapshot), expected);
        assert_eq!(writer.render(&global.snapshot), expected);
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = corpus();
        let token = CancellationToken::new();
        token.cancel();
        let result = Scanner::new(ScanOptions::new(dir.path()))
            .with_cancellation(token)
            .scan();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cancelled_mid_scan_discards_model() {
        let dir = corpus();
        let token = CancellationToken::new();
        let watcher = token.clone();
        // rendezvous channel: the scanner cannot get past a unit before the watcher sees it
        let (tx, rx) = crossbeam::channel::bounded(0);

        let result = std::thread::scope(|s| {
            s.spawn(move || {
                for message in rx {
                    if matches!(message, ProgressMessage::Progress { .. }) {
                        watcher.cancel();
                    }
                }
            });
            let scanner = Scanner::new(ScanOptions::new(dir.path()).sequential())
                .with_cancellation(token.clone())
                .with_progress(tx);
            let result = scanner.scan();
            drop(scanner);
            result
        });

        assert!(token.is_cancelled());
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = corpus();
        write(dir.path(), "src/Broken.java", &[0xff, 0xfe, 0x00, 0x80]);
        let (tx, rx) = crossbeam::channel::unbounded();
        let report = Scanner::new(ScanOptions::new(dir.path()).sequential())
            .with_progress(tx)
            .scan()
            .unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.skipped_files, vec!["src/Broken.java".to_string()]);

        let messages: Vec<ProgressMessage> = rx.try_iter().collect();
        assert!(messages.contains(&ProgressMessage::Skipped("src/Broken.java".to_string())));
        let progressed = messages
            .iter()
            .filter(|m| matches!(m, ProgressMessage::Progress { .. }))
            .count();
        assert_eq!(progressed, 4);
    }

    #[test]
    fn test_ignored_owners() {
        let dir = corpus();
        let options = ScanOptions::new(dir.path())
            .sequential()
            .with_ignored_owners(vec!["java.".to_string()]);
        let report = Scanner::new(options).scan().unwrap();
        assert!(report.walk.ignored >= 1);
        assert!(report
            .snapshot
            .nodes
            .iter()
            .all(|n| !n.key.qualified_name.starts_with("java.")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(ScanOptions::new(dir.path().join("missing")));
        assert!(matches!(scanner.scan(), Err(Error::Io(_))));
    }
}
