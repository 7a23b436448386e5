use anyhow::Context;
use microscope::config::{default_config_path, load_config, write_config, MicroscopeConfig, DEFAULT_OUTPUT};
use microscope::serialize::{TurtleReader, TurtleWriter};
use microscope::ui::{self, is_quiet, ProgressManager, ProgressMessage, ProgressPhase};
use microscope::{EntityKey, Error, EventConfig, RouteKind, ScanOptions, Scanner, Snapshot};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Flags of `microscope scan`
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub sequential: bool,
    pub exclude: Vec<String>,
    pub ignore_owner: Vec<String>,
}

impl ScanArgs {
    /// File values first, flags on top
    fn resolve(&self, config: &MicroscopeConfig) -> (ScanOptions, PathBuf) {
        let jobs = if self.sequential {
            Some(1)
        } else {
            self.jobs.or(config.jobs)
        };
        let mut excludes = config.exclude.clone();
        excludes.extend(self.exclude.iter().cloned());
        let mut ignored = config.ignored_owner_prefixes.clone();
        ignored.extend(self.ignore_owner.iter().cloned());

        let output = self
            .output
            .clone()
            .or_else(|| config.output.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let options = ScanOptions::new(&self.path)
            .with_jobs(jobs)
            .with_excludes(excludes)
            .with_ignored_owners(ignored);
        (options, output)
    }
}

pub fn run_scan(args: ScanArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?.unwrap_or_default();
    let (options, output) = args.resolve(&config);
    let quiet = is_quiet();

    if !quiet {
        ui::header("Scanning JVM sources");
        ui::info("Path", &options.root.display().to_string());
        ui::info("Output", &output.display().to_string());
    }

    let (mut progress, tx) = ProgressManager::new();
    let result = Scanner::new(options)
        .with_cancellation(cancel.clone())
        .with_progress(tx.clone())
        .scan();

    let report = match result {
        Ok(report) if !cancel.is_cancelled() => report,
        Ok(_) | Err(Error::Cancelled) => {
            drop(tx);
            progress.join();
            progress.clear();
            anyhow::bail!("scan cancelled, no output written");
        }
        Err(e) => {
            drop(tx);
            progress.join();
            progress.clear();
            return Err(e).with_context(|| format!("scan of {} failed", args.path.display()));
        }
    };

    let _ = tx.send(ProgressMessage::Started {
        phase: ProgressPhase::Writing,
        total: 1,
    });
    let writer = TurtleWriter::new(config.namespaces());
    let written = writer.write_to_file(&report.snapshot, &output);
    let _ = tx.send(ProgressMessage::Finished {
        phase: ProgressPhase::Writing,
    });
    drop(tx);
    progress.join();
    written.with_context(|| format!("failed to write {}", output.display()))?;

    let stats = report.snapshot.stats();
    info!("Scan of {} finished: {}", args.path.display(), stats);
    progress.finish_with_summary(report.elapsed, report.files, stats.nodes(), stats.edges());
    if !quiet {
        ui::section("Knowledge model");
        println!("{}", ui::stats_table(&stats));
        for skipped in &report.skipped_files {
            ui::skipped(skipped);
        }
        ui::success(&format!("Model written to {}", output.display()));
    }
    Ok(())
}

pub fn run_inspect(input: PathBuf, json: bool, method: Option<String>) -> anyhow::Result<()> {
    let snapshot = TurtleReader::new()
        .read_file(&input)
        .with_context(|| format!("failed to read model {}", input.display()))?;
    let stats = snapshot.stats();

    let routes = route_list(&snapshot);
    let configs = config_list(&snapshot);
    let neighbours = match method.as_deref() {
        Some(key) => Some(call_neighbours(&snapshot, key)?),
        None => None,
    };

    if json {
        let routes: Vec<_> = routes
            .iter()
            .map(|(kind, route, method)| {
                serde_json::json!({ "kind": kind, "route": route, "method": method })
            })
            .collect();
        let mut data = serde_json::json!({
            "input": input.display().to_string(),
            "stats": stats,
            "routes": routes,
            "configs": configs
                .iter()
                .map(|(config, node)| {
                    serde_json::json!({ "qualifier": config.qualifier, "queue_url": config.queue_url, "node": node })
                })
                .collect::<Vec<_>>(),
        });
        if let (Some(key), Some((callers, callees))) = (&method, &neighbours) {
            data["method"] = serde_json::json!({ "key": key, "callers": callers, "callees": callees });
        }
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    ui::header(&format!("Model {}", input.display()));
    println!("{}", ui::stats_table(&stats));

    if !routes.is_empty() {
        ui::section("Routes");
        for (kind, route, method) in &routes {
            ui::route_row(*kind, route, method);
        }
    }
    if !configs.is_empty() {
        ui::section("Event configs");
        for (config, node) in &configs {
            let url = config.queue_url.as_deref().unwrap_or("-");
            ui::info(&config.qualifier, &format!("{}  {}", url, ui::dim(node)));
        }
    }
    if let (Some(key), Some((callers, callees))) = (&method, &neighbours) {
        ui::section(key);
        for caller in callers {
            ui::info("called by", caller);
        }
        for callee in callees {
            ui::info("calls", callee);
        }
    }
    Ok(())
}

/// Key strings of the callers and callees of `key`
fn call_neighbours(snapshot: &Snapshot, key: &str) -> anyhow::Result<(Vec<String>, Vec<String>)> {
    let key = EntityKey::parse(key).with_context(|| format!("invalid method key {}", key))?;
    if snapshot.node(&key).is_none() {
        anyhow::bail!("{} is not in the model", key);
    }
    let keys = |entities: Vec<&microscope::Entity>| -> Vec<String> {
        entities.iter().map(|e| e.key.to_key_string()).collect()
    };
    Ok((keys(snapshot.callers(&key)), keys(snapshot.callees(&key))))
}

/// `(config, node key)` pairs in key order
fn config_list(snapshot: &Snapshot) -> Vec<(&EventConfig, String)> {
    snapshot
        .nodes
        .iter()
        .flat_map(|node| node.configs.iter().map(move |config| (config, node.key.to_key_string())))
        .collect()
}

/// `(kind, route, method key)` triples in key order
fn route_list(snapshot: &Snapshot) -> Vec<(RouteKind, String, String)> {
    snapshot
        .nodes
        .iter()
        .flat_map(|node| {
            node.routes
                .iter()
                .map(move |route| (route.kind, route.to_string(), node.key.to_key_string()))
        })
        .collect()
}

pub fn run_init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(default_config_path);
    write_config(&path, &MicroscopeConfig::starter(), force)?;
    ui::success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = MicroscopeConfig {
            output: Some("from-config.ttl".to_string()),
            exclude: vec!["legacy/".to_string()],
            ignored_owner_prefixes: vec!["kotlin.".to_string()],
            jobs: Some(8),
            ..MicroscopeConfig::default()
        };
        let args = ScanArgs {
            path: PathBuf::from("svc"),
            output: Some(PathBuf::from("flag.ttl")),
            sequential: true,
            exclude: vec!["gen/".to_string()],
            ..ScanArgs::default()
        };

        let (options, output) = args.resolve(&config);
        assert_eq!(output, PathBuf::from("flag.ttl"));
        assert!(options.is_sequential());
        assert_eq!(options.excludes, vec!["legacy/".to_string(), "gen/".to_string()]);
        assert_eq!(options.ignored_owner_prefixes, vec!["kotlin.".to_string()]);
    }

    #[test]
    fn test_call_neighbours() {
        let model = microscope::KnowledgeModel::new();
        let caller = model.insert_or_get_node(microscope::Entity::declared(
            EntityKey::method("com.acme.A", "foo", 0),
            "A.java",
        ));
        model.record(
            caller,
            microscope::Entity::referenced(EntityKey::method("com.acme.B", "bar", 0)),
            microscope::EdgeKind::Calls,
            microscope::Confidence::High,
        );
        let snapshot = model.snapshot();

        let (callers, callees) = call_neighbours(&snapshot, "method:com.acme.B.bar(0)").unwrap();
        assert_eq!(callers, vec!["method:com.acme.A.foo(0)".to_string()]);
        assert!(callees.is_empty());
        assert!(call_neighbours(&snapshot, "method:com.acme.C.baz(0)").is_err());
        assert!(call_neighbours(&snapshot, "not a key").is_err());
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let config = MicroscopeConfig {
            output: Some("from-config.ttl".to_string()),
            jobs: Some(3),
            ..MicroscopeConfig::default()
        };
        let args = ScanArgs {
            path: PathBuf::from("svc"),
            ..ScanArgs::default()
        };
        let (options, output) = args.resolve(&config);
        assert_eq!(output, PathBuf::from("from-config.ttl"));
        assert_eq!(options.jobs, Some(3));

        let (_, output) = args.resolve(&MicroscopeConfig::default());
        assert_eq!(output, PathBuf::from(DEFAULT_OUTPUT));
    }
}
