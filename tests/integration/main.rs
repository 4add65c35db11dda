//! Integration tests for tts-mcp

mod manager_tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tts_mcp::audit::AuditLog;
    use tts_mcp::propagation::{ComputeHook, DependentStatus, HookError, HookTable, SkipReason};
    use tts_mcp::registry::{Registry, RegistryEntry, ROOT_STORE};
    use tts_mcp::session::{SessionManager, SessionRecord, SessionTable};
    use tts_mcp::store::{Document, SqliteTable};
    use tts_mcp::{DataManager, McpError, ManagerOptions};

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn valid_root() -> Document {
        doc(json!({
            "formData": {"potencia_mva": 10, "tensao_at": 138, "tensao_bt": 13.8}
        }))
    }

    async fn open_with(
        temp: &TempDir,
        registry: Registry,
        hooks: HookTable,
        options: ManagerOptions,
    ) -> DataManager {
        let table = SqliteTable::open(temp.path()).await.unwrap();
        DataManager::load(
            registry,
            Arc::new(table),
            hooks,
            options,
            AuditLog::disabled(),
        )
        .await
        .unwrap()
    }

    async fn open(temp: &TempDir, hooks: HookTable) -> DataManager {
        open_with(
            temp,
            Registry::standard().unwrap(),
            hooks,
            ManagerOptions::default(),
        )
        .await
    }

    /// Hook table with a counting hook bound for every computed store of
    /// the standard registry
    fn counting_hooks(registry: &Registry) -> (HookTable, HashMap<String, Arc<AtomicUsize>>) {
        let mut hooks = HookTable::new();
        let mut counters = HashMap::new();
        for entry in registry.entries() {
            let Some(reference) = entry.compute_hook.clone() else {
                continue;
            };
            let counter = Arc::new(AtomicUsize::new(0));
            counters.insert(entry.store_id.clone(), counter.clone());
            hooks = hooks.with_fn(reference, move |_payload| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(doc(json!({"run": n})))
            });
        }
        (hooks, counters)
    }

    fn calls(counters: &HashMap<String, Arc<AtomicUsize>>, id: &str) -> usize {
        counters[id].load(Ordering::SeqCst)
    }

    /// Hook that sleeps past any short timeout
    struct SlowHook(Duration);

    #[async_trait]
    impl ComputeHook for SlowHook {
        async fn compute(&self, _payload: Document) -> Result<Document, HookError> {
            tokio::time::sleep(self.0).await;
            Ok(doc(json!({"late": true})))
        }
    }

    #[tokio::test]
    async fn round_trip_for_every_store() {
        let temp = TempDir::new().unwrap();
        let manager = open(&temp, HookTable::new()).await;

        let ids: Vec<String> = manager.registry().ids().map(str::to_string).collect();
        for id in &ids {
            let value = doc(json!({"note": format!("value of {}", id), "n": [1, 2, 3]}));
            manager.set(id, value.clone()).await.unwrap();
            assert_eq!(manager.get(id).await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let manager = open(&temp, HookTable::new()).await;
            manager.set(ROOT_STORE, valid_root()).await.unwrap();
            manager
                .set("standards", doc(json!({"norm": "IEC 60076"})))
                .await
                .unwrap();
        }

        let manager = open(&temp, HookTable::new()).await;
        assert_eq!(manager.get(ROOT_STORE).await.unwrap(), valid_root());
        assert_eq!(manager.snapshot("standards").await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn version_increments_once_per_write() {
        let temp = TempDir::new().unwrap();
        let manager = open(&temp, HookTable::new()).await;

        manager.set("impulse", doc(json!({"a": 1}))).await.unwrap();
        manager.patch("impulse", doc(json!({"b": 2}))).await.unwrap();
        let outcome = manager.clear("impulse").await.unwrap();
        assert_eq!(outcome.version, 3);
        assert_eq!(manager.snapshot("impulse").await.unwrap().version, 3);

        // rejected by the schema: results must be an object
        let err = manager
            .set("impulse", doc(json!({"results": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidDocument { .. }));
        assert_eq!(manager.snapshot("impulse").await.unwrap().version, 3);
    }

    #[tokio::test]
    async fn patch_merges_form_data_one_level() {
        let temp = TempDir::new().unwrap();
        let manager = open(&temp, HookTable::new()).await;

        manager.set(ROOT_STORE, valid_root()).await.unwrap();
        manager
            .patch(
                ROOT_STORE,
                doc(json!({"formData": {"tensao_at": 230}, "note": "x"})),
            )
            .await
            .unwrap();

        let value = manager.get(ROOT_STORE).await.unwrap();
        assert_eq!(
            value.get("formData"),
            Some(&json!({"potencia_mva": 10, "tensao_at": 230, "tensao_bt": 13.8}))
        );
        assert_eq!(value.get("note"), Some(&json!("x")));
    }

    #[tokio::test]
    async fn guard_blocks_incomplete_root() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let (hooks, counters) = counting_hooks(&registry);
        let manager = open_with(&temp, registry, hooks, ManagerOptions::default()).await;

        let outcome = manager
            .set(ROOT_STORE, doc(json!({"formData": {"potencia_mva": null}})))
            .await
            .unwrap();

        let report = outcome.propagation.unwrap();
        match report.skipped {
            Some(SkipReason::GuardUnmet { missing }) => {
                assert_eq!(missing, vec!["potencia_mva", "tensao_at", "tensao_bt"]);
            }
            other => panic!("expected guard skip, got {:?}", other),
        }
        assert!(counters.values().all(|c| c.load(Ordering::SeqCst) == 0));
    }

    #[tokio::test]
    async fn complete_root_runs_each_direct_dependent_once() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let (hooks, counters) = counting_hooks(&registry);
        let manager = open_with(&temp, registry, hooks, ManagerOptions::default()).await;

        let outcome = manager.set(ROOT_STORE, valid_root()).await.unwrap();
        let report = outcome.propagation.unwrap();
        assert!(report.skipped.is_none());
        assert_eq!(report.outcomes.len(), 7);
        assert_eq!(report.updated().len(), 7);

        for id in report.updated() {
            assert_eq!(calls(&counters, id), 1, "{} ran more than once", id);
        }
        // temperatureRise depends on losses only; losses' write-back does
        // not fan out within this trigger
        assert!(report.outcome("temperatureRise").is_none());
        assert_eq!(calls(&counters, "temperatureRise"), 0);

        let losses = manager.get("losses").await.unwrap();
        assert_eq!(losses.get("results"), Some(&json!({"run": 1})));
        assert_eq!(
            losses.get("basicData"),
            Some(&json!({"potencia_mva": 10, "tensao_at": 138, "tensao_bt": 13.8}))
        );
    }

    #[tokio::test]
    async fn losses_write_recomputes_temperature_rise_from_fresh_results() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let seen = Arc::new(std::sync::Mutex::new(vec![]));
        let log = seen.clone();
        let hooks = HookTable::new()
            .with_fn("losses/process", |_| {
                std::thread::sleep(Duration::from_millis(50));
                Ok(doc(json!({"p0": 42})))
            })
            .with_fn("temperatureRise/process", move |payload| {
                log.lock().unwrap().push(payload);
                Ok(doc(json!({"delta_top_oil": 55})))
            });
        let manager = open_with(&temp, registry, hooks, ManagerOptions::default()).await;

        manager.set(ROOT_STORE, valid_root()).await.unwrap();
        assert!(seen.lock().unwrap().is_empty());

        // processing losses' own change reaches temperatureRise, which then
        // sees the settled losses results and the root's basic data
        let report = manager.propagate_from("losses").await.unwrap();
        assert_eq!(report.updated(), vec!["temperatureRise"]);

        let payloads = seen.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].get("losses"), Some(&json!({"p0": 42})));
        assert_eq!(
            payloads[0].get("basicData"),
            Some(&json!({"potencia_mva": 10, "tensao_at": 138, "tensao_bt": 13.8}))
        );
    }

    #[tokio::test]
    async fn propagation_is_single_level() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new(vec![
            RegistryEntry::new("a").propagates_to(&["b"]),
            RegistryEntry::new("b")
                .depends_on(&["a"])
                .propagates_to(&["c"])
                .with_hook("b/process"),
            RegistryEntry::new("c").depends_on(&["b"]).with_hook("c/process"),
        ])
        .unwrap()
        .with_root("a")
        .unwrap();

        let c_calls = Arc::new(AtomicUsize::new(0));
        let counter = c_calls.clone();
        let hooks = HookTable::new()
            .with_fn("b/process", |_| Ok(doc(json!({"b": 1}))))
            .with_fn("c/process", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(doc(json!({"c": 1})))
            });
        let manager = open_with(&temp, registry, hooks, ManagerOptions::default()).await;

        let outcome = manager.set("a", doc(json!({"x": 1}))).await.unwrap();
        let report = outcome.propagation.unwrap();
        assert_eq!(report.updated(), vec!["b"]);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);

        // processing b's write separately reaches c
        let report = manager.propagate_from("b").await.unwrap();
        assert_eq!(report.updated(), vec!["c"]);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_hook_does_not_fail_the_write() {
        let temp = TempDir::new().unwrap();
        let hooks = HookTable::new()
            .with("impulse/process", SlowHook(Duration::from_secs(5)))
            .with_fn("losses/process", |_| Ok(doc(json!({"p0": 12.5}))));
        let options = ManagerOptions {
            propagation_enabled: true,
            hook_timeout: Duration::from_millis(50),
        };
        let manager =
            open_with(&temp, Registry::standard().unwrap(), hooks, options).await;

        let before = doc(json!({"results": {"old": true}}));
        manager.set("impulse", before.clone()).await.unwrap();

        let outcome = manager.set(ROOT_STORE, valid_root()).await.unwrap();
        let report = outcome.propagation.unwrap();

        assert_eq!(report.outcome("impulse"), Some(&DependentStatus::TimedOut));
        assert!(matches!(
            report.outcome("losses"),
            Some(DependentStatus::Updated { .. })
        ));
        assert_eq!(manager.get(ROOT_STORE).await.unwrap(), valid_root());
        assert_eq!(manager.get("impulse").await.unwrap(), before);
    }

    #[tokio::test]
    async fn failing_hook_leaves_dependent_unchanged() {
        let temp = TempDir::new().unwrap();
        let hooks = HookTable::new().with_fn("impulse/process", |_| {
            Err(HookError::Application("bad tap".to_string()))
        });
        let manager = open(&temp, hooks).await;

        let outcome = manager.set(ROOT_STORE, valid_root()).await.unwrap();
        let report = outcome.propagation.unwrap();
        assert!(matches!(
            report.outcome("impulse"),
            Some(DependentStatus::Failed { .. })
        ));
        assert_eq!(report.outcome("losses"), Some(&DependentStatus::Unbound));
        assert_eq!(manager.snapshot("impulse").await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn disabled_propagation_skips_and_manual_trigger_runs() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let (hooks, counters) = counting_hooks(&registry);
        let manager = open_with(&temp, registry, hooks, ManagerOptions::default()).await;

        manager.disable_propagation();
        let outcome = manager.set(ROOT_STORE, valid_root()).await.unwrap();
        assert_eq!(
            outcome.propagation.unwrap().skipped,
            Some(SkipReason::Disabled)
        );
        assert_eq!(calls(&counters, "losses"), 0);

        let report = manager.propagate_from(ROOT_STORE).await.unwrap();
        assert_eq!(report.updated().len(), 7);
        assert_eq!(calls(&counters, "losses"), 1);

        manager.enable_propagation();
        assert!(manager.propagation_enabled());
    }

    #[tokio::test]
    async fn session_round_trip() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(open(&temp, HookTable::new()).await);
        let table = SqliteTable::open(temp.path()).await.unwrap();
        let sessions = SessionManager::new(manager.clone(), Arc::new(table));

        manager.set(ROOT_STORE, valid_root()).await.unwrap();
        manager
            .set("losses", doc(json!({"results": {"p0": 3.2}})))
            .await
            .unwrap();
        let saved = manager.get_all().await;

        sessions.save("s1", "desc").await.unwrap();
        manager.clear_all().await.unwrap();
        assert!(manager.get("losses").await.unwrap().is_empty());

        let outcome = sessions.restore("s1").await.unwrap();
        assert_eq!(outcome.session_id, "s1");
        assert_eq!(manager.get_all().await, saved);

        let listed = sessions.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description, "desc");
    }

    #[tokio::test]
    async fn session_restore_recomputes_root_dependents() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let (hooks, counters) = counting_hooks(&registry);
        let manager = Arc::new(open_with(&temp, registry, hooks, ManagerOptions::default()).await);
        let table = SqliteTable::open(temp.path()).await.unwrap();
        let sessions = SessionManager::new(manager.clone(), Arc::new(table));

        manager.disable_propagation();
        manager.set(ROOT_STORE, valid_root()).await.unwrap();
        sessions.save("s1", "").await.unwrap();
        manager.clear_all().await.unwrap();
        manager.enable_propagation();

        let outcome = sessions.restore("s1").await.unwrap();
        let reports = &outcome.summary.propagation;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source, ROOT_STORE);
        assert_eq!(reports[0].updated().len(), 7);

        for id in reports[0].updated() {
            assert_eq!(calls(&counters, id), 1, "{} ran {} times", id, calls(&counters, id));
            let value = manager.get(id).await.unwrap();
            assert_eq!(value.get("results"), Some(&json!({"run": 1})), "{}", id);
        }
        assert_eq!(calls(&counters, "temperatureRise"), 0);
    }

    #[tokio::test]
    async fn session_restore_without_root_propagates_from_each_store() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::standard().unwrap();
        let (hooks, counters) = counting_hooks(&registry);
        let manager = Arc::new(open_with(&temp, registry, hooks, ManagerOptions::default()).await);
        let table = Arc::new(SqliteTable::open(temp.path()).await.unwrap());
        let sessions = SessionManager::new(manager.clone(), table.clone());

        let mut stores = std::collections::BTreeMap::new();
        stores.insert("losses".to_string(), doc(json!({"results": {"p0": 7.5}})));
        stores.insert("standards".to_string(), doc(json!({"norm": "IEC"})));
        table
            .put(&SessionRecord::new("partial".to_string(), String::new(), stores))
            .await
            .unwrap();

        let outcome = sessions.restore("partial").await.unwrap();
        assert_eq!(outcome.summary.restored, vec!["losses", "standards"]);

        let sources: Vec<&str> = outcome
            .summary
            .propagation
            .iter()
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources, vec!["losses", "standards"]);
        assert_eq!(
            outcome.summary.propagation[0].updated(),
            vec!["temperatureRise"]
        );
        assert!(outcome.summary.propagation[1].outcomes.is_empty());

        assert_eq!(calls(&counters, "temperatureRise"), 1);
        assert_eq!(calls(&counters, "losses"), 0);
        let rise = manager.get("temperatureRise").await.unwrap();
        assert_eq!(rise.get("results"), Some(&json!({"run": 1})));
    }

    #[tokio::test]
    async fn restoring_missing_session_fails() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(open(&temp, HookTable::new()).await);
        let table = SqliteTable::open(temp.path()).await.unwrap();
        let sessions = SessionManager::new(manager, Arc::new(table));

        let err = sessions.restore("nope").await.unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_distinct_stores() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(open(&temp, HookTable::new()).await);

        let a = doc(json!({"results": {"p0": 1.0}, "tag": "A"}));
        let b = doc(json!({"results": {"u": 95.0}, "tag": "B"}));

        let m1 = manager.clone();
        let v1 = a.clone();
        let t1 = tokio::spawn(async move { m1.set("losses", v1).await });
        let m2 = manager.clone();
        let v2 = b.clone();
        let t2 = tokio::spawn(async move { m2.set("impulse", v2).await });

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        assert_eq!(manager.snapshot("losses").await.unwrap().version, 1);
        assert_eq!(manager.snapshot("impulse").await.unwrap().version, 1);
        assert_eq!(manager.get("losses").await.unwrap(), a);
        assert_eq!(manager.get("impulse").await.unwrap(), b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_patches_to_one_store_are_serialized() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(open(&temp, HookTable::new()).await);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let m = manager.clone();
                tokio::spawn(async move {
                    let mut partial = Document::new();
                    partial.insert(format!("k{}", i), json!(i));
                    m.patch("standards", partial).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let record = manager.snapshot("standards").await.unwrap();
        assert_eq!(record.version, 16);
        assert_eq!(record.value.as_map().len(), 16);
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    const ROOT: &str = r#"{"formData":{"potencia_mva":10,"tensao_at":138,"tensao_bt":13.8}}"#;

    /// Command isolated to a temporary config file and data directory
    fn tts(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("tts-mcp");
        cmd.env_remove("TTS_MCP_CONFIG")
            .env_remove("TTS_MCP_DATA_DIR")
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--data-dir")
            .arg(temp.path().join("data"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("tts-mcp")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("reactive multi-store data manager"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("tts-mcp")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tts-mcp"));
    }

    #[test]
    fn stores_lists_registry() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .arg("stores")
            .assert()
            .success()
            .stdout(predicate::str::contains("transformerInputs"))
            .stdout(predicate::str::contains("temperatureRise"))
            .stdout(predicate::str::contains("11 store(s)"));
    }

    #[test]
    fn set_then_get() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["set", "transformerInputs", ROOT])
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote transformerInputs (v1)"))
            .stdout(predicate::str::contains("no hook bound"));

        tts(&temp)
            .args(["get", "transformerInputs"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"tensao_at\": 138"));

        tts(&temp)
            .args(["get", "transformerInputs", "--meta"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"version\": 1"));
    }

    #[test]
    fn incomplete_root_reports_missing_fields() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args([
                "set",
                "transformerInputs",
                r#"{"formData":{"potencia_mva":10}}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("missing: tensao_at, tensao_bt"));
    }

    #[test]
    fn no_propagate_flag_disables_fan_out() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["--no-propagate", "set", "transformerInputs", ROOT])
            .assert()
            .success()
            .stdout(predicate::str::contains("propagation disabled"));
    }

    #[test]
    fn unknown_store_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["get", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Store 'nope' does not exist"))
            .stderr(predicate::str::contains("tts-mcp stores"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["set", "losses", "[1, 2]"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid document"));
    }

    #[test]
    fn patch_merges() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["set", "standards", r#"{"a":1}"#])
            .assert()
            .success();
        tts(&temp)
            .args(["patch", "standards", r#"{"b":2}"#, "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("standards 2"));
        tts(&temp)
            .args(["get", "standards"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"a\": 1"))
            .stdout(predicate::str::contains("\"b\": 2"));
    }

    #[test]
    fn export_then_import() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("losses.json");

        tts(&temp)
            .args(["set", "losses", r#"{"results":{"p0":4.2}}"#])
            .assert()
            .success();
        tts(&temp)
            .args(["export", "losses", "--output"])
            .arg(&file)
            .assert()
            .success();
        tts(&temp).args(["clear", "losses"]).assert().success();

        tts(&temp)
            .args(["import", "losses"])
            .arg(&file)
            .assert()
            .success();
        tts(&temp)
            .args(["get", "losses"])
            .assert()
            .success()
            .stdout(predicate::str::contains("4.2"));
    }

    #[test]
    fn session_save_list_restore() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["set", "standards", r#"{"norm":"IEC"}"#])
            .assert()
            .success();
        tts(&temp)
            .args(["session", "save", "s1", "-d", "first draft"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Saved session s1"));
        tts(&temp)
            .args(["session", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("s1"))
            .stdout(predicate::str::contains("first draft"));

        tts(&temp).arg("clear-all").assert().success();
        tts(&temp)
            .args(["session", "restore", "s1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Restored session s1"));
        tts(&temp)
            .args(["get", "standards"])
            .assert()
            .success()
            .stdout(predicate::str::contains("IEC"));
    }

    #[test]
    fn invalid_session_id_is_rejected() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["session", "save", "../escape"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid session id"));
    }

    #[test]
    fn backup_then_restore() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("backup.json");

        tts(&temp)
            .args(["set", "standards", r#"{"norm":"NBR"}"#])
            .assert()
            .success();
        tts(&temp)
            .args(["backup", "--output"])
            .arg(&file)
            .assert()
            .success();
        tts(&temp).arg("clear-all").assert().success();

        tts(&temp)
            .arg("restore-backup")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("store(s) restored"));
        tts(&temp)
            .args(["get", "standards"])
            .assert()
            .success()
            .stdout(predicate::str::contains("NBR"));
    }

    #[test]
    fn propagate_json_reports_unbound_hooks() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["--no-propagate", "set", "transformerInputs", ROOT])
            .assert()
            .success();
        tts(&temp)
            .args(["propagate", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"unbound\""));
    }

    #[test]
    fn config_init_set_show() {
        let temp = TempDir::new().unwrap();
        tts(&temp).args(["config", "init"]).assert().success();
        tts(&temp)
            .args(["config", "set", "propagation.hook_timeout_ms", "250"])
            .assert()
            .success();
        tts(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("hook_timeout_ms = 250"))
            .stdout(predicate::str::contains("[propagation]"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        tts(&temp)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }
}
