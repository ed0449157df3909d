#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension. The file
    /// is removed when the handle drops.
    pub fn create_temp_file(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("actiondispatch_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_file(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_file(content, "json")
    }
}

pub mod doubles {
    use actiondispatch::action::{ActionHooks, HookContext};
    use actiondispatch::controller::{DataAccess, IsolationLevel};
    use actiondispatch::event::{Event, RedirectCode};
    use actiondispatch::validator::ValidationIssue;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    pub type Log = Arc<Mutex<Vec<String>>>;

    pub fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Data-access collaborator that records the transaction bracket.
    pub struct RecordingStore {
        pub log: Log,
        pub fail_commit: bool,
    }

    impl RecordingStore {
        pub fn new(log: &Log) -> Arc<Self> {
            Arc::new(Self {
                log: Arc::clone(log),
                fail_commit: false,
            })
        }

        pub fn failing(log: &Log) -> Arc<Self> {
            Arc::new(Self {
                log: Arc::clone(log),
                fail_commit: true,
            })
        }
    }

    impl DataAccess for RecordingStore {
        fn start_transaction(&self, isolation: Option<IsolationLevel>) -> anyhow::Result<()> {
            let level = isolation.map_or_else(|| "default".to_string(), |l| l.to_string());
            self.log.lock().unwrap().push(format!("begin {level}"));
            Ok(())
        }

        fn commit(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push("commit".to_string());
            if self.fail_commit {
                anyhow::bail!("commit refused");
            }
            Ok(())
        }

        fn rollback(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push("rollback".to_string());
            Ok(())
        }
    }

    /// Hooks that record their invocations and redirect on rejection.
    pub struct RecordingHooks {
        pub log: Log,
        pub reject_target: Option<String>,
    }

    impl RecordingHooks {
        pub fn new(log: &Log) -> Self {
            Self {
                log: Arc::clone(log),
                reject_target: None,
            }
        }

        pub fn redirect_rejects_to(mut self, action: &str) -> Self {
            self.reject_target = Some(action.to_string());
            self
        }

        fn push(&self, entry: impl Into<String>) {
            self.log.lock().unwrap().push(entry.into());
        }
    }

    impl ActionHooks for RecordingHooks {
        fn on_pre_exec(&self, cx: &HookContext<'_>, _event: &mut Event) -> anyhow::Result<()> {
            self.push(format!("pre_exec {}", cx.action().name()));
            Ok(())
        }

        fn on_post_exec(&self, _cx: &HookContext<'_>, _event: &mut Event) -> anyhow::Result<()> {
            self.push("post_exec");
            Ok(())
        }

        fn on_success(&self, _cx: &HookContext<'_>, event: &mut Event) -> anyhow::Result<()> {
            self.push("success");
            event.set_auto_trigger(Event::response(
                actiondispatch::event::ResponseEvent::ok(event.result().cloned()),
            ));
            Ok(())
        }

        fn on_graceful_fail(&self, _cx: &HookContext<'_>, event: &mut Event) -> anyhow::Result<()> {
            self.push("graceful_fail");
            event.redirect("/try-again", RedirectCode::SeeOther);
            Ok(())
        }

        fn on_hard_fail(&self, _cx: &HookContext<'_>, _event: &mut Event, error: &anyhow::Error) {
            self.push(format!("hard_fail {error}"));
        }

        fn on_data_validation_fail(
            &self,
            cx: &HookContext<'_>,
            event: &mut Event,
            issues: &[ValidationIssue],
        ) -> anyhow::Result<()> {
            let fields: Vec<&str> = issues.iter().map(|i| i.location.as_str()).collect();
            self.push(format!("validation_fail {}", fields.join(",")));
            if let Some(target) = &self.reject_target {
                cx.redirect_to_action(event, target, &[] as &[&str])?;
            }
            Ok(())
        }

        fn on_response_200(
            &self,
            _cx: &HookContext<'_>,
            _event: &mut Event,
            result: Option<&Value>,
        ) -> anyhow::Result<()> {
            self.push(format!("response_200 {}", result.cloned().unwrap_or(Value::Null)));
            Ok(())
        }
    }
}
