//! Message protocol
//!
//! Tagged JSON request/response envelopes for a host shell driving the
//! engine, plus the [`Session`] handler that guarantees no error escapes
//! uncaught: every failure becomes an `error` (or `diagnostic-error`)
//! response instead of a crash.

use crate::batch::{BatchOrchestrator, BatchReport, MigrationProgress};
use crate::config::EngineConfig;
use crate::engine::MigrationEngine;
use crate::error::EngineError;
use crate::locator::{DeprecatedComponentGroup, InstanceLocator, SearchScope};
use crate::remote::VariablesApi;
use crate::theme::{self, ThemeDiagnostics};
use compass_host::{ComponentKey, DocumentHost, NodeId, VariableHost};
use compass_registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Requests from the shell to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Handshake; answered with `init`
    Ready,
    /// Search a scope for deprecated component instances
    Search {
        /// Scope to search
        scope: SearchScope,
    },
    /// Migrate instances to their replacement
    Migrate {
        /// Instance ids to migrate; accepts a single id or a list
        #[serde(rename = "instanceId", deserialize_with = "node_id_list")]
        instance_ids: Vec<NodeId>,
        /// Explicit target set key; registry default when absent
        #[serde(
            rename = "targetComponentKey",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        target: Option<ComponentKey>,
    },
    /// Cancel the in-flight batch run (takes effect between batches)
    Cancel,
    /// Inventory reachable theme sources
    DiagnoseThemes,
}

/// Accepts `"1:2"` or `["1:2", "3:4"]` for the migrate payload
fn node_id_list<'de, D>(deserializer: D) -> Result<Vec<NodeId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(NodeId),
        Many(Vec<NodeId>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

/// Responses and push messages from the engine to the shell
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    /// Handshake reply carrying the initial document snapshot
    Init {
        /// Number of currently selected nodes
        #[serde(rename = "selectionCount")]
        selection_count: usize,
        /// Name of the current page
        #[serde(rename = "currentPageName")]
        current_page_name: String,
    },
    /// Search finished
    SearchComplete {
        /// Located groups
        groups: Vec<DeprecatedComponentGroup>,
    },
    /// Per-batch progress push during a migration
    MigrationProgress {
        /// Current counters
        progress: MigrationProgress,
    },
    /// Migration run finished
    MigrationComplete {
        /// Final accounting
        report: BatchReport,
    },
    /// Theme diagnostics finished
    DiagnosticComplete {
        /// Collected inventory
        diagnostics: ThemeDiagnostics,
    },
    /// Theme diagnostics failed
    DiagnosticError {
        /// What went wrong
        message: String,
    },
    /// Any other request failure
    Error {
        /// What went wrong
        message: String,
    },
}

/// One shell connection: owns the engine stack and wraps all errors
pub struct Session<H> {
    host: Arc<H>,
    registry: Arc<ComponentRegistry>,
    config: EngineConfig,
    orchestrator: BatchOrchestrator<H>,
    push: Option<mpsc::UnboundedSender<Response>>,
}

impl<H: DocumentHost + VariableHost + 'static> Session<H> {
    /// Create a session over a host, registry, and remote API client
    #[must_use]
    pub fn new(
        host: Arc<H>,
        registry: Arc<ComponentRegistry>,
        config: EngineConfig,
        api: Arc<dyn VariablesApi>,
    ) -> Self {
        let engine = Arc::new(MigrationEngine::new(
            Arc::clone(&host),
            Arc::clone(&registry),
            config.clone(),
            api,
        ));
        Self {
            host,
            registry,
            config,
            orchestrator: BatchOrchestrator::new(engine),
            push: None,
        }
    }

    /// Deliver `migration-progress` pushes over a channel as batches
    /// finish, instead of replaying them in the `migrate` reply
    #[must_use]
    pub fn with_push_channel(mut self, tx: mpsc::UnboundedSender<Response>) -> Self {
        self.push = Some(tx);
        self
    }

    /// Handle a raw JSON request; malformed payloads become `error`
    pub async fn handle_json(&self, raw: &str) -> Vec<Response> {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => vec![Response::Error {
                message: EngineError::BadRequest(e).to_string(),
            }],
        }
    }

    /// Handle one request; never returns an error
    ///
    /// Migration runs yield progress pushes followed by the final report.
    pub async fn handle(&self, request: Request) -> Vec<Response> {
        match self.dispatch(request).await {
            Ok(responses) => responses,
            Err(e) => {
                tracing::error!(error = %e, "request failed");
                vec![Response::Error {
                    message: e.to_string(),
                }]
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Vec<Response>, EngineError> {
        match request {
            Request::Ready => {
                let selection = self.host.selection().await?;
                let page = self.host.current_page().await?;
                Ok(vec![Response::Init {
                    selection_count: selection.len(),
                    current_page_name: page.name,
                }])
            }
            Request::Search { scope } => {
                let locator = InstanceLocator::new(self.host.as_ref(), &self.registry, &self.config);
                let groups = locator.search(scope).await?;
                Ok(vec![Response::SearchComplete { groups }])
            }
            Request::Migrate {
                instance_ids,
                target,
            } => {
                let (tx, mut rx) = mpsc::unbounded_channel();
                // The forwarder runs alongside the batch run, so a
                // configured push channel sees each batch as it lands.
                let forward = async {
                    let mut replay = Vec::new();
                    while let Some(progress) = rx.recv().await {
                        let update = Response::MigrationProgress { progress };
                        match &self.push {
                            Some(push) => {
                                let _ = push.send(update);
                            }
                            None => replay.push(update),
                        }
                    }
                    replay
                };
                let (report, mut responses) = tokio::join!(
                    self.orchestrator.run(instance_ids, target, Some(tx)),
                    forward
                );
                responses.push(Response::MigrationComplete { report });
                Ok(responses)
            }
            Request::Cancel => {
                self.orchestrator.cancel_flag().store(true, Ordering::SeqCst);
                Ok(Vec::new())
            }
            Request::DiagnoseThemes => match theme::diagnose(self.host.as_ref()).await {
                Ok(diagnostics) => Ok(vec![Response::DiagnosticComplete { diagnostics }]),
                Err(e) => Ok(vec![Response::DiagnosticError {
                    message: e.to_string(),
                }]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::NoRemote;
    use compass_test_utils::{button_fixture, sample_registry, ButtonSpec};
    use std::time::Duration;

    fn session(fixture: compass_test_utils::Fixture) -> Session<compass_test_utils::FakeHost> {
        Session::new(
            Arc::new(fixture.host),
            Arc::new(sample_registry()),
            EngineConfig::default()
                .with_batch_pause(Duration::from_millis(0))
                .with_retry_delay(Duration::from_millis(1)),
            Arc::new(NoRemote),
        )
    }

    #[tokio::test]
    async fn ready_answers_init_with_document_snapshot() {
        let fixture = button_fixture();
        let picked = fixture.add_button(ButtonSpec::new("picked"));
        fixture.host.select(vec![picked]);
        let session = session(fixture);

        let responses = session.handle(Request::Ready).await;
        let [Response::Init {
            selection_count,
            current_page_name,
        }] = &responses[..]
        else {
            panic!("expected init, got {responses:?}");
        };
        assert_eq!(*selection_count, 1);
        assert_eq!(current_page_name, "Page 1");
    }

    #[tokio::test]
    async fn search_then_migrate_roundtrip() {
        let fixture = button_fixture();
        fixture.add_button(ButtonSpec::new("one"));
        fixture.add_button(ButtonSpec::new("two"));
        let session = session(fixture);

        let responses = session
            .handle(Request::Search {
                scope: SearchScope::Page,
            })
            .await;
        let [Response::SearchComplete { groups }] = &responses[..] else {
            panic!("expected search-complete, got {responses:?}");
        };
        assert_eq!(groups[0].instance_count, 2);

        let instance_ids: Vec<NodeId> = groups[0]
            .instances
            .iter()
            .map(|i| i.node.id.clone())
            .collect();
        let responses = session
            .handle(Request::Migrate {
                instance_ids,
                target: None,
            })
            .await;

        let Some(Response::MigrationComplete { report }) = responses.last() else {
            panic!("expected migration-complete last, got {responses:?}");
        };
        assert_eq!(report.progress.completed, 2);
        assert!(responses
            .iter()
            .any(|r| matches!(r, Response::MigrationProgress { .. })));
    }

    #[tokio::test]
    async fn push_channel_receives_progress_out_of_band() {
        let fixture = button_fixture();
        let mut instance_ids = Vec::new();
        for i in 0..4 {
            instance_ids.push(fixture.add_button(ButtonSpec::new(format!("b{i}"))));
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = session(fixture).with_push_channel(tx);

        let responses = session
            .handle(Request::Migrate {
                instance_ids,
                target: None,
            })
            .await;

        assert!(
            matches!(&responses[..], [Response::MigrationComplete { .. }]),
            "reply carries only the final report, got {responses:?}"
        );
        let mut pushed = 0;
        while let Ok(update) = rx.try_recv() {
            assert!(matches!(update, Response::MigrationProgress { .. }));
            pushed += 1;
        }
        assert!(pushed >= 1, "progress arrived on the push channel");
    }

    #[tokio::test]
    async fn migrate_payload_accepts_one_id_or_many() {
        let single: Request =
            serde_json::from_str(r#"{"type": "migrate", "instanceId": "12:7"}"#).unwrap();
        let Request::Migrate {
            instance_ids,
            target,
        } = single
        else {
            panic!("expected migrate");
        };
        assert_eq!(instance_ids, vec![NodeId::new("12:7")]);
        assert!(target.is_none());

        let many: Request = serde_json::from_str(
            r#"{"type": "migrate", "instanceId": ["1:1", "2:2"], "targetComponentKey": "abc"}"#,
        )
        .unwrap();
        let Request::Migrate {
            instance_ids,
            target,
        } = many
        else {
            panic!("expected migrate");
        };
        assert_eq!(instance_ids.len(), 2);
        assert_eq!(target, Some(ComponentKey::new("abc")));
    }

    #[tokio::test]
    async fn malformed_json_becomes_error_response() {
        let session = session(button_fixture());
        let responses = session.handle_json("{\"type\": \"launch-missiles\"}").await;
        let [Response::Error { message }] = &responses[..] else {
            panic!("expected error, got {responses:?}");
        };
        assert!(message.contains("malformed request"));
    }

    #[tokio::test]
    async fn request_envelopes_use_kebab_tags() {
        let request: Request =
            serde_json::from_str(r#"{"type": "search", "scope": "page"}"#).unwrap();
        assert!(matches!(
            request,
            Request::Search {
                scope: SearchScope::Page
            }
        ));

        let request: Request = serde_json::from_str(r#"{"type": "diagnose-themes"}"#).unwrap();
        assert!(matches!(request, Request::DiagnoseThemes));

        let request: Request = serde_json::from_str(r#"{"type": "ready"}"#).unwrap();
        assert!(matches!(request, Request::Ready));

        let init = Response::Init {
            selection_count: 2,
            current_page_name: "Page 1".to_string(),
        };
        let json = serde_json::to_string(&init).unwrap();
        assert!(json.contains("\"type\":\"init\""));
        assert!(json.contains("\"selectionCount\":2"));
        assert!(json.contains("\"currentPageName\":\"Page 1\""));
    }

    #[tokio::test]
    async fn diagnose_themes_reports_inventory() {
        let fixture = button_fixture();
        fixture.host.add_local_collection(compass_host::VariableCollection {
            id: "c1".to_string(),
            name: "System Tokens and Themes".to_string(),
            modes: vec![],
        });
        let session = session(fixture);

        let responses = session.handle(Request::DiagnoseThemes).await;
        let [Response::DiagnosticComplete { diagnostics }] = &responses[..] else {
            panic!("expected diagnostic-complete, got {responses:?}");
        };
        assert_eq!(diagnostics.local_collections.len(), 1);
    }
}
