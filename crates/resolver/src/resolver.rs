//! Bundle graph traversal

use crate::resolution::Resolution;
use drs_errors::Error;
use drs_events::{AppEvent, EventEmitter, EventSender, FailureContext, ResolverEvent};
use drs_net::Transport;
use drs_types::{AuthHeaders, Bundle, ContentRef, DrsObject, ResolutionIssue};
use std::collections::HashSet;
use std::sync::Arc;

/// Walks bundles, fetching by-id references through a [`Transport`]
#[derive(Clone)]
pub struct BundleResolver {
    transport: Arc<dyn Transport>,
    headers: AuthHeaders,
    tx: Option<EventSender>,
}

/// A content reference waiting to be visited
struct Pending {
    content: ContentRef,
    parent_id: String,
}

impl EventEmitter for BundleResolver {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl BundleResolver {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, headers: AuthHeaders) -> Self {
        Self {
            transport,
            headers,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Resolve every blob reachable from `root`
    ///
    /// Never fails as a whole: an id seen twice is skipped with a warning and
    /// a nested reference that cannot be fetched or parsed loses only its own
    /// branch. Both are recorded in the returned issues.
    pub async fn resolve(&self, root: &Bundle) -> Resolution {
        self.emit(AppEvent::Resolver(ResolverEvent::Started {
            root_id: root.id.clone(),
        }));

        let mut resolution = Resolution::default();
        let mut visited: HashSet<String> = HashSet::from([root.id.clone()]);
        let mut stack: Vec<Pending> = Vec::new();
        push_contents(&mut stack, root);

        while let Some(Pending { content, parent_id }) = stack.pop() {
            let id = content.id().to_string();
            if !visited.insert(id.clone()) {
                self.emit(AppEvent::Resolver(ResolverEvent::DuplicateSkipped {
                    id: id.clone(),
                    parent_id: parent_id.clone(),
                }));
                resolution
                    .issues
                    .push(ResolutionIssue::CycleOrDuplicate { id, parent_id });
                continue;
            }

            let object = match content {
                ContentRef::Inline(object) => *object,
                ContentRef::ById { id, name } => match self.fetch(&id).await {
                    Ok(object) => {
                        self.emit(AppEvent::Resolver(ResolverEvent::ObjectFetched {
                            id: id.clone(),
                            parent_id: parent_id.clone(),
                            is_bundle: object.is_bundle(),
                        }));
                        with_fallback_name(object, name)
                    }
                    Err(err) => {
                        self.emit(AppEvent::Resolver(ResolverEvent::BranchFailed {
                            id: id.clone(),
                            parent_id: parent_id.clone(),
                            failure: FailureContext::from_error(&err),
                        }));
                        resolution.issues.push(ResolutionIssue::BranchError {
                            id,
                            parent_id,
                            message: err.to_string(),
                        });
                        continue;
                    }
                },
            };

            match object {
                DrsObject::Blob(blob) => resolution.leaves.push(Arc::new(blob)),
                DrsObject::Bundle(bundle) => push_contents(&mut stack, &bundle),
            }
        }

        self.emit(AppEvent::Resolver(ResolverEvent::Completed {
            root_id: root.id.clone(),
            leaves: resolution.leaves.len(),
            warnings: resolution.warnings(),
            branch_errors: resolution.branch_errors(),
        }));
        resolution
    }

    async fn fetch(&self, id: &str) -> Result<DrsObject, Error> {
        let document = self.transport.fetch_object(id, false, &self.headers).await?;
        Ok(DrsObject::from_json(document)?)
    }
}

/// Push in reverse so the first listed entry is popped first
fn push_contents(stack: &mut Vec<Pending>, bundle: &Bundle) {
    stack.extend(bundle.contents.iter().rev().map(|content| Pending {
        content: content.clone(),
        parent_id: bundle.id.clone(),
    }));
}

/// Keep the name the parent listed when the object has none of its own
fn with_fallback_name(object: DrsObject, listed: Option<String>) -> DrsObject {
    match object {
        DrsObject::Blob(mut blob) if blob.name.is_none() => {
            blob.name = listed;
            DrsObject::Blob(blob)
        }
        other => other,
    }
}
