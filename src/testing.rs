//! In-memory platform and reporter for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use crate::core::context::{Context, ContextBuilder};
use crate::core::event::{Interaction, Message, User};
use crate::core::interaction::InteractionContext;
use crate::core::platform::{CommandScope, InteractionResponse, Platform, RemoteCommand};
use crate::core::report::{ErrorContext, FailureReason, Reporter};
use crate::error::{AugurError, Result};
use crate::runtime::config::ClientConfig;

pub struct MockPlatform {
    user: Mutex<Option<User>>,
    sent: Mutex<Vec<(String, String)>>,
    responses: Mutex<Vec<InteractionResponse>>,
    remote: Mutex<Vec<RemoteCommand>>,
    fetches: AtomicUsize,
}

impl MockPlatform {
    /// A connected platform whose own user is the bot `0`.
    pub fn new() -> Self {
        Self {
            user: Mutex::new(Some(User::new("0", "augur").as_bot())),
            sent: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            remote: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_user(&self, user: User) {
        *self.user.lock() = Some(user);
    }

    /// Simulate a connection that is not ready yet.
    pub fn clear_user(&self) {
        *self.user.lock() = None;
    }

    pub fn add_remote_command(&self, id: &str, name: &str, scope: CommandScope) {
        self.remote.lock().push(RemoteCommand {
            id: id.to_string(),
            name: name.to_string(),
            scope,
        });
    }

    /// `(channel, content)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_contents(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, content)| content.clone()).collect()
    }

    pub fn responses(&self) -> Vec<InteractionResponse> {
        self.responses.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn current_user(&self) -> Option<User> {
        self.user.lock().clone()
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        self.sent.lock().push((channel_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn respond(&self, _interaction: &Interaction, response: InteractionResponse) -> Result<()> {
        self.responses.lock().push(response);
        Ok(())
    }

    async fn fetch_application_commands(&self, scope: &CommandScope) -> Result<Vec<RemoteCommand>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let remote = self.remote.lock();
        Ok(remote.iter().filter(|command| &command.scope == scope).cloned().collect())
    }
}

/// Captures reports and interaction failures instead of logging them.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<FailureReason>>,
}

impl RecordingReporter {
    /// `(error, context)` renderings in report order.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().clone()
    }

    pub fn failures(&self) -> Vec<FailureReason> {
        self.failures.lock().clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    fn report(&self, error: &AugurError, context: &ErrorContext) {
        self.reports.lock().push((error.to_string(), context.to_string()));
    }

    async fn interaction_failed(&self, _icx: &InteractionContext, reason: FailureReason) {
        self.failures.lock().push(reason);
    }
}

pub fn test_context() -> (Context, Arc<MockPlatform>, Arc<RecordingReporter>) {
    let platform = Arc::new(MockPlatform::new());
    let reporter = Arc::new(RecordingReporter::default());
    let ctx = ContextBuilder::new()
        .with_config(ClientConfig::default().with_owner("owner"))
        .with_platform(platform.clone())
        .with_reporter(reporter.clone())
        .build()
        .expect("context with a platform always builds");
    (ctx, platform, reporter)
}

/// A direct message in channel `c1`.
pub fn message(author_id: &str, content: &str) -> Message {
    Message::new(User::new(author_id, author_id), "c1", content)
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}
