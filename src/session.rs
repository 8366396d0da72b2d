use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::model::{self, Turn};

/// Normalized outcome of one remote call. Failures travel as ordinary data
/// so callers render them instead of handling errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success(String),
    Error(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(text) => write!(f, "{text}"),
            Self::Error(description) => write!(f, "Error: {description}"),
        }
    }
}

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

/// The remote generation capability. Tests substitute a deterministic stub.
pub trait GenerateBackend {
    fn generate<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        turns: &'a [Turn],
    ) -> GenerateFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiBackend;

impl GenerateBackend for GeminiBackend {
    fn generate<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        turns: &'a [Turn],
    ) -> GenerateFuture<'a> {
        Box::pin(model::generate(client, cfg, turns))
    }
}

/// Binding to the remote model plus at most one live conversation.
pub struct Session<'a, B = GeminiBackend> {
    client: &'a Client,
    cfg: &'a Config,
    backend: B,
    conversation: Option<Vec<Turn>>,
}

impl<'a> Session<'a, GeminiBackend> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self::with_backend(client, cfg, GeminiBackend)
    }
}

impl<'a, B> Session<'a, B>
where
    B: GenerateBackend,
{
    pub fn with_backend(client: &'a Client, cfg: &'a Config, backend: B) -> Self {
        Self {
            client,
            cfg,
            backend,
            conversation: None,
        }
    }

    pub fn conversation(&self) -> Option<&[Turn]> {
        self.conversation.as_deref()
    }

    /// Installs a fresh empty conversation, discarding any existing one.
    pub fn start_conversation(&mut self) {
        debug!("starting a new conversation");
        self.conversation = Some(Vec::new());
    }

    /// One stateless request carrying only `message`, no prior turns.
    pub async fn send_once(&self, message: &str) -> Response {
        let Some(message) = non_blank(message) else {
            return Response::Error(EMPTY_MESSAGE.to_string());
        };

        let turns = [Turn::user(message)];
        match self.backend.generate(self.client, self.cfg, &turns).await {
            Ok(text) => Response::Success(text),
            Err(err) => Response::Error(format!("{err:#}")),
        }
    }

    /// Appends `message` as the next turn of the conversation, starting one
    /// if none exists. A failed exchange is rolled back so it leaves no
    /// partial turn behind.
    pub async fn send_in_conversation(&mut self, message: &str) -> Response {
        let Some(message) = non_blank(message) else {
            return Response::Error(EMPTY_MESSAGE.to_string());
        };

        if self.conversation.is_none() {
            self.start_conversation();
        }
        let history = self.conversation.get_or_insert_with(Vec::new);
        history.push(Turn::user(message));

        match self.backend.generate(self.client, self.cfg, history).await {
            Ok(text) => {
                history.push(Turn::model(text.clone()));
                Response::Success(text)
            }
            Err(err) => {
                history.pop();
                Response::Error(format!("{err:#}"))
            }
        }
    }
}

const EMPTY_MESSAGE: &str = "Message is empty, nothing was sent";

fn non_blank(message: &str) -> Option<&str> {
    let trimmed = message.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use std::cell::RefCell;

    use super::{GenerateBackend, GenerateFuture, Response, Session};
    use crate::config::{ApiKey, Config};
    use crate::model::{Role, Turn};

    #[derive(Debug)]
    enum StubOutcome {
        Ok(String),
        Err(String),
        /// Fails on the call numbered by the first field (1-based),
        /// succeeds with the string otherwise.
        FailOnCall(usize, String),
    }

    struct StubBackend {
        calls: RefCell<Vec<Vec<Turn>>>,
        outcome: StubOutcome,
    }

    impl StubBackend {
        fn ok(text: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Ok(text.into()),
            }
        }

        fn err(message: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Err(message.into()),
            }
        }

        fn fail_on_call(n: usize, text: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::FailOnCall(n, text.into()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl GenerateBackend for StubBackend {
        fn generate<'a>(
            &'a self,
            _client: &'a reqwest::Client,
            _cfg: &'a Config,
            turns: &'a [Turn],
        ) -> GenerateFuture<'a> {
            self.calls.borrow_mut().push(turns.to_vec());
            let call_number = self.calls.borrow().len();
            let result = match &self.outcome {
                StubOutcome::Ok(text) => Ok(text.clone()),
                StubOutcome::Err(message) => Err(anyhow!(message.clone())),
                StubOutcome::FailOnCall(n, text) => {
                    if call_number == *n {
                        Err(anyhow!("stubbed failure"))
                    } else {
                        Ok(text.clone())
                    }
                }
            };
            Box::pin(async move { result })
        }
    }

    fn test_config() -> Config {
        Config {
            model: "gemini-pro".to_string(),
            api_base_url: "http://localhost:0".to_string(),
            request_timeout_secs: 60,
            api_key: Some(ApiKey::new("test-key")),
        }
    }

    #[tokio::test]
    async fn send_once_returns_success_text() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let session = Session::with_backend(&client, &cfg, StubBackend::ok("pong"));

        let response = session.send_once("ping").await;

        assert_eq!(response, Response::Success("pong".to_string()));
        let calls = session.backend.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![Turn::user("ping")]);
    }

    #[tokio::test]
    async fn send_once_normalizes_backend_failures_into_error_responses() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let session = Session::with_backend(&client, &cfg, StubBackend::err("quota exceeded"));

        let response = session.send_once("ping").await;

        assert!(response.is_error());
        let rendered = response.to_string();
        assert!(
            rendered.starts_with("Error: ") && rendered.contains("quota exceeded"),
            "unexpected rendering: {rendered}"
        );
    }

    #[tokio::test]
    async fn blank_messages_are_rejected_before_any_call() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let mut session = Session::with_backend(&client, &cfg, StubBackend::ok("unused"));

        assert!(session.send_once("").await.is_error());
        assert!(session.send_once("   ").await.is_error());
        assert!(session.send_in_conversation("\t\n").await.is_error());
        assert_eq!(session.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn send_in_conversation_starts_a_conversation_lazily() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let mut session = Session::with_backend(&client, &cfg, StubBackend::ok("hello"));
        assert!(session.conversation().is_none());

        let response = session.send_in_conversation("hi").await;

        assert_eq!(response, Response::Success("hello".to_string()));
        let history = session.conversation().expect("conversation should exist");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Turn::user("hi"));
        assert_eq!(history[1], Turn::model("hello"));
    }

    #[tokio::test]
    async fn conversation_accumulates_alternating_turns() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let mut session = Session::with_backend(&client, &cfg, StubBackend::ok("reply"));

        session.send_in_conversation("first").await;
        session.send_in_conversation("second").await;

        let history = session.conversation().expect("conversation should exist");
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], Turn::user("second"));
        // the second call carried the first exchange as context
        let calls = session.backend.calls.borrow();
        assert_eq!(calls[1].len(), 3);
    }

    #[tokio::test]
    async fn start_conversation_discards_prior_context() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let mut session = Session::with_backend(&client, &cfg, StubBackend::ok("reply"));

        session.send_in_conversation("remember this").await;
        session.start_conversation();
        assert_eq!(session.conversation(), Some(&[][..]));

        session.send_in_conversation("fresh start").await;
        let calls = session.backend.calls.borrow();
        assert_eq!(calls[1], vec![Turn::user("fresh start")]);
        assert!(
            calls[1].iter().all(|turn| turn.text != "remember this"),
            "new conversation should carry no prior turns"
        );
    }

    #[tokio::test]
    async fn failed_turn_is_rolled_back_and_later_turns_proceed() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let mut session =
            Session::with_backend(&client, &cfg, StubBackend::fail_on_call(2, "reply"));

        assert!(!session.send_in_conversation("one").await.is_error());
        assert!(session.send_in_conversation("two").await.is_error());
        assert!(!session.send_in_conversation("three").await.is_error());

        let history = session.conversation().expect("conversation should exist");
        let user_turns: Vec<&str> = history
            .iter()
            .filter(|turn| turn.role == Role::User)
            .map(|turn| turn.text.as_str())
            .collect();
        assert_eq!(user_turns, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn send_once_never_touches_the_conversation() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let session = Session::with_backend(&client, &cfg, StubBackend::ok("pong"));

        session.send_once("ping").await;

        assert!(session.conversation().is_none());
    }
}
