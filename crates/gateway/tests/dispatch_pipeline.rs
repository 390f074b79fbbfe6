//! Integration tests for the inbound reply pipeline.
//!
//! Directory, normalizer, prompt selection, generator and dispatcher run
//! for real; the chat network and the model are in-memory fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use wb_domain::config::{ContactEntry, ContactsConfig, GenerationOptions};
use wb_domain::contact::Category;
use wb_domain::error::{Error, Result};
use wb_domain::turn::{ConversationTurn, RawMessage};
use wb_gateway::directory::ContactDirectory;
use wb_gateway::runtime::conversation_lock::ConversationLocks;
use wb_gateway::runtime::dispatch::{
    AbortStage, DispatchOutcome, Dispatcher, IgnoreReason, InboundMessage,
};
use wb_gateway::runtime::prompts::select_prompt;
use wb_gateway::runtime::reply::ReplyGenerator;
use wb_gateway::transport::{ChatTransport, ImageMessage};
use wb_providers::{ChatRequest, ChatResponse, LlmProvider};

const MUM: &str = "2348012345678";
const TUNDE: &str = "2348098765432";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fakes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct FakeTransport {
    history: Vec<RawMessage>,
    fail_fetch: bool,
    fail_send: bool,
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl ChatTransport for FakeTransport {
    async fn fetch_history(&self, chat_id: &str, _limit: usize) -> Result<Vec<RawMessage>> {
        self.calls.lock().push(format!("fetch:{chat_id}"));
        if self.fail_fetch {
            return Err(Error::Transport("bridge unreachable".into()));
        }
        Ok(self.history.clone())
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.calls.lock().push(format!("send:{chat_id}"));
        if self.fail_send {
            return Err(Error::Transport("HTTP 500".into()));
        }
        self.sent.lock().push((chat_id.into(), text.into()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<()> {
        self.calls.lock().push(format!("typing:{chat_id}"));
        Ok(())
    }

    async fn send_image(&self, chat_id: &str, _image: &ImageMessage) -> Result<()> {
        self.calls.lock().push(format!("image:{chat_id}"));
        Ok(())
    }
}

struct FakeProvider {
    reply: std::result::Result<&'static str, &'static str>,
    delay: Duration,
    requests: Mutex<Vec<ChatRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeProvider {
    fn replying(text: &'static str) -> Arc<Self> {
        Arc::new(Self::new(Ok(text), Duration::ZERO))
    }

    fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self::new(Err(message), Duration::ZERO))
    }

    fn slow(text: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::new(Ok(text), delay))
    }

    fn new(reply: std::result::Result<&'static str, &'static str>, delay: Duration) -> Self {
        Self {
            reply,
            delay,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for FakeProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(req.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.reply {
            Ok(text) => Ok(ChatResponse {
                content: text.into(),
                usage: None,
                model: "fake".into(),
                finish_reason: Some("stop".into()),
            }),
            Err(message) => Err(Error::Http(message.into())),
        }
    }

    fn provider_id(&self) -> &str {
        "fake"
    }
}

fn contacts() -> ContactsConfig {
    ContactsConfig {
        family_elder: vec![ContactEntry { name: "Mum".into(), id: MUM.into() }],
        male_friends: vec![ContactEntry { name: "Tunde".into(), id: format!("{TUNDE}@c.us") }],
        ..Default::default()
    }
}

fn dispatcher(transport: Arc<FakeTransport>, provider: Arc<FakeProvider>) -> Dispatcher {
    let generator = Arc::new(ReplyGenerator::new(
        provider,
        GenerationOptions::default(),
        Duration::from_secs(5),
    ));
    Dispatcher::new(
        Arc::new(ContactDirectory::from_config(&contacts())),
        transport,
        generator,
        Arc::new(ConversationLocks::new()),
    )
}

fn jid(phone: &str) -> String {
    format!("{phone}@s.whatsapp.net")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Happy path
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn elder_gets_reply_with_normalized_history() {
    let transport = Arc::new(FakeTransport {
        history: vec![
            RawMessage::own("hi"),
            RawMessage::own("you there?"),
            RawMessage::peer("yes"),
            RawMessage::peer("what's up"),
            RawMessage::own("nm"),
            RawMessage::peer("Have you eaten?"),
        ],
        ..Default::default()
    });
    let provider = FakeProvider::replying("  Good afternoon, Mum. Yes, I have eaten.  ");
    let d = dispatcher(transport.clone(), provider.clone());

    let outcome = d.handle(InboundMessage::direct(jid(MUM), "Have you eaten?")).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Sent {
            chat_id: jid(MUM),
            chars: "Good afternoon, Mum. Yes, I have eaten.".len(),
        }
    );

    let requests = provider.requests.lock();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.system_instruction.as_deref(), Some(select_prompt(Category::FamilyElder)));
    assert_eq!(
        req.history,
        vec![ConversationTurn::user("yes"), ConversationTurn::model("nm")]
    );
    assert_eq!(req.message, "Have you eaten?");

    assert_eq!(
        *transport.sent.lock(),
        vec![(jid(MUM), "Good afternoon, Mum. Yes, I have eaten.".to_string())]
    );
    assert_eq!(
        *transport.calls.lock(),
        vec![format!("typing:{}", jid(MUM)), format!("fetch:{}", jid(MUM)), format!("send:{}", jid(MUM))]
    );
}

#[tokio::test]
async fn elder_resolves_with_and_without_suffix() {
    for sender in [MUM.to_string(), jid(MUM), format!("{MUM}@c.us")] {
        let transport = Arc::new(FakeTransport::default());
        let provider = FakeProvider::replying("Hello Mum");
        let d = dispatcher(transport.clone(), provider.clone());

        let outcome = d.handle(InboundMessage::direct(sender.clone(), "hello")).await;
        assert!(matches!(outcome, DispatchOutcome::Sent { .. }), "{sender}: {outcome:?}");
        assert_eq!(
            provider.requests.lock()[0].system_instruction.as_deref(),
            Some(select_prompt(Category::FamilyElder))
        );
    }
}

#[tokio::test]
async fn friend_gets_friend_tone() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::replying("guy, I dey");
    let d = dispatcher(transport, provider.clone());

    d.handle(InboundMessage::direct(jid(TUNDE), "how far")).await;
    assert_eq!(
        provider.requests.lock()[0].system_instruction.as_deref(),
        Some(select_prompt(Category::MaleFriend))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ignored and aborted
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn unknown_sender_makes_no_transport_calls() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::replying("should not be used");
    let d = dispatcher(transport.clone(), provider.clone());

    let outcome = d.handle(InboundMessage::direct(jid("2340000000000"), "hello?")).await;

    assert_eq!(outcome, DispatchOutcome::Ignored { reason: IgnoreReason::UnknownSender });
    assert!(transport.calls.lock().is_empty());
    assert!(provider.requests.lock().is_empty());
}

#[tokio::test]
async fn own_and_empty_messages_are_ignored() {
    let transport = Arc::new(FakeTransport::default());
    let d = dispatcher(transport.clone(), FakeProvider::replying("x"));

    let mut own = InboundMessage::direct(jid(MUM), "sent from my phone");
    own.from_me = true;
    assert_eq!(d.handle(own).await, DispatchOutcome::Ignored { reason: IgnoreReason::FromMe });
    assert_eq!(
        d.handle(InboundMessage::direct(jid(MUM), "   ")).await,
        DispatchOutcome::Ignored { reason: IgnoreReason::EmptyBody }
    );
    assert!(transport.calls.lock().is_empty());
}

#[tokio::test]
async fn known_contact_in_group_is_ignored() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::replying("guy, I dey");
    let d = dispatcher(transport.clone(), provider.clone());

    let outcome = d
        .handle(InboundMessage {
            sender: jid(TUNDE),
            chat_id: "120363400270745236@g.us".into(),
            body: "how far".into(),
            from_me: false,
            message_id: Some("GRP1".into()),
        })
        .await;

    assert_eq!(outcome, DispatchOutcome::Ignored { reason: IgnoreReason::NotDirectChat });
    assert!(transport.calls.lock().is_empty());
    assert!(provider.requests.lock().is_empty());
}

#[tokio::test]
async fn chat_of_another_participant_is_ignored() {
    let transport = Arc::new(FakeTransport::default());
    let d = dispatcher(transport.clone(), FakeProvider::replying("x"));

    let mut msg = InboundMessage::direct(jid(MUM), "hello");
    msg.chat_id = jid("2340000000000");
    assert_eq!(d.handle(msg).await, DispatchOutcome::Ignored { reason: IgnoreReason::NotDirectChat });
    assert!(transport.calls.lock().is_empty());
}

#[tokio::test]
async fn device_tagged_sender_resolves() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::replying("Hello Mum");
    let d = dispatcher(transport.clone(), provider.clone());

    let mut msg = InboundMessage::direct(format!("{MUM}:12@s.whatsapp.net"), "hello");
    msg.chat_id = jid(MUM);
    let outcome = d.handle(msg).await;

    assert_eq!(outcome, DispatchOutcome::Sent { chat_id: jid(MUM), chars: 9 });
    assert_eq!(
        provider.requests.lock()[0].system_instruction.as_deref(),
        Some(select_prompt(Category::FamilyElder))
    );
}

#[tokio::test]
async fn burst_history_never_ends_on_user_turn() {
    let transport = Arc::new(FakeTransport {
        history: vec![
            RawMessage::peer("hi"),
            RawMessage::own("hello"),
            RawMessage::peer("are you there?"),
            RawMessage::peer("call me"),
        ],
        ..Default::default()
    });
    let provider = FakeProvider::replying("ok");
    let d = dispatcher(transport, provider.clone());

    d.handle(InboundMessage::direct(jid(MUM), "call me")).await;

    let requests = provider.requests.lock();
    assert_eq!(
        requests[0].history,
        vec![ConversationTurn::user("hi"), ConversationTurn::model("hello")]
    );
    assert_eq!(requests[0].message, "call me");
}

#[tokio::test]
async fn provider_error_sends_nothing() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::failing("connection reset");
    let d = dispatcher(transport.clone(), provider.clone());

    let outcome = d.handle(InboundMessage::direct(jid(MUM), "hello")).await;

    assert_eq!(outcome, DispatchOutcome::Aborted { stage: AbortStage::Generation });
    assert_eq!(provider.requests.lock().len(), 1);
    assert!(transport.sent.lock().is_empty());
}

#[tokio::test]
async fn history_failure_skips_generation() {
    let transport = Arc::new(FakeTransport { fail_fetch: true, ..Default::default() });
    let provider = FakeProvider::replying("x");
    let d = dispatcher(transport.clone(), provider.clone());

    let outcome = d.handle(InboundMessage::direct(jid(MUM), "hello")).await;

    assert_eq!(outcome, DispatchOutcome::Aborted { stage: AbortStage::FetchHistory });
    assert!(provider.requests.lock().is_empty());
    assert!(transport.sent.lock().is_empty());
}

#[tokio::test]
async fn send_failure_is_reported() {
    let transport = Arc::new(FakeTransport { fail_send: true, ..Default::default() });
    let d = dispatcher(transport, FakeProvider::replying("hello"));

    let outcome = d.handle(InboundMessage::direct(jid(MUM), "hello")).await;
    assert_eq!(outcome, DispatchOutcome::Aborted { stage: AbortStage::Send });
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Concurrency
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn same_chat_pipelines_do_not_overlap() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::slow("ok", Duration::from_millis(50));
    let d = Arc::new(dispatcher(transport.clone(), provider.clone()));

    let handles: Vec<_> = ["one", "two", "three"]
        .into_iter()
        .map(|body| {
            let d = d.clone();
            tokio::spawn(async move { d.handle(InboundMessage::direct(jid(MUM), body)).await })
        })
        .collect();
    for h in handles {
        assert!(matches!(h.await.unwrap(), DispatchOutcome::Sent { .. }));
    }

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(transport.sent.lock().len(), 3);
}

#[tokio::test]
async fn suffix_variants_of_one_chat_share_a_lock() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::slow("ok", Duration::from_millis(50));
    let d = Arc::new(dispatcher(transport.clone(), provider.clone()));

    let handles: Vec<_> = [jid(MUM), format!("{MUM}@c.us")]
        .into_iter()
        .map(|chat| {
            let d = d.clone();
            tokio::spawn(async move { d.handle(InboundMessage::direct(chat, "hi")).await })
        })
        .collect();
    for h in handles {
        assert!(matches!(h.await.unwrap(), DispatchOutcome::Sent { .. }));
    }

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(d.locks().len(), 1);
}

#[tokio::test]
async fn different_chats_run_concurrently() {
    let transport = Arc::new(FakeTransport::default());
    let provider = FakeProvider::slow("ok", Duration::from_millis(200));
    let d = Arc::new(dispatcher(transport.clone(), provider.clone()));

    let a = {
        let d = d.clone();
        tokio::spawn(async move { d.handle(InboundMessage::direct(jid(MUM), "hi")).await })
    };
    let b = {
        let d = d.clone();
        tokio::spawn(async move { d.handle(InboundMessage::direct(jid(TUNDE), "hi")).await })
    };
    a.await.unwrap();
    b.await.unwrap();

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 2);
}
