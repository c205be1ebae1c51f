//! Stranger sessions and the matching service.
//!
//! `Session` and `MatchService` are the seams the router depends on; the
//! in-memory `Stranger` and `MatchMaker` behind them are enough to run the
//! bot on a single process. Smarter matching lives outside this module.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::relay::content::Content;
use crate::relay::router::{notify, relay_content};
use crate::relay::telegram::Messenger;

pub(crate) const MATCHED_NOTICE: &str = "Your partner is here. Have a nice chat!";
pub(crate) const QUEUED_NOTICE: &str = "Looking for a stranger to pair you with. Hang on!";
pub(crate) const PARTNER_LEFT_NOTICE: &str =
    "Your partner has left the chat. Type /begin to find a new one.";

/// The session has no partner assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingPartner;

impl fmt::Display for MissingPartner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no partner assigned")
    }
}

impl std::error::Error for MissingPartner {}

/// The matching service has nobody to pair with right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoPartnerAvailable;

impl fmt::Display for NoPartnerAvailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no partner available")
    }
}

impl std::error::Error for NoPartnerAvailable {}

/// A matched user's chat state, as the router sees it.
#[async_trait]
pub trait Session: Send + Sync {
    /// Forward content to the paired user.
    async fn send_to_partner(&self, content: &Content) -> Result<(), MissingPartner>;

    /// Leave the current chat.
    async fn end_chatting(&self);
}

/// Pairs waiting strangers with each other.
#[async_trait]
pub trait MatchService: Send + Sync {
    type Session: Session;

    /// Look up or create the session for a chat. Idempotent per chat id.
    fn get_or_create_stranger(&self, chat_id: i64) -> Arc<Self::Session>;

    /// Try to assign a partner to the session.
    async fn set_partner(&self, session: &Arc<Self::Session>) -> Result<(), NoPartnerAvailable>;
}

/// One stranger's chat session.
pub struct Stranger<M: Messenger> {
    chat_id: i64,
    messenger: Arc<M>,
    partner: Mutex<Option<Arc<Stranger<M>>>>,
    /// Waiting queue shared with the matchmaker, so ending a chat also
    /// leaves the queue.
    waiting: Arc<Mutex<VecDeque<i64>>>,
}

impl<M: Messenger> Stranger<M> {
    fn new(chat_id: i64, messenger: Arc<M>, waiting: Arc<Mutex<VecDeque<i64>>>) -> Self {
        Self {
            chat_id,
            messenger,
            partner: Mutex::new(None),
            waiting,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    fn partner(&self) -> Option<Arc<Stranger<M>>> {
        self.partner.lock().expect("partner lock poisoned").clone()
    }

    fn replace_partner(&self, partner: Option<Arc<Stranger<M>>>) -> Option<Arc<Stranger<M>>> {
        std::mem::replace(&mut *self.partner.lock().expect("partner lock poisoned"), partner)
    }

    fn leave_queue(&self) {
        self.waiting
            .lock()
            .expect("waiting lock poisoned")
            .retain(|id| *id != self.chat_id);
    }
}

#[async_trait]
impl<M: Messenger> Session for Stranger<M> {
    async fn send_to_partner(&self, content: &Content) -> Result<(), MissingPartner> {
        let partner = self.partner().ok_or(MissingPartner)?;
        if let Err(e) = relay_content(self.messenger.as_ref(), partner.chat_id, content).await {
            warn!(
                "Not relaying {} from chat {} to chat {}: {e}",
                content.kind(),
                self.chat_id,
                partner.chat_id
            );
        }
        Ok(())
    }

    async fn end_chatting(&self) {
        self.leave_queue();
        match self.replace_partner(None) {
            Some(partner) => {
                partner.replace_partner(None);
                info!("Chat between {} and {} ended", self.chat_id, partner.chat_id);
                notify(self.messenger.as_ref(), partner.chat_id, PARTNER_LEFT_NOTICE).await;
            }
            None => debug!("Chat {} ended without a partner", self.chat_id),
        }
    }
}

/// In-memory matchmaker: a session registry and a FIFO waiting queue.
pub struct MatchMaker<M: Messenger> {
    messenger: Arc<M>,
    strangers: Mutex<HashMap<i64, Arc<Stranger<M>>>>,
    waiting: Arc<Mutex<VecDeque<i64>>>,
}

impl<M: Messenger> MatchMaker<M> {
    pub fn new(messenger: Arc<M>) -> Self {
        Self {
            messenger,
            strangers: Mutex::new(HashMap::new()),
            waiting: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Pop the first waiting stranger that can be paired with `session`.
    fn next_waiting(&self, session: &Arc<Stranger<M>>) -> Option<Arc<Stranger<M>>> {
        let strangers = self.strangers.lock().expect("strangers lock poisoned");
        let mut waiting = self.waiting.lock().expect("waiting lock poisoned");
        while let Some(id) = waiting.pop_front() {
            if id == session.chat_id {
                continue;
            }
            let Some(other) = strangers.get(&id) else {
                continue;
            };
            if other.partner().is_some() {
                // Stale queue entry, already matched elsewhere.
                continue;
            }
            return Some(other.clone());
        }
        None
    }

    fn enqueue(&self, chat_id: i64) {
        let mut waiting = self.waiting.lock().expect("waiting lock poisoned");
        if !waiting.contains(&chat_id) {
            waiting.push_back(chat_id);
        }
    }
}

#[async_trait]
impl<M: Messenger> MatchService for MatchMaker<M> {
    type Session = Stranger<M>;

    fn get_or_create_stranger(&self, chat_id: i64) -> Arc<Stranger<M>> {
        self.strangers
            .lock()
            .expect("strangers lock poisoned")
            .entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Stranger::new(chat_id, self.messenger.clone(), self.waiting.clone()))
            })
            .clone()
    }

    async fn set_partner(&self, session: &Arc<Stranger<M>>) -> Result<(), NoPartnerAvailable> {
        // A stranger looking for someone new leaves their current chat first.
        if session.partner().is_some() {
            session.end_chatting().await;
        }

        match self.next_waiting(session) {
            Some(partner) => {
                session.replace_partner(Some(partner.clone()));
                partner.replace_partner(Some(session.clone()));
                info!("Matched chat {} with chat {}", session.chat_id, partner.chat_id);
                notify(self.messenger.as_ref(), session.chat_id, MATCHED_NOTICE).await;
                notify(self.messenger.as_ref(), partner.chat_id, MATCHED_NOTICE).await;
                Ok(())
            }
            None => {
                self.enqueue(session.chat_id);
                info!("Chat {} queued for a partner", session.chat_id);
                notify(self.messenger.as_ref(), session.chat_id, QUEUED_NOTICE).await;
                Err(NoPartnerAvailable)
            }
        }
    }
}
