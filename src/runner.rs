//! Async driver for a `QuizSession`.
//!
//! The runner owns the session and is meant to live on a single task (one per
//! WebSocket connection). Word queries and the reveal timer run as spawned
//! tasks that report back over a channel; `next_event` applies whatever
//! arrives and silently drops signals made stale by a newer level selection,
//! a skip, or a previous advance. Dropping the runner aborts pending work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, instrument};

use crate::domain::{LevelSet, Word};
use crate::error::QuizError;
use crate::gateway::{GatewayError, WordGateway};
use crate::matcher::MatchResult;
use crate::session::{Prompt, QuizSession, RefreshOutcome, RefreshTicket, RevealTicket, Solution};

/// Something that changed the session without a direct request.
#[derive(Debug, PartialEq, Eq)]
pub enum RunnerEvent {
    /// The pool query for the latest selection finished.
    Refreshed(Result<RefreshOutcome, QuizError>),
    /// The reveal delay elapsed and the next word is up (absent if none left).
    Advanced(Option<Prompt>),
}

enum Signal {
    Refreshed { generation: u64, result: Result<Vec<Word>, GatewayError> },
    RevealElapsed(RevealTicket),
}

pub struct QuizRunner<G: WordGateway> {
    session: QuizSession,
    gateway: Arc<G>,
    reveal_delay: Duration,
    tx: mpsc::UnboundedSender<Signal>,
    rx: mpsc::UnboundedReceiver<Signal>,
    refresh_task: Option<AbortHandle>,
    reveal_task: Option<AbortHandle>,
}

impl<G: WordGateway> QuizRunner<G> {
    pub fn new(session: QuizSession, gateway: Arc<G>, reveal_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { session, gateway, reveal_delay, tx, rx, refresh_task: None, reveal_task: None }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn start(&mut self) -> RefreshTicket {
        let ticket = self.session.start();
        self.spawn_refresh(&ticket);
        ticket
    }

    pub fn set_levels(&mut self, levels: LevelSet) -> RefreshTicket {
        let ticket = self.session.set_levels(levels);
        self.spawn_refresh(&ticket);
        ticket
    }

    pub fn toggle_level(&mut self, level: u32) -> RefreshTicket {
        let ticket = self.session.toggle_level(level);
        self.spawn_refresh(&ticket);
        ticket
    }

    /// Check the answer; a correct one schedules the advance after the reveal delay.
    pub fn submit_answer(&mut self, raw: &str) -> Result<MatchResult, QuizError> {
        let result = self.session.submit_answer(raw)?;
        if let Some(ticket) = self.session.pending_reveal() {
            self.schedule_reveal(ticket);
        }
        Ok(result)
    }

    pub fn skip(&mut self) -> Result<Option<Prompt>, QuizError> {
        self.cancel_reveal();
        self.session.skip()
    }

    pub fn current_prompt(&self) -> Option<Prompt> {
        self.session.current_prompt()
    }

    pub fn reveal_solution(&self) -> Option<Solution> {
        self.session.reveal_solution()
    }

    pub fn take_invalid_words(&mut self) -> Vec<QuizError> {
        self.session.take_invalid_words()
    }

    /// Wait for the next applied background signal. Cancel-safe.
    pub async fn next_event(&mut self) -> RunnerEvent {
        loop {
            // `self.tx` keeps the channel open, so `None` never happens.
            let Some(signal) = self.rx.recv().await else {
                return std::future::pending::<RunnerEvent>().await;
            };
            match signal {
                Signal::Refreshed { generation, result } => {
                    match self.session.complete_refresh(generation, result) {
                        Err(QuizError::StaleResponse { .. }) => continue,
                        outcome => {
                            self.refresh_task = None;
                            return RunnerEvent::Refreshed(outcome);
                        }
                    }
                }
                Signal::RevealElapsed(ticket) => match self.session.finish_reveal(ticket) {
                    Ok(prompt) => {
                        self.reveal_task = None;
                        return RunnerEvent::Advanced(prompt);
                    }
                    Err(_) => continue,
                },
            }
        }
    }

    #[instrument(level = "debug", skip(self), fields(generation = ticket.generation, levels = %ticket.levels.to_csv()))]
    fn spawn_refresh(&mut self, ticket: &RefreshTicket) {
        self.cancel_reveal();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        let generation = ticket.generation;
        let levels = ticket.levels.clone();
        let handle = tokio::spawn(async move {
            let result = gateway.fetch_words(&levels).await;
            let _ = tx.send(Signal::Refreshed { generation, result });
        });
        if let Some(previous) = self.refresh_task.replace(handle.abort_handle()) {
            debug!(target: "quiz", "Aborting superseded word query");
            previous.abort();
        }
    }

    fn schedule_reveal(&mut self, ticket: RevealTicket) {
        self.cancel_reveal();
        let tx = self.tx.clone();
        let delay = self.reveal_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Signal::RevealElapsed(ticket));
        });
        self.reveal_task = Some(handle.abort_handle());
    }

    fn cancel_reveal(&mut self) {
        if let Some(handle) = self.reveal_task.take() {
            handle.abort();
        }
    }
}

impl<G: WordGateway> Drop for QuizRunner<G> {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_task.take() {
            handle.abort();
        }
        self.cancel_reveal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::oneshot;

    use crate::domain::{Direction, WordId};
    use crate::session::SessionPhase;

    fn word(id: &str, hanzi: &str, translation: &str, level: u32) -> Word {
        Word {
            id: WordId::from(id),
            hanzi: hanzi.into(),
            pinyin: "pīn".into(),
            translation: translation.into(),
            level,
        }
    }

    /// Gateway whose responses are released by the test, per level set.
    #[derive(Default)]
    struct ScriptedGateway {
        pending: Mutex<HashMap<String, oneshot::Receiver<Result<Vec<Word>, GatewayError>>>>,
    }

    impl ScriptedGateway {
        fn expect(&self, levels: &str) -> oneshot::Sender<Result<Vec<Word>, GatewayError>> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(levels.to_string(), rx);
            tx
        }
    }

    impl WordGateway for ScriptedGateway {
        async fn fetch_words(&self, levels: &LevelSet) -> Result<Vec<Word>, GatewayError> {
            let rx = self.pending.lock().unwrap().remove(&levels.to_csv());
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(GatewayError::Unavailable("dropped".into()))),
                None => Err(GatewayError::Unavailable(format!("unexpected query {}", levels.to_csv()))),
            }
        }
    }

    fn runner(gateway: Arc<ScriptedGateway>) -> QuizRunner<ScriptedGateway> {
        let session = QuizSession::with_rng(Direction::HanziToTranslation, StdRng::seed_from_u64(1));
        QuizRunner::new(session, gateway, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn latest_level_selection_wins() {
        let gw = Arc::new(ScriptedGateway::default());
        let reply20 = gw.expect("20");
        let reply30 = gw.expect("30");
        let mut r = runner(gw.clone());

        r.set_levels(LevelSet::single(20));
        tokio::task::yield_now().await;
        r.set_levels(LevelSet::single(30));

        reply30.send(Ok(vec![word("w30", "水", "agua", 30)])).unwrap();
        let _ = reply20.send(Ok(vec![word("w20", "茶", "té", 20)]));

        match r.next_event().await {
            RunnerEvent::Refreshed(Ok(outcome)) => {
                assert_eq!(outcome.pool_size, 1);
                assert_eq!(outcome.prompt.display_text, "水");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(r.session().current_word().map(|w| w.level), Some(30));
    }

    #[tokio::test]
    async fn query_failure_surfaces_as_error_state() {
        let gw = Arc::new(ScriptedGateway::default());
        let reply = gw.expect("10");
        let mut r = runner(gw.clone());
        r.start();
        reply.send(Err(GatewayError::Unavailable("boom".into()))).unwrap();
        match r.next_event().await {
            RunnerEvent::Refreshed(Err(QuizError::Query(msg))) => assert!(msg.contains("boom")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(r.session().phase(), SessionPhase::Error);
    }

    #[tokio::test]
    async fn empty_result_is_reported() {
        let gw = Arc::new(ScriptedGateway::default());
        gw.expect("10").send(Ok(vec![])).unwrap();
        let mut r = runner(gw.clone());
        r.start();
        assert_eq!(r.next_event().await, RunnerEvent::Refreshed(Err(QuizError::EmptyPool)));
        assert!(r.current_prompt().is_none());
    }

    async fn ready_runner(words: Vec<Word>) -> QuizRunner<ScriptedGateway> {
        let gw = Arc::new(ScriptedGateway::default());
        gw.expect("10").send(Ok(words)).unwrap();
        let mut r = runner(gw);
        r.start();
        assert!(matches!(r.next_event().await, RunnerEvent::Refreshed(Ok(_))));
        r
    }

    #[tokio::test(start_paused = true)]
    async fn correct_answer_advances_after_reveal_delay() {
        let mut r = ready_runner(vec![word("a", "水", "agua", 10), word("b", "茶", "té", 10)]).await;
        let answer = r.session().current_word().unwrap().translation.display();
        let first = r.session().current_word().unwrap().id.clone();

        let t0 = tokio::time::Instant::now();
        assert!(r.submit_answer(&answer).unwrap().correct);
        assert_eq!(r.session().phase(), SessionPhase::Revealing);

        match r.next_event().await {
            RunnerEvent::Advanced(Some(_)) => {}
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(t0.elapsed() >= Duration::from_secs(2));
        assert_ne!(r.session().current_word().unwrap().id, first);
        assert_eq!(r.session().phase(), SessionPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_cancels_the_pending_advance() {
        let mut r = ready_runner(vec![word("a", "水", "agua", 10), word("b", "茶", "té", 10), word("c", "猫", "gato", 10)]).await;
        let answer = r.session().current_word().unwrap().translation.display();
        r.submit_answer(&answer).unwrap();
        r.skip().unwrap();
        let after_skip = r.session().current_word().unwrap().id.clone();

        let waited = tokio::time::timeout(Duration::from_secs(5), r.next_event()).await;
        assert!(waited.is_err(), "no advance may fire after skip");
        assert_eq!(r.session().current_word().unwrap().id, after_skip);
    }

    #[tokio::test(start_paused = true)]
    async fn level_change_cancels_the_pending_advance() {
        let gw = Arc::new(ScriptedGateway::default());
        gw.expect("10").send(Ok(vec![word("a", "水", "agua", 10)])).unwrap();
        let reply = gw.expect("10,20");
        let mut r = runner(gw.clone());
        r.start();
        assert!(matches!(r.next_event().await, RunnerEvent::Refreshed(Ok(_))));

        r.submit_answer("agua").unwrap();
        r.toggle_level(20);
        assert_eq!(r.session().phase(), SessionPhase::Loading);

        tokio::time::sleep(Duration::from_secs(3)).await;
        reply.send(Ok(vec![word("b", "茶", "té", 20)])).unwrap();
        match r.next_event().await {
            RunnerEvent::Refreshed(Ok(outcome)) => assert_eq!(outcome.prompt.display_text, "茶"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn answers_are_refused_while_loading() {
        let gw = Arc::new(ScriptedGateway::default());
        let _reply = gw.expect("10");
        let mut r = runner(gw);
        r.start();
        assert_eq!(r.submit_answer("agua"), Err(QuizError::NotReady(SessionPhase::Loading)));
    }
}
