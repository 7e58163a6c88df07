//! Configuration sessions and the turn pipeline.
//!
//! A session moves through `NoConfiguration -> HasConfiguration ->
//! {Completed | Aborted}`. Each turn runs extract, parse, merge, score and
//! record. A failed extraction leaves the prior state untouched.

use std::sync::Arc;

use assetwright_core::{Domain, MergePolicy};
use assetwright_corpus::{CorpusStore, InteractionRecord, is_store_worthy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::merge::merge;
use crate::oracle::{ExtractionError, OracleClient};
use crate::parser::{Parsed, parse};
use crate::schema::lookup;
use crate::scorer::score;
use crate::state::ConfigState;
use crate::validate::ValidationCoercion;

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    NoConfiguration,
    HasConfiguration(ConfigState),
    Completed(ConfigState),
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Completed,
    Aborted,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} is {status}")]
    Closed { id: Uuid, status: SessionStatus },

    #[error("Session {0} has no configuration yet")]
    NoConfiguration(Uuid),
}

/// One user's configuration conversation for one domain.
///
/// The merge policy is fixed at creation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    domain: Domain,
    policy: MergePolicy,
    phase: Phase,
    turns: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(domain: Domain, policy: MergePolicy) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            domain,
            policy,
            phase: Phase::NoConfiguration,
            turns: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The current configuration, if any turn has produced one.
    pub fn state(&self) -> Option<&ConfigState> {
        match &self.phase {
            Phase::HasConfiguration(state) | Phase::Completed(state) => Some(state),
            Phase::NoConfiguration | Phase::Aborted => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::NoConfiguration | Phase::HasConfiguration(_) => SessionStatus::Open,
            Phase::Completed(_) => SessionStatus::Completed,
            Phase::Aborted => SessionStatus::Aborted,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status() != SessionStatus::Open
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.status() {
            SessionStatus::Open => Ok(()),
            status => Err(SessionError::Closed { id: self.id, status }),
        }
    }

    /// Accept the current configuration and close the session.
    pub fn finish(&mut self) -> Result<ConfigState, SessionError> {
        self.ensure_open()?;
        let Phase::HasConfiguration(state) = &self.phase else {
            return Err(SessionError::NoConfiguration(self.id));
        };
        let state = state.clone();
        self.phase = Phase::Completed(state.clone());
        self.updated_at = Utc::now();
        info!(session_id = %self.id, domain = %self.domain, turns = self.turns, "Session completed");
        Ok(state)
    }

    /// Abandon the session.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.phase = Phase::Aborted;
        self.updated_at = Utc::now();
        info!(session_id = %self.id, domain = %self.domain, turns = self.turns, "Session aborted");
        Ok(())
    }
}

/// What one turn did.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The session's configuration after the turn.
    pub state: Option<ConfigState>,
    /// False when extraction failed and the prior state was kept.
    pub applied: bool,
    pub warning: Option<ExtractionError>,
    pub coercions: Vec<ValidationCoercion>,
    pub changed_fields: Vec<&'static str>,
    pub score: Option<f32>,
    /// True if the turn was appended to the corpus.
    pub recorded: bool,
}

impl TurnOutcome {
    fn not_applied(session: &Session, warning: ExtractionError) -> Self {
        Self {
            state: session.state().cloned(),
            applied: false,
            warning: Some(warning),
            coercions: Vec::new(),
            changed_fields: Vec::new(),
            score: None,
            recorded: false,
        }
    }
}

/// Runs turns for any domain against one oracle and an optional corpus.
pub struct ConfigEngine {
    oracle: Arc<OracleClient>,
    corpus: Option<Arc<CorpusStore>>,
}

impl ConfigEngine {
    pub fn new(oracle: Arc<OracleClient>) -> Self {
        Self { oracle, corpus: None }
    }

    /// Record store-worthy turns into `corpus`.
    pub fn with_corpus(mut self, corpus: Arc<CorpusStore>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    pub fn oracle(&self) -> &Arc<OracleClient> {
        &self.oracle
    }

    pub fn start_session(&self, domain: Domain, policy: MergePolicy) -> Session {
        let session = Session::new(domain, policy);
        info!(session_id = %session.id, %domain, %policy, "Session started");
        session
    }

    /// Run one turn. Only a closed session is an error; extraction failures
    /// come back as a warning on the outcome.
    pub async fn turn(&self, session: &mut Session, user_text: &str) -> Result<TurnOutcome, SessionError> {
        session.ensure_open()?;
        session.turns += 1;
        session.updated_at = Utc::now();

        let schema = lookup(session.domain);
        let prior = session.state().cloned();

        let raw = match self
            .oracle
            .extract(schema, user_text, prior.as_ref(), session.policy)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Extraction failed, keeping prior configuration");
                return Ok(TurnOutcome::not_applied(session, e.into()));
            }
        };

        let Parsed::Object(proposal) = parse(&raw) else {
            warn!(session_id = %session.id, "Oracle response had no configuration object");
            return Ok(TurnOutcome::not_applied(session, ExtractionError::NoObjectFound));
        };

        let merged = merge(schema, session.policy, prior.as_ref(), &proposal);
        session.phase = Phase::HasConfiguration(merged.state.clone());

        let turn_score = score(user_text, &merged.state);
        let recorded = self.record(session.domain, user_text, &merged.state, turn_score).await;

        info!(
            session_id = %session.id,
            domain = %session.domain,
            turn = session.turns,
            changed = merged.changed_fields.len(),
            coercions = merged.coercions.len(),
            score = turn_score,
            recorded,
            "Turn applied"
        );

        Ok(TurnOutcome {
            state: Some(merged.state),
            applied: true,
            warning: None,
            coercions: merged.coercions,
            changed_fields: merged.changed_fields,
            score: Some(turn_score),
            recorded,
        })
    }

    /// Append a store-worthy turn. Corpus failures never fail the turn.
    async fn record(&self, domain: Domain, user_text: &str, state: &ConfigState, turn_score: f32) -> bool {
        let Some(corpus) = &self.corpus else {
            return false;
        };
        if !is_store_worthy(turn_score) {
            return false;
        }
        let record = InteractionRecord::new(user_text, state.to_json_string(), turn_score);
        match corpus.append(domain, &record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%domain, error = %e, "Failed to record interaction");
                false
            }
        }
    }
}
