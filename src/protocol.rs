//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, LevelSet};
use crate::matcher::MatchResult;
use crate::session::{Prompt, Solution};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetPrompt,
    SetLevels {
        levels: Vec<u32>,
    },
    ToggleLevel {
        level: u32,
    },
    SubmitAnswer {
        answer: String,
    },
    Skip,
    RevealSolution,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Loading {
        /// The learner's selection, possibly empty.
        selected: LevelSet,
        /// Levels actually queried.
        levels: LevelSet,
        defaulted: bool,
        notice: Option<String>,
    },
    Prompt {
        prompt: Option<Prompt>,
    },
    AnswerResult {
        correct: bool,
        reveal_hanzi: bool,
        reveal_translation: bool,
        typed_hanzi: bool,
        message: String,
        solution: Option<Solution>,
    },
    Solution {
        solution: Option<Solution>,
    },
    Empty {
        message: String,
    },
    InvalidWord {
        message: String,
    },
    Error {
        message: String,
        retryable: bool,
    },
}

//
// HTTP request/response DTOs
//

/// `?niveles=10,20` (the original query name) or `?levels=10,20`.
#[derive(Debug, Default, Deserialize)]
pub struct LevelsQuery {
    #[serde(default, rename = "niveles", alias = "levels")]
    pub levels: Option<String>,
}

/// Query string of the WebSocket upgrade: `/ws?direction=...&levels=...`.
#[derive(Debug, Default, Deserialize)]
pub struct QuizParams {
    #[serde(default, alias = "modo")]
    pub direction: Direction,
    #[serde(default, alias = "niveles")]
    pub levels: Option<String>,
}

impl ServerWsMessage {
    /// Answer feedback; the solution is attached only when something is revealed.
    pub fn answer(result: MatchResult, solution: Option<Solution>) -> Self {
        let message = if result.correct {
            "Correct! Next word in a moment..."
        } else {
            "Try again."
        };
        let reveal = result.reveal_hanzi || result.reveal_translation;
        ServerWsMessage::AnswerResult {
            correct: result.correct,
            reveal_hanzi: result.reveal_hanzi,
            reveal_translation: result.reveal_translation,
            typed_hanzi: result.typed_hanzi,
            message: message.into(),
            solution: solution.filter(|_| reveal),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct LevelsOut {
    pub available: Vec<u32>,
    pub default: u32,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
