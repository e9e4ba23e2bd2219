//! HTTP implementation of [`AttemptClient`] over the REST backend.
//!
//! All wire shapes live here and are converted into domain types at this
//! boundary. In particular, answer options arrive either as plain strings or
//! as full records; both are normalized into [`QuestionOption`] immediately,
//! so no later layer branches on shape.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use quiz_core::model::{
    Attempt, AttemptId, Difficulty, OptionId, PracticeSessionId, QuestionId, QuestionOption,
    QuestionResult, QuizId, QuizQuestion, QuizSummary, RemedialId, TopicId,
};

use crate::client::{
    AttemptClient, CurrentQuestion, GeneratedQuestion, PracticeFeedback, PracticeStart,
    QuizStart, RemedialFeedback, RemedialQuestion,
};
use crate::error::ClientError;

/// Connection settings for the attempt service.
#[derive(Clone, Debug)]
pub struct AttemptApiConfig {
    base_url: Url,
    token: Option<String>,
}

impl AttemptApiConfig {
    /// Parses and normalizes the base URL (a trailing slash is enforced so
    /// relative endpoint joins behave).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` when the URL cannot be parsed.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self { base_url, token })
    }

    /// Reads `QUIZ_API_BASE_URL` and `QUIZ_API_TOKEN` from the environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let token = env::var("QUIZ_API_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(&base_url, token).ok()
    }
}

/// Reqwest-backed client for the attempt service.
#[derive(Clone)]
pub struct HttpAttemptClient {
    client: Client,
    config: AttemptApiConfig,
}

impl HttpAttemptClient {
    #[must_use]
    pub fn new(config: AttemptApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let mut request = self.client.get(self.endpoint(path)?);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        Self::read_json(request.send().await?).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let mut request = self.client.post(self.endpoint(path)?).json(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        Self::read_json(request.send().await?).await
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AttemptClient for HttpAttemptClient {
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<QuizStart, ClientError> {
        let wire: QuizStartWire = self
            .post_json(&format!("quizzes/{quiz_id}/attempts"), &Empty {})
            .await?;
        wire.into_domain()
    }

    async fn current_question(
        &self,
        attempt_id: AttemptId,
    ) -> Result<CurrentQuestion, ClientError> {
        let wire: CurrentQuestionWire = self
            .get_json(&format!("attempts/{attempt_id}/current-question"))
            .await?;
        wire.into_domain()
    }

    async fn answer_question(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Attempt, ClientError> {
        let body = AnswerBody {
            question_id: question_id.value(),
            option_id: option_id.value(),
        };
        let wire: AttemptWire = self
            .post_json(&format!("attempts/{attempt_id}/answers"), &body)
            .await?;
        wire.into_domain()
    }

    async fn quiz_summary(&self, attempt_id: AttemptId) -> Result<QuizSummary, ClientError> {
        let wire: SummaryWire = self
            .get_json(&format!("attempts/{attempt_id}/summary"))
            .await?;
        wire.into_domain()
    }

    async fn choose_remedial_difficulty(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        difficulty: Difficulty,
    ) -> Result<RemedialQuestion, ClientError> {
        let body = RemediationBody {
            question_id: question_id.value(),
            difficulty,
        };
        let wire: RemedialQuestionWire = self
            .post_json(&format!("attempts/{attempt_id}/remediation"), &body)
            .await?;
        wire.into_domain()
    }

    async fn submit_remedial_answer(
        &self,
        remedial_id: RemedialId,
        option_id: OptionId,
    ) -> Result<RemedialFeedback, ClientError> {
        let body = RemedialAnswerBody {
            option_id: option_id.value(),
        };
        let wire: RemedialFeedbackWire = self
            .post_json(&format!("remediation/{remedial_id}/answers"), &body)
            .await?;
        wire.into_domain()
    }

    async fn start_practice_session(
        &self,
        topic_id: TopicId,
        difficulty: Difficulty,
    ) -> Result<PracticeStart, ClientError> {
        let body = PracticeStartBody {
            topic_id: topic_id.value(),
            difficulty,
        };
        let wire: PracticeStartWire = self.post_json("practice-sessions", &body).await?;
        wire.into_domain()
    }

    async fn answer_practice_question(
        &self,
        session_id: PracticeSessionId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<PracticeFeedback, ClientError> {
        let body = AnswerBody {
            question_id: question_id.value(),
            option_id: option_id.value(),
        };
        let wire: PracticeFeedbackWire = self
            .post_json(&format!("practice-sessions/{session_id}/answers"), &body)
            .await?;
        Ok(wire.into_domain())
    }

    async fn generate_more_practice_question(
        &self,
        session_id: PracticeSessionId,
    ) -> Result<GeneratedQuestion, ClientError> {
        let wire: GeneratedQuestionWire = self
            .post_json(&format!("practice-sessions/{session_id}/questions"), &Empty {})
            .await?;
        wire.into_domain()
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct AnswerBody {
    question_id: u64,
    option_id: u64,
}

#[derive(Serialize)]
struct RemediationBody {
    question_id: u64,
    difficulty: Difficulty,
}

#[derive(Serialize)]
struct RemedialAnswerBody {
    option_id: u64,
}

#[derive(Serialize)]
struct PracticeStartBody {
    topic_id: u64,
    difficulty: Difficulty,
}

/// Answer options arrive in two historical shapes; `Record` must come first so
/// objects are not swallowed by the string fallback.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionWire {
    Record {
        id: Option<u64>,
        text: String,
        #[serde(default)]
        is_correct: Option<bool>,
    },
    Text(String),
}

impl OptionWire {
    /// Normalizes into the canonical option record. Options without a server
    /// id get a positional one, which is stable because issued questions are
    /// immutable.
    fn normalize(self, index: usize) -> QuestionOption {
        match self {
            OptionWire::Text(text) => QuestionOption::new(OptionId::new(index as u64), text),
            OptionWire::Record {
                id,
                text,
                is_correct,
            } => QuestionOption {
                id: OptionId::new(id.unwrap_or(index as u64)),
                text,
                is_correct,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionWire {
    id: u64,
    body: String,
    options: Vec<OptionWire>,
    difficulty: String,
    #[serde(default)]
    parent_question_id: Option<u64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    citation: Option<String>,
}

impl QuestionWire {
    fn into_domain(self) -> Result<QuizQuestion, ClientError> {
        let difficulty: Difficulty = self
            .difficulty
            .parse()
            .map_err(|_| ClientError::Decode(format!("unknown difficulty {:?}", self.difficulty)))?;
        let options = self
            .options
            .into_iter()
            .enumerate()
            .map(|(i, o)| o.normalize(i))
            .collect();

        let mut question =
            QuizQuestion::new(QuestionId::new(self.id), self.body, options, difficulty)
                .map_err(|e| ClientError::Decode(e.to_string()))?;
        if let Some(parent) = self.parent_question_id {
            question = question.with_parent(QuestionId::new(parent));
        }
        if let Some(explanation) = self.explanation {
            question = question.with_explanation(explanation);
        }
        if let Some(citation) = self.citation {
            question = question.with_citation(citation);
        }
        Ok(question)
    }
}

#[derive(Debug, Deserialize)]
struct QuizStartWire {
    attempt_id: Uuid,
    #[serde(default)]
    question: Option<QuestionWire>,
    question_index: usize,
    total_questions: usize,
}

impl QuizStartWire {
    fn into_domain(self) -> Result<QuizStart, ClientError> {
        Ok(QuizStart {
            attempt_id: AttemptId::new(self.attempt_id),
            question: self.question.map(QuestionWire::into_domain).transpose()?,
            question_index: self.question_index,
            total_questions: self.total_questions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrentQuestionWire {
    #[serde(default)]
    question: Option<QuestionWire>,
    question_index: usize,
    total_questions: usize,
}

impl CurrentQuestionWire {
    fn into_domain(self) -> Result<CurrentQuestion, ClientError> {
        Ok(CurrentQuestion {
            question: self.question.map(QuestionWire::into_domain).transpose()?,
            question_index: self.question_index,
            total_questions: self.total_questions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AttemptWire {
    question_id: u64,
    selected_option_id: u64,
    is_correct: bool,
    score: f64,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    xp_awarded: Option<u32>,
    #[serde(default)]
    badges: Option<Vec<String>>,
    #[serde(default)]
    next_question: Option<QuestionWire>,
    #[serde(default)]
    all_questions_answered: Option<bool>,
}

impl AttemptWire {
    fn into_domain(self) -> Result<Attempt, ClientError> {
        let mut attempt = Attempt::new(
            QuestionId::new(self.question_id),
            OptionId::new(self.selected_option_id),
            self.is_correct,
            self.score,
        )
        .map_err(|e| ClientError::Decode(e.to_string()))?;

        if let Some(explanation) = self.explanation {
            attempt = attempt.with_explanation(explanation);
        }
        if let Some(xp) = self.xp_awarded {
            attempt = attempt.with_xp(xp);
        }
        if let Some(badges) = self.badges {
            attempt = attempt.with_badges(badges);
        }
        if let Some(next) = self.next_question {
            attempt = attempt.with_next_question(next.into_domain()?);
        }
        if let Some(done) = self.all_questions_answered {
            attempt = attempt.with_all_questions_answered(done);
        }
        Ok(attempt)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionResultWire {
    question_id: u64,
    question_text: String,
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryWire {
    attempt_id: Uuid,
    score: f64,
    percentage: f64,
    results: Vec<QuestionResultWire>,
    #[serde(default)]
    remedial_plan: Option<bool>,
}

impl SummaryWire {
    fn into_domain(self) -> Result<QuizSummary, ClientError> {
        let results = self
            .results
            .into_iter()
            .map(|r| QuestionResult {
                question_id: QuestionId::new(r.question_id),
                question_text: r.question_text,
                is_correct: r.is_correct,
            })
            .collect();
        QuizSummary::new(
            AttemptId::new(self.attempt_id),
            self.score,
            self.percentage,
            results,
            self.remedial_plan.unwrap_or(false),
        )
        .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RemedialQuestionWire {
    remedial_id: Uuid,
    question: QuestionWire,
}

impl RemedialQuestionWire {
    fn into_domain(self) -> Result<RemedialQuestion, ClientError> {
        Ok(RemedialQuestion {
            remedial_id: RemedialId::new(self.remedial_id),
            question: self.question.into_domain()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RemedialFeedbackWire {
    is_correct: bool,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    next_question: Option<QuestionWire>,
    #[serde(default)]
    remedial_completed: Option<bool>,
}

impl RemedialFeedbackWire {
    fn into_domain(self) -> Result<RemedialFeedback, ClientError> {
        Ok(RemedialFeedback {
            is_correct: self.is_correct,
            explanation: self.explanation,
            next_question: self.next_question.map(QuestionWire::into_domain).transpose()?,
            remedial_completed: self.remedial_completed.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PracticeStartWire {
    session_id: Uuid,
    questions: Vec<QuestionWire>,
    #[serde(default)]
    quiz_context_used: bool,
}

impl PracticeStartWire {
    fn into_domain(self) -> Result<PracticeStart, ClientError> {
        Ok(PracticeStart {
            session_id: PracticeSessionId::new(self.session_id),
            questions: self
                .questions
                .into_iter()
                .map(QuestionWire::into_domain)
                .collect::<Result<_, _>>()?,
            quiz_context_used: self.quiz_context_used,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PracticeFeedbackWire {
    is_correct: bool,
    #[serde(default)]
    explanation: Option<String>,
    questions_completed: u32,
    total_correct: u32,
}

impl PracticeFeedbackWire {
    fn into_domain(self) -> PracticeFeedback {
        PracticeFeedback {
            is_correct: self.is_correct,
            explanation: self.explanation,
            questions_completed: self.questions_completed,
            total_correct: self.total_correct,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestionWire {
    question: QuestionWire,
}

impl GeneratedQuestionWire {
    fn into_domain(self) -> Result<GeneratedQuestion, ClientError> {
        Ok(GeneratedQuestion {
            question: self.question.into_domain()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_string_options() {
        let wire: QuestionWire = serde_json::from_str(
            r#"{
                "id": 7,
                "body": "Pick one",
                "options": ["alpha", "beta"],
                "difficulty": "standard"
            }"#,
        )
        .unwrap();
        let question = wire.into_domain().unwrap();

        assert_eq!(question.options().len(), 2);
        assert_eq!(question.options()[0].id, OptionId::new(0));
        assert_eq!(question.options()[1].text, "beta");
        assert!(question.options().iter().all(|o| o.is_correct.is_none()));
    }

    #[test]
    fn normalizes_record_options() {
        let wire: QuestionWire = serde_json::from_str(
            r#"{
                "id": 7,
                "body": "Pick one",
                "options": [
                    {"id": 11, "text": "alpha", "is_correct": true},
                    {"id": 12, "text": "beta"}
                ],
                "difficulty": "hard",
                "parent_question_id": 3,
                "explanation": "because"
            }"#,
        )
        .unwrap();
        let question = wire.into_domain().unwrap();

        assert_eq!(question.difficulty(), Difficulty::Hard);
        assert_eq!(question.parent_question_id(), Some(QuestionId::new(3)));
        assert_eq!(question.correct_option_id(), Some(OptionId::new(11)));
        assert_eq!(question.explanation(), Some("because"));
    }

    #[test]
    fn rejects_unknown_difficulty() {
        let wire: QuestionWire = serde_json::from_str(
            r#"{"id": 1, "body": "q", "options": ["a", "b"], "difficulty": "extreme"}"#,
        )
        .unwrap();
        assert!(matches!(
            wire.into_domain().unwrap_err(),
            ClientError::Decode(_)
        ));
    }

    #[test]
    fn summary_defaults_missing_remedial_plan_to_false() {
        let wire: SummaryWire = serde_json::from_str(
            r#"{
                "attempt_id": "7f0c0b9e-5b1a-4d2a-9a3e-0a4f8a9b1c2d",
                "score": 1.0,
                "percentage": 100.0,
                "results": [
                    {"question_id": 1, "question_text": "Q1", "is_correct": true}
                ]
            }"#,
        )
        .unwrap();
        let summary = wire.into_domain().unwrap();
        assert!(!summary.has_remedial_plan());
    }

    #[test]
    fn attempt_keeps_optional_completion_signals_absent() {
        let wire: AttemptWire = serde_json::from_str(
            r#"{
                "question_id": 1,
                "selected_option_id": 2,
                "is_correct": false,
                "score": 0.0
            }"#,
        )
        .unwrap();
        let attempt = wire.into_domain().unwrap();
        assert_eq!(attempt.all_questions_answered(), None);
        assert!(attempt.next_question().is_none());
    }

    #[test]
    fn config_enforces_trailing_slash() {
        let config = AttemptApiConfig::new("https://api.example.com/v1", None).unwrap();
        let client = HttpAttemptClient::new(config);
        let url = client.endpoint("quizzes/3/attempts").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/quizzes/3/attempts");
    }

    #[test]
    fn config_rejects_garbage_url() {
        assert!(matches!(
            AttemptApiConfig::new("not a url", None).unwrap_err(),
            ClientError::InvalidBaseUrl(_)
        ));
    }
}
