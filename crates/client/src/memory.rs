//! In-memory fake of the attempt service for tests and offline development.
//!
//! The fake grades against a seeded question bank with known correct options,
//! redacts correctness on everything it issues to graded flows, and always
//! provides an explicit completion signal on answers (`next_question` or
//! `all_questions_answered`). The two `without_*` toggles recreate older
//! server behavior so the engine's fallback paths stay exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rand::seq::IndexedRandom;

use quiz_core::model::{
    Attempt, AttemptId, Difficulty, OptionId, PracticeSessionId, QuestionId, QuestionResult,
    QuizId, QuizQuestion, QuizSummary, RemedialId, TopicId,
};

use crate::client::{
    AttemptClient, CurrentQuestion, GeneratedQuestion, PracticeFeedback, PracticeStart,
    QuizStart, RemedialFeedback, RemedialQuestion,
};
use crate::error::ClientError;

/// XP granted for a correct graded answer. Badge awarding stays external.
const XP_PER_CORRECT: u32 = 10;
/// Size of the initial practice batch.
const PRACTICE_BATCH: usize = 3;
/// Minted variant ids start here to stay clear of seeded bank ids.
const VARIANT_ID_BASE: u64 = 10_000;

#[derive(Debug)]
struct AttemptState {
    questions: Vec<QuizQuestion>,
    cursor: usize,
    /// (question id, question text, graded correct), in quiz order.
    answers: Vec<(QuestionId, String, bool)>,
}

#[derive(Debug)]
struct RemedialState {
    concept: QuestionId,
    difficulty: Difficulty,
    current_question: QuestionId,
}

#[derive(Debug)]
struct PracticeState {
    topic_id: TopicId,
    difficulty: Difficulty,
    completed: u32,
    correct: u32,
}

#[derive(Debug, Default)]
struct State {
    quizzes: HashMap<QuizId, Vec<QuizQuestion>>,
    topics: HashMap<TopicId, Vec<QuizQuestion>>,
    attempts: HashMap<AttemptId, AttemptState>,
    remedials: HashMap<RemedialId, RemedialState>,
    practices: HashMap<PracticeSessionId, PracticeState>,
    answer_key: HashMap<QuestionId, Option<OptionId>>,
    next_variant_id: u64,
    fail_next: bool,
    quiz_mistakes_seen: bool,
}

impl State {
    fn mint_variant(
        &mut self,
        base: &QuizQuestion,
        difficulty: Difficulty,
    ) -> Result<QuizQuestion, ClientError> {
        self.next_variant_id += 1;
        let id = QuestionId::new(VARIANT_ID_BASE + self.next_variant_id);
        let mut variant = QuizQuestion::new(
            id,
            base.body().to_string(),
            base.options().to_vec(),
            difficulty,
        )
        .map_err(|e| ClientError::Rejected(e.to_string()))?
        .with_parent(base.parent_question_id().unwrap_or_else(|| base.id()));
        if let Some(explanation) = base.explanation() {
            variant = variant.with_explanation(explanation);
        }
        if let Some(citation) = base.citation() {
            variant = variant.with_citation(citation);
        }
        self.answer_key.insert(id, variant.correct_option_id());
        Ok(variant)
    }

    fn grade(&self, question_id: QuestionId, option_id: OptionId) -> Result<bool, ClientError> {
        match self.answer_key.get(&question_id) {
            Some(key) => Ok(*key == Some(option_id)),
            None => Err(ClientError::Rejected(format!(
                "unknown question {question_id}"
            ))),
        }
    }
}

/// Mutex-guarded fake attempt service.
#[derive(Clone)]
pub struct InMemoryAttemptClient {
    state: Arc<Mutex<State>>,
    serve_lookahead: bool,
    serve_completion_flag: bool,
}

impl InMemoryAttemptClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            serve_lookahead: true,
            serve_completion_flag: true,
        }
    }

    /// Stops serving the `next_question` look-ahead on answers, forcing the
    /// engine onto its fetch paths.
    #[must_use]
    pub fn without_lookahead(mut self) -> Self {
        self.serve_lookahead = false;
        self
    }

    /// Stops serving `all_questions_answered`, forcing the engine onto the
    /// explicit current-question re-fetch branch.
    #[must_use]
    pub fn without_completion_flag(mut self) -> Self {
        self.serve_completion_flag = false;
        self
    }

    /// Seeds a quiz. Questions must carry their correct options; issued
    /// copies are redacted.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_quiz(
        &self,
        quiz_id: QuizId,
        questions: Vec<QuizQuestion>,
    ) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        for question in &questions {
            state
                .answer_key
                .insert(question.id(), question.correct_option_id());
        }
        state.quizzes.insert(quiz_id, questions);
        Ok(())
    }

    /// Seeds a practice topic.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_topic(
        &self,
        topic_id: TopicId,
        questions: Vec<QuizQuestion>,
    ) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        for question in &questions {
            state
                .answer_key
                .insert(question.id(), question.correct_option_id());
        }
        state.topics.insert(topic_id, questions);
        Ok(())
    }

    /// Arms a one-shot transient failure: the next call, whatever it is,
    /// returns `ClientError::Unavailable`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn fail_next(&self) -> Result<(), ClientError> {
        self.lock()?.fail_next = true;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ClientError> {
        self.state
            .lock()
            .map_err(|e| ClientError::Connection(e.to_string()))
    }

    fn locked(&self) -> Result<MutexGuard<'_, State>, ClientError> {
        let mut state = self.lock()?;
        if state.fail_next {
            state.fail_next = false;
            return Err(ClientError::Unavailable);
        }
        Ok(state)
    }

    fn practice_pool(questions: &[QuizQuestion], difficulty: Difficulty) -> Vec<QuizQuestion> {
        let filtered: Vec<QuizQuestion> = questions
            .iter()
            .filter(|q| q.difficulty() == difficulty)
            .cloned()
            .collect();
        if filtered.is_empty() {
            questions.to_vec()
        } else {
            filtered
        }
    }
}

impl Default for InMemoryAttemptClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttemptClient for InMemoryAttemptClient {
    async fn start_quiz(&self, quiz_id: QuizId) -> Result<QuizStart, ClientError> {
        let mut state = self.locked()?;
        let questions = state
            .quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(ClientError::NotFound)?;

        let attempt_id = AttemptId::mint();
        let first = questions.first().map(QuizQuestion::with_correctness_withheld);
        let total = questions.len();
        state.attempts.insert(
            attempt_id,
            AttemptState {
                questions,
                cursor: 0,
                answers: Vec::new(),
            },
        );

        Ok(QuizStart {
            attempt_id,
            question: first,
            question_index: 0,
            total_questions: total,
        })
    }

    async fn current_question(
        &self,
        attempt_id: AttemptId,
    ) -> Result<CurrentQuestion, ClientError> {
        let state = self.locked()?;
        let attempt = state.attempts.get(&attempt_id).ok_or(ClientError::NotFound)?;
        Ok(CurrentQuestion {
            question: attempt
                .questions
                .get(attempt.cursor)
                .map(QuizQuestion::with_correctness_withheld),
            question_index: attempt.cursor,
            total_questions: attempt.questions.len(),
        })
    }

    async fn answer_question(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Attempt, ClientError> {
        let mut state = self.locked()?;
        let attempt = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or(ClientError::NotFound)?;
        let question = attempt
            .questions
            .get(attempt.cursor)
            .ok_or_else(|| ClientError::Rejected("quiz already finished".into()))?
            .clone();
        if question.id() != question_id {
            return Err(ClientError::Rejected("question answered out of order".into()));
        }
        if !question.has_option(option_id) {
            return Err(ClientError::Rejected("unknown option".into()));
        }

        let is_correct = question.correct_option_id() == Some(option_id);
        attempt
            .answers
            .push((question_id, question.body().to_string(), is_correct));
        attempt.cursor += 1;
        let cursor = attempt.cursor;
        let finished = cursor >= attempt.questions.len();
        let next = attempt
            .questions
            .get(cursor)
            .map(QuizQuestion::with_correctness_withheld);
        if !is_correct {
            state.quiz_mistakes_seen = true;
        }

        let score = if is_correct { 1.0 } else { 0.0 };
        let mut outcome = Attempt::new(question_id, option_id, is_correct, score)
            .map_err(|e| ClientError::Rejected(e.to_string()))?;
        if let Some(explanation) = question.explanation() {
            outcome = outcome.with_explanation(explanation);
        }
        if is_correct {
            outcome = outcome.with_xp(XP_PER_CORRECT);
        }
        if self.serve_lookahead {
            if let Some(next) = next {
                outcome = outcome.with_next_question(next);
            }
        }
        if self.serve_completion_flag {
            outcome = outcome.with_all_questions_answered(finished);
        }
        Ok(outcome)
    }

    async fn quiz_summary(&self, attempt_id: AttemptId) -> Result<QuizSummary, ClientError> {
        let state = self.locked()?;
        let attempt = state.attempts.get(&attempt_id).ok_or(ClientError::NotFound)?;
        if attempt.cursor < attempt.questions.len() {
            return Err(ClientError::Rejected("attempt still in progress".into()));
        }

        let total = attempt.answers.len();
        let correct = attempt.answers.iter().filter(|(_, _, ok)| *ok).count();
        let (score, percentage) = if total == 0 {
            (1.0, 100.0)
        } else {
            let score = correct as f64 / total as f64;
            (score, 100.0 * score)
        };
        let results = attempt
            .answers
            .iter()
            .map(|(id, text, ok)| QuestionResult {
                question_id: *id,
                question_text: text.clone(),
                is_correct: *ok,
            })
            .collect();

        QuizSummary::new(attempt_id, score, percentage, results, correct < total)
            .map_err(|e| ClientError::Rejected(e.to_string()))
    }

    async fn choose_remedial_difficulty(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        difficulty: Difficulty,
    ) -> Result<RemedialQuestion, ClientError> {
        let mut state = self.locked()?;
        let attempt = state.attempts.get(&attempt_id).ok_or(ClientError::NotFound)?;
        let missed = attempt
            .answers
            .iter()
            .any(|(id, _, ok)| *id == question_id && !*ok);
        if !missed {
            return Err(ClientError::Rejected(
                "question was not missed in this attempt".into(),
            ));
        }
        let base = attempt
            .questions
            .iter()
            .find(|q| q.id() == question_id)
            .cloned()
            .ok_or(ClientError::NotFound)?;

        let variant = state.mint_variant(&base, difficulty)?;
        let remedial_id = RemedialId::mint();
        state.remedials.insert(
            remedial_id,
            RemedialState {
                concept: question_id,
                difficulty,
                current_question: variant.id(),
            },
        );

        Ok(RemedialQuestion {
            remedial_id,
            question: variant.with_correctness_withheld(),
        })
    }

    async fn submit_remedial_answer(
        &self,
        remedial_id: RemedialId,
        option_id: OptionId,
    ) -> Result<RemedialFeedback, ClientError> {
        let mut state = self.locked()?;
        let (concept, difficulty, current) = {
            let remedial = state
                .remedials
                .get(&remedial_id)
                .ok_or(ClientError::NotFound)?;
            (
                remedial.concept,
                remedial.difficulty,
                remedial.current_question,
            )
        };
        let is_correct = state.grade(current, option_id)?;

        // Explanation comes from the concept's bank question.
        let base = state
            .quizzes
            .values()
            .flat_map(|questions| questions.iter())
            .find(|q| q.id() == concept)
            .cloned();
        let explanation = base
            .as_ref()
            .and_then(|q| q.explanation().map(str::to_owned));

        if is_correct {
            return Ok(RemedialFeedback {
                is_correct: true,
                explanation,
                next_question: None,
                remedial_completed: true,
            });
        }

        let base = base.ok_or(ClientError::NotFound)?;
        let variant = state.mint_variant(&base, difficulty)?;
        if let Some(remedial) = state.remedials.get_mut(&remedial_id) {
            remedial.current_question = variant.id();
        }
        Ok(RemedialFeedback {
            is_correct: false,
            explanation,
            next_question: Some(variant.with_correctness_withheld()),
            remedial_completed: false,
        })
    }

    async fn start_practice_session(
        &self,
        topic_id: TopicId,
        difficulty: Difficulty,
    ) -> Result<PracticeStart, ClientError> {
        let mut state = self.locked()?;
        let bank = state
            .topics
            .get(&topic_id)
            .cloned()
            .ok_or(ClientError::NotFound)?;
        let pool = Self::practice_pool(&bank, difficulty);
        if pool.is_empty() {
            return Err(ClientError::Rejected("topic has no questions".into()));
        }

        let session_id = PracticeSessionId::mint();
        let quiz_context_used = state.quiz_mistakes_seen;
        state.practices.insert(
            session_id,
            PracticeState {
                topic_id,
                difficulty,
                completed: 0,
                correct: 0,
            },
        );

        Ok(PracticeStart {
            session_id,
            questions: pool
                .iter()
                .take(PRACTICE_BATCH)
                .map(QuizQuestion::with_correctness_withheld)
                .collect(),
            quiz_context_used,
        })
    }

    async fn answer_practice_question(
        &self,
        session_id: PracticeSessionId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<PracticeFeedback, ClientError> {
        let mut state = self.locked()?;
        if !state.practices.contains_key(&session_id) {
            return Err(ClientError::NotFound);
        }
        let is_correct = state.grade(question_id, option_id)?;
        let explanation = state
            .topics
            .values()
            .flat_map(|questions| questions.iter())
            .find(|q| q.id() == question_id)
            .and_then(|q| q.explanation().map(str::to_owned));

        let session = state
            .practices
            .get_mut(&session_id)
            .ok_or(ClientError::NotFound)?;
        session.completed += 1;
        if is_correct {
            session.correct += 1;
        }

        Ok(PracticeFeedback {
            is_correct,
            explanation,
            questions_completed: session.completed,
            total_correct: session.correct,
        })
    }

    async fn generate_more_practice_question(
        &self,
        session_id: PracticeSessionId,
    ) -> Result<GeneratedQuestion, ClientError> {
        let mut state = self.locked()?;
        let (topic_id, difficulty) = {
            let session = state
                .practices
                .get(&session_id)
                .ok_or(ClientError::NotFound)?;
            (session.topic_id, session.difficulty)
        };
        let bank = state
            .topics
            .get(&topic_id)
            .cloned()
            .ok_or(ClientError::NotFound)?;
        let pool = Self::practice_pool(&bank, difficulty);
        let base = pool
            .choose(&mut rand::rng())
            .ok_or_else(|| ClientError::Rejected("topic has no questions".into()))?;

        let variant = state.mint_variant(base, difficulty)?;
        Ok(GeneratedQuestion {
            question: variant.with_correctness_withheld(),
        })
    }
}
