//! Application state and command handling
//!
//! `App` owns one course: its configuration, question catalog, progress store
//! and running quizzes. The binary opens one per command and saves it after.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::catalog::{Catalog, Grade, Question, QuestionId, TallyRow, load_catalog};
use crate::config::{self, CourseConfig, ProgressFile, SessionFile};
use crate::engine::{
    self, AnswerOutcome, EngineError, ProgressStore, QuizSession, SessionMode, Standing,
    StepSeed, StepStatus, Tracker,
};

/// Where a course keeps its files
#[derive(Debug, Clone)]
pub struct CoursePaths {
    /// Catalog JSON
    pub catalog: PathBuf,
    /// Progress JSON
    pub progress: PathBuf,
    /// Running-quiz JSON
    pub session: PathBuf,
}

impl CoursePaths {
    /// Standard layout for a course inside a data directory
    pub fn new(catalog: &Path, data_dir: &Path, course: &str) -> Self {
        Self {
            catalog: catalog.to_path_buf(),
            progress: config::progress_path(data_dir, course),
            session: config::session_path(data_dir, course),
        }
    }
}

/// Overview line for a topic
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub name: String,
    pub questions: usize,
    pub score: f64,
}

/// Overview line for a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub step: usize,
    pub name: String,
    pub questions: usize,
    pub status: StepStatus,
}

/// Overview line for a brush-up level
#[derive(Debug, Clone, PartialEq)]
pub struct BrushUpLevel {
    pub name: String,
    pub level: usize,
    pub available: bool,
}

/// Result of submitting one answer
#[derive(Debug, Clone)]
pub struct AnswerReport {
    pub grade: Grade,
    pub outcome: AnswerOutcome,
    /// Next question, if the quiz goes on
    pub next: Option<Question>,
}

/// The main application
pub struct App {
    /// Course configuration
    config: CourseConfig,

    /// Questions of the course, restricted to the configured kinds
    catalog: Catalog,

    /// Lives, completions and answer log
    progress: ProgressFile,

    /// Running quizzes
    sessions: SessionFile,

    /// Files backing the state, if any
    paths: Option<CoursePaths>,

    /// Randomness for adaptive draws
    rng: ChaCha20Rng,
}

impl App {
    /// Build an application from in-memory state
    pub fn new(config: CourseConfig, catalog: Catalog, progress: ProgressFile) -> Self {
        let catalog = catalog.with_types(&config.question_types);
        Self {
            config,
            catalog,
            progress,
            sessions: SessionFile::default(),
            paths: None,
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Load a course from disk
    pub fn open(config: CourseConfig, paths: CoursePaths) -> Result<Self> {
        let catalog = load_catalog(&paths.catalog)?;
        let progress = ProgressFile::load_from(&paths.progress)?;
        let sessions = SessionFile::load_from(&paths.session)?;

        let mut app = Self::new(config, catalog, progress);
        app.sessions = sessions;
        app.paths = Some(paths);
        Ok(app)
    }

    /// Use a fixed seed for adaptive draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
        self
    }

    /// Write progress and sessions back to disk
    pub fn save(&self) -> Result<()> {
        if let Some(paths) = &self.paths {
            self.progress.save_to(&paths.progress)?;
            self.sessions.save_to(&paths.session)?;
        }
        Ok(())
    }

    /// Course configuration
    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    /// Question catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Register a learner; false if already enrolled
    pub fn enroll(&mut self, learner: &str) -> bool {
        self.progress.enroll(learner, self.config.initial_life_number)
    }

    /// Current lives of a learner
    pub fn lives(&self, learner: &str) -> Result<u32> {
        self.require_enrolled(learner)?;
        Ok(self.progress.lives(learner))
    }

    /// Visible topics with the learner's score on each
    pub fn topics(&self, learner: &str) -> Result<Vec<TopicSummary>> {
        self.require_enrolled(learner)?;
        let rows = self.rows(learner);
        Ok(self
            .visible_topics()
            .into_iter()
            .map(|name| {
                let questions = rows.iter().filter(|r| r.topic == name).count();
                let score = engine::topic_score(&rows, &name);
                TopicSummary { name, questions, score }
            })
            .collect())
    }

    /// Steps of a topic with their lock state
    pub fn steps(&self, learner: &str, topic: &str) -> Result<Vec<StepSummary>> {
        self.require_enrolled(learner)?;
        self.require_topic(topic)?;

        let rows = self.rows(learner);
        let plan = self.plan(learner, topic, &rows);
        let tracker = self.tracker();

        Ok((1..=plan.len())
            .map(|step| StepSummary {
                step,
                name: self.config.step_name(step),
                questions: plan.step(step).map_or(0, <[QuestionId]>::len),
                status: tracker.step_status(&self.progress, learner, topic, step),
            })
            .collect())
    }

    /// Brush-up levels and whether each can produce a quiz
    pub fn brushup_levels(&self, learner: &str) -> Result<Vec<BrushUpLevel>> {
        self.require_enrolled(learner)?;
        let rows = self.rows(learner);
        let available = engine::brushup_availability(
            &rows,
            &self.config.recover_topics,
            self.config.n_questions_by_brush_up,
            &self.config.brush_up_levels,
        );
        Ok(self
            .config
            .brush_up_levels
            .iter()
            .zip(available)
            .enumerate()
            .map(|(i, (&level, available))| BrushUpLevel {
                name: self.config.brush_up_level_name(i),
                level,
                available,
            })
            .collect())
    }

    /// Start an adaptive quiz on one step of a topic
    pub fn start_step(&mut self, learner: &str, topic: &str, step: usize) -> Result<QuizSession> {
        self.require_enrolled(learner)?;
        self.require_topic(topic)?;
        self.tracker().check_step_access(&self.progress, learner, topic, step)?;

        let rows = self.rows(learner);
        let plan = self.plan(learner, topic, &rows);
        let candidates = plan.step_rows(step, &rows);
        let n_questions = plan.step_quiz_size(step);
        let questions =
            engine::select(&candidates, n_questions, &self.config.race_params(), &mut self.rng);

        tracing::info!(learner, topic, step, questions = questions.len(), "step quiz started");
        Ok(self.begin(learner, SessionMode::Step { topic: topic.to_string(), step }, questions))
    }

    /// Start a life-recovery quiz
    pub fn start_recovery(&mut self, learner: &str) -> Result<QuizSession> {
        self.require_enrolled(learner)?;

        let rows = self.rows(learner);
        let recovery_topics = self.recovery_topics();
        let n_questions = rows.iter().filter(|r| recovery_topics.contains(&r.topic)).count();
        let questions =
            engine::select_recovery(&rows, &recovery_topics, n_questions, &mut self.rng);

        tracing::info!(learner, questions = questions.len(), "recovery quiz started");
        Ok(self.begin(learner, SessionMode::Recovery { correct: 0 }, questions))
    }

    /// Start a brush-up quiz at a configured level (0-based index)
    pub fn start_brushup(&mut self, learner: &str, index: usize) -> Result<QuizSession> {
        self.require_enrolled(learner)?;
        let Some(&level) = self.config.brush_up_levels.get(index) else {
            bail!(
                "Unknown brush-up level {}; {} levels are configured",
                index + 1,
                self.config.brush_up_levels.len()
            );
        };

        let rows = self.rows(learner);
        let questions = engine::select_brushup(
            &rows,
            &self.config.recover_topics,
            self.config.n_questions_by_brush_up,
            level,
            &mut self.rng,
        );

        tracing::info!(learner, level, questions = questions.len(), "brush-up quiz started");
        Ok(self.begin(learner, SessionMode::BrushUp { level }, questions))
    }

    /// Start a quiz over every question of a topic
    pub fn start_review(&mut self, learner: &str, topic: &str) -> Result<QuizSession> {
        self.require_enrolled(learner)?;
        self.require_topic(topic)?;

        let rows = self.rows(learner);
        let questions = engine::select_review(&rows, topic);

        tracing::info!(learner, topic, questions = questions.len(), "review quiz started");
        Ok(self.begin(learner, SessionMode::Review { topic: topic.to_string() }, questions))
    }

    /// Question the learner has to answer next
    pub fn current_question(&self, learner: &str) -> Option<&Question> {
        self.sessions
            .get(learner)
            .and_then(QuizSession::current)
            .and_then(|id| self.catalog.find(id))
    }

    /// Grade an answer to the current question and advance the quiz
    pub fn answer(&mut self, learner: &str, input: &str) -> Result<AnswerReport> {
        let tracker = self.tracker();
        let session = self.sessions.get_mut(learner).ok_or(EngineError::NoActiveSession)?;
        let id = session.current().ok_or(EngineError::NoActiveSession)?;
        let question = self.catalog.find(id).ok_or(EngineError::UnknownQuestion(id))?;

        let grade = question.grade(input);
        let outcome = tracker.answer(session, &mut self.progress, grade.correct)?;
        let next = session.current().and_then(|id| self.catalog.find(id)).cloned();

        if outcome.finished {
            self.sessions.clear(learner);
        }
        Ok(AnswerReport { grade, outcome, next })
    }

    /// Save a question for later, the current one when `question` is None.
    ///
    /// Returns the saved id and whether it was newly saved.
    pub fn save_question(
        &mut self,
        learner: &str,
        question: Option<QuestionId>,
    ) -> Result<(QuestionId, bool)> {
        self.require_enrolled(learner)?;
        let id = match question {
            Some(id) => id,
            None => self
                .sessions
                .get(learner)
                .and_then(QuizSession::current)
                .ok_or(EngineError::NoActiveSession)?,
        };
        if self.catalog.find(id).is_none() {
            return Err(EngineError::UnknownQuestion(id).into());
        }
        let added = self.progress.bookmark(learner, id);
        tracing::debug!(learner, id, added, "question saved");
        Ok((id, added))
    }

    /// Forget a saved question; false if it was not saved
    pub fn unsave_question(&mut self, learner: &str, question: QuestionId) -> Result<bool> {
        self.require_enrolled(learner)?;
        Ok(self.progress.unbookmark(learner, question))
    }

    /// Saved questions still present in the catalog, by id
    pub fn saved_questions(&self, learner: &str) -> Result<Vec<&Question>> {
        self.require_enrolled(learner)?;
        Ok(self
            .progress
            .bookmarks(learner)
            .into_iter()
            .filter_map(|id| self.catalog.find(id))
            .collect())
    }

    /// Drop every saved question. Returns how many were dropped
    pub fn reset_saved_questions(&mut self, learner: &str) -> Result<usize> {
        self.require_enrolled(learner)?;
        Ok(self.progress.reset_bookmarks(learner))
    }

    /// Learners ranked by their mean score over visible topics
    pub fn ranking(&self) -> Vec<Standing> {
        let topics = self.visible_topics();
        engine::leaderboard(self.progress.learners().into_iter().map(|learner| {
            let rows = self.rows(learner);
            (learner.to_string(), engine::course_score(&rows, &topics))
        }))
    }

    fn begin(
        &mut self,
        learner: &str,
        mode: SessionMode,
        questions: Vec<QuestionId>,
    ) -> QuizSession {
        let session = QuizSession::new(learner, mode, questions);
        if !session.finished {
            self.sessions.start(session.clone());
        }
        session
    }

    fn tracker(&self) -> Tracker {
        Tracker::new(self.config.tracker_rules())
    }

    fn rows(&self, learner: &str) -> Vec<TallyRow> {
        self.catalog.tally_rows(&self.progress.tallies(learner))
    }

    fn plan(&self, learner: &str, topic: &str, rows: &[TallyRow]) -> engine::StepPlan {
        engine::partition(
            rows,
            topic,
            self.config.n_steps,
            self.config.n_questions,
            StepSeed::derive(learner, topic),
        )
    }

    fn visible_topics(&self) -> Vec<String> {
        engine::visible_topics(&self.catalog, &self.config.topics_to_hide)
    }

    /// Configured recovery topics, or every visible topic when none are set
    fn recovery_topics(&self) -> Vec<String> {
        if self.config.recover_topics.is_empty() {
            self.visible_topics()
        } else {
            self.config.recover_topics.clone()
        }
    }

    fn require_enrolled(&self, learner: &str) -> Result<()> {
        if !self.progress.is_enrolled(learner) {
            bail!("Learner {learner:?} is not enrolled; run `quizpath init {learner}` first");
        }
        Ok(())
    }

    fn require_topic(&self, topic: &str) -> Result<(), EngineError> {
        if self.catalog.topic(topic).is_none() {
            return Err(EngineError::UnknownTopic(topic.to_string()));
        }
        Ok(())
    }
}
