use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quizpath::app::{AnswerReport, CoursePaths};
use quizpath::catalog::Question;
use quizpath::engine::{QuizSession, StepStatus};
use quizpath::{App, CourseConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quizpath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Question catalog (JSON)
    #[arg(long, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Learner playing
    #[arg(short, long, global = true)]
    learner: Option<String>,

    /// Course name, used to separate progress files
    #[arg(long, global = true, default_value = "default")]
    course: String,

    /// Course configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for progress and session files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a learner with the initial number of lives
    Init {
        /// Learner name
        name: String,
    },
    /// List topics with your score on each
    Topics,
    /// Show the steps of a topic
    Steps {
        /// Topic name
        topic: String,
    },
    /// Start an adaptive quiz on a step
    Step {
        /// Topic name
        topic: String,
        /// Step number, starting at 1
        step: usize,
    },
    /// Start a quiz to win back a life
    Recover,
    /// List brush-up levels, or start one
    BrushUp {
        /// Level number, starting at 1
        level: Option<usize>,
    },
    /// Start a quiz over every question of a topic
    Review {
        /// Topic name
        topic: String,
    },
    /// Answer the current question
    Answer {
        /// Your answer
        text: String,
    },
    /// Show your remaining lives
    Lives,
    /// Save a question for later (the current one by default)
    Save {
        /// Question id
        id: Option<u64>,
    },
    /// Remove a question from your saved ones
    Unsave {
        /// Question id
        id: u64,
    },
    /// List your saved questions
    Saved,
    /// Remove all your saved questions
    ResetSaved,
    /// Show the course ranking
    Ranking,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizpath=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CourseConfig::load_from(path)?,
        None => CourseConfig::load()?,
    };
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => CourseConfig::data_dir()?,
    };
    let paths = CoursePaths::new(&cli.catalog, &data_dir, &cli.course);
    let mut app = App::open(config, paths)?;

    let Some(command) = cli.command else {
        println!("{}: {} questions", app.config().quiz_name, app.catalog().question_count());
        println!("Run `quizpath --help` to see the available commands.");
        return Ok(());
    };

    if let Commands::Init { name } = &command {
        if app.enroll(name) {
            let lives = app.config().initial_life_number;
            println!("Welcome {name}! You start with {lives} lives.");
        } else {
            println!("{name} is already enrolled.");
        }
        return app.save();
    }

    if let Commands::Ranking = &command {
        for (rank, standing) in app.ranking().iter().enumerate() {
            println!("{:>3}. {:<20} {:.3}", rank + 1, standing.learner, standing.score);
        }
        return Ok(());
    }

    let learner = cli.learner.context("This command needs --learner <name>")?;

    match command {
        Commands::Topics => {
            for topic in app.topics(&learner)? {
                println!(
                    "{:<30} {:>4} questions  score {:.3}",
                    topic.name, topic.questions, topic.score
                );
            }
        }
        Commands::Steps { topic } => {
            for step in app.steps(&learner, &topic)? {
                let status = match step.status {
                    StepStatus::Locked => "locked".to_string(),
                    StepStatus::Open { completions } => format!("open ({completions} done)"),
                    StepStatus::Cleared { completions } => format!("cleared ({completions} done)"),
                };
                println!(
                    "{}. {:<12} {:>4} questions  {}",
                    step.step, step.name, step.questions, status
                );
            }
        }
        Commands::Step { topic, step } => {
            let session = app.start_step(&learner, &topic, step)?;
            announce(&app, &session);
        }
        Commands::Recover => {
            let session = app.start_recovery(&learner)?;
            announce(&app, &session);
        }
        Commands::BrushUp { level: None } => {
            for (i, level) in app.brushup_levels(&learner)?.iter().enumerate() {
                let state = if level.available { "available" } else { "not available yet" };
                println!("{}. {:<12} {}", i + 1, level.name, state);
            }
        }
        Commands::BrushUp { level: Some(level) } => {
            let index = level.checked_sub(1).context("Brush-up levels start at 1")?;
            let session = app.start_brushup(&learner, index)?;
            announce(&app, &session);
        }
        Commands::Review { topic } => {
            let session = app.start_review(&learner, &topic)?;
            announce(&app, &session);
        }
        Commands::Answer { text } => {
            let report = app.answer(&learner, &text)?;
            print_report(&report);
        }
        Commands::Lives => {
            println!("{} of {} lives", app.lives(&learner)?, app.config().initial_life_number);
        }
        Commands::Save { id } => {
            let (id, added) = app.save_question(&learner, id)?;
            if added {
                println!("Question {id} saved.");
            } else {
                println!("Question {id} was already saved.");
            }
        }
        Commands::Unsave { id } => {
            if app.unsave_question(&learner, id)? {
                println!("Question {id} removed from saved questions.");
            } else {
                println!("Question {id} was not saved.");
            }
        }
        Commands::Saved => {
            let saved = app.saved_questions(&learner)?;
            if saved.is_empty() {
                println!("No saved questions.");
            }
            for question in saved {
                println!(
                    "{:>6}  {:<24} [{}] {}",
                    question.id, question.topic, question.name, question.text
                );
            }
        }
        Commands::ResetSaved => {
            let dropped = app.reset_saved_questions(&learner)?;
            println!("Removed {dropped} saved questions.");
        }
        Commands::Init { .. } | Commands::Ranking => {}
    }

    app.save()
}

/// Print the first question of a freshly started quiz
fn announce(app: &App, session: &QuizSession) {
    if session.questions.is_empty() {
        println!("No questions available for {}.", session.mode.label());
        return;
    }
    println!("{}: {} questions", session.mode.label(), session.questions.len());
    if let Some(question) = session.current().and_then(|id| app.catalog().find(id)) {
        print_question(question);
    }
}

fn print_question(question: &Question) {
    println!();
    println!("[{}] {}", question.name, question.text);
    if question.kind.is_choice() {
        for answer in &question.answers {
            println!("  - {}", answer.text);
        }
    }
}

fn print_report(report: &AnswerReport) {
    if report.grade.correct {
        println!("Correct!");
    } else {
        println!("Wrong. Expected: {}", report.grade.expected.join(" | "));
    }
    if let Some(feedback) = &report.grade.feedback {
        println!("{feedback}");
    }

    let outcome = &report.outcome;
    if outcome.recovered {
        println!("You won back a life: {} left.", outcome.lives);
    } else if outcome.lives_exhausted() {
        println!("No lives left. Run `quizpath recover` to win one back.");
    } else if !outcome.correct {
        println!("{} lives left.", outcome.lives);
    }
    if let Some(count) = outcome.step_completions {
        println!("Step completed ({count} times so far).");
    }

    match &report.next {
        Some(question) => print_question(question),
        None if outcome.finished => println!("Quiz finished."),
        None => {}
    }
}
