use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::{Instant, interval_at};
use tracing::{info, warn};

use services::{AppServices, GameLoopService, ProviderError, TurnReport};
use storage::repository::StoreScope;
use study_core::game::{
    AnswerFeedback, EndCause, GameConfig, GameError, GamePhase, GameSession, GameSnapshot,
    ProblemRequest, TickOutcome,
};
use study_core::model::ProblemDraft;

const TICK: Duration = Duration::from_secs(1);

/// What a line typed by the player asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Answer(String),
    Skip,
    Continue,
    Quit,
}

fn interpret(line: &str, snapshot: &GameSnapshot) -> Command {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "quit" => return Command::Quit,
        "skip" => return Command::Skip,
        _ => {}
    }
    if snapshot.phase == GamePhase::Answered {
        return Command::Continue;
    }

    // A 1-based number picks an option; anything else is sent as typed.
    let options = snapshot
        .problem
        .as_ref()
        .map(|problem| problem.options.as_slice())
        .unwrap_or_default();
    let picked = trimmed
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index));
    Command::Answer(picked.cloned().unwrap_or_else(|| trimmed.to_string()))
}

type Fetch = Pin<Box<dyn Future<Output = Result<ProblemDraft, ProviderError>>>>;

/// Provider call running alongside input and ticks.
struct InFlight {
    request: ProblemRequest,
    fetch: Fetch,
}

impl InFlight {
    fn new(game_loop: &Arc<GameLoopService>, request: ProblemRequest) -> Self {
        let game_loop = Arc::clone(game_loop);
        Self {
            request,
            fetch: Box::pin(async move { game_loop.fetch(&request).await }),
        }
    }
}

/// Resolves when the in-flight call finishes; pending forever when idle.
async fn landed(
    in_flight: &mut Option<InFlight>,
) -> (ProblemRequest, Result<ProblemDraft, ProviderError>) {
    match in_flight {
        Some(call) => (call.request, (&mut call.fetch).await),
        None => std::future::pending().await,
    }
}

/// A fresh problem went up, so the next tick should be a full second away.
fn problem_landed(before: GamePhase, after: GamePhase) -> bool {
    before == GamePhase::Loading && after == GamePhase::AwaitingAnswer
}

/// Apply a player command; returns the feedback and the request to load next.
fn perform(
    session: &mut GameSession,
    command: Command,
) -> Result<(Option<AnswerFeedback>, Option<ProblemRequest>), GameError> {
    match command {
        Command::Answer(answer) => session
            .submit_answer(&answer)
            .map(|result| (Some(result.feedback), result.next)),
        Command::Skip => session.skip().map(|request| (None, Some(request))),
        Command::Continue => session.advance().map(|request| (None, request)),
        Command::Quit => Ok((None, None)),
    }
}

fn turn(
    session: &GameSession,
    feedback: Option<AnswerFeedback>,
    notice: Option<String>,
) -> TurnReport {
    TurnReport {
        snapshot: session.snapshot(),
        feedback,
        notice,
    }
}

/// Interactive game until it ends or the player quits.
///
/// Finished games are recorded in the player's progress.
pub async fn run(
    services: &AppServices,
    scope: &StoreScope,
    config: GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = GameSession::new(config);
    if !services.online() {
        println!("Playing offline with practice problems.");
    }

    let lines = BufReader::new(tokio::io::stdin()).lines();
    drive(&services.game_loop(), &mut session, lines).await?;

    if !session.is_over() {
        println!("Game abandoned.");
        return Ok(());
    }

    print_game_over(&session.snapshot());
    println!(
        "{} of {} problems answered correctly.",
        session.correct_answers(),
        session.problems_served()
    );
    match services.progress().record_game(scope, &session).await {
        Ok(progress) => println!(
            "Best score in {}: {} (highest level {})",
            session.category().title(),
            progress.best_score,
            progress.highest_level
        ),
        Err(err) => warn!(error = %err, "could not save progress"),
    }
    Ok(())
}

/// Play until the game ends, the player quits or input runs out.
///
/// Input, timer ticks and the provider call are separate branches of one
/// `select!`, so each transition runs to completion and `quit` can abandon a
/// problem that is still loading.
async fn drive<R>(
    game_loop: &Arc<GameLoopService>,
    session: &mut GameSession,
    mut lines: Lines<R>,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let timed = session.config().timer().is_timed();
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    let mut in_flight = Some(InFlight::new(game_loop, session.start()));
    info!(category = %session.category(), policy = ?session.policy(), "game started");

    while !session.is_over() {
        tokio::select! {
            biased;

            (request, fetched) = landed(&mut in_flight) => {
                in_flight = None;
                let before = session.phase();
                match game_loop.apply(session, &request, fetched) {
                    Ok(notice) => {
                        if problem_landed(before, session.phase()) {
                            ticker.reset();
                        }
                        render(&turn(session, None, notice));
                    }
                    Err(err) => println!("{err}"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = interpret(&line, &session.snapshot());
                if command == Command::Quit {
                    // Dropping the call discards whatever it would have returned.
                    session.reset();
                    in_flight = None;
                    break;
                }
                match perform(session, command) {
                    Ok((feedback, next)) => {
                        if let Some(request) = next {
                            in_flight = Some(InFlight::new(game_loop, request));
                        }
                        render(&turn(session, feedback, None));
                    }
                    Err(err) => println!("{err}"),
                }
            }
            _ = ticker.tick(), if timed => match session.tick() {
                TickOutcome::TimedOut => println!("\nTime's up!"),
                TickOutcome::Running { remaining } if remaining <= 5 || remaining % 15 == 0 => {
                    println!("  {remaining}s left");
                }
                TickOutcome::Running { .. } | TickOutcome::Ignored => {}
            },
        }
    }
    Ok(())
}

fn render(report: &TurnReport) {
    if let Some(feedback) = &report.feedback {
        if feedback.correct {
            println!("Correct! +{}", feedback.delta);
        } else {
            println!("Not quite. The answer was {}.", feedback.correct_answer);
        }
    }
    if let Some(notice) = &report.notice {
        println!("({notice})");
    }

    let snapshot = &report.snapshot;
    match snapshot.phase {
        GamePhase::AwaitingAnswer => print_problem(snapshot),
        GamePhase::Answered => println!("Press Enter to continue."),
        GamePhase::Loading => println!("Loading the next problem..."),
        GamePhase::Idle | GamePhase::GameOver => {}
    }
}

fn print_problem(snapshot: &GameSnapshot) {
    let Some(problem) = &snapshot.problem else {
        return;
    };

    let clock = snapshot
        .time_remaining
        .map_or_else(String::new, |secs| format!(" | {secs}s"));
    println!(
        "\nLevel {}/{} | Score {}{clock}",
        snapshot.level, snapshot.max_level, snapshot.score
    );
    println!("{}", problem.statement);
    for (index, option) in problem.options.iter().enumerate() {
        println!("  {}. {option}", index + 1);
    }
    if snapshot.can_skip {
        println!("(type \"skip\" to skip, \"quit\" to leave)");
    }
}

fn print_game_over(snapshot: &GameSnapshot) {
    let reason = match snapshot.end_cause {
        Some(EndCause::Completed) => "You cleared every level!",
        Some(EndCause::WrongAnswer) => "Wrong answer, game over.",
        Some(EndCause::Timeout) => "Out of time, game over.",
        None => "Game over.",
    };
    println!("\n{reason} Final score: {}", snapshot.score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::ScriptedProblemProvider;
    use study_core::game::{EliminationPolicy, ProblemView, TimerMode};
    use study_core::model::{AnswerKind, Category};

    fn snapshot(phase: GamePhase, options: &[&str]) -> GameSnapshot {
        GameSnapshot {
            category: Category::LogicRiddle,
            policy: EliminationPolicy::RevealAndContinue,
            phase,
            level: 1,
            max_level: 10,
            score: 0,
            time_remaining: None,
            problem: Some(ProblemView {
                statement: "Which one?".into(),
                options: options.iter().map(ToString::to_string).collect(),
                answer_kind: if options.is_empty() {
                    AnswerKind::Numeric
                } else {
                    AnswerKind::Choice
                },
                level: 1,
            }),
            used_fallback: false,
            last_answer: None,
            end_cause: None,
            can_skip: false,
        }
    }

    #[test]
    fn numbers_pick_options() {
        let snap = snapshot(GamePhase::AwaitingAnswer, &["cat", "dog"]);
        assert_eq!(interpret(" 2 ", &snap), Command::Answer("dog".into()));
        assert_eq!(interpret("dog", &snap), Command::Answer("dog".into()));
        // Out of range is passed through and rejected by the session.
        assert_eq!(interpret("3", &snap), Command::Answer("3".into()));
    }

    #[test]
    fn free_answers_keep_numbers() {
        let snap = snapshot(GamePhase::AwaitingAnswer, &[]);
        assert_eq!(interpret("12", &snap), Command::Answer("12".into()));
    }

    #[test]
    fn reserved_words_and_continue() {
        let snap = snapshot(GamePhase::AwaitingAnswer, &["a"]);
        assert_eq!(interpret("SKIP", &snap), Command::Skip);
        assert_eq!(interpret("quit", &snap), Command::Quit);

        let answered = snapshot(GamePhase::Answered, &["a"]);
        assert_eq!(interpret("", &answered), Command::Continue);
    }

    fn bodmas(max_level: u32) -> GameSession {
        let config = GameConfig::new(
            Category::Bodmas,
            max_level,
            EliminationPolicy::StrictElimination,
            TimerMode::Untimed,
            None,
        )
        .unwrap();
        GameSession::new(config)
    }

    fn looper(provider: ScriptedProblemProvider) -> Arc<GameLoopService> {
        Arc::new(GameLoopService::new(Arc::new(provider)))
    }

    #[test]
    fn clock_restarts_only_when_a_problem_lands() {
        assert!(problem_landed(GamePhase::Loading, GamePhase::AwaitingAnswer));
        // Rejected input leaves the phase alone.
        assert!(!problem_landed(
            GamePhase::AwaitingAnswer,
            GamePhase::AwaitingAnswer
        ));
        // A stale response does not present anything.
        assert!(!problem_landed(GamePhase::Loading, GamePhase::Loading));
        assert!(!problem_landed(GamePhase::Answered, GamePhase::Loading));
    }

    #[test]
    fn rejected_input_requests_nothing() {
        let mut session = bodmas(3);
        let request = session.start();
        session
            .on_problem_ready(&request, ProblemDraft::open("1 + 1", "2"))
            .unwrap();

        let err = perform(&mut session, Command::Answer("two".into())).unwrap_err();
        assert!(matches!(err, GameError::InvalidInput(_)));
        assert_eq!(session.phase(), GamePhase::AwaitingAnswer);

        let (feedback, next) = perform(&mut session, Command::Answer("2".into())).unwrap();
        assert!(feedback.unwrap().correct);
        assert_eq!(next.map(|r| r.level()), Some(2));
    }

    #[tokio::test]
    async fn quit_abandons_a_problem_still_loading() {
        let game_loop = looper(ScriptedProblemProvider::new().then_stall());
        let mut session = bodmas(3);

        let input = (&b"quit\n"[..]).lines();
        tokio::time::timeout(Duration::from_secs(2), drive(&game_loop, &mut session, input))
            .await
            .expect("quit should not wait for the provider")
            .unwrap();

        assert_eq!(session.phase(), GamePhase::Idle);
        assert!(session.current_problem().is_none());
    }

    #[tokio::test]
    async fn scripted_game_plays_to_the_end() {
        let game_loop = looper(
            ScriptedProblemProvider::new()
                .then_problem(ProblemDraft::open("1 + 1", "2"))
                .then_problem(ProblemDraft::open("2 + 2", "4")),
        );
        let mut session = bodmas(2);

        let input = (&b"2\n4\n"[..]).lines();
        drive(&game_loop, &mut session, input).await.unwrap();

        assert_eq!(session.end_cause(), Some(EndCause::Completed));
        assert_eq!(session.score(), 30);
    }
}
