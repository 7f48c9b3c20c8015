use actix::Addr;
use chess::Square;
use clap::{Parser, Subcommand, ValueEnum};
use futures::channel::mpsc;
use futures::StreamExt;
use log::{error, info, warn};
use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chess_client::api::game::GameMode;
use chess_client::api::{AiSubmitter, ApiClient, MultiplayerSubmitter};
use chess_client::auth::AuthGuard;
use chess_client::config::ClientConfig;
use chess_client::game::render::render_board;
use chess_client::game::utils::{color_to_side, describe_result, side_to_string};
use chess_client::game::{BoardController, ChessOracle, MoveSubmitter};
use chess_client::models::{AiDifficulty, AppState, GameId, NoticeLevel, Position};
use chess_client::websocket::{ChannelActor, SyncWithState, Teardown};
use chess_client::{ClientError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "chess-client", about = "Play chess against people or the engine from a terminal")]
struct Cli {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a multiplayer game and wait for an opponent
    Create,
    /// Join a multiplayer game by its id
    Join { game_id: u64 },
    /// Play against the engine
    Ai {
        #[arg(value_enum)]
        difficulty: Difficulty,
    },
    /// Show a profile with stats and recent games
    Profile { user_id: Option<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl From<Difficulty> for AiDifficulty {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => AiDifficulty::Easy,
            Difficulty::Medium => AiDifficulty::Medium,
            Difficulty::Hard => AiDifficulty::Hard,
        }
    }
}

#[actix_rt::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env()?;
    info!("Using backend at {}", config.api_url);

    let app_state = Arc::new(AppState::new());
    let api = ApiClient::new(&config, app_state.clone());
    api.sign_in(&cli.username, &cli.password).await?;

    let mode = match cli.command {
        Command::Profile { user_id } => return show_profile(&api, user_id).await,
        Command::Create => {
            let created = api.start_new_game().await?;
            println!("Created game {}. Share this id with your opponent.", created.id);
            GameMode::Multiplayer
        }
        Command::Join { game_id } => {
            api.join_existing_game(GameId(game_id)).await?;
            GameMode::Multiplayer
        }
        Command::Ai { difficulty } => {
            api.start_ai_game(difficulty.into()).await?;
            GameMode::Ai
        }
    };

    let outcome = play(&api, &config, mode).await;
    if let Err(e) = api.sign_out().await {
        warn!("Logout failed: {}", e);
    }
    outcome
}

async fn show_profile(api: &ApiClient, user_id: Option<String>) -> Result<()> {
    let user = match user_id {
        Some(id) => api.fetch_user(&id).await?,
        None => api.fetch_profile().await?,
    };
    let stats = api.fetch_user_stats(&user.id).await?;
    let games = api.fetch_user_games(&user.id).await?;

    println!("{} <{}>, member since {}", user.username, user.email, user.created_at.format("%Y-%m-%d"));
    println!(
        "Multiplayer: {} wins, {} losses ({})",
        stats.multiplayer_wins, stats.multiplayer_losses, stats.multiplayer_win_rate
    );
    println!("Against AI: {} wins, {} losses ({})", stats.ai_wins, stats.ai_losses, stats.ai_win_rate);
    println!("Best streak: {}, games played: {}", stats.best_streak, stats.total_games);
    for game in games {
        println!(
            "  {}  {:<12} {:?} vs {}",
            game.date.format("%Y-%m-%d"),
            game.game_type,
            game.result,
            game.opponent_username
        );
    }
    Ok(())
}

enum Input {
    Click(Square),
    Mark(Square),
    Resign,
    Quit,
}

fn parse_input(line: &str) -> Result<Input> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("quit"), None) => Ok(Input::Quit),
        (Some("resign"), None) => Ok(Input::Resign),
        (Some("mark"), Some(square)) => parse_square(square).map(Input::Mark),
        (Some(square), None) => parse_square(square).map(Input::Click),
        _ => Err(ClientError::InvalidSquare(line.trim().to_string())),
    }
}

fn parse_square(text: &str) -> Result<Square> {
    Square::from_str(&text.to_ascii_lowercase()).map_err(|_| ClientError::InvalidSquare(text.to_string()))
}

/// Lines typed on stdin, read on a plain thread so the event loop keeps running.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.unbounded_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn play(api: &ApiClient, config: &ClientConfig, mode: GameMode) -> Result<()> {
    let app_state = api.app_state().clone();
    let channel: Option<Addr<ChannelActor>> = match mode {
        GameMode::Multiplayer => {
            let addr = ChannelActor::start(app_state.clone(), config);
            match addr.send(SyncWithState).await {
                Ok(result) => result?,
                Err(e) => warn!("Channel unavailable: {}", e),
            }
            Some(addr)
        }
        GameMode::Ai => None,
    };
    let submitter: Box<dyn MoveSubmitter + '_> = match mode {
        GameMode::Multiplayer => Box::new(MultiplayerSubmitter { api }),
        GameMode::Ai => Box::new(AiSubmitter {
            api,
            result_delay: config.result_delay,
        }),
    };

    println!("Enter a square to select or move, `mark <square>` to mark, `resign` or `quit`.");
    let mut controller = BoardController::new(app_state.clone());
    let mut lines = stdin_lines();
    let mut shown: Option<Position> = None;
    let mut dirty = true;

    loop {
        controller.refresh();
        let position = app_state.game().position;
        if dirty || shown.as_ref() != Some(&position) {
            print_board(&controller, &app_state)?;
            shown = Some(position);
            dirty = false;
        }
        print_notices(&app_state);

        if let Some(winner) = app_state.result().winner.filter(|_| app_state.result().visible) {
            println!("{}", describe_result(winner, app_state.game().player));
            break;
        }

        let line = match actix_rt::time::timeout(POLL_INTERVAL, lines.next()).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(_) => continue,
        };
        if line.trim().is_empty() {
            continue;
        }

        let input = parse_input(&line);
        if matches!(input, Ok(Input::Click(_)) | Ok(Input::Resign)) {
            // Long games can outlive the access token
            if let Err(e) = AuthGuard::authorize(api).await {
                println!("Session expired, please log in again.");
                return Err(e);
            }
        }

        match input {
            Ok(Input::Quit) => break,
            Ok(Input::Resign) => {
                if let Err(e) = api.resign(mode).await {
                    warn!("Resign failed: {}", e);
                }
            }
            Ok(Input::Mark(square)) => {
                controller.on_square_right_click(square);
                dirty = true;
            }
            Ok(Input::Click(square)) => {
                let outcome = controller.click(square, submitter.as_ref()).await;
                info!("Click on {}: {:?}", square, outcome);
                dirty = true;
            }
            Err(e) => println!("{}", e),
        }
    }

    if let Some(addr) = channel {
        if let Err(e) = addr.send(Teardown).await {
            warn!("Channel already stopped: {}", e);
        }
    }
    Ok(())
}

fn print_board(controller: &BoardController, app_state: &AppState) -> Result<()> {
    let session = app_state.game();
    let board = ChessOracle::board(&session.position)?;
    println!();
    print!(
        "{}",
        render_board(&board, controller.orientation(), &controller.highlights(), controller.marks())
    );
    let game = session.game_id.map(|id| id.to_string()).unwrap_or_default();
    let status = session.status.map(|s| format!("{:?}", s)).unwrap_or_default();
    println!(
        "Game {} | {} | {} to move",
        game,
        status,
        side_to_string(color_to_side(board.side_to_move()))
    );
    Ok(())
}

fn print_notices(app_state: &AppState) {
    for notice in app_state.drain_notices() {
        match notice.level {
            NoticeLevel::Info => println!("* {}", notice.text),
            NoticeLevel::Error => println!("! {}", notice.text),
        }
    }
}
