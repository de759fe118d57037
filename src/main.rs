use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::cursor::{Hide, Show};
use crossterm::event;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use maze_game::config::{
    prompt_username, resolve_username, Args, GameConfig, Pacing, LEADERBOARD_SIZE,
};
use maze_game::input::InputTracker;
use maze_game::leaderboard::{settle, JsonFileStore, LeaderboardStore};
use maze_game::render::Renderer;
use maze_game::{MazeSet, MoveOutcome, Progress, ProgressionController, Result, Tick};

const DEAD_END_MESSAGE: &str = "You hit a dead end and were eaten by trolls!";
const RESTART_MESSAGE: &str = "Game over, restarting!";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_file);

    let config = match GameConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("maze: {e}");
            return ExitCode::FAILURE;
        }
    };
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mazes = match MazeSet::build(&mut rng, config.map_count, config.width, config.height) {
        Ok(mazes) => mazes,
        Err(e) => {
            error!("{e}");
            eprintln!("maze: {e}");
            return ExitCode::FAILURE;
        }
    };

    let username = match args.username.as_deref() {
        Some(name) => resolve_username(Some(name)),
        None => prompt_username(&mut io::stdin().lock(), &mut io::stdout()),
    };
    info!(
        "starting run for {username}: {} maps of {}x{}, seed {seed}",
        config.map_count, config.width, config.height
    );

    let controller = ProgressionController::new(mazes, config.max_fails_per_map);
    let mut store = JsonFileStore::new(&args.leaderboard);
    match play(&controller, &mut store, &username) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("maze: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(path: &Path) {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn play(
    controller: &ProgressionController,
    store: &mut impl LeaderboardStore,
    username: &str,
) -> Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, controller, store, username);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(
    stdout: &mut Stdout,
    controller: &ProgressionController,
    store: &mut impl LeaderboardStore,
    username: &str,
) -> Result<()> {
    let pacing = Pacing::from_env();
    let mut state = controller.new_session()?;
    let grid = controller.active_maze(&state)?.grid();
    let mut renderer = Renderer::new(grid.width(), grid.height());
    let mut input = InputTracker::new();
    let mut banner: Option<String> = None;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            input.absorb(&event::read()?);
        }

        if last_tick.elapsed() >= pacing.tick {
            last_tick = Instant::now();
            let snapshot = input.take_snapshot();
            let tick = controller.tick(&mut state, &snapshot)?;
            if let Some(standings) = settle(&tick, store, username, LEADERBOARD_SIZE) {
                renderer.render_win(
                    stdout,
                    controller.mazes().count(),
                    state.total_attempts(),
                    &standings,
                )?;
                return wait_for_quit(&mut input);
            }
            match tick {
                Tick::Quit => {
                    info!("closed by player");
                    return Ok(());
                }
                Tick::NoInput => {}
                Tick::Move { outcome, progress } => {
                    if outcome.is_rejected() {
                        thread::sleep(Pacing::throttle(snapshot.sprint));
                    }
                    match (outcome, progress) {
                        (MoveOutcome::Moved(step), None) => {
                            banner = None;
                            let frame = controller.frame(&state)?;
                            renderer.animate(stdout, &frame, step, snapshot.sprint)?;
                        }
                        (MoveOutcome::DeadEnd { step, .. }, None) => {
                            banner = Some(DEAD_END_MESSAGE.to_owned());
                            let frame = controller.frame(&state)?;
                            renderer.animate(stdout, &frame, step, snapshot.sprint)?;
                        }
                        (_, Some(Progress::Restarted)) => {
                            banner = Some(format!("{DEAD_END_MESSAGE} {RESTART_MESSAGE}"));
                            renderer.invalidate();
                        }
                        (_, Some(Progress::Advanced { map_index })) => {
                            banner = Some(format!("Map {map_index} cleared!"));
                            renderer.invalidate();
                        }
                        _ => {}
                    }
                }
            }
        }

        let frame = controller.frame(&state)?;
        let status = controller.status(&state);
        renderer.render(stdout, &frame, &status, banner.as_deref())?;

        let elapsed = frame_start.elapsed();
        if elapsed < pacing.frame {
            thread::sleep(pacing.frame - elapsed);
        }
    }
}

fn wait_for_quit(input: &mut InputTracker) -> Result<()> {
    loop {
        if event::poll(Duration::from_millis(50))? {
            input.absorb(&event::read()?);
            if input.take_snapshot().quit {
                return Ok(());
            }
        }
    }
}
