use anyhow::{Context, Result};
use minesweeper_cli::Game;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout carries the game itself, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let mut game = Game::setup(&mut input, &mut output).context("failed to set up the board")?;
    game.play(&mut input, &mut output).context("game aborted")?;
    Ok(())
}
