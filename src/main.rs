use clap::Parser;
use std::sync::mpsc;
use tdw::{CancellationToken, Cli, Config, PlainTextRenderer, PoolInitError, WatchedDir};

fn main() {
    let cli = Cli::parse();
    let config = Config::resolve(cli, std::path::Path::new("."));

    let mut watched = match WatchedDir::new(
        config.path.clone(),
        config.ignore_packages.clone(),
        config.ignore_modules.clone(),
        config.run_timeout,
        config.python_launcher.clone(),
    ) {
        Ok(watched) => watched,
        Err(err) => {
            eprintln!("tdw: {err}");
            std::process::exit(1);
        }
    };
    for mapping in &config.map {
        watched.register_mapping(mapping);
    }

    let pool = match rayon::ThreadPoolBuilder::new().build() {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("tdw: {}", PoolInitError { reason: err.to_string() });
            std::process::exit(1);
        }
    };

    let mut renderer = PlainTextRenderer;
    let token = CancellationToken::new();

    if config.dbg {
        tdw::run_debug_loop(&mut watched, &pool, &mut renderer, &token);
        return;
    }

    let (tx, rx) = mpsc::channel::<char>();
    spawn_stdin_reader(tx);
    let mut input = tdw::ChannelInputSource::new(rx);
    tdw::watch(&mut watched, &pool, &mut renderer, &mut input, &token, config.frequency);
}

/// Forwards single characters typed on stdin to the cycle driver's input
/// channel. Raw-terminal handling (no Enter required) is left to a richer
/// front end; this reads line-buffered stdin, which is enough for the
/// `r`/`q`/`a` operator commands.
fn spawn_stdin_reader(tx: mpsc::Sender<char>) {
    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            if let Some(c) = line.trim().chars().next() {
                if tx.send(c).is_err() {
                    break;
                }
            }
        }
    });
}
