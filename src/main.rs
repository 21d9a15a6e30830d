use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use plugin_builder::app::App;
use plugin_builder::builder::{ManifestDefaults, PluginBuilder};
use plugin_builder::cli::{Cli, CliContext, Commands};
use plugin_builder::logging;
use plugin_builder::model::config::AppConfig;
use plugin_builder::msg::Msg;

fn main() {
    let code = dispatch(Cli::parse());
    process::exit(code);
}

/// Run the parsed command and return the process exit code. The logging
/// guard lives for the duration of this call so buffered lines are flushed.
fn dispatch(cli: Cli) -> i32 {
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e:#}");
            return 1;
        }
    };

    // Logging goes to a file, never stdout
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let _guard = match logging::init(level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {e:#}");
            None
        }
    };

    let root = match config.marketplace_root(cli.root.as_deref()) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return 1;
        }
    };
    let builder =
        PluginBuilder::new(root).with_manifest_defaults(ManifestDefaults::from(&config.plugin));

    match cli.command {
        None | Some(Commands::Tui) => match run_tui(builder, config) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e:#}");
                1
            }
        },
        Some(command) => {
            let color = config.ui.color && !cli.no_color && std::env::var_os("NO_COLOR").is_none();
            let context = CliContext::new(builder, color);
            match context.execute(&command) {
                Ok(output) => {
                    if !output.text.is_empty() {
                        println!("{}", output.text);
                    }
                    output.exit_code
                }
                Err(e) => {
                    tracing::error!("{command:?} failed: {e}");
                    eprintln!("Error: {e}");
                    1
                }
            }
        }
    }
}

fn run_tui(builder: PluginBuilder, config: AppConfig) -> Result<()> {
    tracing::info!("opening terminal UI on {}", builder.root().display());
    let watch_root = builder.root().to_path_buf();
    let app = App::new(builder, config)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, app, watch_root);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    watch_root: PathBuf,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    // Input thread: reads terminal events and forwards them as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) => Msg::Key(k),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: drives the refresh debounce
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(100));
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    spawn_file_watcher(watch_root, tx.clone());

    terminal.draw(|f| app.view(f))?;

    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        if app.should_quit {
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    tracing::info!("terminal UI closed");
    Ok(())
}

fn spawn_file_watcher(root: PathBuf, tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let tx_watch = tx.clone();
        let mut watcher: RecommendedWatcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            if tx_watch.send(Msg::FileChanged(path)).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("file watcher error: {err}");
                }
            }) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("failed to initialize file watcher: {err}");
                    return;
                }
            };

        for dir in ["registry", "plugins"] {
            let path = root.join(dir);
            if !path.is_dir() {
                continue;
            }
            if let Err(err) = watcher.watch(&path, RecursiveMode::Recursive) {
                tracing::warn!("failed to watch {}: {err}", path.display());
            }
        }

        loop {
            thread::park();
        }
    });
}
