use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use tracing::info;

mod app;
mod assist;
mod buffer;
mod config;
mod error;
mod highlight;
mod keybinds;
mod language;
mod logging;
mod lsp_client;
mod runner;
mod session;
mod syntax;
mod theme;
mod types;
mod ui;
mod util;
use app::App;
use language::Language;
use ui::draw;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    file: Option<PathBuf>,
    language: Option<Language>,
    help: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--lang" => {
                let Some(name) = args.next() else {
                    return Err("--lang needs a value".to_string());
                };
                let Some(lang) = Language::parse(&name) else {
                    return Err(format!(
                        "Unknown language: {name} (expected Python, JavaScript, C or Java)"
                    ));
                };
                parsed.language = Some(lang);
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option: {other}"));
            }
            _ => {
                if parsed.file.is_some() {
                    return Err("Only one FILE may be given".to_string());
                }
                parsed.file = Some(PathBuf::from(arg));
            }
        }
    }
    Ok(parsed)
}

fn print_help() {
    println!("Usage: lightide [OPTIONS] [FILE]");
    println!();
    println!("Arguments:");
    println!("  [FILE]         File to open (default: untitled buffer)");
    println!();
    println!("Options:");
    println!("  --lang NAME    Start with Python, JavaScript, C or Java selected");
    println!("  --help         Show this help message");
}

pub fn run() -> io::Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("Try 'lightide --help'.");
            return Ok(());
        }
    };
    if args.help {
        print_help();
        return Ok(());
    }

    let _log_guard = logging::init();
    let config = config::load_config();
    let cwd = std::env::current_dir()?;
    let mut app = App::new(cwd, config);
    if let Some(lang) = args.language {
        app.set_language(lang);
    }
    if let Some(path) = args.file.as_deref() {
        app.open_path(path);
    }
    info!(language = app.language.name(), "starting editor");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let enhanced_keys =
        ratatui::crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        );
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    let result = run_app(terminal, app);

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    if enhanced_keys {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;

    result
}

fn run_app(mut terminal: Terminal<CrosstermBackend<Stdout>>, mut app: App) -> io::Result<()> {
    loop {
        app.poll_lsp();
        terminal.draw(|f| draw(&mut app, f))?;
        if app.quit {
            return Ok(());
        }
        if event::poll(Duration::from_millis(100))? {
            loop {
                match event::read()? {
                    Event::Key(key) => {
                        if let Err(err) = app.handle_key(key) {
                            app.set_status(format!("Action failed: {err}"));
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let Err(err) = app.handle_mouse(mouse) {
                            app.set_status(format!("Action failed: {err}"));
                        }
                    }
                    _ => {}
                }
                if app.quit {
                    return Ok(());
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_and_language_are_parsed() {
        let parsed = parse_args(args(&["main.c", "--lang", "c"])).expect("parse");
        assert_eq!(parsed.file, Some(PathBuf::from("main.c")));
        assert_eq!(parsed.language, Some(Language::C));
        assert!(!parsed.help);
    }

    #[test]
    fn no_arguments_means_untitled_python() {
        assert_eq!(parse_args(Vec::new()).expect("parse"), CliArgs::default());
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = parse_args(args(&["--lang", "Rust"])).expect_err("rejected");
        assert!(err.contains("Unknown language: Rust"));
        assert!(parse_args(args(&["--lang"])).is_err());
    }

    #[test]
    fn unknown_option_and_extra_file_are_rejected() {
        assert!(parse_args(args(&["--verbose"])).is_err());
        assert!(parse_args(args(&["a.py", "b.py"])).is_err());
        assert!(parse_args(args(&["-h"])).expect("parse").help);
    }
}
