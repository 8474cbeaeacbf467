//! Interactive poetry studio.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use weaver_application::{InputAcquirer, surprise};
use weaver_core::params::{GenerationParameters, ParameterSelection, all_domains};
use weaver_core::session::Session;

use super::report;
use crate::bootstrap::AppBootstrap;
use crate::downloads::Downloads;

const COMMANDS: &[&str] = &[
    "/name",
    "/style",
    "/mood",
    "/language",
    "/tone",
    "/length",
    "/theme",
    "/surprise",
    "/settings",
    "/weave",
    "/speak",
    "/clear",
    "/gallery",
    "/save-image",
    "/save-pdf",
    "/help",
    "/quit",
];

/// Completion and hints for studio commands and parameter values.
struct StudioHelper {
    commands: Vec<String>,
    domains: Vec<(&'static str, Vec<String>)>,
}

impl StudioHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
            domains: all_domains(),
        }
    }

    fn values_for(&self, command: &str) -> Option<&[String]> {
        let field = command.strip_prefix('/')?;
        self.domains
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, values)| values.as_slice())
    }
}

impl Helper for StudioHelper {}

impl Completer for StudioHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        match line.split_once(' ') {
            None => {
                let candidates = self
                    .commands
                    .iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .map(|cmd| Pair {
                        display: cmd.clone(),
                        replacement: cmd.clone(),
                    })
                    .collect();
                Ok((0, candidates))
            }
            Some((command, partial)) => {
                let Some(values) = self.values_for(command) else {
                    return Ok((0, vec![]));
                };
                let partial_lower = partial.to_lowercase();
                let candidates = values
                    .iter()
                    .filter(|value| value.to_lowercase().starts_with(&partial_lower))
                    .map(|value| Pair {
                        display: value.clone(),
                        replacement: value.clone(),
                    })
                    .collect();
                Ok((command.len() + 1, candidates))
            }
        }
    }
}

impl Highlighter for StudioHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for StudioHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for StudioHelper {}

/// A parsed studio input line.
#[derive(Debug, PartialEq)]
enum StudioCommand<'a> {
    Name(&'a str),
    Set { field: &'a str, value: &'a str },
    Surprise,
    Settings,
    Weave,
    Speak(Option<&'a str>),
    Clear,
    Gallery,
    SaveImage(Option<&'a str>),
    SavePdf,
    Help,
    Quit,
    Prompt(&'a str),
    Unknown(&'a str),
}

impl<'a> StudioCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return match line {
                "quit" | "exit" => Self::Quit,
                _ => Self::Prompt(line),
            };
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let argument = (!rest.is_empty()).then_some(rest);
        match command {
            "/name" => Self::Name(rest),
            "/style" | "/mood" | "/language" | "/tone" | "/length" | "/theme" => Self::Set {
                field: &command[1..],
                value: rest,
            },
            "/surprise" => Self::Surprise,
            "/settings" => Self::Settings,
            "/weave" => Self::Weave,
            "/speak" => Self::Speak(argument),
            "/clear" => Self::Clear,
            "/gallery" => Self::Gallery,
            "/save-image" => Self::SaveImage(argument),
            "/save-pdf" => Self::SavePdf,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other => Self::Unknown(other),
        }
    }
}

struct Studio<'a> {
    app: &'a AppBootstrap,
    downloads: Downloads,
    session: Session,
    selection: ParameterSelection,
    rng: StdRng,
}

impl<'a> Studio<'a> {
    fn greet(&self) {
        println!(
            "{}",
            format!("Greetings, {}!", self.session.identity()).bright_magenta()
        );
    }

    fn current_parameters(&self) -> Option<GenerationParameters> {
        match self.selection.to_parameters() {
            Ok(params) => Some(params),
            Err(err) => {
                eprintln!("{}", err.to_string().red());
                None
            }
        }
    }

    /// Handles one line. Returns false when the studio should close.
    async fn handle(&mut self, command: StudioCommand<'_>) -> bool {
        match command {
            StudioCommand::Quit => return false,
            StudioCommand::Name(name) => {
                self.session.set_identity(name);
                self.greet();
            }
            StudioCommand::Set { field, value } => self.set(field, value),
            StudioCommand::Surprise => {
                let (params, message) = surprise(&mut self.rng);
                self.selection = params.into();
                println!("{}", message.green());
            }
            StudioCommand::Settings => {
                if let Some(params) = self.current_parameters() {
                    println!("{}", params.to_string().bright_black());
                }
            }
            StudioCommand::Weave => {
                let prompt = self.session.last_prompt().to_string();
                self.weave(&prompt).await;
            }
            StudioCommand::Speak(path) => self.speak(path).await,
            StudioCommand::Clear => {
                self.session.clear();
                println!("{}", "Chat cleared!".green());
            }
            StudioCommand::Gallery => self.gallery(),
            StudioCommand::SaveImage(number) => self.save_image(number),
            StudioCommand::SavePdf => self.save_pdf(),
            StudioCommand::Help => help(),
            StudioCommand::Prompt(prompt) => self.weave(prompt).await,
            StudioCommand::Unknown(command) => {
                println!("{}", format!("Unknown command {command}. Try /help").bright_black());
            }
        }
        true
    }

    fn set(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            let choices = all_domains()
                .into_iter()
                .find(|(name, _)| *name == field)
                .map(|(_, values)| values.join(", "))
                .unwrap_or_default();
            println!("{}", format!("{field}: {choices}").bright_black());
            return;
        }

        let mut candidate = self.selection.clone();
        let validated = candidate
            .set(field, value)
            .and_then(|()| candidate.to_parameters());
        match validated {
            Ok(params) => {
                self.selection = candidate;
                println!("{}", params.to_string().bright_black());
            }
            Err(err) => eprintln!("{}", err.to_string().red()),
        }
    }

    async fn weave(&mut self, prompt: &str) {
        let Some(params) = self.current_parameters() else {
            return;
        };
        match self.app.use_case.weave(&mut self.session, prompt, params).await {
            Ok(outcome) => report::outcome(&outcome, &self.downloads),
            Err(err) => report::error(&err),
        }
    }

    async fn speak(&mut self, path: Option<&str>) {
        let Some((listener, timeout)) = self.listener(path) else {
            return;
        };
        println!("{}", "Listening... Speak your inspiration!".bright_black());
        match listener.listen(timeout).await {
            Ok(text) => {
                println!("{}", format!("> {text}").green());
                self.session.set_last_prompt(text.as_str());
                println!("{}", "Type /weave to weave it.".bright_black());
            }
            Err(err) => report::voice_unavailable(&err),
        }
    }

    fn listener(&self, path: Option<&str>) -> Option<(InputAcquirer, Duration)> {
        match path {
            Some(path) => {
                let listener = self.app.file_listener(Path::new(path));
                Some((listener, self.app.voice_timeout()))
            }
            None => self.microphone(),
        }
    }

    #[cfg(feature = "microphone")]
    fn microphone(&self) -> Option<(InputAcquirer, Duration)> {
        Some(self.app.microphone_listener())
    }

    #[cfg(not(feature = "microphone"))]
    fn microphone(&self) -> Option<(InputAcquirer, Duration)> {
        println!(
            "{}",
            "No microphone support in this build. Use /speak <file.wav>".yellow()
        );
        None
    }

    fn gallery(&self) {
        if self.session.is_empty() {
            println!("{}", "The gallery is empty.".bright_black());
            return;
        }
        println!("{}", "Image Gallery".bright_magenta().bold());
        for entry in self.session.gallery() {
            let first_line = entry.poem.text.lines().next().unwrap_or_default();
            println!(
                "  {} {}",
                format!("Artwork {}", entry.index + 1).bright_cyan(),
                first_line.bright_black()
            );
        }
    }

    fn save_image(&self, number: Option<&str>) {
        let index = match number.map(str::parse::<usize>) {
            Some(Ok(n)) if n >= 1 => n - 1,
            None if !self.session.is_empty() => self.session.len() - 1,
            _ => {
                println!("{}", "Usage: /save-image <artwork number>".yellow());
                return;
            }
        };
        let Some(entry) = self.session.entry(index) else {
            println!("{}", format!("No artwork #{}", index + 1).yellow());
            return;
        };
        match self.downloads.save_artwork(entry.index, entry.image) {
            Ok(path) => report::written(&[path]),
            Err(err) => eprintln!("{}", format!("{err:#}").red()),
        }
    }

    fn save_pdf(&self) {
        let Some(entry) = self.session.len().checked_sub(1).and_then(|i| self.session.entry(i))
        else {
            println!("{}", "Weave a poem first.".yellow());
            return;
        };
        let saved = self
            .app
            .use_case
            .exporter()
            .export(&entry.poem.text, entry.image)
            .map_err(anyhow::Error::from)
            .and_then(|pdf| self.downloads.save_document(&pdf));
        match saved {
            Ok(path) => report::written(&[path]),
            Err(err) => eprintln!("{}", format!("{err:#}").red()),
        }
    }
}

fn help() {
    let lines = [
        ("<text>", "weave a poem from your muse"),
        ("/weave", "weave again from the last prompt"),
        ("/speak [file.wav]", "speak your muse"),
        ("/style, /mood, /language, /tone, /length, /theme <value>", "pick a parameter"),
        ("/surprise", "pick every parameter at random"),
        ("/settings", "show the current parameters"),
        ("/name <name>", "tell the studio who you are"),
        ("/gallery", "list this session's artwork"),
        ("/save-image [n]", "save Artwork_n.png"),
        ("/save-pdf", "save the latest poem as Poem_With_Image.pdf"),
        ("/clear", "clear the history"),
        ("/quit", "leave the studio"),
    ];
    for (usage, description) in lines {
        println!("  {} {}", usage.bright_cyan(), description.bright_black());
    }
}

pub async fn run(app: &AppBootstrap, name: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let mut session = Session::new();
    if let Some(name) = name {
        session.set_identity(name);
    }

    let mut studio = Studio {
        app,
        downloads: app.downloads(output),
        session,
        selection: ParameterSelection::default(),
        rng: StdRng::from_entropy(),
    };

    let mut rl: Editor<StudioHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(StudioHelper::new()));

    println!("{}", "=== Poetry Weaver ===".bright_magenta().bold());
    studio.greet();
    println!(
        "{}",
        format!(
            "Share your muse, or type /help. Downloads go to {}",
            studio.downloads.dir().display()
        )
        .bright_black()
    );
    println!();

    loop {
        match rl.readline("muse> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                if !studio.handle(StudioCommand::parse(&line)).await {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
