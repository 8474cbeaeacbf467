use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use weaver_application::{WeaveError, surprise_message};
use weaver_core::params::{GenerationParameters, ParameterSelection};
use weaver_core::session::Session;

use super::report;
use crate::bootstrap::AppBootstrap;

#[derive(Args, Debug)]
pub struct WeaveArgs {
    /// Your muse: the prompt the poem is woven from
    prompt: Option<String>,

    /// Read the prompt from a recorded WAV file instead
    #[arg(long, conflicts_with = "prompt")]
    voice: Option<PathBuf>,

    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    mood: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    tone: Option<String>,
    #[arg(long)]
    length: Option<String>,
    #[arg(long)]
    theme: Option<String>,

    /// Pick every parameter at random
    #[arg(long)]
    surprise: bool,

    /// Seed for --surprise, for repeatable picks
    #[arg(long, requires = "surprise")]
    seed: Option<u64>,

    /// Directory downloads are written to
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Name recorded for this session
    #[arg(long)]
    name: Option<String>,
}

impl WeaveArgs {
    fn selection(&self) -> ParameterSelection {
        ParameterSelection {
            style: self.style.clone(),
            mood: self.mood.clone(),
            language: self.language.clone(),
            tone: self.tone.clone(),
            length: self.length.clone(),
            theme: self.theme.clone(),
        }
    }
}

pub async fn run(app: &AppBootstrap, args: WeaveArgs) -> Result<()> {
    let mut session = Session::new();
    if let Some(name) = &args.name {
        session.set_identity(name.as_str());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let params = GenerationParameters::resolve(&args.selection(), args.surprise, &mut rng)?;
    if args.surprise {
        println!("{}", surprise_message(&params).green());
    }

    let prompt = match (&args.voice, &args.prompt) {
        (Some(path), _) => {
            println!("{}", "Listening... Speak your inspiration!".bright_black());
            match app.file_listener(path).listen(app.voice_timeout()).await {
                Ok(text) => {
                    println!("{}", format!("> {text}").green());
                    text
                }
                Err(err) => {
                    report::voice_unavailable(&err);
                    return Ok(());
                }
            }
        }
        (None, Some(prompt)) => prompt.clone(),
        (None, None) => String::new(),
    };

    match app.use_case.weave(&mut session, &prompt, params).await {
        Ok(outcome) => {
            report::outcome(&outcome, &app.downloads(args.output.clone()));
            Ok(())
        }
        Err(WeaveError::EmptyPrompt) => {
            report::error(&WeaveError::EmptyPrompt);
            Ok(())
        }
        Err(err) => bail!(err),
    }
}
