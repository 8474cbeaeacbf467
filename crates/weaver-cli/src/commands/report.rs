//! Terminal presentation shared by the one-shot command and the studio.

use colored::Colorize;
use std::path::PathBuf;
use weaver_application::{NOT_POETIC_MESSAGE, WeaveError, WeaveOutcome, WovenPoem};
use weaver_core::error::InputUnavailable;

use crate::downloads::Downloads;

/// Prints the outcome and writes downloads for a delivered poem.
pub fn outcome(outcome: &WeaveOutcome, downloads: &Downloads) {
    match outcome {
        WeaveOutcome::NotPoetic => println!("{}", NOT_POETIC_MESSAGE.yellow()),
        WeaveOutcome::Woven(woven) => {
            poem(woven);
            match downloads.save_woven(woven) {
                Ok(paths) => written(&paths),
                Err(err) => eprintln!("{}", format!("Could not save downloads: {err:#}").red()),
            }
        }
    }
}

pub fn error(err: &WeaveError) {
    match err {
        WeaveError::EmptyPrompt => println!("{}", err.to_string().yellow()),
        other => eprintln!("{}", format!("Error: {other}").red()),
    }
}

pub fn poem(woven: &WovenPoem) {
    println!();
    println!("{}", "Weaver:".bright_magenta().bold());
    for line in woven.poem.text.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
    println!(
        "{}",
        format!("{} #{}", woven.image.caption, woven.index + 1).bright_black()
    );
    for warning in &woven.warnings {
        println!("{}", format!("Warning: {warning}").yellow());
    }
}

pub fn written(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", format!("Saved {}", path.display()).green());
    }
}

pub fn voice_unavailable(err: &InputUnavailable) {
    println!("{}", format!("{err}. Type your muse instead.").yellow());
}
