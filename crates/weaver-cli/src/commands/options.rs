use anyhow::Result;
use colored::Colorize;
use weaver_core::params::all_domains;

pub fn run() -> Result<()> {
    for (field, choices) in all_domains() {
        println!("{}", field.bright_magenta().bold());
        for (i, choice) in choices.iter().enumerate() {
            let marker = if i == 0 { " (default)" } else { "" };
            println!("  {}{}", choice, marker.bright_black());
        }
    }
    Ok(())
}
