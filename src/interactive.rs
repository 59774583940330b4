//! Interactive menu shown when no command is given.
//!
//! Only the choice of command comes from the prompt; it is then run exactly
//! as if it had been given on the command line.

use crate::cli::Command;
use anyhow::{Result, bail};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::io::{IsTerminal, stderr, stdin};
use std::path::PathBuf;

const MENU_ITEMS: [&str; 2] = [
    "Create / update baseline",
    "Check integrity against baseline",
];

pub fn is_interactive_available() -> bool {
    stdin().is_terminal() && stderr().is_terminal()
}

pub fn prompt_command() -> Result<Command> {
    if !is_interactive_available() {
        bail!(
            "Interactive mode requires a terminal. Run 'fimcheck baseline' or 'fimcheck check' instead."
        );
    }

    let theme = ColorfulTheme::default();

    let selection = Select::with_theme(&theme)
        .with_prompt("Choose an option")
        .items(&MENU_ITEMS)
        .default(0)
        .interact()?;

    menu_command(selection, || {
        Input::<String>::with_theme(&theme)
            .with_prompt("Directory to monitor")
            .default(".".to_string())
            .interact_text()
            .map_err(Into::into)
    })
}

fn menu_command(selection: usize, ask_dir: impl FnOnce() -> Result<String>) -> Result<Command> {
    match selection {
        0 => {
            let dir = ask_dir()?;
            let dir = match dir.trim() {
                "" => PathBuf::from("."),
                trimmed => PathBuf::from(trimmed),
            };
            Ok(Command::Baseline {
                dir,
                fingerprint: None,
                dry_run: false,
            })
        }
        1 => Ok(Command::Check {
            dir: None,
            diff: false,
        }),
        _ => bail!("Invalid choice. Please run again and choose 1 or 2."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_choice_uses_entered_directory() {
        let command = menu_command(0, || Ok("  /srv/app ".to_string())).unwrap();

        match command {
            Command::Baseline { dir, .. } => assert_eq!(dir, PathBuf::from("/srv/app")),
            other => panic!("Expected baseline command, got {:?}", other),
        }
    }

    #[test]
    fn blank_directory_means_current() {
        let command = menu_command(0, || Ok(String::new())).unwrap();

        assert!(matches!(command, Command::Baseline { dir, .. } if dir == PathBuf::from(".")));
    }

    #[test]
    fn check_choice_does_not_ask_for_directory() {
        let command = menu_command(1, || panic!("should not prompt")).unwrap();

        assert!(matches!(command, Command::Check { dir: None, diff: false }));
    }

    #[test]
    fn out_of_range_choice_is_an_error() {
        assert!(menu_command(7, || Ok(".".to_string())).is_err());
    }
}
