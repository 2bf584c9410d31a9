use crate::errors::Result;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Yes/no question asked before destructive operations
pub trait ConfirmPrompt {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Terminal confirmation dialog, or an automatic yes when `--yes` was given
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        let result = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(result)
    }
}

/// Create and configure the progress bar used while waiting for several activities
pub fn create_activity_progress_bar(
    total: usize,
    draw_target: ProgressDrawTarget,
) -> Result<ProgressBar> {
    let pb = ProgressBar::with_draw_target(Some(total as u64), draw_target);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(" {pos}/{len} [{bar:28.cyan/blue}] {percent:>3}% {elapsed:>6}")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
