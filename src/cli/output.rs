//! Terminal output for the CLI commands.

use owo_colors::{OwoColorize, Style};

/// Kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Note,
    Warn,
    Fail,
    /// A file or directory was written.
    Wrote,
    /// An existing file or directory was left alone.
    Kept,
}

impl Mark {
    fn symbol(self) -> &'static str {
        match self {
            Mark::Done | Mark::Wrote => "✓",
            Mark::Note => "•",
            Mark::Warn => "⚠",
            Mark::Fail => "✗",
            Mark::Kept => "○",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Mark::Done => "[OK]",
            Mark::Note => "[INFO]",
            Mark::Warn => "[WARN]",
            Mark::Fail => "[ERROR]",
            Mark::Wrote => "[CREATED]",
            Mark::Kept => "[SKIPPED]",
        }
    }

    fn style(self) -> Style {
        match self {
            Mark::Done | Mark::Wrote => Style::new().green().bold(),
            Mark::Note => Style::new().blue(),
            Mark::Warn | Mark::Kept => Style::new().yellow(),
            Mark::Fail => Style::new().red().bold(),
        }
    }
}

/// Writes CLI messages, with or without ANSI colors.
pub struct Output {
    pub colored: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn render(&self, mark: Mark, message: &str) -> String {
        if self.colored {
            format!("  {} {}", mark.symbol().style(mark.style()), message)
        } else {
            format!("  {} {}", mark.tag(), message)
        }
    }

    /// One status line. Failures go to stderr.
    pub fn status(&self, mark: Mark, message: &str) {
        let line = self.render(mark, message);
        if mark == Mark::Fail {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "syllabus".bright_cyan().bold(),
                version.dimmed(),
                "chat with your class material".bright_white()
            );
        } else {
            println!("\n   syllabus {}\n   chat with your class material\n", version);
        }
    }

    /// Section title, preceded by a blank line.
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// A shell command the user should run next.
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }
}
