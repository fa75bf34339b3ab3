//! Line-oriented console implementation of the decision port.
//!
//! Prompts render to stdout as a question plus a `[key] Label` menu; the
//! analyst answers with a single choice key (empty input takes the default).
//! Free-text edits read one line, seeded text shown for reference.

use std::io::{BufRead, Write};

use findmerge::ports::{Choice, DecisionPort};

pub struct ConsolePort;

impl ConsolePort {
    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_owned()),
        }
    }
}

impl DecisionPort for ConsolePort {
    fn ask(&mut self, prompt: &str, options: &[Choice], default: Option<Choice>) -> Choice {
        let menu: Vec<String> = options
            .iter()
            .map(|option| {
                let marker = if Some(*option) == default { "*" } else { "" };
                format!("[{}{marker}] {}", option.key(), option.label())
            })
            .collect();

        println!("\n{prompt}");
        println!("  {}", menu.join("  "));

        loop {
            print!("> ");
            let _ = std::io::stdout().flush();

            let Some(answer) = self.read_line() else {
                // Stdin closed mid-run: fall back to the default rather than
                // loop forever.
                return default.or_else(|| options.first().copied()).unwrap_or(Choice::Abort);
            };

            if answer.is_empty() {
                if let Some(choice) = default {
                    return choice;
                }
            }
            if let Some(key) = answer.chars().next() {
                let key = key.to_ascii_lowercase();
                if let Some(choice) = options.iter().find(|option| option.key() == key) {
                    return *choice;
                }
            }
            println!("  please answer with one of: {}", menu.join("  "));
        }
    }

    fn edit(&mut self, seed: &str) -> String {
        if seed.is_empty() {
            println!("enter replacement text:");
        } else {
            println!("current text:\n  {seed}\nenter replacement text (empty keeps current):");
        }
        print!("> ");
        let _ = std::io::stdout().flush();

        match self.read_line() {
            Some(line) if !line.is_empty() => line,
            _ => seed.to_owned(),
        }
    }
}
