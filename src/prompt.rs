// src/prompt.rs
//
// Interactive questions asked before the port is opened.
// The prompter owns its input and output handles and is passed explicitly to
// each step; answers are returned, never stored.

use std::io::{BufRead, Write};
use std::num::NonZeroUsize;

use crossterm::style::Stylize;

use crate::config::{parse_baud_rate, parse_length, parse_mode_name, ModeKind};
use crate::display::write_port_list;
use crate::error::ConfigError;
use crate::io::serial::PortInfo;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Print `question` and read one line. EOF is an error.
    fn ask(&mut self, question: &str) -> Result<String, ConfigError> {
        write!(self.output, "{}", question.blue())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConfigError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    fn warn(&mut self, message: &str) -> Result<(), ConfigError> {
        writeln!(self.output, "{}", message.red())?;
        Ok(())
    }

    /// Show the port list and return the chosen path. Selection is 1-based.
    pub fn select_port(&mut self, ports: &[PortInfo]) -> Result<String, ConfigError> {
        write_port_list(&mut self.output, ports)?;
        let answer = self.ask("\nSelect a port by number: ")?;

        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| ports.get(index))
            .map(|port| port.path.clone())
            .ok_or(ConfigError::InvalidPort(answer))
    }

    pub fn select_mode(&mut self) -> Result<ModeKind, ConfigError> {
        let answer = self.ask("Choose data reading mode (raw / text / byte): ")?;
        parse_mode_name(&answer)
    }

    /// Menu of `rates` plus a custom option. Invalid answers fall back to
    /// `fallback` with a warning rather than aborting.
    pub fn select_baud_rate(&mut self, rates: &[u32], fallback: u32) -> Result<u32, ConfigError> {
        writeln!(self.output, "{}", "\n⚙️  Choose a Baud Rate:".cyan().bold())?;
        for (index, rate) in rates.iter().enumerate() {
            writeln!(self.output, "{}: {}", (index + 1).to_string().green(), rate)?;
        }
        writeln!(self.output, "{}: Custom baud rate", "c".green())?;

        let answer = self.ask("\nEnter option number or 'c' for custom: ")?;

        if answer.eq_ignore_ascii_case("c") {
            let custom = self.ask("Enter custom baud rate (number): ")?;
            return match parse_baud_rate(&custom) {
                Some(rate) => Ok(rate),
                None => {
                    self.warn(&format!("❌ Invalid baud rate. Using default {}.", fallback))?;
                    Ok(fallback)
                }
            };
        }

        let chosen = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| rates.get(index).copied());

        match chosen {
            Some(rate) => Ok(rate),
            None => {
                self.warn(&format!("❌ Invalid selection. Using default {}.", fallback))?;
                Ok(fallback)
            }
        }
    }

    pub fn ask_length(&mut self) -> Result<NonZeroUsize, ConfigError> {
        let answer = self.ask("Enter byte length to parse: ")?;
        parse_length(&answer)
    }
}
