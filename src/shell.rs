//! Read-line-and-dispatch loop shared by the two assistants

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::console::Console;
use crate::runner::{CommandRunner, FailureMarker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run a shell command, reported under `label`
    Run { command: String, label: &'static str },
    Help,
    Exit,
    /// Write `contents` to the assistant's env file
    WriteEnvFile { contents: String },
    /// Print static text
    Print(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ExitCommand,
    EndOfInput,
}

pub struct Assistant {
    pub name: &'static str,
    pub prompt: &'static str,
    pub banner: String,
    pub commands: Vec<(&'static str, Action)>,
    /// Printed on `exit` and on end of input
    pub exit_message: Option<&'static str>,
    pub env_file: PathBuf,
    runner: CommandRunner,
}

impl Assistant {
    pub fn new(name: &'static str, prompt: &'static str, commands: Vec<(&'static str, Action)>, markers: Vec<FailureMarker>) -> Self {
        let names: Vec<&str> = commands.iter().map(|(name, _)| *name).collect();
        Self {
            name,
            prompt,
            banner: format!("{} Ready. Type a command: ({})", name, names.join(", ")),
            commands,
            exit_message: None,
            env_file: PathBuf::from(".env"),
            runner: CommandRunner::new(markers),
        }
    }

    pub fn with_exit_message(mut self, message: &'static str) -> Self {
        self.exit_message = Some(message);
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|(name, _)| *name).collect()
    }

    pub fn lookup(&self, input: &str) -> Option<&Action> {
        self.commands
            .iter()
            .find(|(name, _)| *name == input)
            .map(|(_, action)| action)
    }

    /// Handle one input line.
    pub fn dispatch<O: Write, E: Write>(&self, line: &str, console: &mut Console<O, E>) -> Flow {
        let input = line.trim();
        let Some(action) = self.lookup(input) else {
            console.warn(&format!("Unknown command: {}. Type 'help' for available commands.", input));
            return Flow::Continue;
        };

        match action {
            Action::Run { command, label } => {
                self.runner.run(command, label, console);
            }
            Action::Help => {
                console.line(&format!("Available commands: {}", self.command_names().join(", ")));
            }
            Action::Exit => return Flow::Exit,
            Action::WriteEnvFile { contents } => self.write_env_file(contents, console),
            Action::Print(text) => console.line(text),
        }
        Flow::Continue
    }

    fn write_env_file<O: Write, E: Write>(&self, contents: &str, console: &mut Console<O, E>) {
        match fs::write(&self.env_file, contents) {
            Ok(()) => {
                log::info!("Wrote {}", self.env_file.display());
                console.ok(&format!("{} file created successfully with the backend anon key.", self.env_file.display()));
                console.info("Restart your dev server (Ctrl+C then npm run serve) to load the new environment variables.");
            }
            Err(e) => console.fail(&format!("Failed to create {} file: {}", self.env_file.display(), e)),
        }
    }

    /// Prompt, read, dispatch until `exit` or end of input.
    pub fn run<R: BufRead, O: Write, E: Write>(&self, mut input: R, console: &mut Console<O, E>) -> io::Result<LoopExit> {
        console.info(&self.banner);

        // Raw bytes so a line that is not UTF-8 is just an unknown command.
        let mut buf = Vec::new();
        let reason = loop {
            console.prompt(self.prompt);
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break LoopExit::EndOfInput;
            }
            let line = String::from_utf8_lossy(&buf);
            if self.dispatch(&line, console) == Flow::Exit {
                break LoopExit::ExitCommand;
            }
        };

        if reason == LoopExit::EndOfInput {
            console.line("");
        }
        if let Some(message) = self.exit_message {
            console.info(message);
        }
        log::debug!("{} stopped: {:?}", self.name, reason);
        Ok(reason)
    }
}
