//! Masked terminal input for passwords and identity tokens.

use std::io::{Stderr, Write, stderr};

use crossterm::{
    cursor,
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    style::Print,
    terminal::{self, ClearType},
};

use crate::error::{AppError, Result};

/// What the terminal should show after an input event.
#[derive(Debug, PartialEq, Eq)]
enum Echo {
    Nothing,
    /// One `*` per accepted character.
    Masked(usize),
    Erase,
    Done,
    Interrupted,
}

/// Secret being typed; knows nothing about the terminal.
#[derive(Debug, Default)]
struct SecretInput {
    buf: String,
}

impl SecretInput {
    fn key(&mut self, key: KeyEvent) -> Echo {
        if key.kind == KeyEventKind::Release {
            return Echo::Nothing;
        }
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => Echo::Done,
            KeyCode::Backspace if self.buf.pop().is_some() => Echo::Erase,
            KeyCode::Char('c') if control => Echo::Interrupted,
            KeyCode::Char(ch) if !control => {
                self.buf.push(ch);
                Echo::Masked(1)
            }
            _ => Echo::Nothing,
        }
    }

    /// Tokens are usually pasted; line breaks in the paste are dropped.
    fn paste(&mut self, text: &str) -> Echo {
        let before = self.buf.chars().count();
        self.buf.extend(text.chars().filter(|ch| !ch.is_control()));
        Echo::Masked(self.buf.chars().count() - before)
    }
}

/// Raw mode and bracketed paste for as long as it lives.
struct RawTerminal {
    out: Stderr,
}

impl RawTerminal {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = stderr();
        if let Err(err) = execute!(out, EnableBracketedPaste) {
            let _ = terminal::disable_raw_mode();
            return Err(err.into());
        }
        Ok(Self { out })
    }

    fn show(&mut self, echo: &Echo) -> Result<()> {
        match echo {
            Echo::Nothing => return Ok(()),
            Echo::Masked(count) => execute!(self.out, Print("*".repeat(*count)))?,
            Echo::Erase => execute!(
                self.out,
                cursor::MoveLeft(1),
                Print(" "),
                cursor::MoveLeft(1)
            )?,
            Echo::Done | Echo::Interrupted => execute!(self.out, Print("\r\n"))?,
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

/// Read one line without echoing it.
pub fn prompt_secret(prompt: &str) -> Result<String> {
    let mut term = RawTerminal::enter()?;
    execute!(
        term.out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    term.out.flush()?;

    let mut input = SecretInput::default();
    loop {
        let echo = match event::read()? {
            Event::Key(key) => input.key(key),
            Event::Paste(text) => input.paste(&text),
            _ => Echo::Nothing,
        };
        term.show(&echo)?;
        match echo {
            Echo::Done => return Ok(input.buf),
            Echo::Interrupted => return Err(AppError::Terminal("interrupted".to_string())),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_erasing() {
        let mut input = SecretInput::default();
        assert_eq!(input.key(press(KeyCode::Char('a'))), Echo::Masked(1));
        assert_eq!(input.key(press(KeyCode::Char('b'))), Echo::Masked(1));
        assert_eq!(input.key(press(KeyCode::Backspace)), Echo::Erase);
        assert_eq!(input.key(press(KeyCode::Enter)), Echo::Done);
        assert_eq!(input.buf, "a");

        // Nothing left to erase.
        input.key(press(KeyCode::Backspace));
        assert_eq!(input.key(press(KeyCode::Backspace)), Echo::Nothing);
    }

    #[test]
    fn control_c_interrupts_and_other_chords_are_ignored() {
        let mut input = SecretInput::default();
        let ctrl = |ch| KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL);
        assert_eq!(input.key(ctrl('u')), Echo::Nothing);
        assert_eq!(input.key(ctrl('c')), Echo::Interrupted);
        assert!(input.buf.is_empty());
    }

    #[test]
    fn pasted_token_is_masked_without_line_breaks() {
        let mut input = SecretInput::default();
        assert_eq!(input.paste("eyJ.abc\r\n"), Echo::Masked(7));
        assert_eq!(input.buf, "eyJ.abc");
    }
}
