use crossterm::{
    cursor::MoveToColumn,
    event::{read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use std::io::{self, Write};
use std::mem;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Pending,
    Submit(String),
    Eof,
}

/// Single-line editor with cursor movement and in-session history.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    recall: Option<usize>,
    draft: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Edit {
        if key.kind == KeyEventKind::Release {
            return Edit::Pending;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('c') if ctrl => return Edit::Eof,
            KeyCode::Char('d') if ctrl && self.buffer.is_empty() => return Edit::Eof,
            KeyCode::Char('d') if ctrl => self.delete_char(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::Char('u') if ctrl => {
                self.buffer = self.buffer.split_off(self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.add_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_char(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => self.recall_previous(),
            KeyCode::Down => self.recall_next(),
            _ => {}
        }
        Edit::Pending
    }

    /// Redraw the current line in place.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let column = u16::try_from(self.cursor).unwrap_or(u16::MAX);
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::UntilNewLine),
            Print(self.line()),
            MoveToColumn(column)
        )?;
        out.flush()
    }

    fn add_char(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.buffer.remove(self.cursor);
        }
    }

    fn delete_char(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    fn submit(&mut self) -> Edit {
        let line: String = self.buffer.drain(..).collect();
        self.cursor = 0;
        self.recall = None;
        self.draft.clear();
        if !line.trim().is_empty() && self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        Edit::Submit(line)
    }

    fn recall_previous(&mut self) {
        let index = match self.recall {
            None if self.history.is_empty() => return,
            None => {
                self.draft = self.line();
                self.history.len() - 1
            }
            Some(0) => return,
            Some(index) => index - 1,
        };
        self.recall = Some(index);
        self.set_line(self.history[index].clone());
    }

    fn recall_next(&mut self) {
        let Some(index) = self.recall else {
            return;
        };
        if index + 1 < self.history.len() {
            self.recall = Some(index + 1);
            self.set_line(self.history[index + 1].clone());
        } else {
            self.recall = None;
            let draft = mem::take(&mut self.draft);
            self.set_line(draft);
        }
    }

    fn set_line(&mut self, line: String) {
        self.buffer = line.chars().collect();
        self.cursor = self.buffer.len();
    }
}

/// Read edited lines from the terminal in raw mode and forward them until
/// Ctrl-D on an empty line, Ctrl-C, or the receiver going away.
pub fn forward_edited_lines(tx: &mpsc::Sender<String>) -> io::Result<()> {
    enable_raw_mode()?;
    let result = edit_loop(tx);
    disable_raw_mode()?;
    result
}

fn edit_loop(tx: &mpsc::Sender<String>) -> io::Result<()> {
    let mut editor = LineEditor::new();
    let mut stdout = io::stdout();
    loop {
        let Event::Key(key) = read()? else {
            continue;
        };
        match editor.handle_key(key) {
            Edit::Pending => editor.render(&mut stdout)?,
            Edit::Submit(line) => {
                write!(stdout, "\r\n")?;
                stdout.flush()?;
                if tx.blocking_send(line).is_err() {
                    return Ok(());
                }
            }
            Edit::Eof => {
                debug!("line editor closed");
                write!(stdout, "\r\n")?;
                return stdout.flush();
            }
        }
    }
}
