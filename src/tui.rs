use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::Event;

/// Terminal session: raw mode, alternate screen and the input task.
/// Leaving (explicitly or on drop) puts the terminal back.
pub struct Tui {
    pub terminal: Terminal<CrosstermBackend<Stdout>>,
    frame_rate: Duration,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Tui {
    pub fn new(frame_rate: Duration) -> io::Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(io::stdout()))?,
            frame_rate,
            events_tx,
            events_rx,
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    pub fn enter(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.clear()?;
        self.start_input();
        Ok(())
    }

    pub fn exit(&mut self) -> io::Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        restore()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    fn start_input(&mut self) {
        let tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let frame_rate = self.frame_rate;

        self.task = Some(tokio::spawn(async move {
            tx.send(Event::Init).ok();

            let mut input = EventStream::new();
            let mut frames = tokio::time::interval(frame_rate);

            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = frames.tick() => Event::Render,
                    maybe = input.next() => match maybe {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break,
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

/// Leave the alternate screen and raw mode. Safe to call more than once, which
/// the panic hook relies on.
pub fn restore() -> io::Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()
}
