mod feed;
mod menu;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::action::ConfirmAction;
use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Menu => menu::render(frame, app, chunks[1]),
        Screen::Feed(_) => feed::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    if let Some(ConfirmAction::RemoveLine { product_id, .. }) = &app.confirm {
        let name = app
            .catalog
            .get(product_id)
            .map(|p| p.title.as_str())
            .unwrap_or("this item");
        popup::render_confirm(
            frame,
            "Remove Item",
            &format!("Remove {} from your cart?", name),
        );
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Menu => "storefront - Profile".to_string(),
        Screen::Feed(feed) => {
            let count = app.row_count();
            if count > 0 {
                format!("storefront - {} ({})", feed.title(), count)
            } else {
                format!("storefront - {}", feed.title())
            }
        }
    };

    let header = Paragraph::new(Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let loading = app.pane.as_ref().is_some_and(|p| {
        let status = p.list().status();
        status.is_initial_loading || status.is_loading_more
    });

    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if loading {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match app.screen {
            Screen::Menu => "j/k/g/G: nav | Enter: open | q: quit",
            Screen::Feed(crate::feed::Feed::Cart) => {
                "j/k: nav | +/-: quantity | d: remove | m: more | r: reload | q: back"
            }
            Screen::Feed(_) => "j/k/g/G: nav | m: more | r: reload | q: back",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
