use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use crate::app::App;
use crate::feed::Feed;

fn describe(feed: Feed) -> &'static str {
    match feed {
        Feed::Cart => "Items waiting at checkout",
        Feed::Favourites => "Products you saved",
        Feed::Friends => "People you follow",
        Feed::Payments => "Payment history",
        Feed::Promotions => "Active coupons",
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = Feed::ALL
        .iter()
        .enumerate()
        .map(|(i, feed)| {
            let style = if i == app.menu_index {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<14}", feed.to_string()), style),
                Span::styled(describe(*feed), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Profile "))
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.menu_index));

    frame.render_stateful_widget(list, area, &mut state);
}
