use std::collections::HashMap;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::{App, FeedPane};
use crate::cart;
use crate::controller::ListStatus;
use crate::feed::Feed;
use crate::types::{
    format_amount, format_date, CartEntry, Coupon, Payment, PaymentStatus, Product, User,
};

/// Which of the mutually exclusive feed layouts to draw
#[derive(Debug, PartialEq, Eq)]
enum View<'a> {
    InitialLoading,
    Failed(&'a str),
    Empty,
    Populated,
}

/// `rows` counts what is actually listed, which can be fewer than the loaded
/// items (inactive coupons are hidden).
fn view_for<'a>(status: &ListStatus<'a>, rows: usize) -> View<'a> {
    if status.is_initial_loading {
        View::InitialLoading
    } else if rows > 0 {
        View::Populated
    } else if let Some(err) = status.last_error {
        View::Failed(err)
    } else if status.has_more || status.is_loading_more {
        // Nothing to show yet, but the footer still offers the next page
        View::Populated
    } else {
        View::Empty
    }
}

/// Trailing row under a populated list
fn footer(status: &ListStatus<'_>, feed: Feed) -> (String, Style) {
    if status.is_loading_more {
        ("Loading...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(err) = status.last_error {
        (
            format!("Error: {} - m/r: try again", err),
            Style::default().fg(Color::Red),
        )
    } else if status.has_more {
        (
            "Show more (m)".to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            feed.end_message().to_string(),
            Style::default().fg(Color::DarkGray),
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(pane) = &app.pane else {
        return;
    };
    let feed = pane.feed();
    let status = pane.list().status();
    let title = if status.len > 0 {
        format!(" {} - page {} ", feed.title(), status.current_page)
    } else {
        format!(" {} ", feed.title())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let message = match view_for(&status, pane.row_count()) {
        View::InitialLoading => Some(Paragraph::new(format!("Loading {}...", feed)).style(
            Style::default().fg(Color::Yellow),
        )),
        View::Failed(err) => Some(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("Error: {}", err),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press r to retry",
                    Style::default().fg(Color::Gray),
                )),
            ]),
        ),
        View::Empty => Some(
            Paragraph::new(feed.empty_message()).style(Style::default().fg(Color::Gray)),
        ),
        View::Populated => None,
    };
    if let Some(message) = message {
        frame.render_widget(message.block(block), area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let mut items: Vec<ListItem> = match pane {
        FeedPane::Cart(list) => cart_rows(list.items(), &app.catalog, width),
        FeedPane::Favourites(list) => list.items().iter().map(|p| product_row(p, width)).collect(),
        FeedPane::Friends(list) => list.items().iter().map(|u| user_row(u, width)).collect(),
        FeedPane::Payments(list) => list.items().iter().map(payment_row).collect(),
        FeedPane::Promotions(list) => list
            .items()
            .iter()
            .filter(|c| c.is_active())
            .map(coupon_row)
            .collect(),
    };

    let (text, style) = footer(&status, feed);
    items.push(ListItem::new(Line::from(Span::styled(text, style))));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if app.row_index < pane.row_count() {
        state.select(Some(app.row_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn cart_rows<'a>(
    entries: &'a [CartEntry],
    catalog: &HashMap<String, Product>,
    width: usize,
) -> Vec<ListItem<'a>> {
    let fixed = 36; // cart(12) + space(1) + qty(5) + space(1) + line total(10) + date(~7)
    let flex = width.saturating_sub(fixed).max(10);
    let mut rows = Vec::with_capacity(cart::line_count(entries));

    for entry in entries {
        let date = entry.date.as_deref().map(format_date).unwrap_or_default();
        let total = match cart::entry_total(entry, catalog) {
            Some(t) => format!("{} items, ${:.2}", cart::item_count(entry), t),
            None => format!("{} items", cart::item_count(entry)),
        };

        for (i, line) in entry.products.iter().enumerate() {
            let product = catalog.get(&line.product_id);
            let title = product
                .map(|p| p.title.clone())
                .unwrap_or_else(|| format!("Product #{}", line.product_id));
            let line_total = product
                .map(|p| format!("${:.2}", p.price * f64::from(line.quantity)))
                .unwrap_or_else(|| "...".to_string());

            // Only the first line of each cart names the cart
            let cart_label = if i == 0 {
                format!("#{}", truncate(&entry.id, 11))
            } else {
                String::new()
            };

            let mut spans = vec![
                Span::styled(format!("{:<12}", cart_label), Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::raw(format!("{:<flex$}", truncate(&title, flex))),
                Span::raw(" "),
                Span::styled(
                    format!("x{:<4}", line.quantity),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::styled(format!("{:>10}", line_total), Style::default().fg(Color::Green)),
            ];
            if i + 1 == entry.products.len() {
                spans.push(Span::styled(
                    format!("  {} {}", date, total),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            rows.push(ListItem::new(Line::from(spans)));
        }
    }
    rows
}

fn product_row(product: &Product, width: usize) -> ListItem<'static> {
    let fixed = 40; // price(10) + old price(10) + discount(6) + rating(6) + badges(~8)
    let flex = width.saturating_sub(fixed).max(10);

    let mut spans = vec![
        Span::styled(
            format!("{:<flex$}", truncate(&product.title, flex)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("${:>8}", format_amount(product.price)),
            Style::default().fg(Color::Green),
        ),
    ];
    if let Some(old) = product.old_price.filter(|_| product.discount_percent().is_some()) {
        spans.push(Span::styled(
            format!(" ${:>7}", format_amount(old)),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        ));
    }
    if let Some(pct) = product.discount_percent() {
        spans.push(Span::styled(
            format!(" -{}%", pct),
            Style::default().fg(Color::Red),
        ));
    }
    if let Some(rating) = product.rating {
        spans.push(Span::styled(
            format!(" ★ {:.1}", rating),
            Style::default().fg(Color::Yellow),
        ));
    }
    if product.is_new {
        spans.push(Span::styled(" NEW", Style::default().fg(Color::Magenta)));
    }
    if product.stock.is_some_and(|s| s <= 0.0) {
        spans.push(Span::styled(" sold out", Style::default().fg(Color::Red)));
    }

    ListItem::new(Line::from(spans))
}

fn user_row(user: &User, width: usize) -> ListItem<'static> {
    let fixed = 60; // name(22) + @username(16) + email(~22)
    let flex = width.saturating_sub(fixed).max(10);

    let username = user
        .username
        .as_deref()
        .map(|u| format!("@{}", truncate(u, 14)))
        .unwrap_or_default();
    let whereabouts = user
        .address
        .as_ref()
        .map(|a| a.to_string())
        .filter(|a| !a.is_empty())
        .or_else(|| user.company.as_ref().map(|c| c.name.clone()))
        .unwrap_or_default();

    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{:<22}", truncate(&user.name, 22)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{:<16}", username), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{:<22}", truncate(user.email.as_deref().unwrap_or(""), 21)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(truncate(&whereabouts, flex), Style::default().fg(Color::DarkGray)),
    ]))
}

fn payment_color(status: PaymentStatus) -> Color {
    match status {
        PaymentStatus::Completed => Color::Green,
        PaymentStatus::Refunded => Color::Blue,
        PaymentStatus::Failed => Color::Red,
        PaymentStatus::Pending => Color::Yellow,
    }
}

fn payment_row(payment: &Payment) -> ListItem<'static> {
    let date = payment
        .created_at
        .as_deref()
        .map(format_date)
        .unwrap_or_default();

    ListItem::new(Line::from(vec![
        Span::styled(
            format!("Order {:<14}", truncate(&payment.order_id, 14)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:>10}", format!("${:.2}", payment.amount)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  via {:<12}", truncate(&payment.method, 12))),
        Span::styled(
            format!("{:<10}", payment.status),
            Style::default().fg(payment_color(payment.status)),
        ),
        Span::styled(date, Style::default().fg(Color::DarkGray)),
    ]))
}

fn coupon_row(coupon: &Coupon) -> ListItem<'static> {
    let min_order = coupon
        .min_order_amount
        .map(|m| format!("min. order ${}", format_amount(m)))
        .unwrap_or_default();
    let expiry = coupon
        .expiry_date
        .as_deref()
        .map(|d| format!("expires {}", format_date(d)))
        .unwrap_or_default();

    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{:<16}", truncate(&coupon.code, 16)),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{:>8}", coupon.badge()), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("{:<20}", min_order), Style::default().fg(Color::Gray)),
        Span::styled(expiry, Style::default().fg(Color::DarkGray)),
    ]))
}
