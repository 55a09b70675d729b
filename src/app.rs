use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::action::{Action, ConfirmAction};
use crate::cart;
use crate::config::Config;
use crate::controller::{ListController, Paginated, Ticket};
use crate::event::Event;
use crate::feed::Feed;
use crate::source::{fetch_batch, Batch, Catalog};
use crate::types::{CartEntry, Coupon, Payment, Product, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,       // Profile menu listing the feeds
    Feed(Feed), // One paginated feed
}

/// The controller of whichever feed is on screen
#[derive(Debug)]
pub enum FeedPane {
    Cart(ListController<CartEntry>),
    Favourites(ListController<Product>),
    Friends(ListController<User>),
    Payments(ListController<Payment>),
    Promotions(ListController<Coupon>),
}

impl FeedPane {
    pub fn open(feed: Feed, per_page: u32) -> Self {
        match feed {
            Feed::Cart => FeedPane::Cart(ListController::new(per_page)),
            Feed::Favourites => FeedPane::Favourites(ListController::new(per_page)),
            Feed::Friends => FeedPane::Friends(ListController::new(per_page)),
            Feed::Payments => FeedPane::Payments(ListController::new(per_page)),
            Feed::Promotions => FeedPane::Promotions(ListController::new(per_page)),
        }
    }

    pub fn feed(&self) -> Feed {
        match self {
            FeedPane::Cart(_) => Feed::Cart,
            FeedPane::Favourites(_) => Feed::Favourites,
            FeedPane::Friends(_) => Feed::Friends,
            FeedPane::Payments(_) => Feed::Payments,
            FeedPane::Promotions(_) => Feed::Promotions,
        }
    }

    pub fn list(&self) -> &dyn Paginated {
        match self {
            FeedPane::Cart(c) => c,
            FeedPane::Favourites(c) => c,
            FeedPane::Friends(c) => c,
            FeedPane::Payments(c) => c,
            FeedPane::Promotions(c) => c,
        }
    }

    pub fn list_mut(&mut self) -> &mut dyn Paginated {
        match self {
            FeedPane::Cart(c) => c,
            FeedPane::Favourites(c) => c,
            FeedPane::Friends(c) => c,
            FeedPane::Payments(c) => c,
            FeedPane::Promotions(c) => c,
        }
    }

    /// Hand a fetch outcome to the controller. Returns whether it was applied.
    pub fn apply(&mut self, ticket: Ticket, result: Result<Batch, String>) -> bool {
        match (self, result) {
            (FeedPane::Cart(c), Ok(Batch::Cart(page))) => c.apply(ticket, Ok::<_, String>(page)),
            (FeedPane::Favourites(c), Ok(Batch::Favourites(page))) => {
                c.apply(ticket, Ok::<_, String>(page))
            }
            (FeedPane::Friends(c), Ok(Batch::Friends(page))) => {
                c.apply(ticket, Ok::<_, String>(page))
            }
            (FeedPane::Payments(c), Ok(Batch::Payments(page))) => {
                c.apply(ticket, Ok::<_, String>(page))
            }
            (FeedPane::Promotions(c), Ok(Batch::Promotions(page))) => {
                c.apply(ticket, Ok::<_, String>(page))
            }
            (pane, Err(message)) => pane.list_mut().fail(ticket, &message),
            (pane, Ok(_)) => {
                debug!(feed = %pane.feed(), "page belongs to another feed");
                pane.list_mut().fail(ticket, "unexpected response shape")
            }
        }
    }

    /// Number of selectable rows. Cart lines are listed individually and
    /// inactive coupons are hidden.
    pub fn row_count(&self) -> usize {
        match self {
            FeedPane::Cart(c) => cart::line_count(c.items()),
            FeedPane::Favourites(c) => c.items().len(),
            FeedPane::Friends(c) => c.items().len(),
            FeedPane::Payments(c) => c.items().len(),
            FeedPane::Promotions(c) => c.items().iter().filter(|k| k.is_active()).count(),
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub pane: Option<FeedPane>,
    pub menu_index: usize,
    pub row_index: usize,
    pub catalog: HashMap<String, Product>,
    pub confirm: Option<ConfirmAction>,
    pub error: Option<String>,
    pub should_quit: bool,
    pending_products: HashSet<String>,
    feed_cancel: CancellationToken,
    config: Config,
    api: Arc<dyn Catalog>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        api: Arc<dyn Catalog>,
        config: Config,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::Menu,
            pane: None,
            menu_index: 0,
            row_index: 0,
            catalog: HashMap::new(),
            confirm: None,
            error: None,
            should_quit: false,
            pending_products: HashSet::new(),
            feed_cancel: CancellationToken::new(),
            config,
            api,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => match self.config.general.start_feed {
                Some(feed) => Action::OpenFeed(feed),
                None => Action::None,
            },
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.confirm.is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Action::ConfirmYes,
                KeyCode::Char('n') | KeyCode::Esc => Action::ConfirmNo,
                _ => Action::None,
            };
        }

        let in_cart = self.screen == Screen::Feed(Feed::Cart);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => match self.screen {
                Screen::Menu => Action::Quit,
                Screen::Feed(_) => Action::Back,
            },
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('m') if self.pane.is_some() => Action::LoadMore,
            KeyCode::Char('r') if self.pane.is_some() => Action::Retry,
            KeyCode::Char('+') | KeyCode::Char('=') if in_cart => Action::IncreaseQuantity,
            KeyCode::Char('-') if in_cart => Action::DecreaseQuantity,
            KeyCode::Char('d') | KeyCode::Delete if in_cart => Action::RemoveLine,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some()
            && !matches!(
                action,
                Action::ProductLoaded(_) | Action::ProductFailed { .. }
            )
        {
            self.error = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::Menu => {
                    self.should_quit = true;
                }
                Screen::Feed(_) => self.close_feed(),
            },
            Action::ScrollUp => match self.screen {
                Screen::Menu => {
                    self.menu_index = self.menu_index.saturating_sub(1);
                }
                Screen::Feed(_) => {
                    self.row_index = self.row_index.saturating_sub(1);
                }
            },
            Action::ScrollDown => match self.screen {
                Screen::Menu => {
                    if self.menu_index < Feed::ALL.len() - 1 {
                        self.menu_index += 1;
                    }
                }
                Screen::Feed(_) => {
                    let rows = self.row_count();
                    if rows > 0 && self.row_index < rows - 1 {
                        self.row_index += 1;
                    } else {
                        // Trailing edge reached
                        self.load_more();
                    }
                }
            },
            Action::GoToTop => match self.screen {
                Screen::Menu => self.menu_index = 0,
                Screen::Feed(_) => self.row_index = 0,
            },
            Action::GoToBottom => match self.screen {
                Screen::Menu => self.menu_index = Feed::ALL.len() - 1,
                Screen::Feed(_) => self.row_index = self.row_count().saturating_sub(1),
            },
            Action::Select => {
                if self.screen == Screen::Menu {
                    if let Some(feed) = Feed::ALL.get(self.menu_index) {
                        self.open_feed(*feed);
                    }
                }
            }

            Action::OpenFeed(feed) => self.open_feed(feed),
            Action::LoadMore => self.load_more(),
            Action::Retry => self.initialize(),
            Action::PageFetched { ticket, result } => self.page_fetched(ticket, result),

            Action::ProductLoaded(product) => {
                self.pending_products.remove(&product.id);
                self.catalog.insert(product.id.clone(), *product);
            }
            Action::ProductFailed { id, message } => {
                // Looked up again on the next page load or refresh
                self.pending_products.remove(&id);
                self.error = Some(message);
            }
            Action::IncreaseQuantity => {
                if let Some((entry_id, product_id, quantity)) = self.selected_cart_line() {
                    self.edit_cart(|entries| {
                        cart::set_quantity(entries, &entry_id, &product_id, quantity + 1)
                    });
                }
            }
            Action::DecreaseQuantity => {
                if let Some((entry_id, product_id, quantity)) = self.selected_cart_line() {
                    if quantity <= 1 {
                        self.confirm = Some(ConfirmAction::RemoveLine {
                            entry_id,
                            product_id,
                        });
                    } else {
                        self.edit_cart(|entries| {
                            cart::set_quantity(entries, &entry_id, &product_id, quantity - 1)
                        });
                    }
                }
            }
            Action::RemoveLine => {
                if let Some((entry_id, product_id, _)) = self.selected_cart_line() {
                    self.confirm = Some(ConfirmAction::RemoveLine {
                        entry_id,
                        product_id,
                    });
                }
            }

            Action::ConfirmYes => match self.confirm.take() {
                Some(ConfirmAction::RemoveLine {
                    entry_id,
                    product_id,
                }) => {
                    self.edit_cart(|entries| cart::remove_line(entries, &entry_id, &product_id));
                    self.clamp_row();
                }
                None => {}
            },
            Action::ConfirmNo => {
                self.confirm = None;
            }
            Action::None => {}
        }
    }

    pub fn row_count(&self) -> usize {
        self.pane.as_ref().map_or(0, FeedPane::row_count)
    }

    fn open_feed(&mut self, feed: Feed) {
        if self.pane.is_some() {
            self.close_feed();
        }
        debug!(%feed, "opening feed");
        self.pane = Some(FeedPane::open(feed, self.config.per_page(feed)));
        self.screen = Screen::Feed(feed);
        self.row_index = 0;
        self.initialize();
    }

    /// Tear down the open feed. In-flight fetches are cancelled, and anything
    /// that still arrives is rejected by the controller.
    fn close_feed(&mut self) {
        if let Some(mut pane) = self.pane.take() {
            debug!(feed = %pane.feed(), "closing feed");
            pane.list_mut().teardown();
        }
        self.feed_cancel.cancel();
        self.feed_cancel = CancellationToken::new();
        self.pending_products.clear();
        self.confirm = None;
        self.row_index = 0;
        self.screen = Screen::Menu;
    }

    fn initialize(&mut self) {
        let Some(pane) = self.pane.as_mut() else {
            return;
        };
        let feed = pane.feed();
        if let Some(ticket) = pane.list_mut().begin_initialize() {
            self.spawn_fetch(feed, ticket);
        }
    }

    fn load_more(&mut self) {
        let Some(pane) = self.pane.as_mut() else {
            return;
        };
        let feed = pane.feed();
        if let Some(ticket) = pane.list_mut().begin_load_more() {
            self.spawn_fetch(feed, ticket);
        }
    }

    fn page_fetched(&mut self, ticket: Ticket, result: Result<Batch, String>) {
        let product_ids: Vec<String> = match &result {
            Ok(Batch::Cart(page)) => page
                .items
                .iter()
                .flat_map(|entry| entry.products.iter().map(|l| l.product_id.clone()))
                .collect(),
            _ => Vec::new(),
        };

        let Some(pane) = self.pane.as_mut() else {
            debug!("page arrived with no feed open");
            return;
        };
        if !pane.apply(ticket, result) {
            return;
        }

        self.clamp_row();
        self.spawn_load_products(product_ids);
    }

    fn clamp_row(&mut self) {
        self.row_index = self.row_index.min(self.row_count().saturating_sub(1));
    }

    fn cart_mut(&mut self) -> Option<&mut ListController<CartEntry>> {
        match self.pane.as_mut() {
            Some(FeedPane::Cart(list)) => Some(list),
            _ => None,
        }
    }

    fn edit_cart(&mut self, edit: impl FnOnce(&mut Vec<CartEntry>)) {
        if let Some(list) = self.cart_mut() {
            list.edit_items(edit);
        }
    }

    /// (cart id, product id, quantity) of the highlighted cart line
    fn selected_cart_line(&self) -> Option<(String, String, u32)> {
        let Some(FeedPane::Cart(list)) = &self.pane else {
            return None;
        };
        let (entry_idx, line_idx) = cart::line_at(list.items(), self.row_index)?;
        let entry = &list.items()[entry_idx];
        let line = &entry.products[line_idx];
        Some((entry.id.clone(), line.product_id.clone(), line.quantity))
    }

    fn spawn_fetch(&self, feed: Feed, ticket: Ticket) {
        let tx = self.action_tx.clone();
        let api = Arc::clone(&self.api);
        let cancel = self.feed_cancel.clone();
        debug!(%feed, kind = ?ticket.kind(), page = ticket.request().page, "fetching");
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(%feed, "fetch cancelled");
                    return;
                }
                result = fetch_batch(&*api, feed, ticket.request()) => result,
            };
            tx.send(Action::PageFetched {
                ticket,
                result: result.map_err(|e| e.to_string()),
            })
            .ok();
        });
    }

    fn spawn_load_products(&mut self, ids: Vec<String>) {
        for id in ids {
            if self.catalog.contains_key(&id) || !self.pending_products.insert(id.clone()) {
                continue;
            }
            let tx = self.action_tx.clone();
            let api = Arc::clone(&self.api);
            let cancel = self.feed_cancel.clone();
            tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    result = api.get_product(&id) => result,
                };
                match result {
                    Ok(product) => {
                        tx.send(Action::ProductLoaded(Box::new(product))).ok();
                    }
                    Err(e) => {
                        debug!(product = %id, "product lookup failed: {}", e);
                        tx.send(Action::ProductFailed {
                            id,
                            message: e.to_string(),
                        })
                        .ok();
                    }
                }
            });
        }
    }
}
