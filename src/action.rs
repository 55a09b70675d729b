use crate::controller::Ticket;
use crate::feed::Feed;
use crate::source::Batch;
use crate::types::Product;

/// What to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveLine {
        entry_id: String,
        product_id: String,
    },
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    Select,

    // Navigation
    OpenFeed(Feed),

    // Pagination
    LoadMore,
    Retry,
    PageFetched {
        ticket: Ticket,
        result: Result<Batch, String>,
    },

    // Cart
    ProductLoaded(Box<Product>),
    ProductFailed {
        id: String,
        message: String,
    },
    IncreaseQuantity,
    DecreaseQuantity,
    RemoveLine,

    // Confirmation popup
    ConfirmYes,
    ConfirmNo,

    None,
}
