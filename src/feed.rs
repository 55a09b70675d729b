use serde::Deserialize;
use std::fmt;

/// The paginated collections reachable from the profile menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    Cart,
    Favourites,
    Friends,
    Payments,
    Promotions,
}

impl Feed {
    pub const ALL: [Feed; 5] = [
        Feed::Cart,
        Feed::Favourites,
        Feed::Friends,
        Feed::Payments,
        Feed::Promotions,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            Feed::Cart => "/api/cart",
            Feed::Favourites => "/api/products",
            Feed::Friends => "/api/users",
            Feed::Payments => "/api/payments",
            Feed::Promotions => "/api/coupons",
        }
    }

    /// Query parameter carrying the page size. The store API is not
    /// consistent about this across endpoints.
    pub fn size_param(&self) -> &'static str {
        match self {
            Feed::Favourites | Feed::Promotions => "limit",
            Feed::Cart | Feed::Friends | Feed::Payments => "perPage",
        }
    }

    pub fn default_per_page(&self) -> u32 {
        match self {
            Feed::Cart => 10,
            Feed::Favourites | Feed::Promotions => 20,
            Feed::Friends | Feed::Payments => 5,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Feed::Cart => "Your Shopping Cart",
            Feed::Favourites => "Favourites",
            Feed::Friends => "Friends",
            Feed::Payments => "Payments",
            Feed::Promotions => "Promotions",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Feed::Cart => "Your cart is empty - add some products to get started",
            Feed::Favourites => "No favourites yet",
            Feed::Friends => "No friends found",
            Feed::Payments => "No payments yet",
            Feed::Promotions => "No promotions available right now",
        }
    }

    pub fn end_message(&self) -> &'static str {
        match self {
            Feed::Cart => "No more carts to load",
            Feed::Favourites => "No more products to load",
            Feed::Friends => "No more friends to load",
            Feed::Payments => "No more payments to load",
            Feed::Promotions => "No more promotions to load",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Cart => write!(f, "Cart"),
            Feed::Favourites => write!(f, "Favourites"),
            Feed::Friends => write!(f, "Friends"),
            Feed::Payments => write!(f, "Payments"),
            Feed::Promotions => write!(f, "Promotions"),
        }
    }
}
