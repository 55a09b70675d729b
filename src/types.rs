use chrono::{DateTime, NaiveDate};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;

/// One page to ask the store for. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            per_page: self.per_page,
        }
    }
}

/// One batch of records plus whatever pagination metadata the endpoint reported
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl<T> Page<T> {
    pub fn bare(items: Vec<T>) -> Self {
        Self {
            items,
            current_page: None,
            total_pages: None,
        }
    }

    /// Whether another page is expected after this one.
    ///
    /// An empty page always ends the list. Explicit `totalPages` wins over the
    /// page-length heuristic; without it a full page implies there may be more.
    pub fn has_more(&self, request: PageRequest) -> bool {
        if self.items.is_empty() {
            return false;
        }
        match self.total_pages {
            Some(total) => self.current_page.unwrap_or(request.page) < total,
            None => self.items.len() == request.per_page as usize,
        }
    }
}

// Wire helpers: the store mixes numeric and string ids/amounts freely

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Text(s) => s,
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    IdRepr::deserialize(d).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(d)?.map(String::from))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(f64),
    Text(String),
}

impl AmountRepr {
    fn parse<E: de::Error>(self) -> Result<f64, E> {
        match self {
            AmountRepr::Number(n) => Ok(n),
            AmountRepr::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid amount {:?}", s))),
        }
    }
}

fn de_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    AmountRepr::deserialize(d)?.parse()
}

fn de_opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<AmountRepr>::deserialize(d)?
        .map(AmountRepr::parse)
        .transpose()
}

/// A cart as returned by `/api/cart`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub products: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(deserialize_with = "de_id")]
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(deserialize_with = "de_amount")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub old_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub stock: Option<f64>,
    #[serde(default)]
    pub is_new: bool,
}

impl Product {
    pub fn discount_percent(&self) -> Option<u32> {
        discount_percent(self.old_price?, self.price)
    }
}

/// Whole-percent reduction from `old_price` to `price`, if it is a reduction
pub fn discount_percent(old_price: f64, price: f64) -> Option<u32> {
    if price <= 0.0 || old_price <= price {
        return None;
    }
    Some((((old_price - price) / old_price) * 100.0).round() as u32)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub suite: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.street, &self.suite, &self.city, &self.zipcode]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub catch_phrase: Option<String>,
    #[serde(default)]
    pub bs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub order_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub transaction_id: Option<String>,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    #[serde(default)]
    pub method: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Refunded,
    Failed,
    #[serde(other)]
    Pending,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Pending => write!(f, "Pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id", alias = "id", deserialize_with = "de_id")]
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(deserialize_with = "de_amount")]
    pub discount_value: f64,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub min_order_amount: Option<f64>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    pub status: CouponStatus,
}

impl Coupon {
    pub fn is_active(&self) -> bool {
        self.status == CouponStatus::Active
    }

    /// "$5" for fixed discounts, "15%" for percentages
    pub fn badge(&self) -> String {
        let value = format_amount(self.discount_value);
        match self.discount_type {
            DiscountType::Fixed => format!("${}", value),
            DiscountType::Percentage => format!("{}%", value),
            DiscountType::Other => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DiscountType {
    Fixed,
    Percentage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CouponStatus {
    Active,
    #[serde(other)]
    Inactive,
}

/// Drop a trailing ".0" so whole amounts read naturally
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Render an API timestamp as "Mar 5, 2024"; unparseable input is shown as-is.
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%b %-d, %Y").to_string();
    }
    raw.to_string()
}
