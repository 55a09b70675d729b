use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::feed::Feed;
use crate::types::{CartEntry, Coupon, Page, PageRequest, Payment, Product, User};

/// Anything that can hand out pages of `T`
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page<T>>;
}

/// The store as the app sees it: one list source per feed plus single-product
/// lookups for cart pricing.
#[async_trait]
pub trait Catalog:
    ListSource<CartEntry>
    + ListSource<Product>
    + ListSource<User>
    + ListSource<Payment>
    + ListSource<Coupon>
    + std::fmt::Debug
{
    async fn get_product(&self, id: &str) -> Result<Product>;
}

/// A page of whichever record type a feed carries
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Cart(Page<CartEntry>),
    Favourites(Page<Product>),
    Friends(Page<User>),
    Payments(Page<Payment>),
    Promotions(Page<Coupon>),
}

/// Ties a record type to the feed that serves it
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    const FEED: Feed;

    fn into_batch(page: Page<Self>) -> Batch;
}

impl Record for CartEntry {
    const FEED: Feed = Feed::Cart;

    fn into_batch(page: Page<Self>) -> Batch {
        Batch::Cart(page)
    }
}

impl Record for Product {
    const FEED: Feed = Feed::Favourites;

    fn into_batch(page: Page<Self>) -> Batch {
        Batch::Favourites(page)
    }
}

impl Record for User {
    const FEED: Feed = Feed::Friends;

    fn into_batch(page: Page<Self>) -> Batch {
        Batch::Friends(page)
    }
}

impl Record for Payment {
    const FEED: Feed = Feed::Payments;

    fn into_batch(page: Page<Self>) -> Batch {
        Batch::Payments(page)
    }
}

impl Record for Coupon {
    const FEED: Feed = Feed::Promotions;

    fn into_batch(page: Page<Self>) -> Batch {
        Batch::Promotions(page)
    }
}

async fn fetch_as<T, S>(source: &S, request: PageRequest) -> Result<Batch>
where
    T: Record,
    S: ListSource<T> + ?Sized,
{
    let page = ListSource::<T>::fetch_page(source, request).await?;
    Ok(T::into_batch(page))
}

/// Fetch one page for `feed`, whatever its record type
pub async fn fetch_batch<S>(source: &S, feed: Feed, request: PageRequest) -> Result<Batch>
where
    S: Catalog + ?Sized,
{
    match feed {
        Feed::Cart => fetch_as::<CartEntry, S>(source, request).await,
        Feed::Favourites => fetch_as::<Product, S>(source, request).await,
        Feed::Friends => fetch_as::<User, S>(source, request).await,
        Feed::Payments => fetch_as::<Payment, S>(source, request).await,
        Feed::Promotions => fetch_as::<Coupon, S>(source, request).await,
    }
}

/// Decode a list body: either a bare array, or `{ data, currentPage, totalPages }`.
pub fn decode_page<T: DeserializeOwned>(body: Value) -> Result<Page<T>> {
    match body {
        Value::Array(_) => Ok(Page::bare(serde_json::from_value(body)?)),
        Value::Object(mut obj) => {
            let data = obj.remove("data").ok_or_else(|| {
                StoreError::Decode("expected an array or an object with a `data` field".into())
            })?;
            let items = serde_json::from_value(data)?;
            Ok(Page {
                items,
                current_page: page_number(obj.get("currentPage")),
                total_pages: page_number(obj.get("totalPages")),
            })
        }
        other => Err(StoreError::Decode(format!(
            "expected a list of records, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decode a single-record body, unwrapping a `data` envelope if present
pub fn decode_one<T: DeserializeOwned>(body: Value) -> Result<T> {
    let inner = match body {
        Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_object) => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(inner)?)
}

fn page_number(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_has_no_metadata() {
        let page: Page<u32> = decode_page(json!([1, 2, 3])).unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.current_page, None);
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn envelope_carries_metadata() {
        let page: Page<u32> = decode_page(json!({
            "data": [4, 5],
            "currentPage": 2,
            "totalPages": "3"
        }))
        .unwrap();
        assert_eq!(page.items, vec![4, 5]);
        assert_eq!(page.current_page, Some(2));
        assert_eq!(page.total_pages, Some(3));
    }

    #[test]
    fn object_without_data_is_malformed() {
        let err = decode_page::<u32>(json!({ "message": "nope" })).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn scalar_body_is_malformed() {
        let err = decode_page::<u32>(json!("oops")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn wrong_record_shape_is_malformed() {
        let err = decode_page::<u32>(json!({ "data": [{ "x": 1 }] })).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn decode_one_unwraps_envelope() {
        let product: Product = decode_one(json!({
            "data": { "_id": "p9", "title": "Mug", "price": 4 }
        }))
        .unwrap();
        assert_eq!(product.id, "p9");

        let bare: Product = decode_one(json!({ "_id": "p9", "title": "Mug", "price": 4 })).unwrap();
        assert_eq!(bare, product);
    }
}
