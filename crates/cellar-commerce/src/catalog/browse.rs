//! Filtered, paged catalog listing.

use crate::catalog::{Item, ItemDetails, ItemKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Items per listing page.
pub const BROWSE_PAGE_SIZE: usize = 12;

/// Lowercase form used for every case-insensitive comparison.
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseSort {
    #[default]
    Newest,
    #[serde(rename = "asc")]
    PriceAsc,
    #[serde(rename = "desc")]
    PriceDesc,
}

impl BrowseSort {
    /// `asc` and `desc` sort by price; anything else is newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("asc") => BrowseSort::PriceAsc,
            Some("desc") => BrowseSort::PriceDesc,
            _ => BrowseSort::Newest,
        }
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let primary = match self {
            BrowseSort::Newest => b.created_at.cmp(&a.created_at),
            BrowseSort::PriceAsc => a.price.amount.cmp(&b.price.amount),
            BrowseSort::PriceDesc => b.price.amount.cmp(&a.price.amount),
        };
        primary.then_with(|| a.id.as_str().cmp(b.id.as_str()))
    }
}

/// Inclusive price bounds in minor units. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PriceRange {
    /// Parse `min-max`, `min-` or `-max`. Unparsable sides are left open.
    pub fn parse(raw: &str) -> Self {
        let (min, max) = raw.split_once('-').unwrap_or((raw, ""));
        Self {
            min: min.trim().parse().ok(),
            max: max.trim().parse().ok(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, amount: i64) -> bool {
        self.min.map_or(true, |min| amount >= min) && self.max.map_or(true, |max| amount <= max)
    }
}

/// Listing filters. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    /// Name substring.
    pub search: Option<String>,
    /// Wine type, exact match ignoring case. Restricts the listing to wines.
    pub wine_type: Option<String>,
    /// Wine origin, exact match ignoring case. Restricts the listing to wines.
    pub origin: Option<String>,
    /// Brand for wines; a name substring for accessories and gift sets.
    pub brand: Option<String>,
    pub budget: PriceRange,
    pub sort: BrowseSort,
}

impl BrowseFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_wine_type(mut self, wine_type: impl Into<String>) -> Self {
        self.wine_type = Some(wine_type.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_budget(mut self, budget: PriceRange) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_sort(mut self, sort: BrowseSort) -> Self {
        self.sort = sort;
        self
    }

    /// Kinds the listing draws from.
    pub fn kinds(&self) -> &'static [ItemKind] {
        if present(&self.wine_type).is_some() || present(&self.origin).is_some() {
            &[ItemKind::Wine]
        } else {
            &ItemKind::ALL
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        if !self.kinds().contains(&item.kind) || !self.budget.contains(item.price.amount) {
            return false;
        }
        let name = fold(&item.name);
        if let Some(search) = present(&self.search) {
            if !name.contains(&search) {
                return false;
            }
        }
        match &item.details {
            ItemDetails::Wine {
                brand,
                origin,
                wine_type,
                ..
            } => {
                equals(&self.wine_type, wine_type.as_deref())
                    && equals(&self.origin, origin.as_deref())
                    && present(&self.brand).map_or(true, |wanted| {
                        brand.as_deref().is_some_and(|b| fold(b).contains(&wanted))
                    })
            }
            _ => present(&self.brand).map_or(true, |wanted| name.contains(&wanted)),
        }
    }

    /// Filter, order and cut one page. Pages below 1 are treated as 1.
    pub fn apply(&self, items: Vec<Item>, page: usize) -> BrowsePage {
        let mut matched: Vec<Item> = items.into_iter().filter(|i| self.matches(i)).collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));

        let page = page.max(1);
        let total = matched.len();
        let products = matched
            .into_iter()
            .skip((page - 1).saturating_mul(BROWSE_PAGE_SIZE))
            .take(BROWSE_PAGE_SIZE)
            .collect();
        BrowsePage {
            products,
            current_page: page,
            total_pages: total.div_ceil(BROWSE_PAGE_SIZE),
            total,
        }
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(fold).filter(|v| !v.is_empty())
}

fn equals(wanted: &Option<String>, actual: Option<&str>) -> bool {
    present(wanted).map_or(true, |w| actual.is_some_and(|a| fold(a) == w))
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsePage {
    pub products: Vec<Item>,
    pub current_page: usize,
    /// Zero when nothing matched.
    pub total_pages: usize,
    pub total: usize,
}

/// Whether an item belongs to a category: wine type for wines, the
/// category field for accessories and gift sets. Substring, ignoring case.
pub fn in_category(item: &Item, category: &str) -> bool {
    let wanted = fold(category);
    if wanted.is_empty() {
        return false;
    }
    let field = match &item.details {
        ItemDetails::Wine { wine_type, .. } => wine_type.as_deref(),
        ItemDetails::Accessory { category } | ItemDetails::GiftSet { category } => {
            category.as_deref()
        }
    };
    field.is_some_and(|f| fold(f).contains(&wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ItemId;
    use crate::money::Money;

    fn item(id: &str, name: &str, price: i64, created_at: i64, details: ItemDetails) -> Item {
        Item {
            id: ItemId::new(id),
            kind: details.kind(),
            name: name.into(),
            description: String::new(),
            image_url: None,
            price: Money::vnd(price),
            stock: 1,
            details,
            created_at,
        }
    }

    fn wine(id: &str, price: i64, brand: &str, origin: &str, wine_type: &str) -> Item {
        item(
            id,
            &format!("{brand} {wine_type}"),
            price,
            price,
            ItemDetails::Wine {
                brand: Some(brand.into()),
                origin: Some(origin.into()),
                wine_type: Some(wine_type.into()),
                volume_ml: Some(750),
            },
        )
    }

    #[test]
    fn test_price_range_parse() {
        assert_eq!(
            PriceRange::parse("500000-1000000"),
            PriceRange {
                min: Some(500_000),
                max: Some(1_000_000)
            }
        );
        assert_eq!(PriceRange::parse("2000000-").max, None);
        assert_eq!(PriceRange::parse("-300000").min, None);
        assert!(PriceRange::parse("cheap").is_open());

        let range = PriceRange::parse("100-200");
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn test_sort_parse_defaults_to_newest() {
        assert_eq!(BrowseSort::parse(Some("asc")), BrowseSort::PriceAsc);
        assert_eq!(BrowseSort::parse(Some("desc")), BrowseSort::PriceDesc);
        assert_eq!(BrowseSort::parse(Some("popular")), BrowseSort::Newest);
        assert_eq!(BrowseSort::parse(None), BrowseSort::Newest);
    }

    #[test]
    fn test_wine_filters_exclude_other_kinds() {
        let opener = item(
            "a1",
            "Torres opener",
            90,
            1,
            ItemDetails::Accessory { category: None },
        );
        let red = wine("w1", 300, "Torres", "Tây Ban Nha", "Vang đỏ");

        let by_brand = BrowseFilter::default().with_brand("TORRES");
        assert!(by_brand.matches(&opener));
        assert!(by_brand.matches(&red));

        let by_origin = BrowseFilter::default().with_origin("TÂY BAN NHA");
        assert!(by_origin.matches(&red));
        assert!(!by_origin.matches(&opener));
        assert!(!BrowseFilter::default().with_wine_type("Vang trắng").matches(&red));
    }

    #[test]
    fn test_apply_sorts_and_pages() {
        let items: Vec<Item> = (1..=25)
            .map(|n| wine(&format!("w{n:02}"), n * 1_000, "Penfolds", "Úc", "Vang đỏ"))
            .collect();

        let first = BrowseFilter::default()
            .with_sort(BrowseSort::PriceAsc)
            .apply(items.clone(), 1);
        assert_eq!(first.total, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.products.len(), BROWSE_PAGE_SIZE);
        assert_eq!(first.products[0].price.amount, 1_000);

        let last = BrowseFilter::default()
            .with_sort(BrowseSort::PriceDesc)
            .apply(items.clone(), 3);
        assert_eq!(last.current_page, 3);
        assert_eq!(last.products.len(), 1);
        assert_eq!(last.products[0].price.amount, 1_000);

        let newest = BrowseFilter::default().apply(items.clone(), 0);
        assert_eq!(newest.current_page, 1);
        assert_eq!(newest.products[0].id.as_str(), "w25");

        let none = BrowseFilter::default().with_search("xyz").apply(items, 1);
        assert_eq!(none.total_pages, 0);
        assert!(none.products.is_empty());
    }

    #[test]
    fn test_in_category() {
        let red = wine("w1", 300, "Torres", "Tây Ban Nha", "Vang đỏ");
        let hamper = item(
            "g1",
            "Hộp quà Tết",
            900,
            1,
            ItemDetails::GiftSet {
                category: Some("Giỏ quà Tết".into()),
            },
        );
        assert!(in_category(&red, "VANG ĐỎ"));
        assert!(in_category(&hamper, "quà tết"));
        assert!(!in_category(&hamper, "Vang"));
        assert!(!in_category(&red, "  "));
    }
}
