/// Columns kept from the source dataset, in their canonical order.
pub const RELEVANT_COLUMNS: [&str; 7] = [
    "name",
    "main_category",
    "sub_category",
    "discount_price",
    "actual_price",
    "ratings",
    "no_of_ratings",
];

/// Literal ratings values observed in the dataset snapshot that are not
/// ratings at all (stray prices, storefront UI text). The cleaner's parse
/// gate rejects all of these; the list is kept as the record of what the
/// source actually contained.
pub const RATING_DENYLIST: [&str; 9] = [
    "nan", "Get", "FREE", "₹68.99", "₹65", "₹70", "₹100", "₹99", "₹2.99",
];

/// Fact table written by the loader.
pub const SALES_TABLE: &str = "sales_data";

/// Pre-aggregated tables read by the dashboard.
pub const CATEGORY_ANALYSIS_TABLE: &str = "category_analysis";
pub const PRICE_ANALYSIS_TABLE: &str = "price_analysis";
pub const RATING_ANALYSIS_TABLE: &str = "rating_analysis";
pub const TIME_SERIES_TABLE: &str = "time_series_analysis";
