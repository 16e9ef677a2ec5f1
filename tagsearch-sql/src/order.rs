use std::fmt;

/// The four fixed sort orders a search can be paginated by. The enum's
/// string form also serves as the cache page-file prefix discriminator
/// (`<prefix>.<page>.json`), so renaming a variant changes on-disk cache
/// layout — keep these names stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    AscPostDate,
    AscUpdateDate,
    DescPostDate,
    DescUpdateDate,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::AscPostDate => "ASC_POSTDATE",
            Order::AscUpdateDate => "ASC_UPDATEDATE",
            Order::DescPostDate => "DESC_POSTDATE",
            Order::DescUpdateDate => "DESC_UPDATEDATE",
        }
    }

    /// The page-file prefix for this order: the string form followed by a
    /// dot, e.g. `DESC_POSTDATE.`.
    pub fn page_prefix(self) -> String {
        format!("{}.", self.as_str())
    }

    pub(crate) fn order_by_clause(self) -> &'static str {
        match self {
            Order::AscPostDate => "ORDER BY posted_articles.id ASC",
            Order::AscUpdateDate => "ORDER BY posted_articles.update_date ASC",
            Order::DescPostDate => "ORDER BY posted_articles.id DESC",
            Order::DescUpdateDate => "ORDER BY posted_articles.update_date DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller supplied an order token this engine does not recognize. This is
/// the one fatal, surfaced error in the query-lowering path — everything
/// else in parsing and lowering recovers silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderError {
    pub given: String,
}

impl fmt::Display for UnknownOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order: {:?}", self.given)
    }
}

impl std::error::Error for UnknownOrderError {}

impl std::str::FromStr for Order {
    type Err = UnknownOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC_POSTDATE" => Ok(Order::AscPostDate),
            "ASC_UPDATEDATE" => Ok(Order::AscUpdateDate),
            "DESC_POSTDATE" => Ok(Order::DescPostDate),
            "DESC_UPDATEDATE" => Ok(Order::DescUpdateDate),
            other => Err(UnknownOrderError { given: other.to_string() }),
        }
    }
}
