/// Collection queries
///
/// The views issue one fixed query each. Queries are built as `DocumentQuery`
/// values and rendered to the store's query language; the in-memory backend
/// parses the same subset back.
use std::fmt;

/// Ordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// `*[_type == "<type>"] | order(<field> <dir>) { <fields> }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub document_type: String,
    pub order: Option<(String, SortDirection)>,
    pub projection: Vec<String>,
}

impl DocumentQuery {
    /// Select every document of a type
    pub fn of_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            order: None,
            projection: Vec::new(),
        }
    }

    /// Order results by a field
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    /// Restrict returned fields
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Parse the subset of the query language produced by `Display`
    ///
    /// Returns `None` for anything outside that subset.
    pub fn parse(input: &str) -> Option<Self> {
        let rest = input.trim().strip_prefix("*[")?;
        let (filter, rest) = rest.split_once(']')?;

        let (lhs, rhs) = filter.split_once("==")?;
        if lhs.trim() != "_type" {
            return None;
        }
        let document_type = rhs.trim().strip_prefix('"')?.strip_suffix('"')?.to_string();

        let mut query = Self::of_type(document_type);
        let mut rest = rest.trim();

        if let Some(after_pipe) = rest.strip_prefix('|') {
            let after_order = after_pipe.trim().strip_prefix("order(")?;
            let (clause, tail) = after_order.split_once(')')?;
            let mut parts = clause.split_whitespace();
            let field = parts.next()?.to_string();
            let direction = match parts.next() {
                None | Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(_) => return None,
            };
            if parts.next().is_some() {
                return None;
            }
            query.order = Some((field, direction));
            rest = tail.trim();
        }

        if let Some(body) = rest.strip_prefix('{') {
            let body = body.trim_end().strip_suffix('}')?;
            query.projection = body
                .split(',')
                .map(|field| field.trim().to_string())
                .filter(|field| !field.is_empty())
                .collect();
        } else if !rest.is_empty() {
            return None;
        }

        Some(query)
    }
}

impl fmt::Display for DocumentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*[_type == \"{}\"]", self.document_type)?;
        if let Some((field, direction)) = &self.order {
            write!(f, " | order({} {})", field, direction.as_str())?;
        }
        if !self.projection.is_empty() {
            write!(f, " {{ {} }}", self.projection.join(", "))?;
        }
        Ok(())
    }
}
