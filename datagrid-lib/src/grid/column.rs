//! Column declarations

/// A displayable, searchable and sortable grid column.
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::Column;
///
/// let columns = vec![
///     Column::new("id").label("ID").sortable(),
///     Column::new("name").label("Name").searchable().sortable(),
///     Column::new("customer_name")
///         .label("Customer")
///         .searchable()
///         .relation("customers.name"),
/// ];
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Record field the column reads.
    pub field: String,
    /// Header label.
    pub label: String,
    /// Hidden columns are still filterable and searchable.
    pub hidden: bool,
    /// Included in free-text search.
    pub searchable: bool,
    /// Offered as a sort key.
    pub sortable: bool,
    /// Relation-qualified field used instead of `field` against a queryable store.
    pub relation_field: Option<String>,
}

impl Column {
    /// Creates a visible, non-searchable, non-sortable column labelled with its field name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            label: field.clone(),
            field,
            hidden: false,
            searchable: false,
            sortable: false,
            relation_field: None,
        }
    }

    /// Sets the header label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Starts the column hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Includes the column in free-text search.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Allows sorting by the column.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Aliases the column to a field of a related table.
    pub fn relation(mut self, qualified_field: impl Into<String>) -> Self {
        self.relation_field = Some(qualified_field.into());
        self
    }
}

/// Relation search declarations: related table → columns searched with the free-text term.
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::RelationSearch;
///
/// let relations = RelationSearch::new()
///     .relation("customers", ["name", "email"]);
///
/// assert_eq!(relations.qualified_fields('.'), vec!["customers.name", "customers.email"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSearch {
    relations: Vec<(String, Vec<String>)>,
}

impl RelationSearch {
    /// Creates an empty declaration set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares columns of a related table as searchable.
    pub fn relation<I, S>(mut self, relation: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations
            .push((relation.into(), columns.into_iter().map(Into::into).collect()));
        self
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.relations.iter().all(|(_, columns)| columns.is_empty())
    }

    /// Returns every declared column qualified with its relation name.
    pub fn qualified_fields(&self, separator: char) -> Vec<String> {
        self.relations
            .iter()
            .flat_map(|(relation, columns)| {
                columns
                    .iter()
                    .map(move |column| format!("{}{}{}", relation, separator, column))
            })
            .collect()
    }
}
