//! Built-in analyzer rules and the default batches they run in.

mod erase_projection;
mod pushdown;
mod resolve_columns;
mod resolve_natural_joins;
mod resolve_stars;
mod resolve_subqueries;
mod resolve_tables;
mod validation;

use common_config::AnalyzerConfig;

pub use erase_projection::EraseProjection;
pub use pushdown::{PushdownFilters, PushdownProjections};
pub use resolve_columns::ResolveColumns;
pub use resolve_natural_joins::ResolveNaturalJoins;
pub use resolve_stars::ResolveStars;
pub use resolve_subqueries::ResolveSubqueries;
pub use resolve_tables::ResolveTables;
pub use validation::{ValidateGroupBy, ValidateResolved};

use crate::rule::{Batch, Phase};

/// The batches every analyzer starts from.
pub(crate) fn default_batches(config: &AnalyzerConfig) -> Vec<Batch> {
    vec![
        Batch::new(
            "resolution",
            Phase::Analysis,
            config.max_iterations,
            vec![
                Box::new(ResolveTables),
                Box::new(ResolveNaturalJoins),
                Box::new(ResolveSubqueries),
                Box::new(ResolveStars),
                Box::new(ResolveColumns),
            ],
        ),
        Batch::new(
            "pushdown",
            Phase::Analysis,
            1,
            vec![
                Box::new(PushdownFilters),
                Box::new(PushdownProjections),
                Box::new(EraseProjection),
            ],
        ),
        Batch::new(
            "validation",
            Phase::Validation,
            1,
            vec![Box::new(ValidateResolved), Box::new(ValidateGroupBy)],
        ),
    ]
}
