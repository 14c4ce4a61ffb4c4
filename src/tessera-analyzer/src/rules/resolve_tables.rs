//! Bind table references to catalog handles.

use std::sync::Arc;

use common_error::TesseraResult;
use log::debug;
use tessera_logical::{Plan, ResolvedTable, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Replace every `UnresolvedTable` with the catalog's table of that name.
///
/// The table is looked up in the node's database qualifier, or in the
/// session's current database when the reference is unqualified.
pub struct ResolveTables;

impl AnalyzerRule for ResolveTables {
    fn name(&self) -> &str {
        "resolve_tables"
    }

    fn description(&self) -> &str {
        "Bind table names to catalog tables"
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| {
            let Plan::UnresolvedTable { name, database } = node.as_ref() else {
                return Ok(Transformed::no(node));
            };

            let database = database.as_deref().unwrap_or(ctx.current_database());
            let table = analyzer.catalog().table(database, name)?;
            debug!("Resolved table '{name}' in database '{database}'");

            Ok(Transformed::yes(Arc::new(Plan::ResolvedTable(
                ResolvedTable::new(table),
            ))))
        })
    }
}

#[cfg(test)]
mod tests {
    use common_error::TesseraError;
    use tessera_logical::PlanBuilder;

    use super::*;
    use crate::testing::{analyzer, ctx};

    #[test]
    fn test_resolves_in_current_database() {
        let analyzer = analyzer();
        let plan = PlanBuilder::table("mytable").limit(1).build();

        let result = ResolveTables
            .apply(&analyzer, &ctx(), plan, &Scope::new())
            .unwrap();

        assert!(result.changed);
        assert!(result.data.resolved());
        let Plan::Limit { input, .. } = result.data.as_ref() else {
            panic!("expected limit");
        };
        assert_eq!(input.as_resolved_table().unwrap().name(), "mytable");
    }

    #[test]
    fn test_qualified_database_wins() {
        let analyzer = analyzer();
        let plan = PlanBuilder::table_in("mydb", "mytable2").build();

        let result = ResolveTables
            .apply(&analyzer, &Context::new(), plan, &Scope::new())
            .unwrap();
        assert!(result.data.resolved());
    }

    #[test]
    fn test_missing_table() {
        let analyzer = analyzer();
        let plan = PlanBuilder::table("nonexistant").build();

        let err = ResolveTables
            .apply(&analyzer, &ctx(), plan, &Scope::new())
            .unwrap_err();
        assert!(matches!(err, TesseraError::TableNotFound(ref t) if t == "nonexistant"));
    }

    #[test]
    fn test_missing_database() {
        let analyzer = analyzer();
        let plan = PlanBuilder::table_in("otherdb", "mytable").build();

        let err = ResolveTables
            .apply(&analyzer, &ctx(), plan, &Scope::new())
            .unwrap_err();
        assert!(matches!(err, TesseraError::DatabaseNotFound(_)));
    }
}
