use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Utc};
use studyhub_application::feature::FinanceService;
use studyhub_core::feature::financial::FinancialRecord;
use studyhub_infrastructure::PostgrestTable;

use super::{App, print_json};

pub async fn summary(app: &App, year: Option<i32>) -> Result<()> {
    app.auth.initialize().await;
    let snapshot = app.auth.resolved().await;
    if !snapshot.is_authenticated() {
        tracing::warn!("[Finance] Not signed in, reading as anonymous");
    }

    let records = Arc::new(PostgrestTable::<FinancialRecord>::new(app.client.clone()));
    let service = FinanceService::new(records);

    print_json(&service.summary().await?)?;
    let year = year.unwrap_or_else(|| Utc::now().year());
    print_json(&service.monthly_stats(year).await?)
}
