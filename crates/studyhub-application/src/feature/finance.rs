use std::sync::Arc;

use studyhub_core::error::Result;
use studyhub_core::feature::financial::{
    FinancialRecord, FinancialRecordDraft, FinancialSummary, MonthlyStats,
};
use studyhub_core::repository::{EntityTable, Query};

/// Ledger summaries for the finance page.
pub struct FinanceService {
    records: Arc<dyn EntityTable<FinancialRecord>>,
}

impl FinanceService {
    pub fn new(records: Arc<dyn EntityTable<FinancialRecord>>) -> Self {
        Self { records }
    }

    /// All records, newest first.
    pub async fn records(&self) -> Result<Vec<FinancialRecord>> {
        self.records
            .list(&Query::new().order_desc("created_at"))
            .await
    }

    pub async fn summary(&self) -> Result<FinancialSummary> {
        let records = self.records.list(&Query::new()).await?;
        Ok(FinancialSummary::from_records(&records))
    }

    pub async fn monthly_stats(&self, year: i32) -> Result<MonthlyStats> {
        let records = self.records.list(&MonthlyStats::query(year)).await?;
        Ok(MonthlyStats::for_year(&records, year))
    }

    pub async fn record(&self, draft: &FinancialRecordDraft) -> Result<FinancialRecord> {
        let record = self.records.create(draft).await?;
        tracing::info!(
            "[Finance] Recorded {:?} of {} ({})",
            record.record_type,
            record.amount,
            record.id
        );
        Ok(record)
    }
}
