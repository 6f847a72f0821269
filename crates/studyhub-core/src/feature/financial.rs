//! Financial ledger and its summaries.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{Entity, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FinancialRecord {
    /// Amount with sign: income positive, expense negative.
    pub fn signed_amount(&self) -> i64 {
        match self.record_type {
            RecordType::Income => self.amount,
            RecordType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecordDraft {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub amount: i64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub recorded_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialRecordPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Entity for FinancialRecord {
    const TABLE: &'static str = "financial_records";
    const ENTITY_TYPE: &'static str = "financial_record";
    type Draft = FinancialRecordDraft;
    type Patch = FinancialRecordPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Totals over the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FinancialSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub record_count: usize,
}

impl FinancialSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FinancialRecord>) -> Self {
        let mut summary = records
            .into_iter()
            .fold(Self::default(), |mut acc, record| {
                match record.record_type {
                    RecordType::Income => acc.total_income += record.amount,
                    RecordType::Expense => acc.total_expense += record.amount,
                }
                acc.record_count += 1;
                acc
            });
        summary.balance = summary.total_income - summary.total_expense;
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonthlyStat {
    /// 1-based month
    pub month: u32,
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

/// Twelve monthly buckets for one calendar year (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub months: [MonthlyStat; 12],
}

impl MonthlyStats {
    /// Backend filter selecting one year of records.
    pub fn query(year: i32) -> Query {
        Query::new()
            .gte("created_at", format!("{year}-01-01"))
            .lte("created_at", format!("{year}-12-31T23:59:59Z"))
    }

    /// Records outside `year` are ignored.
    pub fn for_year<'a>(records: impl IntoIterator<Item = &'a FinancialRecord>, year: i32) -> Self {
        let mut months: [MonthlyStat; 12] = std::array::from_fn(|i| MonthlyStat {
            month: i as u32 + 1,
            ..MonthlyStat::default()
        });

        for record in records.into_iter().filter(|r| r.created_at.year() == year) {
            let stat = &mut months[record.created_at.month0() as usize];
            match record.record_type {
                RecordType::Income => stat.income += record.amount,
                RecordType::Expense => stat.expense += record.amount,
            }
        }
        for stat in &mut months {
            stat.balance = stat.income - stat.expense;
        }

        Self { year, months }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(record_type: RecordType, amount: i64, year: i32, month: u32) -> FinancialRecord {
        FinancialRecord {
            id: Uuid::new_v4(),
            record_type,
            amount,
            description: None,
            category: None,
            recorded_by: None,
            created_at: Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_summary() {
        let records = vec![
            record(RecordType::Income, 50_000, 2025, 1),
            record(RecordType::Income, 20_000, 2025, 2),
            record(RecordType::Expense, 30_000, 2025, 2),
        ];

        let summary = FinancialSummary::from_records(&records);

        assert_eq!(summary.total_income, 70_000);
        assert_eq!(summary.total_expense, 30_000);
        assert_eq!(summary.balance, 40_000);
        assert_eq!(summary.record_count, 3);
        assert_eq!(records[2].signed_amount(), -30_000);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            FinancialSummary::from_records(std::iter::empty()),
            FinancialSummary::default()
        );
    }

    #[test]
    fn test_monthly_stats_buckets_by_month() {
        let records = vec![
            record(RecordType::Income, 10_000, 2025, 3),
            record(RecordType::Expense, 4_000, 2025, 3),
            record(RecordType::Expense, 1_000, 2025, 12),
            record(RecordType::Income, 99_000, 2024, 3),
        ];

        let stats = MonthlyStats::for_year(&records, 2025);

        assert_eq!(stats.months[2].month, 3);
        assert_eq!(stats.months[2].income, 10_000);
        assert_eq!(stats.months[2].balance, 6_000);
        assert_eq!(stats.months[11].balance, -1_000);
        assert_eq!(stats.months[0], MonthlyStat { month: 1, ..MonthlyStat::default() });
    }

    #[test]
    fn test_record_type_wire_name() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "type": "expense",
            "amount": 1200,
            "created_at": "2025-03-01T00:00:00Z"
        });
        let record: FinancialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.record_type, RecordType::Expense);
    }
}
