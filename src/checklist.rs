//! The eight month-end close stages and their fixed task lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

const PRELIMINARY: &[&str] = &[
    "Confirm the accounting period and close calendar with the controller",
    "Verify all sub-ledgers are open for the period being closed",
    "Post all recurring journal entries for the period",
    "Confirm prior month close adjustments were posted",
    "Review suspense and clearing accounts for unexpected balances",
];

const ACCOUNTS_RECEIVABLE: &[&str] = &[
    "Ensure all customer invoices are posted",
    "Apply all customer payments and match to invoices",
    "Review A/R Aging Report for overdue or unapplied credits",
    "Write-off bad debts if necessary",
    "Review Deferred Revenue schedules and post revenue recognition",
];

const ACCOUNTS_PAYABLE: &[&str] = &[
    "Ensure all vendor bills received are entered",
    "Match purchase orders, receipts and vendor invoices",
    "Review A/P Aging Report for duplicate or disputed bills",
    "Record unbilled receipts as accrued liabilities",
    "Reconcile A/P sub-ledger to the general ledger control account",
];

const BANK_RECONCILIATION: &[&str] = &[
    "Download bank statements for every operating account",
    "Match deposits and withdrawals to recorded transactions",
    "Record bank fees, interest and other unrecorded items",
    "Investigate outstanding checks older than 90 days",
    "Reconcile credit card accounts to statements",
    "Confirm reconciled balances agree to the general ledger",
];

const INVENTORY: &[&str] = &[
    "Perform or review the period-end physical count",
    "Reconcile the inventory sub-ledger to the general ledger",
    "Review slow-moving and obsolete stock for write-down",
    "Verify cost of goods sold postings for the period",
    "Record inventory in transit at period end",
];

const ACCRUALS_ADJUSTMENTS: &[&str] = &[
    "Accrue payroll, bonuses and related taxes earned but unpaid",
    "Accrue expenses for services received but not yet billed",
    "Amortize prepaid expenses",
    "Post depreciation for fixed assets",
    "Record intercompany transactions and eliminations",
    "Review and reverse prior month accruals as needed",
];

const REVIEW_FINANCIALS: &[&str] = &[
    "Run the trial balance and confirm debits equal credits",
    "Compare income statement to budget and prior month",
    "Investigate significant variances and document explanations",
    "Review the balance sheet for unusual balances",
    "Prepare the statement of cash flows",
    "Obtain controller sign-off on the financial package",
];

const LOCK_CLOSE_PERIOD: &[&str] = &[
    "Confirm all close checklist stages are complete",
    "Archive supporting schedules and reconciliations",
    "Lock the accounting period in the ledger",
    "Restrict posting permissions for the closed period",
    "Distribute financial statements to stakeholders",
];

/// One step of the month-end close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Preliminary,
    AccountsReceivable,
    AccountsPayable,
    BankReconciliation,
    Inventory,
    AccrualsAdjustments,
    ReviewFinancials,
    LockClosePeriod,
}

impl Stage {
    /// Every stage in pipeline order.
    pub const ALL: [Stage; 8] = [
        Stage::Preliminary,
        Stage::AccountsReceivable,
        Stage::AccountsPayable,
        Stage::BankReconciliation,
        Stage::Inventory,
        Stage::AccrualsAdjustments,
        Stage::ReviewFinancials,
        Stage::LockClosePeriod,
    ];

    /// 1-based position in the pipeline.
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Stable identifier, also the stem of the stage's output files.
    pub fn id(&self) -> &'static str {
        match self {
            Stage::Preliminary => "1preliminary",
            Stage::AccountsReceivable => "2AccountsReceivable",
            Stage::AccountsPayable => "3AccountsPayable",
            Stage::BankReconciliation => "4BankReconciliation",
            Stage::Inventory => "5Inventory",
            Stage::AccrualsAdjustments => "6AccrualsAdjustments",
            Stage::ReviewFinancials => "7ReviewFinancials",
            Stage::LockClosePeriod => "8LockClosePeriod",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Preliminary => "1 Preliminary",
            Stage::AccountsReceivable => "2 Accounts Receivable",
            Stage::AccountsPayable => "3 Accounts Payable",
            Stage::BankReconciliation => "4 Bank Reconciliation",
            Stage::Inventory => "5 Inventory",
            Stage::AccrualsAdjustments => "6 Accruals & Adjustments",
            Stage::ReviewFinancials => "7 Review Financials",
            Stage::LockClosePeriod => "8 Lock Close Period",
        }
    }

    pub fn tasks(&self) -> &'static [&'static str] {
        match self {
            Stage::Preliminary => PRELIMINARY,
            Stage::AccountsReceivable => ACCOUNTS_RECEIVABLE,
            Stage::AccountsPayable => ACCOUNTS_PAYABLE,
            Stage::BankReconciliation => BANK_RECONCILIATION,
            Stage::Inventory => INVENTORY,
            Stage::AccrualsAdjustments => ACCRUALS_ADJUSTMENTS,
            Stage::ReviewFinancials => REVIEW_FINANCIALS,
            Stage::LockClosePeriod => LOCK_CLOSE_PERIOD,
        }
    }

    pub fn checklist(&self) -> Checklist {
        Checklist::new(self.id(), self.title(), self.tasks().iter().copied())
    }

    pub fn all_ids() -> Vec<String> {
        Self::ALL.iter().map(|s| s.id().to_string()).collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Accepts the stable id (any case) or the 1-based pipeline number.
impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if let Ok(n) = needle.parse::<usize>() {
            return Self::ALL
                .iter()
                .copied()
                .find(|stage| stage.number() == n)
                .ok_or_else(|| Error::UnknownStage(needle.to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::UnknownStage(needle.to_string()))
    }
}

/// Ordered task descriptions for one stage. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    pub stage: String,
    pub title: String,
    pub tasks: Vec<String>,
}

impl Checklist {
    pub fn new<I, S>(stage: &str, title: &str, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stage: stage.to_string(),
            title: title.to_string(),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// "5 checklist items"
    pub fn summary(&self) -> String {
        format!("{} checklist items", self.tasks.len())
    }
}

/// Whole-number completion percentage, rounded to nearest. Zero for an empty list.
pub fn completion_percentage(checked: usize, total: usize) -> u16 {
    if total == 0 {
        return 0;
    }
    let checked = checked.min(total);
    ((checked * 100 + total / 2) / total) as u16
}
