use std::fmt;

use fastnum::{D128, dec128};
use serde::Serialize;

use crate::{
    domain::{AccountName, EntryDate, LedgerEntry, Owner, Session},
    engine::LedgerEngine,
    metrics::Metrics,
};

const BAR_WIDTH: usize = 20;

/// One line of the history table.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub date: EntryDate,
    pub balance: D128,
    pub daily_gain: D128,
}

/// One point of the balance chart, with both reference lines.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub date: EntryDate,
    pub balance: D128,
    pub initial: D128,
    pub target: D128,
}

/// Everything shown for one selected account.
#[derive(Clone, Debug)]
pub struct Dashboard {
    pub account: AccountName,
    pub firm: String,
    pub owner: Owner,
    pub metrics: Metrics,
    /// Ascending by date.
    pub chart: Vec<ChartPoint>,
    /// Newest first.
    pub history: Vec<HistoryRow>,
}

impl Dashboard {
    /// Returns `None` when the account has no entries the session can see,
    /// which callers render as an empty state.
    pub fn build(engine: &LedgerEngine<'_>, session: &Session, account: &AccountName) -> Option<Self> {
        if !engine.is_visible(session, account) {
            return None;
        }
        let snapshot = engine.snapshot(account)?;
        let history = engine.history(account);

        let chart = history
            .iter()
            .map(|entry| ChartPoint {
                date: entry.date.clone(),
                balance: entry.balance,
                initial: snapshot.initial,
                target: snapshot.target,
            })
            .collect();

        Some(Dashboard {
            account: snapshot.account.clone(),
            firm: snapshot.firm.clone(),
            owner: snapshot.owner.clone(),
            metrics: Metrics::from_snapshot(snapshot),
            chart,
            history: history_rows(&history),
        })
    }
}

/// First differences of balance over the ascending history, newest first.
///
/// The earliest entry has a daily gain of zero.
pub fn history_rows(history: &[&LedgerEntry]) -> Vec<HistoryRow> {
    let mut previous: Option<D128> = None;
    let mut rows: Vec<HistoryRow> = history
        .iter()
        .map(|entry| {
            let daily_gain = previous.map_or(D128::ZERO, |before| entry.balance - before);
            previous = Some(entry.balance);
            HistoryRow {
                date: entry.date.clone(),
                balance: entry.balance,
                daily_gain,
            }
        })
        .collect();
    rows.reverse();
    rows
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = &self.metrics;

        writeln!(f, "{} ({}) - {}", self.account, self.firm, self.owner)?;
        writeln!(
            f,
            "  Balance   {:>12}  {} overall",
            money(metrics.balance),
            signed(metrics.total_pnl)
        )?;
        writeln!(f, "  Target    {:>12}", money(metrics.target))?;
        writeln!(
            f,
            "  Progress  {:>11}%  [{}]{}",
            metrics.progress_percent().rescale(1).to_string(),
            progress_bar(metrics.progress),
            if metrics.target_reached() { "  target reached" } else { "" }
        )?;
        writeln!(f, "  Distance  {:>12}", money(metrics.distance_to_target))?;
        writeln!(f)?;

        writeln!(f, "  {:<12} {:>12} {:>12}", "Date", "Balance", "Daily gain")?;
        for row in &self.history {
            writeln!(
                f,
                "  {:<12} {:>12} {:>12}",
                row.date.to_string(),
                money(row.balance),
                signed(row.daily_gain)
            )?;
        }
        Ok(())
    }
}

fn money(value: D128) -> String {
    value.rescale(2).to_string()
}

fn signed(value: D128) -> String {
    if value < D128::ZERO {
        money(value)
    } else {
        format!("+{}", money(value))
    }
}

fn progress_bar(progress: D128) -> String {
    let step = dec128!(0.05);
    let mut filled = 0;
    let mut threshold = step;
    while filled < BAR_WIDTH && threshold <= progress {
        filled += 1;
        threshold += step;
    }
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, account: &str, balance: D128, owner: &str) -> LedgerEntry {
        LedgerEntry {
            date: EntryDate::parse(date),
            account: AccountName::new(account),
            firm: "Apex".to_string(),
            initial: dec128!(25000),
            target: dec128!(26600),
            balance,
            owner: Owner::new(owner),
        }
    }

    fn ledger() -> Vec<LedgerEntry> {
        vec![
            entry("2026-01-03", "Eval1", dec128!(24800), "alice"),
            entry("2026-01-01", "Eval1", dec128!(25000), "alice"),
            entry("2026-01-01", "Eval2", dec128!(50000), "bob"),
            entry("2026-01-02", "Eval1", dec128!(25800), "alice"),
        ]
    }

    #[test]
    fn test_history_is_newest_first_with_daily_gains() {
        let entries = ledger();
        let engine = LedgerEngine::new(&entries);

        let dashboard = Dashboard::build(&engine, &Session::default(), &AccountName::new("Eval1"))
            .expect("account has entries");

        let gains: Vec<_> = dashboard.history.iter().map(|row| row.daily_gain).collect();
        assert_eq!(gains, vec![dec128!(-1000), dec128!(800), dec128!(0)]);
        assert_eq!(dashboard.history[0].date, EntryDate::parse("2026-01-03"));
    }

    #[test]
    fn test_single_entry_has_zero_gain() {
        let only = entry("2026-01-01", "Eval1", dec128!(25000), "alice");

        let rows = history_rows(&[&only]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].daily_gain, dec128!(0));
    }

    #[test]
    fn test_chart_is_ascending_with_reference_lines() {
        let entries = ledger();
        let engine = LedgerEngine::new(&entries);

        let dashboard = Dashboard::build(&engine, &Session::default(), &AccountName::new("Eval1"))
            .expect("account has entries");

        let balances: Vec<_> = dashboard.chart.iter().map(|point| point.balance).collect();
        assert_eq!(balances, vec![dec128!(25000), dec128!(25800), dec128!(24800)]);
        assert!(dashboard
            .chart
            .iter()
            .all(|point| point.initial == dec128!(25000) && point.target == dec128!(26600)));
        assert_eq!(dashboard.metrics.balance, dec128!(24800));
    }

    #[test]
    fn test_empty_state_for_hidden_or_missing_account() {
        let entries = ledger();
        let engine = LedgerEngine::new(&entries);
        let alice = Session::for_owner(Owner::new("alice"));

        assert!(Dashboard::build(&engine, &alice, &AccountName::new("Eval2")).is_none());
        assert!(Dashboard::build(&engine, &alice, &AccountName::new("Nope")).is_none());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(dec128!(0)), "-".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(dec128!(0.5)), format!("{}{}", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(dec128!(1)), "#".repeat(BAR_WIDTH));
    }

    #[test]
    fn test_render_mentions_metrics() {
        let entries = ledger();
        let engine = LedgerEngine::new(&entries);
        let dashboard = Dashboard::build(&engine, &Session::default(), &AccountName::new("Eval1"))
            .expect("account has entries");

        let rendered = dashboard.to_string();
        assert!(rendered.starts_with("Eval1 (Apex) - alice"));
        assert!(rendered.contains("24800.00"));
        assert!(rendered.contains("-200.00 overall"));
        assert!(rendered.contains("1800.00"));
    }
}
